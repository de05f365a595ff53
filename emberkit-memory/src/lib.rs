//! Accounting allocator for the emberkit toolkit.
//!
//! [`MeteredAlloc`] wraps a raw allocation facility with libc-compatible
//! `malloc`/`free`/`realloc`/`calloc`/`size` semantics while keeping running
//! usage statistics and, optionally, emitting one trace line per call through
//! an injected [`TraceSink`].
//!
//! The allocator is deliberately not thread-safe; callers that share one
//! instance across threads serialize access externally (one mutex per
//! instance).

mod metered;
mod raw;
mod stats;
mod trace;

pub use metered::{AllocError, GRANULE, MeteredAlloc};
pub use raw::{RawAlloc, SystemRaw};
pub use stats::AllocStats;
pub use trace::{LogSink, TraceSink, WriteSink};
