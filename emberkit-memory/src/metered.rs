use std::{alloc::Layout, fmt, ptr};

use crate::{
    raw::{RawAlloc, SystemRaw},
    stats::AllocStats,
    trace::{LogSink, TraceSink},
};

/// Allocation granularity unit in bytes.
///
/// Every underlying block is a whole number of granules; the first granule
/// holds the block header.
pub const GRANULE: usize = 8;

const _: () = assert!(GRANULE >= std::mem::size_of::<usize>());

/// Why the most recent allocation attempt failed.
///
/// Sticky like `errno`: set on failure, left untouched on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The raw facility returned null.
    OutOfMemory,
    /// The request overflowed the granule arithmetic (or a `calloc` product
    /// overflowed `usize`).
    SizeOverflow,
}

/// # MeteredAlloc
///
/// An accounting allocator with libc-compatible semantics over a pluggable
/// raw facility.
///
/// ## Block layout
/// ```ignore
///       base                  base + GRANULE
///        |                     |
///        v                     v
///        +---------------------+----------------------------+
///        | header (usize size) | payload (size bytes, plus  |
///        |                     | padding up to a granule)   |
///        +---------------------+----------------------------+
///         <-- one granule ----> <-- ceil(size / GRANULE) -->
/// ```
///
/// The pointer handed to callers is `base + GRANULE`; the header granule
/// stores the *exact* requested size, so [`MeteredAlloc::size`] never
/// returns a rounded value. Header and payload are one owned block, released
/// together.
///
/// ## Semantics
/// - `malloc(0)` is legal and returns a distinguishable non-null pointer
///   (glibc convention); the block still carries its header.
/// - `realloc(null, n)` is `malloc(n)`; `realloc(p, 0)` is `free(p)`.
/// - `calloc` overflow-checks `nmemb * size` unless the `unchecked_calloc`
///   feature reproduces the historical unchecked multiply.
/// - Failures never panic: null return, failure counter, [`AllocError`].
///
/// Not internally thread-safe. Share an instance across threads by wrapping
/// it in one external mutex; nothing here blocks or retries.
pub struct MeteredAlloc<R: RawAlloc = SystemRaw> {
    raw: R,
    stats: AllocStats,
    tracing: bool,
    sink: Box<dyn TraceSink>,
    last_error: Option<AllocError>,
}

impl MeteredAlloc<SystemRaw> {
    /// Creates an allocator over the process heap, tracing to [`LogSink`].
    pub fn new() -> Self {
        Self::with_raw(SystemRaw)
    }
}

impl Default for MeteredAlloc<SystemRaw> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RawAlloc> MeteredAlloc<R> {
    /// Creates an allocator over `raw`, tracing to [`LogSink`].
    pub fn with_raw(raw: R) -> Self {
        Self::with_sink(raw, Box::new(LogSink))
    }

    /// Creates an allocator over `raw` with an injected trace sink.
    ///
    /// The sink is only written to while tracing is enabled via
    /// [`MeteredAlloc::trace`].
    pub fn with_sink(raw: R, sink: Box<dyn TraceSink>) -> Self {
        Self {
            raw,
            stats: AllocStats::default(),
            tracing: false,
            sink,
            last_error: None,
        }
    }

    /// Allocates `size` bytes, returning null on failure.
    ///
    /// `size == 0` succeeds with a unique non-null pointer whose stored size
    /// is 0.
    pub fn malloc(&mut self, size: usize) -> *mut u8 {
        let out = self.grab(size);
        self.emit(format_args!("malloc({size}) = {out:p}"));

        out
    }

    /// Releases a block. Null is a legal no-op, counted separately.
    ///
    /// # Safety
    /// A non-null `ptr` must have come from this allocator and must not have
    /// been freed already.
    pub unsafe fn free(&mut self, ptr: *mut u8) {
        self.emit(format_args!("free({ptr:p})"));

        if ptr.is_null() {
            self.stats.null_frees += 1;
            return;
        }

        unsafe { self.drop_block(ptr) };
    }

    /// Resizes a block with libc `realloc` semantics.
    ///
    /// Null `ptr` behaves as `malloc(size)`; `size == 0` with non-null `ptr`
    /// behaves as `free(ptr)` and returns null. A request for the exact
    /// stored size returns `ptr` unchanged with no copy. On allocation
    /// failure the original block and its contents are left untouched and
    /// null is returned.
    ///
    /// # Safety
    /// A non-null `ptr` must have come from this allocator and be live. On
    /// success the old pointer is invalid unless it was returned back.
    pub unsafe fn realloc(&mut self, ptr: *mut u8, size: usize) -> *mut u8 {
        let out = unsafe { self.realloc_inner(ptr, size) };
        self.emit(format_args!("realloc({ptr:p}, {size}) = {out:p}"));

        out
    }

    /// Allocates a zero-filled block of `nmemb * size` bytes.
    ///
    /// The product is overflow-checked and overflow counts as an allocation
    /// failure, unless the `unchecked_calloc` feature restores the
    /// historical wrapping multiply.
    pub fn calloc(&mut self, nmemb: usize, size: usize) -> *mut u8 {
        let out = if cfg!(feature = "unchecked_calloc") {
            self.grab_zeroed(nmemb.wrapping_mul(size))
        } else {
            match nmemb.checked_mul(size) {
                Some(bytes) => self.grab_zeroed(bytes),
                None => {
                    self.stats.failures += 1;
                    self.last_error = Some(AllocError::SizeOverflow);
                    ptr::null_mut()
                }
            }
        };
        self.emit(format_args!("calloc({nmemb}, {size}) = {out:p}"));

        out
    }

    /// Returns the exact size requested at the most recent allocating call
    /// for `ptr`, or 0 for null.
    ///
    /// # Safety
    /// A non-null `ptr` must have come from this allocator and be live.
    #[inline(always)]
    pub unsafe fn size(&self, ptr: *const u8) -> usize {
        if ptr.is_null() {
            0
        } else {
            unsafe { stored_size(ptr) }
        }
    }

    /// Enables or disables per-call trace lines; returns the prior setting.
    pub fn trace(&mut self, enable: bool) -> bool {
        std::mem::replace(&mut self.tracing, enable)
    }

    #[inline(always)]
    pub fn stats(&self) -> &AllocStats {
        &self.stats
    }

    /// Bytes handed out over the allocator's lifetime.
    #[inline(always)]
    pub fn total(&self) -> usize {
        self.stats.total_bytes
    }

    /// Bytes currently outstanding.
    #[inline(always)]
    pub fn current(&self) -> usize {
        self.stats.current_bytes
    }

    #[inline(always)]
    pub fn successes(&self) -> usize {
        self.stats.successes
    }

    #[inline(always)]
    pub fn failures(&self) -> usize {
        self.stats.failures
    }

    #[inline(always)]
    pub fn frees(&self) -> usize {
        self.stats.frees
    }

    #[inline(always)]
    pub fn null_frees(&self) -> usize {
        self.stats.null_frees
    }

    /// The `errno` equivalent: why the most recent failure failed.
    #[inline(always)]
    pub fn last_error(&self) -> Option<AllocError> {
        self.last_error
    }

    unsafe fn realloc_inner(&mut self, ptr: *mut u8, size: usize) -> *mut u8 {
        if ptr.is_null() {
            return self.grab(size);
        }

        if size == 0 {
            unsafe { self.drop_block(ptr) };
            return ptr::null_mut();
        }

        let old = unsafe { stored_size(ptr) };
        if old == size {
            // No allocation attempt is issued, so no counter moves.
            return ptr;
        }

        let fresh = self.grab(size);
        if fresh.is_null() {
            return ptr::null_mut();
        }

        unsafe {
            ptr::copy_nonoverlapping(ptr, fresh, old.min(size));
            self.drop_block(ptr);
        }

        fresh
    }

    fn grab(&mut self, size: usize) -> *mut u8 {
        let Some(layout) = block_layout(size) else {
            self.stats.failures += 1;
            self.last_error = Some(AllocError::SizeOverflow);
            return ptr::null_mut();
        };

        let base = self.raw.alloc(layout);
        if base.is_null() {
            self.stats.failures += 1;
            self.last_error = Some(AllocError::OutOfMemory);
            return ptr::null_mut();
        }

        unsafe { (base as *mut usize).write(size) };

        self.stats.successes += 1;
        self.stats.total_bytes += size;
        self.stats.current_bytes += size;

        unsafe { base.add(GRANULE) }
    }

    fn grab_zeroed(&mut self, size: usize) -> *mut u8 {
        let out = self.grab(size);
        if !out.is_null() {
            unsafe { ptr::write_bytes(out, 0, size) };
        }

        out
    }

    unsafe fn drop_block(&mut self, ptr: *mut u8) {
        let size = unsafe { stored_size(ptr) };
        let layout = block_layout(size).expect("Invalid block layout");

        debug_assert!(
            size <= self.stats.current_bytes,
            "Freed size {} exceeds outstanding bytes {}",
            size,
            self.stats.current_bytes
        );

        self.stats.current_bytes -= size;
        self.stats.frees += 1;

        unsafe { self.raw.dealloc(ptr.sub(GRANULE), layout) };
    }

    fn emit(&mut self, line: fmt::Arguments) {
        if self.tracing {
            self.sink.write(&line.to_string());
        }
    }
}

/// Layout of the underlying block for a `size`-byte request: one header
/// granule plus the payload rounded up to whole granules. None on overflow.
fn block_layout(size: usize) -> Option<Layout> {
    let units = size.div_ceil(GRANULE).checked_add(1)?;
    let bytes = units.checked_mul(GRANULE)?;

    Layout::from_size_align(bytes, GRANULE).ok()
}

#[inline(always)]
unsafe fn stored_size(ptr: *const u8) -> usize {
    unsafe { (ptr.sub(GRANULE) as *const usize).read() }
}
