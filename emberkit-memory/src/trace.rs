use std::io;

/// Destination for the allocator's per-call trace lines.
///
/// Sinks are injected at construction; nothing in the crate writes to a
/// hardcoded stream.
pub trait TraceSink: Send {
    fn write(&mut self, line: &str);
}

/// Routes trace lines to the [`log`] crate at `trace` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl TraceSink for LogSink {
    #[inline]
    fn write(&mut self, line: &str) {
        log::trace!(target: "emberkit_memory", "{line}");
    }
}

/// Routes trace lines to any [`io::Write`], one line each.
///
/// Write errors are swallowed; tracing is diagnostic output and must never
/// turn an allocation into a failure.
#[derive(Debug)]
pub struct WriteSink<W: io::Write> {
    inner: W,
}

impl<W: io::Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write + Send> TraceSink for WriteSink<W> {
    fn write(&mut self, line: &str) {
        use io::Write;

        let _ = writeln!(self.inner, "{line}");
    }
}
