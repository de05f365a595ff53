use std::alloc::Layout;

/// The raw allocation facility behind [`MeteredAlloc`](crate::MeteredAlloc).
///
/// Implementations return null on exhaustion instead of panicking; the
/// allocator turns that into its failure bookkeeping.
pub trait RawAlloc {
    /// Returns a pointer to `layout.size()` bytes, or null on failure.
    fn alloc(&mut self, layout: Layout) -> *mut u8;

    /// Releases a block previously returned by [`RawAlloc::alloc`].
    ///
    /// # Safety
    /// `ptr` must have been returned by `alloc` on this facility with the
    /// same `layout`, and must not be released twice.
    unsafe fn dealloc(&mut self, ptr: *mut u8, layout: Layout);
}

/// [`RawAlloc`] backed by the process heap.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRaw;

impl RawAlloc for SystemRaw {
    #[inline(always)]
    fn alloc(&mut self, layout: Layout) -> *mut u8 {
        debug_assert!(layout.size() > 0, "Zero-size raw allocation");

        unsafe { std::alloc::alloc(layout) }
    }

    #[inline(always)]
    unsafe fn dealloc(&mut self, ptr: *mut u8, layout: Layout) {
        unsafe { std::alloc::dealloc(ptr, layout) }
    }
}
