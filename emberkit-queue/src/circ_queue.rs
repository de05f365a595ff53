/// # CircQueue
///
/// A fixed-capacity circular FIFO over a caller-provided backing slice.
///
/// ## Counter layout
/// ```ignore
///                 head & mask            tail & mask
///                  |                      |
///                  v                      v
///     +------+------+------+------+------+------+------+------+
///     |  e5  |      |      |      |  e1  |  e2  |  e3  |  e4  |
///     +------+------+------+------+------+------+------+------+
///       occupied      free slots           occupied
/// ```
///
/// `head` and `tail` are fixed-width unsigned counters that only ever
/// increase, wrapping through zero via wrapping arithmetic. Because
/// `used() = head.wrapping_sub(tail)` is computed in the same fixed-width
/// unsigned arithmetic, the wrap cancels and no modulo bookkeeping is
/// needed; slot indices are `counter & mask` with `mask = capacity - 1`.
///
/// The usable capacity is the largest power of two not exceeding the
/// requested capacity (and the slice length). A capacity of 0 degenerates to
/// a queue that is permanently both empty and full: every insert fails.
///
/// ## Concurrency
/// There is no internal synchronization. The non-blocking O(1) operations
/// are safe for exactly one producer and one consumer only where the
/// counter increments are effectively atomic with respect to the producer's
/// and consumer's own execution context — true for word-sized counters on
/// most targets, but not guaranteed under arbitrary preemption without a
/// memory fence. Callers own that constraint; the queue never locks, since
/// locking would defeat its purpose in interrupt contexts.
pub struct CircQueue<'a, T: Copy> {
    slots: &'a mut [T],
    head: usize,
    tail: usize,
    mask: usize,
    capacity: usize,
}

impl<'a, T: Copy> CircQueue<'a, T> {
    /// Creates a queue over `slots`, using the largest power of two not
    /// exceeding `requested` (nor the slice length) as its capacity.
    pub fn new(slots: &'a mut [T], requested: usize) -> Self {
        let capacity = floor_pow2(requested.min(slots.len()));

        Self {
            slots,
            head: 0,
            tail: 0,
            mask: capacity.wrapping_sub(1),
            capacity,
        }
    }

    /// Appends `item`, returning `false` without side effects when full.
    #[inline(always)]
    pub fn insert(&mut self, item: T) -> bool {
        if self.free() == 0 {
            return false;
        }

        self.slots[self.head & self.mask] = item;
        self.head = self.head.wrapping_add(1);

        true
    }

    /// Copy of the oldest item without consuming it; `None` when empty.
    #[inline(always)]
    pub fn peek(&self) -> Option<T> {
        if self.used() == 0 {
            return None;
        }

        Some(self.slots[self.tail & self.mask])
    }

    /// Removes and returns the oldest item; `None` when empty.
    #[inline(always)]
    pub fn remove(&mut self) -> Option<T> {
        let item = self.peek()?;
        self.tail = self.tail.wrapping_add(1);

        Some(item)
    }

    /// Returns the queue to the empty state unconditionally.
    ///
    /// The caller guarantees no concurrent producer or consumer is in
    /// flight.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    /// Number of occupied slots.
    #[inline(always)]
    pub fn used(&self) -> usize {
        let used = self.head.wrapping_sub(self.tail);
        debug_assert!(used <= self.capacity, "Counter invariant violated");

        used
    }

    /// Number of unoccupied slots.
    #[inline(always)]
    pub fn free(&self) -> usize {
        self.capacity - self.used()
    }

    /// Fixed usable capacity.
    #[inline(always)]
    pub const fn total(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.used() == 0
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.free() == 0
    }
}

/// Largest power of two not exceeding `n`; 0 for 0.
#[inline(always)]
const fn floor_pow2(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        1usize << (usize::BITS - 1 - n.leading_zeros())
    }
}
