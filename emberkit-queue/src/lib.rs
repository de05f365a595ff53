//! Bounded circular queue for the emberkit toolkit.
//!
//! [`CircQueue`] is a fixed-capacity, array-backed FIFO for exactly one
//! producer and one consumer, built for low-overhead hand-off such as
//! interrupt handler to worker. Capacity is forced down to a power of two so
//! slot indexing is a bitmask instead of a modulo, and occupancy falls out
//! of wraparound-correct unsigned counter subtraction.

mod circ_queue;

pub use circ_queue::CircQueue;
