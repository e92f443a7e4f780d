//! Eviction policy of the page cache.
//!
//! - [`FifoReplacer`] - Evicts pages in the order they entered the cache

mod fifo;

pub use fifo::FifoReplacer;
