#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Bounded FIFO building blocks over a single ring of contiguous storage.
//!
//! * [`CircularBuffer`] is a capacity-bounded queue with wrap-around indexes. Besides the usual
//!   single-item operations it supports bulk transfer, concatenation, fan-out to several buffers,
//!   in-place sorting and explicit resizing.
//! * [`BoundedChannel`] wraps a buffer in a mutex and two condition variables, giving a blocking
//!   multi-producer multi-consumer FIFO with optional deadlines and cooperative
//!   [cancellation][CancellationToken].
//! * [`FixedPool`] hands out slots from a preallocated, never-moving array and keeps the free
//!   slots in a circular buffer.
//!
//! # Growth
//!
//! Buffers reject inserts once full unless configured with [`GrowthPolicy::Double`] through
//! [`CircularBuffer::builder()`]. Bulk operations transfer only what fits and never grow.
//!
//! # Example
//!
//! ```
//! use circulate::CircularBuffer;
//!
//! let mut buffer = CircularBuffer::new(3);
//!
//! buffer.enqueue(1).unwrap();
//! buffer.enqueue(2).unwrap();
//! buffer.enqueue(3).unwrap();
//! assert!(buffer.enqueue(4).is_err());
//!
//! assert_eq!(buffer.dequeue(), Some(1));
//! buffer.enqueue(4).unwrap();
//!
//! assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
//! ```
//!
//! Passing items between threads:
//!
//! ```
//! use std::thread;
//!
//! use circulate::BoundedChannel;
//!
//! let channel = BoundedChannel::new(2);
//!
//! thread::scope(|s| {
//!     s.spawn(|| {
//!         for i in 0..10 {
//!             channel.send(i);
//!         }
//!     });
//!
//!     let received = (0..10).map(|_| channel.receive()).collect::<Vec<_>>();
//!     assert_eq!(received, (0..10).collect::<Vec<_>>());
//! });
//! ```

mod builder;
mod cancellation;
mod channel;
mod circular_buffer;
mod error;
mod fixed_pool;
mod growth_policy;

pub use builder::*;
pub use cancellation::*;
pub use channel::*;
pub use circular_buffer::*;
pub use error::*;
pub use fixed_pool::*;
pub use growth_policy::*;
