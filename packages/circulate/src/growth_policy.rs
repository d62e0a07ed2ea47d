/// Determines what a [`CircularBuffer`][crate::CircularBuffer] does when a single-item insert
/// finds the buffer full.
///
/// By default, the buffer has a fixed capacity and rejects the item.
///
/// Bulk operations ([`enqueue_many()`][1], [`concatenate_available()`][2] and similar) never
/// grow the buffer, regardless of policy. They move as many items as currently fit.
///
/// # Examples
///
/// ```
/// use circulate::{CircularBuffer, GrowthPolicy};
///
/// let mut buffer = CircularBuffer::builder()
///     .capacity(2)
///     .growth_policy(GrowthPolicy::Double)
///     .build();
///
/// buffer.enqueue(1).unwrap();
/// buffer.enqueue(2).unwrap();
/// buffer.enqueue(3).unwrap();
///
/// assert_eq!(buffer.capacity(), 4);
/// ```
///
/// [1]: crate::CircularBuffer::enqueue_many
/// [2]: crate::CircularBuffer::concatenate_available
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum GrowthPolicy {
    /// Inserting into a full buffer fails with [`Error::BufferFull`][crate::Error::BufferFull].
    /// This is the default.
    #[default]
    Fixed,

    /// Inserting into a full buffer first doubles its capacity. If the new storage cannot be
    /// allocated, the insert fails with [`Error::OutOfMemory`][crate::Error::OutOfMemory].
    Double,
}
