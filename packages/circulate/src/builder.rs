use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use crate::{CircularBuffer, GrowthPolicy};

/// Builder for creating an instance of [`CircularBuffer`].
///
/// You only need to use this builder if you want to customize the buffer configuration.
/// [`CircularBuffer::new()`][1] creates a fixed-capacity buffer, which is sufficient for most
/// use cases.
///
/// # Examples
///
/// ```
/// use circulate::{CircularBuffer, GrowthPolicy};
///
/// let buffer = CircularBuffer::<u32>::builder()
///     .capacity(16)
///     .growth_policy(GrowthPolicy::Double)
///     .build();
///
/// assert_eq!(buffer.capacity(), 16);
/// ```
///
/// [1]: CircularBuffer::new
#[must_use]
pub struct CircularBufferBuilder<T> {
    capacity: usize,
    growth_policy: GrowthPolicy,

    _item: PhantomData<T>,
}

impl<T> fmt::Debug for CircularBufferBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircularBufferBuilder")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("capacity", &self.capacity)
            .field("growth_policy", &self.growth_policy)
            .finish()
    }
}

/// Capacity used when the builder is not told otherwise.
const DEFAULT_CAPACITY: usize = 64;

impl<T> CircularBufferBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            growth_policy: GrowthPolicy::default(),
            _item: PhantomData,
        }
    }

    /// Sets the initial capacity of the buffer, in items.
    ///
    /// For a [`GrowthPolicy::Fixed`] buffer this is also the final capacity, unless the buffer
    /// is explicitly [resized][CircularBuffer::resize].
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the [growth policy][GrowthPolicy] for the buffer. This governs what happens when
    /// a single item is inserted into a full buffer.
    pub fn growth_policy(mut self, policy: GrowthPolicy) -> Self {
        self.growth_policy = policy;
        self
    }

    /// Builds the buffer with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is zero.
    #[must_use]
    pub fn build(self) -> CircularBuffer<T> {
        CircularBuffer::new_inner(self.capacity, self.growth_policy)
    }
}
