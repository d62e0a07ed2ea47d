//! Operations that rearrange or reallocate the backing storage without changing the logical
//! order of the items.

use std::any::type_name;
use std::cmp::Ordering;

use tracing::debug;

use crate::{CircularBuffer, Error};

impl<T> CircularBuffer<T> {
    /// Rearranges the storage so that the head item is at physical index 0 and the items
    /// occupy one contiguous run. The logical order of the items does not change.
    ///
    /// Does nothing if the buffer is empty or already starts at index 0. Does not allocate.
    pub fn linearize(&mut self) {
        if self.count == 0 {
            self.head = 0;
            self.tail = 0;
            return;
        }

        if self.head == 0 {
            return;
        }

        let end = self
            .head
            .checked_add(self.count)
            .expect("sum of two indexes within an allocation cannot overflow usize");

        if end <= self.capacity() {
            // The items do not wrap, so we can move each one forward by `head` slots. The
            // vacant slots end up behind the items.
            for index in 0..self.count {
                let source = self
                    .head
                    .checked_add(index)
                    .expect("guarded by end <= capacity above");
                self.storage.swap(index, source);
            }
        } else {
            // The items wrap around the end of storage. Rotating the entire storage left by
            // `head` slots via three reversals puts everything in place without a scratch copy.
            let (front, back) = self.storage.split_at_mut(self.head);
            front.reverse();
            back.reverse();
            self.storage.reverse();
        }

        self.head = 0;
        self.tail = self.offset_index(0, self.count);

        #[cfg(debug_assertions)]
        self.integrity_check();
    }

    /// Sorts the items in place with a comparator function, after which the head item is the
    /// smallest one. The sort is stable.
    ///
    /// The storage is [linearized][Self::linearize] first.
    ///
    /// # Examples
    ///
    /// ```
    /// use circulate::CircularBuffer;
    ///
    /// let mut buffer = CircularBuffer::new(4);
    /// buffer.enqueue_many(&["ccc", "a", "bb"]);
    ///
    /// buffer.sort_by(|a, b| a.len().cmp(&b.len()));
    ///
    /// assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec!["a", "bb", "ccc"]);
    /// ```
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.linearize();

        let occupied = self
            .storage
            .get_mut(..self.count)
            .expect("count never exceeds capacity");

        occupied.sort_by(|a, b| match (a, b) {
            (Some(a), Some(b)) => compare(a, b),
            _ => unreachable!("the linearized prefix of a CircularBuffer is fully occupied"),
        });
    }

    /// Sorts the items in place in ascending order.
    ///
    /// The storage is [linearized][Self::linearize] first.
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        self.sort_by(Ord::cmp);
    }

    /// Changes the capacity of the buffer, preserving all items and their order.
    ///
    /// The items are moved into freshly allocated storage starting at index 0. Any outstanding
    /// references to the old storage are ruled out by the exclusive borrow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferFull`] if `new_capacity` is smaller than the number of items in
    /// the buffer; nothing is dropped in that case. Returns [`Error::OutOfMemory`] if the new
    /// storage cannot be allocated. On error, the buffer is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `new_capacity` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use circulate::{CircularBuffer, Error};
    ///
    /// let mut buffer = CircularBuffer::new(2);
    /// buffer.enqueue_many(&[1, 2]);
    ///
    /// buffer.resize(5).unwrap();
    /// assert_eq!(buffer.capacity(), 5);
    /// assert_eq!(buffer.available(), 3);
    ///
    /// assert_eq!(buffer.resize(1), Err(Error::BufferFull));
    /// ```
    pub fn resize(&mut self, new_capacity: usize) -> crate::Result<()> {
        assert!(
            new_capacity > 0,
            "CircularBuffer of {} must have non-zero capacity",
            type_name::<T>()
        );

        if new_capacity < self.count {
            return Err(Error::BufferFull);
        }

        let mut storage = Vec::new();
        storage.try_reserve_exact(new_capacity).map_err(|error| {
            debug!(
                %error,
                new_capacity,
                item_type = type_name::<T>(),
                "failed to allocate storage for circular buffer"
            );
            Error::OutOfMemory
        })?;

        let old_capacity = self.capacity();

        self.linearize();

        storage.extend(self.storage.iter_mut().take(self.count).map(Option::take));
        storage.resize_with(new_capacity, || None);

        self.storage = storage.into_boxed_slice();
        self.head = 0;
        self.tail = self.offset_index(0, self.count);

        debug!(
            old_capacity,
            new_capacity,
            len = self.count,
            item_type = type_name::<T>(),
            "resized circular buffer"
        );

        #[cfg(debug_assertions)]
        self.integrity_check();

        Ok(())
    }

    /// Doubles the capacity, as done on insert under [`GrowthPolicy::Double`][1].
    ///
    /// [1]: crate::GrowthPolicy::Double
    pub(super) fn grow(&mut self) -> crate::Result<()> {
        let new_capacity = self
            .capacity()
            .checked_mul(2)
            .ok_or(Error::OutOfMemory)?;

        self.resize(new_capacity)
    }
}
