//! Operations that move or copy many items at once, between a buffer and a slice or between
//! several buffers.

use crate::{CircularBuffer, Error};

impl<T> CircularBuffer<T> {
    /// Appends clones of as many items from the start of `values` as there is room for.
    ///
    /// This is not a transactional insert: running out of room is not an error, the remaining
    /// items are simply not copied. The buffer never grows here, whatever its growth policy.
    ///
    /// Returns the number of items copied.
    ///
    /// # Examples
    ///
    /// ```
    /// use circulate::CircularBuffer;
    ///
    /// let mut buffer = CircularBuffer::new(3);
    ///
    /// assert_eq!(buffer.enqueue_many(&[1, 2]), 2);
    /// assert_eq!(buffer.enqueue_many(&[3, 4, 5]), 1);
    /// assert_eq!(buffer.len(), 3);
    /// ```
    pub fn enqueue_many(&mut self, values: &[T]) -> usize
    where
        T: Clone,
    {
        let moved = values.len().min(self.available());

        for value in values.iter().take(moved) {
            self.push_back(value.clone());
        }

        moved
    }

    /// Removes items from the head of the buffer into `out`, front to back, until either
    /// `out` is filled or the buffer is empty. Previous contents of the overwritten slots of
    /// `out` are dropped.
    ///
    /// Returns the number of items moved.
    ///
    /// # Examples
    ///
    /// ```
    /// use circulate::CircularBuffer;
    ///
    /// let mut buffer = CircularBuffer::new(4);
    /// buffer.enqueue_many(&[1, 2, 3]);
    ///
    /// let mut out = [0; 2];
    /// assert_eq!(buffer.dequeue_many(&mut out), 2);
    /// assert_eq!(out, [1, 2]);
    ///
    /// let mut out = [0; 2];
    /// assert_eq!(buffer.dequeue_many(&mut out), 1);
    /// assert_eq!(out, [3, 0]);
    /// ```
    pub fn dequeue_many(&mut self, out: &mut [T]) -> usize {
        let moved = out.len().min(self.count);

        for slot in out.iter_mut().take(moved) {
            *slot = self
                .pop_front()
                .expect("guarded by taking at most self.count items");
        }

        moved
    }

    /// Appends clones of `value` until the buffer is full.
    ///
    /// Returns the number of items added.
    pub fn fill(&mut self, value: T) -> usize
    where
        T: Clone,
    {
        let added = self.available();

        for _ in 0..added {
            self.push_back(value.clone());
        }

        added
    }

    /// Moves every item of `other` to the end of this buffer, leaving `other` empty.
    ///
    /// This is all-or-nothing: the capacity check happens before anything is moved, so on
    /// failure neither buffer is modified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferFull`] if this buffer does not have room for all items of `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use circulate::{CircularBuffer, Error};
    ///
    /// let mut target = CircularBuffer::new(3);
    /// let mut source = CircularBuffer::new(3);
    /// target.enqueue_many(&[1, 2]);
    /// source.enqueue_many(&[3, 4]);
    ///
    /// assert_eq!(target.concatenate(&mut source), Err(Error::BufferFull));
    /// assert_eq!(source.len(), 2);
    ///
    /// _ = source.dequeue();
    /// target.concatenate(&mut source).unwrap();
    /// assert!(source.is_empty());
    /// assert_eq!(target.iter().copied().collect::<Vec<_>>(), vec![1, 2, 4]);
    /// ```
    pub fn concatenate(&mut self, other: &mut Self) -> crate::Result<()> {
        if other.count > self.available() {
            return Err(Error::BufferFull);
        }

        while let Some(value) = other.pop_front() {
            self.push_back(value);
        }

        other.head = 0;
        other.tail = 0;

        #[cfg(debug_assertions)]
        {
            self.integrity_check();
            other.integrity_check();
        }

        Ok(())
    }

    /// Moves as many items from the head of `other` to the end of this buffer as there is
    /// room for. The items that do not fit stay at the head of `other`.
    ///
    /// This is meant for draining a producer-side buffer into a shared one where partial
    /// progress on every call is acceptable.
    ///
    /// Returns the number of items moved, which may be zero.
    pub fn concatenate_available(&mut self, other: &mut Self) -> usize {
        let moved = other.count.min(self.available());

        for _ in 0..moved {
            let value = other
                .pop_front()
                .expect("guarded by taking at most other.count items");
            self.push_back(value);
        }

        moved
    }

    /// Appends clones of every item of `other` to the end of this buffer, leaving `other`
    /// unmodified.
    ///
    /// This is all-or-nothing: on failure this buffer is not modified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferFull`] if this buffer does not have room for all items of `other`.
    pub fn copy_from(&mut self, other: &Self) -> crate::Result<()>
    where
        T: Clone,
    {
        if other.count > self.available() {
            return Err(Error::BufferFull);
        }

        for value in other {
            self.push_back(value.clone());
        }

        Ok(())
    }

    /// Broadcasts one batch of items from the head of this buffer to every target, then
    /// removes that batch from this buffer.
    ///
    /// The batch is as large as the target with the least free space can accept, so every
    /// target receives the entire batch and none of them falls behind. Items land in every
    /// target in the same order.
    ///
    /// Returns the number of items in the batch, which is the number of items every target
    /// received. With no targets, nothing happens and zero is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use circulate::CircularBuffer;
    ///
    /// let mut source = CircularBuffer::new(8);
    /// source.enqueue_many(&[1, 2, 3, 4]);
    ///
    /// let mut fast = CircularBuffer::new(8);
    /// let mut slow = CircularBuffer::new(2);
    ///
    /// assert_eq!(source.copy_min_to_others(&mut [&mut fast, &mut slow]), 2);
    /// assert_eq!(fast.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    /// assert_eq!(slow.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    /// assert_eq!(source.iter().copied().collect::<Vec<_>>(), vec![3, 4]);
    /// ```
    pub fn copy_min_to_others(&mut self, targets: &mut [&mut Self]) -> usize
    where
        T: Clone,
    {
        let Some(smallest_room) = targets.iter().map(|target| target.available()).min() else {
            return 0;
        };

        let batch = smallest_room.min(self.count);

        self.broadcast_front(batch, targets);
        batch
    }

    /// Broadcasts one batch of items from the head of this buffer to every target, then
    /// removes that batch from this buffer.
    ///
    /// The batch is as large as the target with the most free space can accept. Targets with
    /// less room receive only the leading part of the batch that fits in them and miss the
    /// rest. This maximizes throughput towards fast consumers at the cost of slow ones.
    ///
    /// Returns the number of items in the batch, which is the number of items removed from
    /// this buffer. This is not the number of items each target received: a target with less
    /// free space than the batch got fewer, and the difference is lost to it. Compare its
    /// [`len()`][Self::len] before and after the call to see how many it received. With no
    /// targets, nothing happens and zero is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use circulate::CircularBuffer;
    ///
    /// let mut source = CircularBuffer::new(8);
    /// source.enqueue_many(&[1, 2, 3, 4]);
    ///
    /// let mut fast = CircularBuffer::new(8);
    /// let mut slow = CircularBuffer::new(2);
    ///
    /// assert_eq!(source.copy_max_to_others(&mut [&mut fast, &mut slow]), 4);
    /// assert_eq!(fast.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    /// assert_eq!(slow.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    /// assert!(source.is_empty());
    /// ```
    pub fn copy_max_to_others(&mut self, targets: &mut [&mut Self]) -> usize
    where
        T: Clone,
    {
        let Some(largest_room) = targets.iter().map(|target| target.available()).max() else {
            return 0;
        };

        let batch = largest_room.min(self.count);

        self.broadcast_front(batch, targets);
        batch
    }

    /// Gives every target the leading `batch` items of this buffer (or as many of them as fit
    /// in that target), then removes `batch` items from this buffer.
    ///
    /// The last target receives the items by move instead of by clone.
    fn broadcast_front(&mut self, batch: usize, targets: &mut [&mut Self])
    where
        T: Clone,
    {
        debug_assert!(batch <= self.count);

        let Some((last, rest)) = targets.split_last_mut() else {
            return;
        };

        for target in rest {
            let fits = batch.min(target.available());

            for value in self.iter().take(fits) {
                target.push_back(value.clone());
            }
        }

        let fits = batch.min(last.available());

        for _ in 0..fits {
            let value = self
                .pop_front()
                .expect("guarded by batch <= self.count");
            last.push_back(value);
        }

        self.discard_front(
            batch
                .checked_sub(fits)
                .expect("fits is capped at batch above"),
        );
    }
}
