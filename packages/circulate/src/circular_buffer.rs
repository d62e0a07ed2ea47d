use std::any::type_name;
use std::fmt;
use std::iter::{self, FusedIterator};

use crate::{CircularBufferBuilder, Error, GrowthPolicy, Rejected};

mod bulk;
mod layout;

/// A capacity-bounded FIFO queue over contiguous storage with wrap-around indexes.
///
/// Items are appended at the tail and removed from the head in O(1). On top of the basic queue
/// operations, the buffer offers:
///
/// * bulk moves that transfer as many items as fit ([`enqueue_many()`][1],
///   [`dequeue_many()`][2], [`concatenate_available()`][3]);
/// * all-or-nothing transfers that either move everything or touch nothing
///   ([`concatenate()`][4], [`copy_from()`][5]);
/// * fan-out copies that broadcast one batch to several other buffers
///   ([`copy_min_to_others()`][6], [`copy_max_to_others()`][7]);
/// * storage maintenance ([`linearize()`][8], [`sort_by()`][9], [`resize()`][10]).
///
/// # Thread safety
///
/// The buffer has no internal synchronization. Every mutation takes `&mut self`, so sharing it
/// between threads requires an outer lock. [`BoundedChannel`][crate::BoundedChannel] and
/// [`FixedPool`][crate::FixedPool] are such wrappers.
///
/// # Capacity
///
/// The capacity is fixed unless the buffer was built with [`GrowthPolicy::Double`], in which
/// case single-item inserts into a full buffer double the capacity first. The capacity may also
/// be changed explicitly via [`resize()`][10]. A capacity of zero is never valid.
///
/// # Examples
///
/// ```
/// use circulate::CircularBuffer;
///
/// let mut buffer = CircularBuffer::new(3);
///
/// buffer.enqueue(1).unwrap();
/// buffer.enqueue(2).unwrap();
/// buffer.enqueue(3).unwrap();
/// assert!(buffer.is_full());
///
/// assert_eq!(buffer.dequeue(), Some(1));
/// buffer.enqueue(4).unwrap();
///
/// let drained: Vec<_> = std::iter::from_fn(|| buffer.dequeue()).collect();
/// assert_eq!(drained, vec![2, 3, 4]);
/// ```
///
/// [1]: Self::enqueue_many
/// [2]: Self::dequeue_many
/// [3]: Self::concatenate_available
/// [4]: Self::concatenate
/// [5]: Self::copy_from
/// [6]: Self::copy_min_to_others
/// [7]: Self::copy_max_to_others
/// [8]: Self::linearize
/// [9]: Self::sort_by
/// [10]: Self::resize
#[derive(Clone)]
pub struct CircularBuffer<T> {
    /// Every slot in the logical range `[head, head + count)` (modulo capacity) is `Some`,
    /// every other slot is `None`. The length of this slice is the capacity.
    storage: Box<[Option<T>]>,

    /// Physical index of the oldest item. Meaningless (but still in bounds) when empty.
    head: usize,

    /// Physical index the next enqueued item will be written to.
    tail: usize,

    /// Number of occupied slots. This is the only way to tell empty from full, as in both cases
    /// `head == tail`.
    count: usize,

    growth_policy: GrowthPolicy,
}

impl<T> CircularBuffer<T> {
    /// Creates a new buffer with room for `capacity` items and the default
    /// ([`GrowthPolicy::Fixed`]) growth policy.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::builder().capacity(capacity).build()
    }

    /// Starts building a new [`CircularBuffer`].
    ///
    /// Use this when you want to customize the buffer configuration beyond the defaults.
    #[must_use]
    pub fn builder() -> CircularBufferBuilder<T> {
        CircularBufferBuilder::new()
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub(crate) fn new_inner(capacity: usize, growth_policy: GrowthPolicy) -> Self {
        assert!(
            capacity > 0,
            "CircularBuffer of {} must have non-zero capacity",
            type_name::<T>()
        );

        Self {
            storage: vacant_storage(capacity),
            head: 0,
            tail: 0,
            count: 0,
            growth_policy,
        }
    }

    /// The number of items in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// The number of items the buffer can hold without growing.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// The number of items that can still be inserted before the buffer is full.
    ///
    /// `available() + len() == capacity()` holds at all times.
    #[must_use]
    pub fn available(&self) -> usize {
        self.capacity()
            .checked_sub(self.count)
            .expect("count never exceeds capacity")
    }

    /// Whether the buffer holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether the buffer has no free slots left.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// The [growth policy][GrowthPolicy] the buffer was built with.
    #[must_use]
    pub fn growth_policy(&self) -> GrowthPolicy {
        self.growth_policy
    }

    /// Appends an item at the tail of the buffer.
    ///
    /// # Errors
    ///
    /// If the buffer is full and uses [`GrowthPolicy::Fixed`], the item is handed back with
    /// [`Error::BufferFull`]. If the buffer uses [`GrowthPolicy::Double`] and the larger storage
    /// cannot be allocated, the item is handed back with [`Error::OutOfMemory`].
    pub fn enqueue(&mut self, value: T) -> Result<(), Rejected<T>> {
        if let Err(error) = self.make_room_for_one() {
            return Err(Rejected::new(error, value));
        }

        self.push_back(value);
        Ok(())
    }

    /// Inserts an item at the head of the buffer, so it becomes the next item to be dequeued.
    ///
    /// # Errors
    ///
    /// Same as [`enqueue()`][Self::enqueue].
    ///
    /// # Examples
    ///
    /// ```
    /// use circulate::CircularBuffer;
    ///
    /// let mut buffer = CircularBuffer::new(4);
    /// buffer.enqueue("second").unwrap();
    /// buffer.prepend("first").unwrap();
    ///
    /// assert_eq!(buffer.dequeue(), Some("first"));
    /// assert_eq!(buffer.dequeue(), Some("second"));
    /// ```
    pub fn prepend(&mut self, value: T) -> Result<(), Rejected<T>> {
        if let Err(error) = self.make_room_for_one() {
            return Err(Rejected::new(error, value));
        }

        self.push_front(value);
        Ok(())
    }

    /// Removes and returns the item at the head of the buffer, or `None` if it is empty.
    pub fn dequeue(&mut self) -> Option<T> {
        self.pop_front()
    }

    /// Returns a reference to the `index`-th item counted from the head (0 is the next item to
    /// be dequeued), or `None` if there is no such item.
    #[must_use]
    pub fn peek(&self, index: usize) -> Option<&T> {
        if index >= self.count {
            return None;
        }

        self.storage
            .get(self.offset_index(self.head, index))
            .and_then(Option::as_ref)
    }

    /// Returns an exclusive reference to the `index`-th item counted from the head, or `None`
    /// if there is no such item.
    #[must_use]
    pub fn peek_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.count {
            return None;
        }

        let physical = self.offset_index(self.head, index);

        self.storage.get_mut(physical).and_then(Option::as_mut)
    }

    /// The item that would be dequeued next.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.peek(0)
    }

    /// The most recently enqueued item.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.peek(self.count.checked_sub(1)?)
    }

    /// Iterates over the items from head to tail without removing them.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            buffer: self,
            position: 0,
        }
    }

    /// Drops all items in the buffer. The capacity is unchanged.
    pub fn clear(&mut self) {
        self.storage.fill_with(|| None);

        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// Ensures a single-item insert will succeed, growing the buffer if the policy allows it.
    fn make_room_for_one(&mut self) -> crate::Result<()> {
        if !self.is_full() {
            return Ok(());
        }

        match self.growth_policy {
            GrowthPolicy::Fixed => Err(Error::BufferFull),
            GrowthPolicy::Double => self.grow(),
        }
    }

    /// # Panics
    ///
    /// Panics if the buffer is full. Callers check for room first.
    pub(crate) fn push_back(&mut self, value: T) {
        assert!(
            !self.is_full(),
            "push_back() into a full CircularBuffer of {}",
            type_name::<T>()
        );

        let slot = self
            .storage
            .get_mut(self.tail)
            .expect("tail is always within storage bounds");

        debug_assert!(slot.is_none(), "tail slot of a non-full buffer must be vacant");
        *slot = Some(value);

        self.tail = self.offset_index(self.tail, 1);
        self.count = self
            .count
            .checked_add(1)
            .expect("guarded by the fullness check above");
    }

    /// # Panics
    ///
    /// Panics if the buffer is full. Callers check for room first.
    fn push_front(&mut self, value: T) {
        assert!(
            !self.is_full(),
            "push_front() into a full CircularBuffer of {}",
            type_name::<T>()
        );

        self.head = self.previous_index(self.head);

        let slot = self
            .storage
            .get_mut(self.head)
            .expect("head is always within storage bounds");

        debug_assert!(
            slot.is_none(),
            "slot before head of a non-full buffer must be vacant"
        );
        *slot = Some(value);

        self.count = self
            .count
            .checked_add(1)
            .expect("guarded by the fullness check above");
    }

    pub(crate) fn pop_front(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }

        let value = self
            .storage
            .get_mut(self.head)
            .and_then(Option::take)
            .expect("head slot of a non-empty buffer must be occupied");

        self.head = self.offset_index(self.head, 1);
        self.count = self
            .count
            .checked_sub(1)
            .expect("guarded by the emptiness check above");

        Some(value)
    }

    /// Drops up to `n` items from the head of the buffer.
    fn discard_front(&mut self, n: usize) {
        for _ in 0..n {
            if self.pop_front().is_none() {
                break;
            }
        }
    }

    /// The physical index `offset` slots after `index`, wrapping around the end of storage.
    ///
    /// Valid for any `index < capacity` and `offset <= capacity`.
    fn offset_index(&self, index: usize, offset: usize) -> usize {
        let capacity = self.capacity();

        debug_assert!(index < capacity);
        debug_assert!(offset <= capacity);

        // Storage is at most isize::MAX bytes long and every slot is at least one byte,
        // so the sum of two in-range values cannot overflow usize.
        let unwrapped = index
            .checked_add(offset)
            .expect("sum of two indexes within an allocation cannot overflow usize");

        if unwrapped >= capacity {
            unwrapped
                .checked_sub(capacity)
                .expect("guarded by the comparison above")
        } else {
            unwrapped
        }
    }

    /// The physical index one slot before `index`, wrapping around the start of storage.
    fn previous_index(&self, index: usize) -> usize {
        index
            .checked_sub(1)
            .unwrap_or_else(|| self.capacity().saturating_sub(1))
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(any(test, debug_assertions))]
    pub(crate) fn integrity_check(&self) {
        let capacity = self.capacity();

        assert!(
            self.count <= capacity,
            "count {} exceeds capacity {capacity} in CircularBuffer of {}",
            self.count,
            type_name::<T>()
        );
        assert!(
            self.head < capacity && self.tail < capacity,
            "head {} or tail {} out of bounds for capacity {capacity} in CircularBuffer of {}",
            self.head,
            self.tail,
            type_name::<T>()
        );
        assert!(
            self.tail == self.offset_index(self.head, self.count),
            "tail {} does not match head {} + count {} in CircularBuffer of {}",
            self.tail,
            self.head,
            self.count,
            type_name::<T>()
        );

        let occupied = self.storage.iter().filter(|slot| slot.is_some()).count();
        assert!(
            occupied == self.count,
            "count {} does not match the observed occupied count {occupied} in CircularBuffer of {}",
            self.count,
            type_name::<T>()
        );

        for logical in 0..self.count {
            assert!(
                self.peek(logical).is_some(),
                "logical slot {logical} is vacant in CircularBuffer of {}",
                type_name::<T>()
            );
        }
    }
}

fn vacant_storage<T>(capacity: usize) -> Box<[Option<T>]> {
    iter::repeat_with(|| None).take(capacity).collect()
}

impl<T> fmt::Debug for CircularBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircularBuffer")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("capacity", &self.capacity())
            .field("len", &self.count)
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("growth_policy", &self.growth_policy)
            .finish_non_exhaustive()
    }
}

impl<'a, T> IntoIterator for &'a CircularBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the items of a [`CircularBuffer`] in FIFO order, created by
/// [`CircularBuffer::iter()`].
#[derive(Debug)]
pub struct Iter<'a, T> {
    buffer: &'a CircularBuffer<T>,
    position: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.peek(self.position)?;

        self.position = self
            .position
            .checked_add(1)
            .expect("position never exceeds the buffer length");

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}
