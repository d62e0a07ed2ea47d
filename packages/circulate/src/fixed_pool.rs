use std::any::type_name;
use std::fmt;
use std::iter;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::{CircularBuffer, Error};

/// Source of unique pool identities, used to recognize keys that belong to a different pool.
static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(0);

/// A fixed-capacity pool of slots that are handed out and taken back without allocating.
///
/// All slots are allocated and initialized when the pool is created and are never moved or
/// reallocated afterwards, so a slot keeps its memory address for the entire life of the pool.
/// [`create()`][Self::create] takes a free slot and returns a [`SlotKey`] for it;
/// [`destroy()`][Self::destroy] returns the slot to the pool. Free slots are kept in a
/// [`CircularBuffer`] and reused in the order they were returned.
///
/// # Slot values
///
/// A slot holds a `T` at all times. Destroying a slot does not reset its value: whoever creates
/// it next sees what the previous occupant left behind and is expected to overwrite it.
///
/// # Synchronization
///
/// The pool bookkeeping (free list, assignment flags, generations) sits behind one mutex that
/// is only held for the duration of a call. Each slot value has its own mutex, so a guard
/// returned by [`get()`][Self::get] blocks nobody except other accessors of the same slot.
/// Several guards for different slots may be held at once, and creating or destroying other
/// slots proceeds while they are alive.
///
/// The `_unlocked` variants and [`get_mut()`][Self::get_mut] take `&mut self` instead, which
/// already proves that nobody else can touch the pool, so they skip the locks. Both sets of
/// methods share the same logic.
///
/// # Misuse
///
/// Destroying a slot that is not currently assigned (destroying twice, using a key from before
/// the slot was recycled, or using a key from another pool) is a programming error and panics.
///
/// # Examples
///
/// ```
/// use circulate::{Error, FixedPool};
///
/// let pool = FixedPool::<u64>::new(2);
///
/// let first = pool.create().unwrap();
/// let second = pool.create().unwrap();
/// assert_eq!(pool.create(), Err(Error::OutOfMemory));
///
/// *pool.get(first) = 42;
///
/// pool.destroy(first);
/// let third = pool.create().unwrap();
///
/// // The freed slot was reused, including the value left in it.
/// assert_eq!(third.index(), first.index());
/// assert_eq!(*pool.get(third), 42);
/// # pool.destroy(second);
/// # pool.destroy(third);
/// ```
pub struct FixedPool<T> {
    state: Mutex<PoolState>,

    /// Never resized after creation. Indexed by `SlotKey::index`.
    values: Box<[Mutex<T>]>,
}

/// Identifies a slot assigned by a [`FixedPool`].
///
/// Keys are only valid until the slot is destroyed. A key that outlives its slot is recognized
/// as stale, even if the same slot has been assigned again in the meantime.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SlotKey {
    pool_id: u64,
    index: usize,
    generation: u64,
}

impl SlotKey {
    /// The position of the slot within the pool, in `0..capacity`.
    ///
    /// Two keys with the same index refer to the same memory, though possibly at different
    /// times (different occupants).
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

struct PoolState {
    pool_id: u64,

    /// For log and panic messages.
    item_type: &'static str,

    /// Same length as `FixedPool::values`, never resized.
    slots: Box<[SlotState]>,

    /// Indexes of every slot that is not assigned. Its capacity equals the slot count, so
    /// returning a slot can never fail for lack of room.
    free_list: CircularBuffer<usize>,

    /// Number of assigned slots. Always `slots.len() - free_list.len()`.
    assigned: usize,
}

struct SlotState {
    /// Incremented every time the slot is destroyed, invalidating keys handed out before.
    generation: u64,

    is_assigned: bool,
}

impl<T> FixedPool<T> {
    /// Creates a pool of `capacity` slots, each initialized with `T::default()`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self
    where
        T: Default,
    {
        Self::with_initializer(capacity, T::default)
    }

    /// Creates a pool of `capacity` slots, each initialized with a value produced by
    /// `initializer`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use circulate::FixedPool;
    ///
    /// let pool = FixedPool::with_initializer(4, || Vec::<u8>::with_capacity(1024));
    ///
    /// let key = pool.create().unwrap();
    /// assert!(pool.get(key).capacity() >= 1024);
    /// # pool.destroy(key);
    /// ```
    #[must_use]
    pub fn with_initializer(capacity: usize, mut initializer: impl FnMut() -> T) -> Self {
        assert!(
            capacity > 0,
            "FixedPool of {} must have non-zero capacity",
            type_name::<T>()
        );

        let values = iter::repeat_with(|| Mutex::new(initializer()))
            .take(capacity)
            .collect::<Box<[_]>>();

        let slots = iter::repeat_with(|| SlotState {
            generation: 0,
            is_assigned: false,
        })
        .take(capacity)
        .collect::<Box<[_]>>();

        let mut free_list = CircularBuffer::new(capacity);
        for index in 0..capacity {
            free_list.push_back(index);
        }

        let pool_id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);

        debug!(
            pool_id,
            capacity,
            item_type = type_name::<T>(),
            "created fixed pool"
        );

        Self {
            state: Mutex::new(PoolState {
                pool_id,
                item_type: type_name::<T>(),
                slots,
                free_list,
                assigned: 0,
            }),
            values,
        }
    }

    /// Assigns a free slot and returns its key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if every slot is already assigned.
    pub fn create(&self) -> crate::Result<SlotKey> {
        self.state.lock().create()
    }

    /// Assigns a free slot and returns its key, without taking the pool lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if every slot is already assigned.
    pub fn create_unlocked(&mut self) -> crate::Result<SlotKey> {
        self.state.get_mut().create()
    }

    /// Assigns `n` free slots at once and returns their keys.
    ///
    /// This is all-or-nothing: if fewer than `n` slots are free, no slot is assigned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if fewer than `n` slots are free.
    pub fn create_many(&self, n: usize) -> crate::Result<Vec<SlotKey>> {
        self.state.lock().create_many(n)
    }

    /// Returns a slot to the pool.
    ///
    /// # Panics
    ///
    /// Panics if the key does not refer to a slot that is currently assigned by this pool.
    pub fn destroy(&self, key: SlotKey) {
        self.state.lock().destroy(key);
    }

    /// Returns a slot to the pool, without taking the pool lock.
    ///
    /// # Panics
    ///
    /// Panics if the key does not refer to a slot that is currently assigned by this pool.
    pub fn destroy_unlocked(&mut self, key: SlotKey) {
        self.state.get_mut().destroy(key);
    }

    /// Returns several slots to the pool.
    ///
    /// # Panics
    ///
    /// Panics if any key does not refer to a slot that is currently assigned by this pool. The
    /// keys before it have been returned to the pool by then.
    pub fn destroy_many(&self, keys: impl IntoIterator<Item = SlotKey>) {
        let mut state = self.state.lock();

        for key in keys {
            state.destroy(key);
        }
    }

    /// Whether `key` refers to a slot that is currently assigned by this pool.
    #[must_use]
    pub fn contains(&self, key: SlotKey) -> bool {
        self.state.lock().is_current(key)
    }

    /// Accesses the value of an assigned slot.
    ///
    /// The key is validated under the pool lock, which is released again before the slot is
    /// locked. The returned guard only holds the lock of this one slot: other slots stay
    /// accessible and the pool can keep creating and destroying slots meanwhile. Calling this
    /// again for the same slot while the guard is alive blocks until the guard is dropped.
    ///
    /// # Panics
    ///
    /// Panics if the key does not refer to a slot that is currently assigned by this pool.
    #[must_use]
    pub fn get(&self, key: SlotKey) -> MutexGuard<'_, T> {
        self.state.lock().assert_current(key, "get");

        self.value(key.index).lock()
    }

    /// Accesses the value of an assigned slot, without taking any lock.
    ///
    /// # Panics
    ///
    /// Panics if the key does not refer to a slot that is currently assigned by this pool.
    #[must_use]
    pub fn get_mut(&mut self, key: SlotKey) -> &mut T {
        self.state.get_mut().assert_current(key, "get_mut");

        self.values
            .get_mut(key.index)
            .expect("a validated key indexes an existing slot")
            .get_mut()
    }

    /// The number of slots currently assigned.
    #[must_use]
    pub fn count(&self) -> usize {
        self.state.lock().assigned
    }

    /// The number of slots currently free.
    ///
    /// `count() + available() == capacity()` holds at all times.
    #[must_use]
    pub fn available(&self) -> usize {
        self.state.lock().free_list.len()
    }

    /// The total number of slots in the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    fn value(&self, index: usize) -> &Mutex<T> {
        self.values
            .get(index)
            .expect("a validated key indexes an existing slot")
    }

    #[cfg(test)]
    fn integrity_check(&self) {
        let state = self.state.lock();
        assert_eq!(state.slots.len(), self.values.len());
        state.integrity_check();
    }
}

impl PoolState {
    fn create(&mut self) -> crate::Result<SlotKey> {
        let Some(index) = self.free_list.pop_front() else {
            trace!(
                pool_id = self.pool_id,
                capacity = self.slots.len(),
                item_type = self.item_type,
                "fixed pool exhausted"
            );
            return Err(Error::OutOfMemory);
        };

        let pool_id = self.pool_id;
        let item_type = self.item_type;
        let slot = self.slot_mut(index);

        assert!(
            !slot.is_assigned,
            "slot {index} was in the free list while assigned in FixedPool of {item_type}"
        );
        slot.is_assigned = true;

        let key = SlotKey {
            pool_id,
            index,
            generation: slot.generation,
        };

        self.assigned = self
            .assigned
            .checked_add(1)
            .expect("a slot was free, so the assigned count is below capacity");

        Ok(key)
    }

    fn create_many(&mut self, n: usize) -> crate::Result<Vec<SlotKey>> {
        if self.free_list.len() < n {
            trace!(
                pool_id = self.pool_id,
                requested = n,
                available = self.free_list.len(),
                item_type = self.item_type,
                "fixed pool cannot satisfy batch"
            );
            return Err(Error::OutOfMemory);
        }

        (0..n).map(|_| self.create()).collect()
    }

    fn destroy(&mut self, key: SlotKey) {
        self.assert_current(key, "destroy");

        let slot = self.slot_mut(key.index);
        slot.is_assigned = false;
        slot.generation = slot.generation.wrapping_add(1);

        // The free list has room for every slot, and this one was not in it.
        self.free_list.push_back(key.index);

        self.assigned = self
            .assigned
            .checked_sub(1)
            .expect("the slot was assigned, so the assigned count is non-zero");
    }

    fn is_current(&self, key: SlotKey) -> bool {
        key.pool_id == self.pool_id
            && self
                .slots
                .get(key.index)
                .is_some_and(|slot| slot.is_assigned && slot.generation == key.generation)
    }

    /// # Panics
    ///
    /// Panics if the key is not current. This is the fatal path for double frees and
    /// foreign keys.
    fn assert_current(&self, key: SlotKey, operation: &str) {
        assert!(
            self.is_current(key),
            "{operation}() with key {key:?} that is not assigned in FixedPool {} of {}",
            self.pool_id,
            self.item_type
        );
    }

    fn slot_mut(&mut self, index: usize) -> &mut SlotState {
        self.slots
            .get_mut(index)
            .expect("slot indexes come from the free list or a validated key")
    }

    /// Walks every slot and the whole free list, so only tests call this.
    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(test)]
    fn integrity_check(&self) {
        let capacity = self.slots.len();

        assert!(
            self.assigned
                .checked_add(self.free_list.len())
                .is_some_and(|total| total == capacity),
            "assigned {} + free {} does not add up to capacity {capacity} in FixedPool of {}",
            self.assigned,
            self.free_list.len(),
            self.item_type
        );

        let mut seen_free = vec![false; capacity];

        for &index in &self.free_list {
            let seen = seen_free
                .get_mut(index)
                .expect("free list entry out of bounds");
            assert!(
                !*seen,
                "slot {index} is in the free list twice in FixedPool of {}",
                self.item_type
            );
            *seen = true;
        }

        for (index, (slot, is_free)) in self.slots.iter().zip(&seen_free).enumerate() {
            assert!(
                slot.is_assigned != *is_free,
                "slot {index} is assigned={} but free={is_free} in FixedPool of {}",
                slot.is_assigned,
                self.item_type
            );
        }
    }
}

impl<T> fmt::Debug for FixedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();

        f.debug_struct(type_name::<Self>())
            .field("pool_id", &state.pool_id)
            .field("capacity", &state.slots.len())
            .field("assigned", &state.assigned)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::rc::Rc;
    use std::sync::Arc;
    use std::thread;

    use static_assertions::{assert_impl_all, assert_not_impl_any};
    use testing::with_watchdog;

    use super::*;

    assert_impl_all!(FixedPool<u32>: Send, Sync, fmt::Debug);
    assert_impl_all!(SlotKey: Send, Sync, Copy);
    assert_not_impl_any!(FixedPool<Rc<u32>>: Send, Sync);

    #[test]
    fn smoke_test() {
        let pool = FixedPool::<u32>::new(3);

        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.count(), 0);
        assert_eq!(pool.available(), 3);

        let a = pool.create().unwrap();
        let b = pool.create().unwrap();

        *pool.get(a) = 1;
        *pool.get(b) = 2;

        assert_eq!(*pool.get(a), 1);
        assert_eq!(*pool.get(b), 2);
        assert_eq!(pool.count(), 2);
        assert_eq!(pool.available(), 1);

        pool.destroy(a);
        pool.destroy(b);
        assert_eq!(pool.count(), 0);
        pool.integrity_check();
    }

    #[test]
    fn exhausted_pool_reuses_destroyed_slot() {
        let pool = FixedPool::<u32>::new(2);

        let p1 = pool.create().unwrap();
        let p2 = pool.create().unwrap();
        assert_eq!(pool.create(), Err(Error::OutOfMemory));

        pool.destroy(p1);
        let p3 = pool.create().unwrap();

        assert_eq!(p3.index(), p1.index());
        assert_ne!(p3, p1);
        assert_ne!(p3.index(), p2.index());
    }

    #[test]
    fn slot_address_is_stable_across_reuse() {
        let pool = FixedPool::<u64>::new(2);

        let first = pool.create().unwrap();
        let address_before = ptr_of(&pool, first);

        pool.destroy(first);
        let second = pool.create().unwrap();

        // The first slot went to the back of the free list, so the other one comes out first.
        assert_ne!(second.index(), first.index());
        let third = pool.create().unwrap();

        assert_eq!(third.index(), first.index());
        assert_eq!(ptr_of(&pool, third), address_before);
    }

    fn ptr_of(pool: &FixedPool<u64>, key: SlotKey) -> *const u64 {
        let guard = pool.get(key);
        &raw const *guard
    }

    #[test]
    fn accounting_holds_for_interleaved_calls() {
        let pool = FixedPool::<u8>::new(5);
        let mut live = Vec::new();

        let mut state: u32 = 7;
        for _ in 0..300 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);

            if state % 2 == 0 && !live.is_empty() {
                let victim = (state as usize / 2) % live.len();
                pool.destroy(live.swap_remove(victim));
            } else if let Ok(key) = pool.create() {
                live.push(key);
            }

            assert_eq!(pool.count(), live.len());
            assert_eq!(pool.count(), pool.capacity() - pool.available());
        }

        pool.integrity_check();
    }

    #[test]
    fn values_persist_until_overwritten() {
        let pool = FixedPool::with_initializer(1, || String::from("initial"));

        let key = pool.create().unwrap();
        assert_eq!(*pool.get(key), "initial");
        pool.get(key).push_str(" changed");
        pool.destroy(key);

        let key = pool.create().unwrap();
        assert_eq!(*pool.get(key), "initial changed");
    }

    #[test]
    fn create_many_is_all_or_nothing() {
        let pool = FixedPool::<u32>::new(4);
        let held = pool.create().unwrap();

        assert_eq!(pool.create_many(4), Err(Error::OutOfMemory));
        assert_eq!(pool.count(), 1);
        assert_eq!(pool.available(), 3);

        let keys = pool.create_many(3).unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(pool.available(), 0);

        pool.destroy_many(keys);
        pool.destroy(held);
        assert_eq!(pool.available(), 4);
        pool.integrity_check();
    }

    #[test]
    fn create_many_zero_is_empty() {
        let pool = FixedPool::<u32>::new(1);

        assert_eq!(pool.create_many(0), Ok(Vec::new()));
        assert_eq!(pool.count(), 0);
    }

    #[test]
    fn unlocked_variants_share_state() {
        let mut pool = FixedPool::<u32>::new(2);

        let a = pool.create_unlocked().unwrap();
        *pool.get_mut(a) = 10;

        let b = pool.create().unwrap();
        assert_eq!(pool.create_unlocked(), Err(Error::OutOfMemory));

        assert_eq!(*pool.get(a), 10);

        pool.destroy_unlocked(a);
        pool.destroy(b);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn contains_tracks_assignment() {
        let pool = FixedPool::<u32>::new(1);

        let key = pool.create().unwrap();
        assert!(pool.contains(key));

        pool.destroy(key);
        assert!(!pool.contains(key));

        let reused = pool.create().unwrap();
        assert!(pool.contains(reused));
        assert!(!pool.contains(key));
    }

    #[test]
    #[should_panic]
    fn double_destroy_panics() {
        let pool = FixedPool::<u32>::new(2);
        let key = pool.create().unwrap();

        pool.destroy(key);
        pool.destroy(key);
    }

    #[test]
    #[should_panic]
    fn destroy_stale_key_panics() {
        let pool = FixedPool::<u32>::new(1);
        let stale = pool.create().unwrap();
        pool.destroy(stale);

        // Same slot, new occupant. The old key must not free it.
        let _current = pool.create().unwrap();
        pool.destroy(stale);
    }

    #[test]
    #[should_panic]
    fn destroy_foreign_key_panics() {
        let pool_a = FixedPool::<u32>::new(1);
        let pool_b = FixedPool::<u32>::new(1);

        let _in_a = pool_a.create().unwrap();
        let in_b = pool_b.create().unwrap();

        pool_a.destroy(in_b);
    }

    #[test]
    #[should_panic]
    fn get_destroyed_panics() {
        let pool = FixedPool::<u32>::new(1);
        let key = pool.create().unwrap();
        pool.destroy(key);

        _ = pool.get(key);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        _ = FixedPool::<u32>::new(0);
    }

    #[cfg_attr(miri, ignore)] // Slow under Miri and adds no memory-model coverage.
    #[test]
    fn concurrent_create_destroy_keeps_accounting() {
        with_watchdog(|| {
            const THREADS: usize = 4;
            const ROUNDS: usize = 1_000;

            let pool = Arc::new(FixedPool::<usize>::new(THREADS));

            let workers = (0..THREADS)
                .map(|worker| {
                    let pool = Arc::clone(&pool);
                    thread::spawn(move || {
                        for round in 0..ROUNDS {
                            // There is one slot per thread, so this can only fail if slots leak.
                            let key = pool.create().expect("pool has a slot for every thread");
                            *pool.get(key) = worker * ROUNDS + round;
                            assert_eq!(*pool.get(key), worker * ROUNDS + round);
                            pool.destroy(key);
                        }
                    })
                })
                .collect::<Vec<_>>();

            for worker in workers {
                worker.join().unwrap();
            }

            assert_eq!(pool.count(), 0);
            assert_eq!(pool.available(), THREADS);
            pool.integrity_check();
        });
    }

    #[test]
    fn guards_for_different_slots_coexist() {
        with_watchdog(|| {
            let pool = FixedPool::<u32>::new(2);
            let a = pool.create().unwrap();
            let b = pool.create().unwrap();

            let mut guard_a = pool.get(a);
            let mut guard_b = pool.get(b);
            *guard_a = 1;
            *guard_b = 2;

            // Bookkeeping queries do not wait for the value guards either.
            assert_eq!(pool.count(), 2);
            assert!(pool.contains(a));

            drop(guard_a);
            drop(guard_b);

            assert_eq!(*pool.get(a), 1);
            assert_eq!(*pool.get(b), 2);
        });
    }

    #[cfg_attr(miri, ignore)] // Spawns threads, adds no memory-model coverage.
    #[test]
    fn create_and_destroy_proceed_while_guard_is_held() {
        with_watchdog(|| {
            let pool = FixedPool::<u32>::new(3);
            let held = pool.create().unwrap();

            let mut guard = pool.get(held);
            *guard = 7;

            thread::scope(|s| {
                s.spawn(|| {
                    let other = pool.create().unwrap();
                    *pool.get(other) = 8;
                    assert_eq!(pool.count(), 2);
                    pool.destroy(other);
                })
                .join()
                .unwrap();
            });

            assert_eq!(*guard, 7);
            assert_eq!(pool.count(), 1);
            drop(guard);

            pool.destroy(held);
            pool.integrity_check();
        });
    }

    #[cfg_attr(miri, ignore)] // Too many iterations for Miri.
    #[test]
    fn large_pool_churn_only_touches_one_slot_per_call() {
        with_watchdog(|| {
            const CAPACITY: usize = 100_000;

            let pool = FixedPool::<u8>::new(CAPACITY);

            // A full scan per call would make this quadratic in the capacity.
            let keys = pool.create_many(CAPACITY).unwrap();
            pool.destroy_many(keys);

            for _ in 0..CAPACITY {
                let key = pool.create().unwrap();
                pool.destroy(key);
            }

            assert_eq!(pool.available(), CAPACITY);
            pool.integrity_check();
        });
    }
}
