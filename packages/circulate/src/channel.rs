use std::any::type_name;
use std::fmt;
use std::mem;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::trace;

use crate::{CancellationToken, CircularBuffer, Error, Rejected};

/// A bounded multi-producer multi-consumer FIFO channel with blocking and timed operations.
///
/// Values are stored in a [`CircularBuffer`] guarded by a mutex. Senders wait while the buffer
/// is full (backpressure) and receivers wait while it is empty. A channel with capacity 1 is a
/// rendezvous channel, created via [`rendezvous()`][Self::rendezvous], where every value is
/// handed over before the next one can be sent.
///
/// The channel is shared between threads by reference (e.g. [`std::thread::scope`] or an
/// [`Arc`][std::sync::Arc]); there are no separate sender and receiver handles.
///
/// # Ordering
///
/// Values are received in the order they were sent. There is no fairness guarantee between
/// several threads blocked on the same side of the channel: which of them wakes first is up to
/// the operating system.
///
/// # Examples
///
/// ```
/// use std::thread;
///
/// use circulate::BoundedChannel;
///
/// let channel = BoundedChannel::new(2);
///
/// thread::scope(|s| {
///     s.spawn(|| {
///         for i in 0..10 {
///             channel.send(i);
///         }
///     });
///
///     let received: Vec<_> = (0..10).map(|_| channel.receive()).collect();
///     assert_eq!(received, (0..10).collect::<Vec<_>>());
/// });
/// ```
pub struct BoundedChannel<T> {
    buffer: Mutex<CircularBuffer<T>>,

    /// Signaled when a slot has been freed up.
    has_room: Condvar,

    /// Signaled when a value has been added.
    has_data: Condvar,
}

impl<T> BoundedChannel<T> {
    /// Creates a channel that buffers up to `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(CircularBuffer::new(capacity)),
            has_room: Condvar::new(),
            has_data: Condvar::new(),
        }
    }

    /// Creates a channel with capacity 1, in which every value must be received before the
    /// next one can be sent.
    #[must_use]
    pub fn rendezvous() -> Self {
        Self::new(1)
    }

    /// Sends a value, blocking for as long as it takes until there is room in the channel.
    ///
    /// There is no way to abandon this wait. Use [`try_send()`][Self::try_send] when the
    /// wait needs to be bounded or cancellable.
    pub fn send(&self, value: T) {
        let mut buffer = self.buffer.lock();

        while buffer.is_full() {
            self.has_room.wait(&mut buffer);
        }

        buffer.push_back(value);
        drop(buffer);

        self.has_data.notify_one();
    }

    /// Receives the oldest value, blocking for as long as it takes until there is one.
    ///
    /// There is no way to abandon this wait. Use [`try_receive()`][Self::try_receive] when the
    /// wait needs to be bounded or cancellable.
    #[must_use]
    pub fn receive(&self) -> T {
        let mut buffer = self.buffer.lock();

        while buffer.is_empty() {
            self.has_data.wait(&mut buffer);
        }

        let value = buffer
            .pop_front()
            .expect("guarded by the emptiness check above");
        drop(buffer);

        self.has_room.notify_one();
        value
    }

    /// Sends a value, waiting at most `timeout` for room in the channel.
    ///
    /// The deadline is fixed when the call starts. Each time the wait wakes up without room
    /// being available, the cancellation token (if any) is checked first and then the deadline.
    /// A zero timeout never blocks on a full channel.
    ///
    /// # Errors
    ///
    /// The value is handed back with [`Error::Cancelled`] if `token` was observed as cancelled,
    /// or with [`Error::Timeout`] if the deadline elapsed.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use circulate::{BoundedChannel, Error};
    ///
    /// let channel = BoundedChannel::rendezvous();
    /// channel.send("first");
    ///
    /// let rejected = channel.try_send("second", Duration::ZERO, None).unwrap_err();
    /// assert_eq!(rejected.error(), Error::Timeout);
    /// assert_eq!(rejected.into_inner(), "second");
    /// ```
    pub fn try_send(
        &self,
        value: T,
        timeout: Duration,
        token: Option<&CancellationToken>,
    ) -> Result<(), Rejected<T>> {
        let deadline = Instant::now().checked_add(timeout);

        let mut buffer = self.buffer.lock();

        if let Err(error) = wait_while(
            &self.has_room,
            &mut buffer,
            deadline,
            token,
            CircularBuffer::is_full,
        ) {
            drop(buffer);
            trace!(?error, ?timeout, item_type = type_name::<T>(), "try_send gave up");
            return Err(Rejected::new(error, value));
        }

        buffer.push_back(value);
        drop(buffer);

        self.has_data.notify_one();
        Ok(())
    }

    /// Receives the oldest value, waiting at most `timeout` for one to arrive.
    ///
    /// The deadline is fixed when the call starts. Each time the wait wakes up without a value
    /// being available, the cancellation token (if any) is checked first and then the deadline.
    /// A zero timeout never blocks on an empty channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `token` was observed as cancelled, or
    /// [`Error::Timeout`] if the deadline elapsed.
    pub fn try_receive(
        &self,
        timeout: Duration,
        token: Option<&CancellationToken>,
    ) -> crate::Result<T> {
        let deadline = Instant::now().checked_add(timeout);

        let mut buffer = self.buffer.lock();

        if let Err(error) = wait_while(
            &self.has_data,
            &mut buffer,
            deadline,
            token,
            CircularBuffer::is_empty,
        ) {
            drop(buffer);
            trace!(?error, ?timeout, item_type = type_name::<T>(), "try_receive gave up");
            return Err(error);
        }

        let value = buffer
            .pop_front()
            .expect("guarded by the emptiness check in wait_while()");
        drop(buffer);

        self.has_room.notify_one();
        Ok(value)
    }

    /// Drops every value currently buffered in the channel.
    ///
    /// This is a hard reset intended for tests and benchmarks. Receivers that were expecting
    /// those values are not told about it; they simply keep waiting for new ones. Senders
    /// blocked on a full channel are woken up since there is room now.
    pub fn reset(&self) {
        // The capacity never changes, so the replacement is allocated before taking the lock.
        let empty = CircularBuffer::new(self.capacity());

        let mut buffer = self.buffer.lock();
        let discarded = mem::replace(&mut *buffer, empty);
        drop(buffer);

        self.has_room.notify_all();

        // Value destructors run outside the lock and may use the channel themselves.
        drop(discarded);
    }

    /// The number of values currently buffered. This is a snapshot that may be outdated by
    /// the time it is returned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Whether no values are currently buffered. This is a snapshot that may be outdated by
    /// the time it is returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    /// Whether the channel is currently full. This is a snapshot that may be outdated by the
    /// time it is returned.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.buffer.lock().is_full()
    }

    /// The maximum number of values the channel buffers.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.lock().capacity()
    }
}

/// Waits on `condvar` for as long as `is_blocked` holds, giving up when the token is cancelled
/// or the deadline passes. The predicate is checked before either, so a waiter that was woken
/// up with its condition satisfied always proceeds. A `None` deadline waits indefinitely.
fn wait_while<T>(
    condvar: &Condvar,
    buffer: &mut MutexGuard<'_, CircularBuffer<T>>,
    deadline: Option<Instant>,
    token: Option<&CancellationToken>,
    is_blocked: impl Fn(&CircularBuffer<T>) -> bool,
) -> crate::Result<()> {
    while is_blocked(&**buffer) {
        if token.is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Cancelled);
        }

        match deadline {
            Some(deadline) => {
                if Instant::now() >= deadline {
                    return Err(Error::Timeout);
                }

                // Timing out is not decided here; the next loop iteration re-checks
                // everything in the documented order.
                _ = condvar.wait_until(buffer, deadline);
            }
            None => condvar.wait(buffer),
        }
    }

    Ok(())
}

impl<T> fmt::Debug for BoundedChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buffer = self.buffer.lock();

        f.debug_struct(type_name::<Self>())
            .field("capacity", &buffer.capacity())
            .field("len", &buffer.len())
            .finish_non_exhaustive()
    }
}
