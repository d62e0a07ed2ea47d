use std::sync::atomic::{AtomicBool, Ordering};

/// A write-once flag that asks pending timed channel operations to give up.
///
/// Pass a reference to the token to [`BoundedChannel::try_send()`][1] or
/// [`BoundedChannel::try_receive()`][2]. Once [`cancel()`][Self::cancel] has been called, those
/// operations fail with [`Error::Cancelled`][crate::Error::Cancelled] the next time they check
/// the token.
///
/// # Latency
///
/// Cancellation is cooperative. A waiting operation only looks at the token when it wakes up,
/// which happens when the channel state changes or when its timeout elapses. Calling `cancel()`
/// does not wake anybody. To react quickly to cancellation, use a short timeout and call the
/// timed operation in a loop.
///
/// Blocking [`send()`][3] and [`receive()`][4] without a timeout never observe a token.
///
/// # Lifetime
///
/// A token cannot be reset. Create a new token for every scope that needs to be cancelled
/// independently. Share it between threads by reference (e.g. with [`std::thread::scope`]) or
/// by wrapping it in an [`Arc`][std::sync::Arc].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use circulate::{BoundedChannel, CancellationToken, Error};
///
/// let channel = BoundedChannel::<u32>::new(4);
/// let token = CancellationToken::new();
///
/// token.cancel();
///
/// let result = channel.try_receive(Duration::from_secs(60), Some(&token));
/// assert_eq!(result, Err(Error::Cancelled));
/// ```
///
/// [1]: crate::BoundedChannel::try_send
/// [2]: crate::BoundedChannel::try_receive
/// [3]: crate::BoundedChannel::send
/// [4]: crate::BoundedChannel::receive
#[derive(Debug, Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token as cancelled. Calling this more than once has no further effect.
    pub fn cancel(&self) {
        // Release pairs with the Acquire in is_cancelled() so whatever the cancelling thread
        // did before cancelling is visible to whoever observes the cancellation.
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether [`cancel()`][Self::cancel] has been called on this token.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
