use std::any::type_name;
use std::error::Error as StdError;
use std::fmt;
use std::result;

use thiserror::Error;

/// Recoverable failures reported by the buffer, channel and pool operations.
///
/// None of the operations in this crate retry on their own. Whether to back off, retry or give
/// up is always the caller's decision.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The operation needed more free slots than the buffer has.
    ///
    /// Returned by strict (fixed capacity) enqueue and prepend, by the all-or-nothing
    /// [`concatenate()`][1] and [`copy_from()`][2] and by a [`resize()`][3] that would
    /// not fit the current contents.
    ///
    /// [1]: crate::CircularBuffer::concatenate
    /// [2]: crate::CircularBuffer::copy_from
    /// [3]: crate::CircularBuffer::resize
    #[error("not enough free slots in the buffer")]
    BufferFull,

    /// Storage could not be obtained: either a reallocation failed or a
    /// [`FixedPool`][crate::FixedPool] has no free slots left.
    #[error("out of memory")]
    OutOfMemory,

    /// The deadline of a timed channel operation elapsed before it could complete.
    #[error("deadline elapsed before the operation could complete")]
    Timeout,

    /// The cancellation token passed to a timed channel operation was observed as cancelled.
    #[error("operation was cancelled")]
    Cancelled,
}

/// A value that an operation could not accept, handed back together with the reason.
///
/// Returned by operations that take ownership of a value, so that the caller can retry
/// with the same value without having to clone it up front.
///
/// # Examples
///
/// ```
/// use circulate::{CircularBuffer, Error};
///
/// let mut buffer = CircularBuffer::new(1);
/// buffer.enqueue("first").unwrap();
///
/// let rejected = buffer.enqueue("second").unwrap_err();
/// assert_eq!(rejected.error(), Error::BufferFull);
/// assert_eq!(rejected.into_inner(), "second");
/// ```
#[derive(Clone, Eq, PartialEq)]
pub struct Rejected<T> {
    error: Error,
    value: T,
}

impl<T> Rejected<T> {
    pub(crate) fn new(error: Error, value: T) -> Self {
        Self { error, value }
    }

    /// Why the value was rejected.
    #[must_use]
    pub fn error(&self) -> Error {
        self.error
    }

    /// Takes back the value that was not accepted.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }
}

// Hand-written so that `T` does not need to be `Debug` for the error to be printable.
impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .field("value_type", &type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value rejected: {}", self.error)
    }
}

impl<T> StdError for Rejected<T> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<Rejected<T>> for Error {
    fn from(rejected: Rejected<T>) -> Self {
        rejected.error
    }
}

/// A specialized `Result` type for this crate, returning the crate's [`Error`] type as the
/// error value.
pub(crate) type Result<T> = result::Result<T, Error>;
