use thiserror::Error;

/// Errors surfaced to callers.
///
/// Slice-shaped operations clamp their bounds and never fail; only
/// single-element access and the explicit search ([`index`]) report errors.
/// Anything else going wrong inside the crate is a bug and panics via an
/// assertion.
///
/// [`index`]: crate::GapBuffer::index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// An element index outside `[-len, len)`.
    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: isize, len: usize },

    /// The searched-for subsequence does not occur in the buffer.
    #[error("subsequence not found")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, Error>;
