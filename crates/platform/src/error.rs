//! Status codes shared by the platform traits and the governor core.

use thiserror_no_std::Error;

/// Error variants surfaced by the power-management stack.
///
/// Hardware implementations map their driver error codes onto these; the
/// governor core returns them unchanged so callers see one vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Operation called before `init`.
    #[error("power manager is not initialized")]
    NotInitialized,
    /// `init` called twice without an intervening `deinit`.
    #[error("power manager is already initialized")]
    AlreadyInitialized,
    /// Out-of-range argument, unknown bit, or a requirement counter that
    /// would underflow/overflow.
    #[error("invalid parameter")]
    InvalidParameter,
    /// The requested power-state transition is not a legal edge.
    #[error("invalid state transition")]
    InvalidState,
    /// A required callback slot is empty.
    #[error("no callback registered")]
    NullCallback,
    /// The resource is occupied (callback slot taken, subscriber table full,
    /// or the ok-to-sleep hook vetoed the sleep).
    #[error("resource busy")]
    Busy,
    /// Unspecified hardware failure reported by a collaborator.
    #[error("operation failed")]
    Fail,
}
