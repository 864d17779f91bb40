pub mod booking;
pub mod identity;
pub mod inquiry;
pub mod payment;
pub mod quote;
pub mod repository;

/// Error taxonomy shared by every lifecycle operation.
///
/// Validation failures carry every violated rule, not just the first, so a
/// caller can present all problems at once. Authorization and NotFound are
/// deliberately message-free: the API surface renders them as generic
/// denials without revealing whether the entity exists for another owner.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("authentication required")]
    Authentication,
    #[error("not permitted")]
    Authorization,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    InvalidState(String),
    #[error("settled amount {received} does not match booking total {expected}")]
    AmountMismatch { expected: i64, received: i64 },
    #[error("payment gateway failure: {0}")]
    PaymentGateway(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Persistence Gateway failures. `Conflict` signals a compare-and-swap
/// precondition that no longer held inside an atomic write group;
/// `Unavailable` wraps transient I/O failures and is safe to retry for
/// reads and for the idempotent acceptance group.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("persistence unavailable: {0}")]
    Unavailable(String),
    #[error("write conflict: {0}")]
    Conflict(String),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
