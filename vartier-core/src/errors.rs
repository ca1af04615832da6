use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("variant observation yields no usable identity: {0}")]
    Malformed(String),
}

/// Failures surfaced by the injected store implementations.
///
/// `Conflict` is the transient variant: stores that allocate report numbers
/// optimistically (compare-and-swap, uniqueness index) return it when a
/// concurrent writer won the race. Callers retry; every other variant is
/// terminal for the current operation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("concurrent update conflict")]
    Conflict,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("corrupt store state: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
