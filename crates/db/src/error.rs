use eduportal_core::error::CoreError;

/// Error returned by repository operations that validate input against rows
/// read inside the same transaction (e.g. reorder permutations).
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}
