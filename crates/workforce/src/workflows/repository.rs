/// Error enumeration for store failures shared by every collection.
///
/// Stores that support conditional writes report a stale `revision` as
/// [`RepositoryError::Conflict`]. Stores without that support fall back to
/// last-write-wins, so two approvers acting on the same request at once may
/// overwrite each other.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record conflicts with stored state")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
