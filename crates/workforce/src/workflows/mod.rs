pub mod attendance;
pub mod directory;
pub mod leave;
pub mod repository;

pub use repository::RepositoryError;
