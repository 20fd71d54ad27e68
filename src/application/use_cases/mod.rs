pub mod list_repositories;
pub mod migrate_repository;
pub mod search_repositories;

pub use list_repositories::{ListRepositoriesRequest, ListRepositoriesResult, ListRepositoriesUseCase};
pub use migrate_repository::MigrationOrchestrator;
pub use search_repositories::SearchRepositoriesUseCase;
