pub mod migration_job;
pub mod repository_summary;

pub use migration_job::{MigrationJob, MigrationReport, MigrationStage, MigrationState, PushStage};
pub use repository_summary::RepositorySummary;
