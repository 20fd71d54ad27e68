pub mod config_store;
pub mod repository_index;
pub mod scratch_dir;

pub use config_store::{AppConfig, ConfigStore, ConfigStoreError};
pub use repository_index::{RecordOutcome, RepositoryIndexError, RepositoryIndexStore};
pub use scratch_dir::ScratchDir;
