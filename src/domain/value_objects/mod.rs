pub mod page_link;
pub mod platform_type;
pub mod repo_name;
pub mod scope_node;
pub mod secret;

pub use page_link::{LinkRelation, PageLink};
pub use platform_type::{PlatformType, PlatformTypeError};
pub use repo_name::{RepoName, RepoNameError};
pub use scope_node::{ScopeNode, ScopeSet};
pub use secret::{redact, redact_url_credentials, Secret};
