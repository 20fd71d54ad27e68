//! Repository directory adapters for the supported hosting platforms.
//!
//! Each adapter turns its platform's paginated list API into a
//! [`RepositoryPage`] and can create an empty repository. Shared pagination
//! handling lives in [`pagination`]; GitLab group expansion in
//! [`scope_resolver`].

pub mod api_client;
pub mod azure_platform;
pub mod github_platform;
pub mod gitlab_platform;
pub mod pagination;
pub mod platform_interface;
pub mod platform_registry;
pub mod scope_resolver;

pub use platform_interface::{
    CreateScope, DirectoryAdapter, ListOptions, ListScope, PlatformError, RepositoryPage,
};
pub use platform_registry::PlatformRegistry;

#[cfg(test)]
pub use platform_interface::MockDirectoryAdapter;
