pub mod mirror;

pub use mirror::{GitMirror, MirrorError, MirrorOperations, PUSH_CREDENTIAL_HELPER};
