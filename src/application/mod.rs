//! Application layer: the use cases the CLI drives.

pub mod use_cases;
