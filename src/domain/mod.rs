//! Core domain types: repositories, migration jobs and the value objects they use.

pub mod entities;
pub mod value_objects;
