pub mod list;
pub mod migrate;
pub mod search;

pub use list::*;
pub use migrate::*;
pub use search::*;
