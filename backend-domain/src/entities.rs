// Domain entities

pub mod log_entry;
pub mod model;
pub mod query;

pub use log_entry::*;
pub use model::*;
pub use query::*;
