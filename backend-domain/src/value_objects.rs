// Domain value objects
pub mod identifiers;
pub mod log_id;

pub use identifiers::*;
pub use log_id::*;
