// Read-side use cases

pub mod browse_queries;
pub mod log_queries;

pub use browse_queries::*;
pub use log_queries::*;
