pub mod admin_handlers;
pub mod browse_handlers;
pub mod ingest_handlers;
pub mod log_handlers;
pub mod ops_handlers;
pub mod stream_handlers;

pub use admin_handlers::*;
pub use browse_handlers::*;
pub use ingest_handlers::*;
pub use log_handlers::*;
pub use ops_handlers::*;
pub use stream_handlers::*;
