// Log store implementations

pub mod clickhouse_logs;
pub mod memory_logs;

pub use clickhouse_logs::*;
pub use memory_logs::*;
