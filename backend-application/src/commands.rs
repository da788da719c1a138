// Write-side use cases

pub mod delete_commands;
pub mod ingest_commands;

pub use delete_commands::*;
pub use ingest_commands::*;
