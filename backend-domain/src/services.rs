// Domain services

pub mod entry_validator;

pub use entry_validator::*;
