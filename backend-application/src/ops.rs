// Live fan-out

pub mod log_hub;

pub use log_hub::*;
