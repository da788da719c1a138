use anyhow::{anyhow, Result};

pub const MAX_PAGE_SIZE: usize = 100;

/// Deadlines must be ordered and fit inside the outer request timeout.
pub fn validate_timeouts(short: u64, medium: u64, long: u64, request: u64) -> Result<()> {
    if short == 0 {
        return Err(anyhow!("short_timeout_seconds must be greater than 0"));
    }
    if short > medium || medium > long {
        return Err(anyhow!(
            "timeouts must satisfy short <= medium <= long (got {}/{}/{})",
            short,
            medium,
            long
        ));
    }
    if request < long {
        return Err(anyhow!(
            "request_timeout_seconds ({}) must be >= long_timeout_seconds ({})",
            request,
            long
        ));
    }
    Ok(())
}

pub fn validate_page_size(name: &str, value: usize) -> Result<()> {
    if value == 0 || value > MAX_PAGE_SIZE {
        return Err(anyhow!("{} must be between 1 and {}", name, MAX_PAGE_SIZE));
    }
    Ok(())
}
