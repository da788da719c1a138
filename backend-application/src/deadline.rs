use std::future::Future;
use std::time::Duration;

use backend_domain::RuntimeConfig;

use crate::AppError;

/// Operation classes with their own time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Single-document deletes, readiness probes.
    Short,
    /// Filtered listings, facets, bulk deletes.
    Medium,
    /// Bulk exports.
    Long,
}

impl Deadline {
    pub fn duration(self, config: &RuntimeConfig) -> Duration {
        let seconds = match self {
            Deadline::Short => config.short_timeout_seconds,
            Deadline::Medium => config.medium_timeout_seconds,
            Deadline::Long => config.long_timeout_seconds,
        };
        Duration::from_secs(seconds.max(1))
    }
}

pub async fn with_deadline<T, F>(
    config: &RuntimeConfig,
    deadline: Deadline,
    operation: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(deadline.duration(config), operation).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_operation_times_out() {
        let config = RuntimeConfig {
            short_timeout_seconds: 1,
            ..RuntimeConfig::default()
        };
        let result: Result<(), AppError> = with_deadline(&config, Deadline::Short, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(AppError::Timeout)));
    }

    #[tokio::test]
    async fn fast_operation_passes_through() {
        let config = RuntimeConfig::default();
        let result = with_deadline(&config, Deadline::Medium, async { Ok(7) }).await;
        assert_eq!(result.expect("within deadline"), 7);
    }
}
