//! Bounded wait for container completion.
//!
//! The engine's blocking wait runs on its own task and races a timer. When
//! the timer wins the container is killed and force-removed before
//! [`WatchdogError::TimedOut`] is returned.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::execution::engine::ContainerEngine;

/// Reasons a bounded wait did not yield an exit code.
#[derive(Debug, Error)]
pub enum WatchdogError {
    /// The container outlived the budget and was killed and removed.
    #[error("Script execution timed out after {} seconds", .limit.as_secs_f64())]
    TimedOut { limit: Duration },

    /// The engine failed while waiting.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Waits for `container_id` to exit, for at most `limit`.
///
/// Kill and removal errors on the timeout path are logged and swallowed.
/// Errors from the wait itself are returned unchanged.
pub async fn wait_bounded(
    engine: Arc<dyn ContainerEngine>,
    container_id: &str,
    limit: Duration,
) -> Result<i64, WatchdogError> {
    let waiter = {
        let engine = Arc::clone(&engine);
        let id = container_id.to_string();
        tokio::spawn(async move { engine.wait_container(&id).await })
    };
    let abort = waiter.abort_handle();

    tokio::select! {
        biased;

        joined = waiter => match joined {
            Ok(result) => Ok(result?),
            Err(e) => Err(WatchdogError::Engine(EngineError::WaitFailed {
                id: container_id.to_string(),
                reason: e.to_string(),
            })),
        },
        _ = tokio::time::sleep(limit) => {
            abort.abort();
            warn!(
                container = container_id,
                limit_secs = limit.as_secs_f64(),
                "Container exceeded its time limit, killing"
            );
            if let Err(e) = engine.kill_container(container_id).await {
                debug!(container = container_id, error = %e, "Kill after timeout failed");
            }
            if let Err(e) = engine.remove_container(container_id, true).await {
                debug!(container = container_id, error = %e, "Removal after timeout failed");
            }
            Err(WatchdogError::TimedOut { limit })
        }
    }
}
