//! Timeout-bounded calls to the app-store client.

use crate::distribution::{
    domain::SubmissionId,
    ports::{StoreClientError, StoreClientResult, StoreOperation},
};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// A store call that did not succeed.
///
/// Local state is never committed after either variant.
#[derive(Debug, Clone, Error)]
pub enum StoreCallError {
    /// The store did not answer in time.
    #[error("store {operation} timed out after {timeout_ms}ms")]
    TimedOut {
        /// Operation attempted.
        operation: StoreOperation,
        /// Timeout applied, in milliseconds.
        timeout_ms: u128,
    },

    /// The store answered with an error.
    #[error("store {operation} failed: {source}")]
    Failed {
        /// Operation attempted.
        operation: StoreOperation,
        /// Client error.
        #[source]
        source: StoreClientError,
    },
}

pub(super) async fn call_store<T>(
    timeout: Duration,
    operation: StoreOperation,
    submission_id: SubmissionId,
    call: impl Future<Output = StoreClientResult<T>>,
) -> Result<T, StoreCallError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => {
            tracing::warn!(
                submission_id = %submission_id,
                operation = %operation,
                error = %source,
                "store call failed"
            );
            Err(StoreCallError::Failed { operation, source })
        }
        Err(_) => {
            tracing::warn!(
                submission_id = %submission_id,
                operation = %operation,
                timeout_ms = timeout.as_millis(),
                "store call timed out"
            );
            Err(StoreCallError::TimedOut {
                operation,
                timeout_ms: timeout.as_millis(),
            })
        }
    }
}
