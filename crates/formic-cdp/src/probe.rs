//! DOM probe injection and invocation. The probe is a self-contained script
//! installed as `window.__formic`; every backend command round-trips through
//! `__formic.process(...)` and returns the JSON envelope defined in
//! `formic_common::protocol`.

use chromiumoxide::Page;
use std::error::Error;
use std::future::Future;
use std::time::Duration;

pub const PROBE_JS: &str = include_str!("probe.js");

/// Evaluation timeout. Prevents hanging when a dialog blocks the JS thread.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum retries for context errors during page navigation.
const MAX_CONTEXT_RETRIES: u32 = 10;

const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Errors that mean the page's execution context went away mid-call
/// (navigation, frame swap) rather than a real failure.
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

async fn retry_on_context_error<T, E, F, Fut>(
    operation_name: &str,
    mut operation: F,
) -> Result<T, Box<dyn Error + Send + Sync>>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let err_str = e.to_string();
                if is_context_error(&err_str) {
                    tracing::debug!(
                        "{} context error (attempt {}/{}), retrying...",
                        operation_name,
                        attempt + 1,
                        MAX_CONTEXT_RETRIES
                    );
                    last_error = Some(err_str);
                    tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
                    continue;
                }
                return Err(err_str.into());
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| format!("{} failed after retries", operation_name))
        .into())
}

pub async fn inject_probe(page: &Page) -> Result<(), Box<dyn Error + Send + Sync>> {
    retry_on_context_error("Probe injection", || try_inject_probe(page)).await
}

async fn try_inject_probe(page: &Page) -> Result<(), Box<dyn Error + Send + Sync>> {
    let is_loaded: bool = page
        .evaluate("typeof window.__formic !== 'undefined'")
        .await
        .map_err(|e| format!("Failed to check probe status: {}", e))?
        .into_value()
        .map_err(|e| format!("Failed to get bool value: {}", e))?;

    if !is_loaded {
        page.evaluate(PROBE_JS)
            .await
            .map_err(|e| format!("Failed to inject probe: {}", e))?;
    }

    Ok(())
}

/// Run one probe command, re-injecting and retrying through navigation
/// races. Returns the raw JSON envelope.
pub async fn execute_command(
    page: &Page,
    params: serde_json::Value,
) -> Result<serde_json::Value, Box<dyn Error + Send + Sync>> {
    let params_json = serde_json::to_string(&params)?;
    let expression = format!("window.__formic.process({})", params_json);

    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        inject_probe(page).await?;

        match evaluate_with_timeout(page, &expression).await {
            Ok(value) => return Ok(value),
            Err(EvalError::Timeout) => {
                return Err(
                    "Probe command timed out - possibly blocked by a dialog".into(),
                );
            }
            Err(EvalError::Context(err_str)) => {
                tracing::debug!(
                    "Context error during command (attempt {}/{}), retrying...",
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
            Err(EvalError::Other(err_str)) => {
                return Err(format!("Evaluation failed: {}", err_str).into());
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| "Failed to execute probe command after retries".to_string())
        .into())
}

enum EvalError {
    Timeout,
    Context(String),
    Other(String),
}

async fn evaluate_with_timeout(
    page: &Page,
    expression: &str,
) -> Result<serde_json::Value, EvalError> {
    let eval_result = tokio::time::timeout(EVAL_TIMEOUT, page.evaluate(expression)).await;

    match eval_result {
        Err(_) => Err(EvalError::Timeout),
        Ok(Err(e)) => {
            let err_str = e.to_string();
            if is_context_error(&err_str) {
                Err(EvalError::Context(err_str))
            } else {
                Err(EvalError::Other(err_str))
            }
        }
        Ok(Ok(remote_object)) => remote_object
            .into_value::<serde_json::Value>()
            .map_err(|e| EvalError::Other(format!("Failed to get result: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::const_is_empty)]
    fn probe_script_is_embedded() {
        assert!(!PROBE_JS.is_empty());
        assert!(PROBE_JS.contains("__formic"));
        assert!(PROBE_JS.contains("snapshot"));
    }

    #[test]
    fn context_errors_are_recognized() {
        assert!(is_context_error("Cannot find context with specified id"));
        assert!(is_context_error("Execution context was destroyed"));
        assert!(!is_context_error("TypeError: undefined is not a function"));
    }
}
