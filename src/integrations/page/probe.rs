// src/integrations/page/probe.rs
//
// Script execution against the embedded page.
//
// The browser view is owned by the host shell. The core only ever submits a
// script and awaits a JSON result; timeouts and fallbacks are applied here,
// on top of whatever the shell does.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::scripts::PageScript;
use crate::error::ProbeError;

/// Allowance for one read of page state before falling back to a default.
pub const PROBE_ALLOWANCE: Duration = Duration::from_millis(500);

/// Capability supplied by the browser-view collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageProbe: Send + Sync {
    /// Run `script` in the page and return its JSON-serializable result.
    async fn execute(&self, script: &str) -> Result<Value, ProbeError>;
}

/// Execute with a hard allowance. The page call itself is not cancelled on
/// timeout; its late result is simply dropped.
pub async fn execute_within(
    page: &dyn PageProbe,
    script: PageScript,
    allowance: Duration,
) -> Result<Value, ProbeError> {
    match tokio::time::timeout(allowance, page.execute(script.source())).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout(allowance.as_millis() as u64)),
    }
}

/// Best-effort read: any failure or unexpected shape yields `default`.
pub async fn probe_or<T, F>(page: &dyn PageProbe, script: PageScript, default: T, parse: F) -> T
where
    F: FnOnce(Value) -> Option<T>,
{
    match execute_within(page, script, PROBE_ALLOWANCE).await {
        Ok(value) => match parse(value.clone()) {
            Some(parsed) => parsed,
            None => {
                log::debug!("[PAGE] {:?} returned unexpected {}", script, value);
                default
            }
        },
        Err(e) => {
            log::debug!("[PAGE] {:?} failed: {}", script, e);
            default
        }
    }
}

/// The page reports pressed state as `true` or `"true"`.
pub fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => Some(s == "true"),
        Value::Null => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_probe_returns_parsed_value() {
        let mut page = MockPageProbe::new();
        page.expect_execute().returning(|_| Ok(json!("true")));

        let muted = probe_or(&page, PageScript::MutedState, false, |v| truthy(&v)).await;
        assert!(muted);
    }

    #[tokio::test]
    async fn test_probe_failure_yields_default() {
        let mut page = MockPageProbe::new();
        page.expect_execute()
            .returning(|_| Err(ProbeError::Script("no element".into())));

        let muted = probe_or(&page, PageScript::MutedState, false, |v| truthy(&v)).await;
        assert!(!muted);
    }

    #[tokio::test]
    async fn test_unexpected_shape_yields_default() {
        let mut page = MockPageProbe::new();
        page.expect_execute().returning(|_| Ok(json!({ "odd": 1 })));

        let muted = probe_or(&page, PageScript::MutedState, false, |v| truthy(&v)).await;
        assert!(!muted);
    }

    struct StalledPage;

    #[async_trait]
    impl PageProbe for StalledPage {
        async fn execute(&self, _script: &str) -> Result<Value, ProbeError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(json!(true))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_page_times_out() {
        let result = execute_within(&StalledPage, PageScript::MutedState, PROBE_ALLOWANCE).await;
        assert_eq!(result, Err(ProbeError::Timeout(500)));

        let started = tokio::time::Instant::now();
        let muted = probe_or(&StalledPage, PageScript::MutedState, false, |v| truthy(&v)).await;
        assert!(!muted);
        assert!(started.elapsed() >= PROBE_ALLOWANCE);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
