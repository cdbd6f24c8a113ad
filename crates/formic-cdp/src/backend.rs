use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use formic_engine::backend::{Backend, BackendError, NavigationResult};
use formic_engine::protocol::{FormSnapshot, ProbeData, ProbeResponse};
use serde_json::json;
use tracing::{debug, info};

use crate::cdp::CdpClient;
use crate::probe;

/// Backend over the operator's running Chrome via the DevTools protocol.
pub struct CdpBackend {
    cdp_url: String,
    client: Option<CdpClient>,
}

impl CdpBackend {
    pub fn new(cdp_url: impl Into<String>) -> Self {
        Self {
            cdp_url: cdp_url.into(),
            client: None,
        }
    }

    fn client(&self) -> Result<&CdpClient, BackendError> {
        self.client.as_ref().ok_or(BackendError::NotReady)
    }

    async fn probe_call(&self, params: serde_json::Value) -> Result<ProbeResponse, BackendError> {
        let client = self.client()?;
        let value = probe::execute_command(&client.page, params)
            .await
            .map_err(|e| BackendError::Probe(e.to_string()))?;
        let response: ProbeResponse = serde_json::from_value(value)?;
        Ok(response)
    }

    /// File inputs cannot be written from page script; route them through
    /// the protocol's file API instead.
    async fn set_file_input(&self, selector: &str, path: &str) -> Result<(), BackendError> {
        let client = self.client()?;
        let element = client
            .page
            .find_element(selector)
            .await
            .map_err(|e| BackendError::Probe(format!("file input not found: {}", e)))?;
        let params = SetFileInputFilesParams::builder()
            .files(vec![path.to_string()])
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(BackendError::Probe)?;
        client
            .page
            .execute(params)
            .await
            .map_err(|e| BackendError::Probe(format!("file upload failed: {}", e)))?;
        info!(selector, path, "attached file");
        Ok(())
    }
}

#[async_trait]
impl Backend for CdpBackend {
    async fn attach(&mut self) -> Result<(), BackendError> {
        info!("Attaching to browser at {}", self.cdp_url);
        let client = CdpClient::attach(&self.cdp_url)
            .await
            .map_err(|e| BackendError::Connect(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if let Some(client) = self.client.take() {
            client.detach().await;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let client = self.client()?;
        info!("Navigating to: {}", url);
        client
            .page
            .goto(url)
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.to_lowercase().contains("timeout") {
                    BackendError::Timeout(msg)
                } else {
                    BackendError::Navigation(msg)
                }
            })?;

        let title = client
            .page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let current = client
            .page
            .url()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult {
            url: current,
            title,
        })
    }

    async fn snapshot(&mut self) -> Result<FormSnapshot, BackendError> {
        match self.probe_call(json!({ "action": "snapshot" })).await? {
            ProbeResponse::Ok {
                data: ProbeData::Snapshot(snapshot),
            } => Ok(*snapshot),
            ProbeResponse::Ok { .. } => {
                Err(BackendError::Probe("snapshot returned non-snapshot data".into()))
            }
            ProbeResponse::Error { code, message } => {
                Err(BackendError::Probe(format!("{code}: {message}")))
            }
        }
    }

    async fn set_value(
        &mut self,
        frame: &str,
        selector: &str,
        value: &str,
    ) -> Result<(), BackendError> {
        let response = self
            .probe_call(json!({
                "action": "set_value",
                "frame": frame,
                "selector": selector,
                "value": value,
            }))
            .await?;
        match response {
            ProbeResponse::Ok {
                data: ProbeData::Action(result),
            } => {
                debug!(selector, success = result.success, "set value");
                if result.success {
                    Ok(())
                } else {
                    Err(BackendError::Probe(
                        result.message.unwrap_or_else(|| "set_value failed".into()),
                    ))
                }
            }
            ProbeResponse::Ok { .. } => {
                Err(BackendError::Probe("set_value returned unexpected data".into()))
            }
            ProbeResponse::Error { code, message: _ } if code == "file_input" => {
                self.set_file_input(selector, value).await
            }
            ProbeResponse::Error { code, message } => {
                Err(BackendError::Probe(format!("{code}: {message}")))
            }
        }
    }

    async fn click(&mut self, frame: &str, selector: &str) -> Result<(), BackendError> {
        let response = self
            .probe_call(json!({
                "action": "click",
                "frame": frame,
                "selector": selector,
            }))
            .await?;
        match response {
            ProbeResponse::Ok { .. } => Ok(()),
            ProbeResponse::Error { code, message } => {
                Err(BackendError::Probe(format!("{code}: {message}")))
            }
        }
    }

    async fn click_match(
        &mut self,
        selectors: &[&str],
        text_patterns: &[&str],
    ) -> Result<bool, BackendError> {
        let response = self
            .probe_call(json!({
                "action": "click_match",
                "selectors": selectors,
                "text_patterns": text_patterns,
            }))
            .await?;
        match response {
            ProbeResponse::Ok {
                data: ProbeData::Action(result),
            } => {
                if result.success {
                    debug!(matched = ?result.message, "clicked control");
                }
                Ok(result.success)
            }
            ProbeResponse::Ok { .. } => Ok(false),
            ProbeResponse::Error { code, message } => {
                Err(BackendError::Probe(format!("{code}: {message}")))
            }
        }
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        let client = self.client()?;
        let bytes = client
            .page
            .screenshot(chromiumoxide::page::ScreenshotParams::builder().build())
            .await
            .map_err(|e| BackendError::Screenshot(e.to_string()))?;
        Ok(bytes)
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        let client = self.client()?;
        Ok(client
            .page
            .url()
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?
            .unwrap_or_default())
    }
}
