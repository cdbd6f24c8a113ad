//! Connection to the operator's already-running Chrome. We attach over the
//! DevTools protocol and open a tab in the existing (logged-in) profile; we
//! never launch a browser and never automate login.

use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;

#[derive(Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
}

impl CdpClient {
    /// Attach to a browser started with `--remote-debugging-port`. Accepts
    /// either the HTTP endpoint (`http://localhost:9222`) or a raw
    /// `ws://` debugger URL.
    pub async fn attach(cdp_url: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let ws_url = if cdp_url.starts_with("ws") {
            cdp_url.to_string()
        } else {
            resolve_ws_url(cdp_url).await?
        };

        tracing::info!("Attaching to browser at {}", ws_url);
        let (browser, mut handler) = Browser::connect(ws_url)
            .await
            .map_err(|e| format!("Failed to attach to browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::error!("Browser handler error (ignoring): {}", e);
                    continue;
                }
            }
            tracing::info!("Browser handler task ended");
        });

        // A fresh tab in the operator's profile: shares their session
        // cookies without disturbing whatever they have open.
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| format!("Failed to open tab: {}", e))?;

        // Auto-accept JavaScript dialogs so a stray confirm() cannot wedge
        // the evaluation channel.
        let mut dialog_events = page
            .event_listener::<chromiumoxide::cdp::browser_protocol::page::EventJavascriptDialogOpening>()
            .await
            .map_err(|e| format!("Failed to subscribe to dialog events: {}", e))?;
        let page_clone = page.clone();
        tokio::spawn(async move {
            while let Some(event) = dialog_events.next().await {
                tracing::info!(
                    "Handling JavaScript dialog: {} ({:?})",
                    event.message,
                    event.r#type
                );
                let cmd =
                    chromiumoxide::cdp::browser_protocol::page::HandleJavaScriptDialogParams::new(
                        true,
                    );
                if let Err(e) = page_clone.execute(cmd).await {
                    tracing::error!("Failed to handle dialog: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            page,
        })
    }

    /// Detach from the browser. The operator's Chrome keeps running; only
    /// our websocket session and handler go away.
    pub async fn detach(self) {
        drop(self.browser);
        self.handler_task.abort();
    }
}

async fn resolve_ws_url(
    http_url: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let endpoint = format!("{}/json/version", http_url.trim_end_matches('/'));
    let info: VersionInfo = reqwest::get(&endpoint)
        .await
        .map_err(|e| {
            format!(
                "Failed to reach {} - is the browser running with --remote-debugging-port? ({})",
                endpoint, e
            )
        })?
        .json()
        .await
        .map_err(|e| format!("Unexpected response from {}: {}", endpoint, e))?;
    Ok(info.web_socket_debugger_url)
}
