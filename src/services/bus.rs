//! Outbound command dispatch to the home automation hub

use serde_json::json;
use tracing::{debug, warn};

/// Sink for widget-originated commands addressed to hub entities.
///
/// Dispatch is fire-and-forget: delivery failures are logged and never
/// surface to the caller, so a dead hub cannot wedge widget input.
pub trait CommandBus: Send + Sync {
    /// Dispatch `domain.service` targeting `entity_id`
    fn call_service(&self, domain: &str, service: &str, entity_id: &str);
}

/// Sends commands to the hub over its REST API
pub struct HttpCommandBus {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpCommandBus {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

impl CommandBus for HttpCommandBus {
    fn call_service(&self, domain: &str, service: &str, entity_id: &str) {
        let url = format!("{}/api/services/{}/{}", self.base_url, domain, service);
        let mut request = self.client.post(&url).json(&json!({ "entity_id": entity_id }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let call = format!("{}.{} -> {}", domain, service, entity_id);
        debug!("Dispatching {}", call);

        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("Delivered {}", call);
                }
                Ok(response) => {
                    warn!("Hub rejected {} with status {}", call, response.status());
                }
                Err(e) => {
                    warn!("Failed to deliver {}: {}", call, e);
                }
            }
        });
    }
}

/// Logs commands without delivering them; used when no hub URL is
/// configured
pub struct NullCommandBus;

impl CommandBus for NullCommandBus {
    fn call_service(&self, domain: &str, service: &str, entity_id: &str) {
        warn!(
            "No command bus configured, dropping {}.{} -> {}",
            domain, service, entity_id
        );
    }
}
