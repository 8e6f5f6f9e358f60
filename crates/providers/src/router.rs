//! Provider router — selects the configured model backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use deskpilot_core::provider::Provider;
use tracing::warn;
use crate::anthropic::AnthropicProvider;

/// Routes model requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build providers from configuration.
///
/// Only the Anthropic Messages API is supported as a backend; other provider
/// names are logged and skipped.
pub fn build_from_config(config: &deskpilot_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);
    let timeout = Duration::from_secs(config.agent.timeout_secs.max(1));

    for (name, provider_config) in &config.providers {
        if name != "anthropic" {
            warn!(provider = %name, "Unsupported provider in config, skipping");
            continue;
        }

        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let mut provider = AnthropicProvider::new(api_key).with_timeout(timeout);
        if let Some(url) = &provider_config.api_url {
            provider = provider.with_base_url(url);
        }
        router.register(name.clone(), Arc::new(provider));
    }

    // Ensure the default provider exists (even if not explicitly configured)
    if router.get(&config.default_provider).is_none() && config.default_provider == "anthropic" {
        let api_key = config.api_key.clone().unwrap_or_default();
        router.register(
            config.default_provider.clone(),
            Arc::new(AnthropicProvider::new(api_key).with_timeout(timeout)),
        );
    }

    router
}
