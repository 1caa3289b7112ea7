use std::env;
use std::time::Duration;

use anyhow::Context;

use crate::models::TenantConfig;
use crate::services::composer::PhraseStrategy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub phrase_strategy: PhraseStrategy,
    pub calendar_timeout: Duration,
    /// Used when a turn arrives without tenant configuration.
    pub tenant_config_path: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "intake.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            phrase_strategy: env::var("PHRASE_STRATEGY")
                .ok()
                .and_then(|v| PhraseStrategy::parse(&v))
                .unwrap_or(PhraseStrategy::Random),
            calendar_timeout: Duration::from_millis(
                env::var("CALENDAR_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(2000),
            ),
            tenant_config_path: env::var("TENANT_CONFIG_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }

    /// Reads the fallback tenant file, or an empty configuration when none
    /// is set.
    pub fn load_default_tenant(&self) -> anyhow::Result<TenantConfig> {
        let Some(path) = &self.tenant_config_path else {
            return Ok(TenantConfig::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read tenant config: {path}"))?;
        serde_json::from_str(&raw).with_context(|| format!("failed to parse tenant config: {path}"))
    }
}
