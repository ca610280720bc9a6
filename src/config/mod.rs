use once_cell::sync::Lazy;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub supabase: SupabaseConfig,
    pub notion: NotionConfig,
    pub webhooks: WebhookConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub key: Option<String>,
}

impl SupabaseConfig {
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.key.is_some()
    }
}

/// Token + database id for one Notion-backed catalog source.
#[derive(Debug, Clone)]
pub struct NotionSource {
    pub token: String,
    pub database_id: String,
}

#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub version: String,
    pub logistics: Option<NotionSource>,
    pub production: Option<NotionSource>,
    pub design: Option<NotionSource>,
    pub sales: Option<NotionSource>,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// General webhook, also the fallback when a module-specific one is unset.
    pub general_url: Option<String>,
    pub logistics_url: Option<String>,
    pub design_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub items_ttl_secs: u64,
    pub planning_ttl_secs: u64,
    pub titles_ttl_secs: u64,
    /// Background worker wake-up interval for all catalogs.
    pub refresh_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env_parse("PORT", 3000),
            },
            security: SecurityConfig {
                jwt_secret: env::var("SECRET_KEY").unwrap_or_default(),
                jwt_expiry_hours: env_parse("SECURITY_JWT_EXPIRY_HOURS", 12),
            },
            supabase: SupabaseConfig {
                url: env_nonempty("SUPABASE_URL"),
                key: env_nonempty("SUPABASE_KEY"),
            },
            notion: NotionConfig {
                version: env::var("NOTION_VERSION").unwrap_or_else(|_| "2022-06-28".to_string()),
                logistics: notion_source("NOTION_TOKEN_LOGISTICA", "NOTION_DATABASE_ID_LOGISTICA"),
                production: notion_source("NOTION_TOKEN_PRODUCCION", "NOTION_DATABASE_ID_PLANEACION"),
                design: notion_source("NOTION_TOKEN_DISENO", "NOTION_DATABASE_ID_DISENO"),
                sales: notion_source("NOTION_TOKEN_VENTAS", "NOTION_DATABASE_ID_VENTAS"),
            },
            webhooks: WebhookConfig {
                general_url: env_nonempty("N8N_WEBHOOK_URL"),
                logistics_url: env_nonempty("LOGISTICA_WEBHOOK_URL"),
                design_url: env_nonempty("N8N_WEBHOOK_URL_DISENO"),
                timeout_secs: env_parse("WEBHOOK_TIMEOUT_SECS", 15),
            },
            cache: CacheConfig {
                items_ttl_secs: env_parse("CACHE_ITEMS_TTL_SECS", 600),
                planning_ttl_secs: env_parse("CACHE_PLANNING_TTL_SECS", 3600),
                titles_ttl_secs: env_parse("CACHE_TITLES_TTL_SECS", 600),
                refresh_interval_secs: env_parse("CACHE_REFRESH_INTERVAL_SECS", 3600),
            },
        }
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn notion_source(token_var: &str, database_var: &str) -> Option<NotionSource> {
    match (env_nonempty(token_var), env_nonempty(database_var)) {
        (Some(token), Some(database_id)) => Some(NotionSource { token, database_id }),
        _ => None,
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_supabase_vars_disable_auth() {
        let cfg = SupabaseConfig { url: None, key: Some("k".into()) };
        assert!(!cfg.is_configured());

        let cfg = SupabaseConfig { url: Some("https://x.supabase.co".into()), key: Some("k".into()) };
        assert!(cfg.is_configured());
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("TEST_ENV_PARSE_PORT", "not-a-number");
        assert_eq!(env_parse("TEST_ENV_PARSE_PORT", 3000u16), 3000);
        std::env::remove_var("TEST_ENV_PARSE_PORT");
    }

    #[test]
    fn notion_source_requires_both_vars() {
        std::env::set_var("TEST_NOTION_TOKEN_ONLY", "secret");
        assert!(notion_source("TEST_NOTION_TOKEN_ONLY", "TEST_NOTION_DB_UNSET").is_none());
        std::env::remove_var("TEST_NOTION_TOKEN_ONLY");
    }
}
