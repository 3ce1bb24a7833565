use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Minimum gap between two user messages from the same source.
pub const DEFAULT_COOLDOWN_SECS: u64 = 60;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MAX_POLLS: u32 = 30;
pub const DEFAULT_PRESENCE_WINDOW_SECS: i64 = 5 * 60;
pub const DEFAULT_PRESENCE_MULTIPLIER: u64 = 55;

/// Top-level config (friday.toml + FRIDAY_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FridayConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub autopost: AutopostConfig,
    #[serde(default)]
    pub forms: FormsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// External assistant API (OpenAI Assistants v2).
///
/// Both `api_key` and `assistant_id` are optional at load time so the
/// server can start without them; chat requests then fail with a config
/// error instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub api_key: Option<String>,
    pub assistant_id: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            assistant_id: None,
            base_url: default_openai_base_url(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Display name stored on assistant replies.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    /// Display name used when the caller sends none.
    #[serde(default = "default_user_name")]
    pub default_user_name: String,
    #[serde(default = "default_presence_window_secs")]
    pub presence_window_secs: i64,
    /// Social-proof factor applied to the connected-users count.
    #[serde(default = "default_presence_multiplier")]
    pub presence_multiplier: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            bot_name: default_bot_name(),
            default_user_name: default_user_name(),
            presence_window_secs: DEFAULT_PRESENCE_WINDOW_SECS,
            presence_multiplier: DEFAULT_PRESENCE_MULTIPLIER,
        }
    }
}

/// Scheduled seed-question posting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutopostConfig {
    /// Shared secret expected as `Authorization: Bearer <secret>`.
    /// When unset, only requests identified as the platform scheduler pass.
    pub cron_secret: Option<String>,
    /// Run the auto-post flow in-process every N seconds. Disabled when unset.
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormsConfig {
    /// Automation webhook receiving lead submissions.
    pub webhook_url: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_max_polls() -> u32 {
    DEFAULT_MAX_POLLS
}
fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN_SECS
}
fn default_bot_name() -> String {
    "שוקי הבוט".to_string()
}
fn default_user_name() -> String {
    "משתמש".to_string()
}
fn default_presence_window_secs() -> i64 {
    DEFAULT_PRESENCE_WINDOW_SECS
}
fn default_presence_multiplier() -> u64 {
    DEFAULT_PRESENCE_MULTIPLIER
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.friday/friday.db", home)
}

impl FridayConfig {
    /// Load config from a TOML file with FRIDAY_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `FRIDAY_ASSISTANT__API_KEY` or `FRIDAY_CHAT__COOLDOWN_SECS`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: FridayConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("FRIDAY_").split("__"))
            .extract()
            .map_err(|e| crate::error::FridayError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the pipeline misbehave silently.
    pub fn validate(&self) -> crate::error::Result<()> {
        let invalid = |key, reason: &str| {
            Err(crate::error::FridayError::InvalidSetting {
                key,
                reason: reason.to_string(),
            })
        };
        if self.assistant.max_polls == 0 {
            return invalid("assistant.max_polls", "must be at least 1");
        }
        if self.assistant.poll_interval_ms == 0 {
            return invalid("assistant.poll_interval_ms", "must be positive");
        }
        if self.chat.presence_window_secs <= 0 {
            return invalid("chat.presence_window_secs", "must be positive");
        }
        if self.chat.bot_name.trim().is_empty() {
            return invalid("chat.bot_name", "must not be empty");
        }
        if self.autopost.interval_secs == Some(0) {
            return invalid("autopost.interval_secs", "omit it to disable the loop");
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.friday/friday.toml", home)
}
