//! Configuration loading, validation, and management for helperbot.
//!
//! Loads configuration from `~/.helperbot/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use helperbot_core::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables the bot cannot run without, paired with a check
/// against the loaded config.
const REQUIRED_SECRETS: &[&str] = &[
    "OPENROUTER_API_KEY",
    "REDDIT_CLIENT_ID",
    "REDDIT_CLIENT_SECRET",
    "REDDIT_USERNAME",
    "REDDIT_PASSWORD",
    "USER_AGENT",
    "SEARXNG_BASE_URL",
];

/// The root configuration structure.
///
/// Maps directly to `~/.helperbot/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Trigger, scope and pacing of the listener
    #[serde(default)]
    pub bot: BotConfig,

    /// Model API settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Thread transcript limits
    #[serde(default)]
    pub transcript: TranscriptConfig,

    /// Reddit account and polling
    #[serde(default)]
    pub reddit: RedditConfig,

    /// Web tool backends and limits
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Retry policies per call site
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Case-insensitive pattern a comment body must match to trigger a reply
    #[serde(default = "default_trigger_pattern")]
    pub trigger_pattern: String,

    /// Subreddits to watch; `["all"]` watches everything
    #[serde(default = "default_subreddits")]
    pub subreddits: Vec<String>,

    /// Minimum pause after each handled trigger
    #[serde(default = "default_rate_limit_secs")]
    pub rate_limit_secs: u64,

    /// How many handled comment ids are remembered
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,

    /// Interval between status log lines (0 disables the reporter)
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,

    /// Appended to every reply after a horizontal rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_footer: Option<String>,
}

fn default_trigger_pattern() -> String {
    r"^\s*(?:\[?u/|@)(?:grok|ai|gpt|gemini|chatgpt)\b".into()
}
fn default_subreddits() -> Vec<String> {
    vec!["all".into()]
}
fn default_rate_limit_secs() -> u64 {
    10
}
fn default_dedup_capacity() -> usize {
    10_000
}
fn default_status_interval_secs() -> u64 {
    60
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trigger_pattern: default_trigger_pattern(),
            subreddits: default_subreddits(),
            rate_limit_secs: default_rate_limit_secs(),
            dedup_capacity: default_dedup_capacity(),
            status_interval_secs: default_status_interval_secs(),
            reply_footer: None,
        }
    }
}

impl BotConfig {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_secs(self.rate_limit_secs)
    }

    pub fn status_interval(&self) -> Option<Duration> {
        (self.status_interval_secs > 0).then(|| Duration::from_secs(self.status_interval_secs))
    }

    /// The trigger pattern compiled case-insensitively.
    pub fn trigger_regex(&self) -> Result<regex_lite::Regex, ConfigError> {
        regex_lite::RegexBuilder::new(&self.trigger_pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::ValidationError(format!("trigger_pattern does not compile: {e}")))
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// OpenRouter (or any OpenAI-compatible) API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout
    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,

    /// Model round-trips allowed per reply, the final wrap-up included
    #[serde(default = "default_max_tool_steps")]
    pub max_tool_steps: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Reasoning effort hint ("low", "medium", "high")
    #[serde(default = "default_reasoning_effort", skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,

    /// Replaces the built-in system prompt; `{local_time}` and `{utc_time}`
    /// placeholders are filled at request time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_path: Option<PathBuf>,

    /// Sent as `HTTP-Referer` for OpenRouter attribution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,

    /// Sent as `X-Title` for OpenRouter attribution
    #[serde(default = "default_app_title")]
    pub app_title: String,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "moonshotai/kimi-k2.5".into()
}
fn default_model_timeout_secs() -> u64 {
    120
}
fn default_max_tool_steps() -> u32 {
    16
}
fn default_temperature() -> f32 {
    0.7
}
fn default_reasoning_effort() -> Option<String> {
    Some("high".into())
}
fn default_app_title() -> String {
    "helperbot".into()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_model_timeout_secs(),
            max_tool_steps: default_max_tool_steps(),
            temperature: default_temperature(),
            max_tokens: None,
            reasoning_effort: default_reasoning_effort(),
            system_prompt_path: None,
            app_url: None,
            app_title: default_app_title(),
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tool_steps", &self.max_tool_steps)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("reasoning_effort", &self.reasoning_effort)
            .field("system_prompt_path", &self.system_prompt_path)
            .field("app_url", &self.app_url)
            .field("app_title", &self.app_title)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Upper bound on the rendered thread text
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Images attached to the user turn, most recent kept
    #[serde(default = "default_max_images")]
    pub max_images: usize,

    /// Ancestor comments walked above the trigger
    #[serde(default = "default_max_ancestors")]
    pub max_ancestors: usize,
}

fn default_max_chars() -> usize {
    40_000
}
fn default_max_images() -> usize {
    5
}
fn default_max_ancestors() -> usize {
    100
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            max_images: default_max_images(),
            max_ancestors: default_max_ancestors(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// The bot account; its own comments never trigger a reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Reddit requires a descriptive user agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Delay between listing polls when no new comments arrived
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    5
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            username: None,
            password: None,
            user_agent: None,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl std::fmt::Debug for RedditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("user_agent", &self.user_agent)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// SearXNG instance root (without `/search`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searxng_base_url: Option<String>,

    /// Accept self-signed certificates from the SearXNG instance
    #[serde(default = "default_true")]
    pub searxng_accept_invalid_certs: bool,

    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u64,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_render_timeout_secs")]
    pub render_timeout_secs: u64,

    /// Upper bound on any single tool call
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Bytes read from a fetched page before giving up on the rest
    #[serde(default = "default_max_fetch_bytes")]
    pub max_fetch_bytes: usize,

    /// Hard cap on one serialized tool result
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,

    /// Lifetime of cached fetch/render results
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Headless render service; absent means `web_render` is unavailable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_url: Option<String>,

    /// User agent for fetch and render requests
    #[serde(default = "default_tool_user_agent")]
    pub user_agent: String,
}

fn default_search_timeout_secs() -> u64 {
    10
}
fn default_fetch_timeout_secs() -> u64 {
    15
}
fn default_render_timeout_secs() -> u64 {
    45
}
fn default_tool_timeout_secs() -> u64 {
    60
}
fn default_max_fetch_bytes() -> usize {
    1_500_000
}
fn default_max_output_chars() -> usize {
    20_000
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_tool_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36"
        .into()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            searxng_base_url: None,
            searxng_accept_invalid_certs: true,
            search_timeout_secs: default_search_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            render_timeout_secs: default_render_timeout_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
            max_fetch_bytes: default_max_fetch_bytes(),
            max_output_chars: default_max_output_chars(),
            cache_ttl_secs: default_cache_ttl_secs(),
            render_url: None,
            user_agent: default_tool_user_agent(),
        }
    }
}

/// One retry policy per call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Comment stream reconnects; unbounded attempts
    #[serde(default = "default_stream_retry")]
    pub stream: RetryPolicy,

    /// Model API calls
    #[serde(default = "default_model_retry")]
    pub model: RetryPolicy,

    /// Reply posting
    #[serde(default = "default_post_retry")]
    pub post: RetryPolicy,

    /// Search backend requests
    #[serde(default = "default_search_retry")]
    pub search: RetryPolicy,
}

fn default_stream_retry() -> RetryPolicy {
    RetryPolicy::new(0, Duration::from_secs(10)).with_max_delay(Duration::from_secs(300))
}
fn default_model_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_secs(2)).with_max_delay(Duration::from_secs(30))
}
fn default_post_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_secs(2)).with_max_delay(Duration::from_secs(30))
}
fn default_search_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_secs(1))
        .with_multiplier(1.0)
        .with_max_delay(Duration::from_secs(1))
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            stream: default_stream_retry(),
            model: default_model_retry(),
            post: default_post_retry(),
            search: default_search_retry(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.helperbot/config.toml)
    /// and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides and validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without environment
    /// overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply environment overrides. `lookup` abstracts `std::env::var` so
    /// tests don't have to mutate the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("OPENROUTER_API_KEY") {
            self.model.api_key = Some(v);
        }
        if let Some(v) = get("HELPERBOT_MODEL") {
            self.model.model = v;
        }
        if let Some(v) = get("REDDIT_CLIENT_ID") {
            self.reddit.client_id = Some(v);
        }
        if let Some(v) = get("REDDIT_CLIENT_SECRET") {
            self.reddit.client_secret = Some(v);
        }
        if let Some(v) = get("REDDIT_USERNAME") {
            self.reddit.username = Some(v);
        }
        if let Some(v) = get("REDDIT_PASSWORD") {
            self.reddit.password = Some(v);
        }
        if let Some(v) = get("USER_AGENT") {
            self.reddit.user_agent = Some(v);
        }
        if let Some(v) = get("SEARXNG_BASE_URL") {
            self.tools.searxng_base_url = Some(v.trim_end_matches('/').to_string());
        }
        if let Some(v) = get("HELPERBOT_RENDER_URL") {
            self.tools.render_url = Some(v.trim_end_matches('/').to_string());
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".helperbot")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bot.trigger_regex()?;

        if self.bot.subreddits.is_empty() {
            return Err(ConfigError::ValidationError(
                "bot.subreddits must name at least one subreddit (use \"all\" for everything)".into(),
            ));
        }

        if self.bot.dedup_capacity == 0 {
            return Err(ConfigError::ValidationError("bot.dedup_capacity must be > 0".into()));
        }

        if self.model.temperature < 0.0 || self.model.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.model.max_tool_steps < 1 {
            return Err(ConfigError::ValidationError("model.max_tool_steps must be >= 1".into()));
        }

        if self.transcript.max_chars < 1_000 {
            return Err(ConfigError::ValidationError(
                "transcript.max_chars must be >= 1000".into(),
            ));
        }

        if self.transcript.max_images > 20 {
            return Err(ConfigError::ValidationError(
                "transcript.max_images must be <= 20".into(),
            ));
        }

        for (name, policy) in [
            ("stream", &self.retry.stream),
            ("model", &self.retry.model),
            ("post", &self.retry.post),
            ("search", &self.retry.search),
        ] {
            policy
                .validate()
                .map_err(|e| ConfigError::ValidationError(format!("retry.{name}: {e}")))?;
        }

        Ok(())
    }

    /// Required secrets that are still unset, by environment variable name.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        REQUIRED_SECRETS
            .iter()
            .copied()
            .filter(|name| {
                let value = match *name {
                    "OPENROUTER_API_KEY" => &self.model.api_key,
                    "REDDIT_CLIENT_ID" => &self.reddit.client_id,
                    "REDDIT_CLIENT_SECRET" => &self.reddit.client_secret,
                    "REDDIT_USERNAME" => &self.reddit.username,
                    "REDDIT_PASSWORD" => &self.reddit.password,
                    "USER_AGENT" => &self.reddit.user_agent,
                    "SEARXNG_BASE_URL" => &self.tools.searxng_base_url,
                    _ => return false,
                };
                value.as_deref().is_none_or(|v| v.trim().is_empty())
            })
            .collect()
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bot.subreddits, vec!["all"]);
        assert_eq!(config.bot.rate_limit_secs, 10);
        assert_eq!(config.model.model, "moonshotai/kimi-k2.5");
        assert_eq!(config.model.max_tool_steps, 16);
        assert_eq!(config.transcript.max_chars, 40_000);
        assert_eq!(config.transcript.max_images, 5);
        assert_eq!(config.tools.max_fetch_bytes, 1_500_000);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.bot.trigger_pattern, config.bot.trigger_pattern);
        assert_eq!(parsed.retry.stream, config.retry.stream);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[bot]
subreddits = ["rust", "programming"]

[retry.post]
max_attempts = 5
base_delay_ms = 500
max_delay_ms = 4000
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.bot.subreddits, vec!["rust", "programming"]);
        assert_eq!(config.bot.rate_limit_secs, 10);
        assert_eq!(config.retry.post.max_attempts, 5);
        assert!((config.retry.post.multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.retry.model.max_attempts, 3);
    }

    #[test]
    fn unparseable_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bot\nsubreddits = 3").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.model.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn invalid_trigger_rejected() {
        let mut config = AppConfig::default();
        config.bot.trigger_pattern = "(unclosed".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_limits_rejected() {
        let mut config = AppConfig::default();
        config.transcript.max_chars = 10;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.model.max_tool_steps = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.retry.stream.jitter = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("OPENROUTER_API_KEY", "sk-or-test"),
            ("HELPERBOT_MODEL", "openrouter/free"),
            ("SEARXNG_BASE_URL", "https://search.local/searxng/"),
            ("REDDIT_USERNAME", "helperbot"),
            ("REDDIT_PASSWORD", "   "),
        ]));
        assert_eq!(config.model.api_key.as_deref(), Some("sk-or-test"));
        assert_eq!(config.model.model, "openrouter/free");
        assert_eq!(config.tools.searxng_base_url.as_deref(), Some("https://search.local/searxng"));
        assert_eq!(config.reddit.username.as_deref(), Some("helperbot"));
        assert!(config.reddit.password.is_none());
    }

    #[test]
    fn missing_credentials_listed() {
        let config = AppConfig::default();
        assert_eq!(config.missing_credentials().len(), REQUIRED_SECRETS.len());

        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("OPENROUTER_API_KEY", "k"),
            ("REDDIT_CLIENT_ID", "id"),
            ("REDDIT_CLIENT_SECRET", "secret"),
            ("REDDIT_USERNAME", "bot"),
            ("REDDIT_PASSWORD", "pw"),
            ("USER_AGENT", "helperbot/0.1 by u/someone"),
        ]));
        assert_eq!(config.missing_credentials(), vec!["SEARXNG_BASE_URL"]);
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.model.api_key = Some("sk-or-very-secret".into());
        config.reddit.password = Some("hunter2".into());
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-or-very-secret"));
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("moonshotai/kimi-k2.5"));
        assert!(toml_str.contains("[retry.stream]"));
    }
}
