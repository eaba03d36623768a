//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. calendar-assistant.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。
//! API キーが設定されていない場合もエラーにはならず、縮退モードで起動します。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "calendar-assistant.toml";

/// LLM Provider type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Mistral (OpenAI-compatible chat completions)
    #[default]
    Mistral,
    /// Anthropic Claude API
    Claude,
    /// OpenAI-compatible API
    OpenAi,
}

impl LlmProvider {
    /// Parse a provider name, falling back to the default provider
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => LlmProvider::Claude,
            "openai" | "glm" | "zai" => LlmProvider::OpenAi,
            _ => LlmProvider::Mistral,
        }
    }

    /// Base URL used when none is configured
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::Mistral => "https://api.mistral.ai/v1",
            LlmProvider::Claude => "https://api.anthropic.com/v1",
            LlmProvider::OpenAi => "https://api.openai.com/v1",
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key (empty = degraded mode)
    #[serde(default)]
    pub api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API provider
    #[serde(default)]
    pub provider: LlmProvider,

    /// Base URL (optional, for custom endpoints)
    pub base_url: Option<String>,

    /// Max tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            provider: LlmProvider::default(),
            base_url: None,
            max_tokens: default_max_tokens(),
        }
    }
}

impl LlmConfig {
    /// Whether an upstream credential is available
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Effective base URL for the configured provider
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }
}

fn default_model() -> String {
    "mistral-large-latest".to_string()
}

fn default_max_tokens() -> u64 {
    1024
}

/// Main configuration for calendar-assistant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Schedule configuration
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API key for HTTP API authentication
    pub key: Option<String>,

    /// Port for HTTP API server
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Allowed CORS origins (e.g., ["http://localhost:3000"])
    /// If empty, any origin is allowed
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            port: default_api_port(),
            allowed_origins: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seed the store with the sample day on startup
    #[serde(default = "default_seed_sample_events")]
    pub seed_sample_events: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            seed_sample_events: default_seed_sample_events(),
        }
    }
}

fn default_api_port() -> u16 {
    3000
}

fn default_seed_sample_events() -> bool {
    true
}

fn parse_flag(value: &str) -> bool {
    value.to_lowercase() != "false"
}

impl Config {
    /// 設定ファイルから環境変数を展開する
    ///
    /// `${VAR_NAME}` 形式の文字列を環境変数の値に置換します。
    /// 環境変数が存在しない場合は空文字列になります。
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // '{' を消費

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// # 環境変数展開
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換されます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)?;

        let mut cfg = Self::from_toml_str(&toml_content)?;

        // 既存の環境変数で上書き（環境変数が優先）
        cfg.apply_env_overrides();

        Ok(cfg)
    }

    /// TOML 文字列から設定を構築する（環境変数の上書きなし）
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded_content = Self::expand_env_vars(content);

        let config: TomlConfig = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        Ok(Self::from_toml_config(config))
    }

    /// デフォルトパスから設定を読み込む
    ///
    /// `./calendar-assistant.toml` があればそれを使い、
    /// 見つからない場合は環境変数のみから読み込みます。
    pub fn load() -> crate::Result<Self> {
        if Path::new(CONFIG_FILE_NAME).exists() {
            return Self::from_toml_file(CONFIG_FILE_NAME);
        }

        Ok(Self::from_env())
    }

    /// TOML 構造から Config を構築
    fn from_toml_config(toml: TomlConfig) -> Self {
        let llm = toml.llm.unwrap_or_default();
        let llm_config = LlmConfig {
            api_key: llm.api_key.unwrap_or_default(),
            model: llm.model.unwrap_or_else(default_model),
            provider: llm
                .provider
                .as_deref()
                .map(LlmProvider::from_name)
                .unwrap_or_default(),
            base_url: llm.base_url,
            max_tokens: llm.max_tokens.unwrap_or_else(default_max_tokens),
        };

        let api = toml.api.unwrap_or_default();
        let api_config = ApiConfig {
            key: api.key,
            port: api.port.unwrap_or_else(default_api_port),
            allowed_origins: api.allowed_origins,
        };

        let schedule = toml.schedule.unwrap_or_default();
        let schedule_config = ScheduleConfig {
            seed_sample_events: schedule
                .seed_sample_events
                .unwrap_or_else(default_seed_sample_events),
        };

        Config {
            llm: llm_config,
            api: api_config,
            schedule: schedule_config,
        }
    }

    /// 環境変数で設定を上書きする
    fn apply_env_overrides(&mut self) {
        // MISTRAL_API_KEY より LLM_API_KEY を優先
        if let Ok(api_key) = std::env::var("MISTRAL_API_KEY") {
            if !api_key.is_empty() {
                self.llm.api_key = api_key;
            }
        }
        if let Ok(api_key) = std::env::var("LLM_API_KEY") {
            if !api_key.is_empty() {
                self.llm.api_key = api_key;
            }
        }

        if let Ok(model) = std::env::var("LLM_MODEL") {
            if !model.is_empty() {
                self.llm.model = model;
            }
        }

        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            if !provider.is_empty() {
                self.llm.provider = LlmProvider::from_name(&provider);
            }
        }

        if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
            if !base_url.is_empty() {
                self.llm.base_url = Some(base_url);
            }
        }

        if let Ok(max_tokens) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(n) = max_tokens.parse() {
                self.llm.max_tokens = n;
            }
        }

        // API 設定の上書き
        if let Ok(key) = std::env::var("API_KEY") {
            if !key.is_empty() {
                self.api.key = Some(key);
            }
        }
        if let Ok(port) = std::env::var("API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }
        if let Ok(origins) = std::env::var("API_ALLOWED_ORIGINS") {
            self.api.allowed_origins = Some(
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }

        if let Ok(seed) = std::env::var("SEED_SAMPLE_EVENTS") {
            self.schedule.seed_sample_events = parse_flag(&seed);
        }
    }

    /// Load configuration from environment variables
    ///
    /// A missing API key is not an error; the server then runs in degraded mode.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }
}

// ============================================================================
// TOML 構造体定義（ファイル解析用）
// ============================================================================

/// TOML ファイル用のトップレベル構造
#[derive(Debug, Deserialize)]
struct TomlConfig {
    /// LLM 設定
    llm: Option<TomlLlmConfig>,
    /// HTTP API 設定
    api: Option<TomlApiConfig>,
    /// スケジュール設定
    schedule: Option<TomlScheduleConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlLlmConfig {
    /// API プロバイダー ("mistral", "claude", "openai")
    #[serde(default)]
    provider: Option<String>,
    /// モデル名
    #[serde(default)]
    model: Option<String>,
    /// API キー
    #[serde(default)]
    api_key: Option<String>,
    /// ベース URL (オプション)
    #[serde(default)]
    base_url: Option<String>,
    /// 最大トークン数
    #[serde(default)]
    max_tokens: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlApiConfig {
    /// API キー (オプション)
    #[serde(default)]
    key: Option<String>,
    /// ポート番号
    #[serde(default)]
    port: Option<u16>,
    /// 許可する CORS オリジン
    #[serde(default)]
    allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlScheduleConfig {
    /// サンプルイベントで初期化するか
    #[serde(default)]
    seed_sample_events: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_provider_default() {
        assert_eq!(LlmProvider::default(), LlmProvider::Mistral);
    }

    #[test]
    fn test_llm_provider_from_name() {
        assert_eq!(LlmProvider::from_name("Claude"), LlmProvider::Claude);
        assert_eq!(LlmProvider::from_name("openai"), LlmProvider::OpenAi);
        assert_eq!(LlmProvider::from_name("mistral"), LlmProvider::Mistral);
        assert_eq!(LlmProvider::from_name("unknown"), LlmProvider::Mistral);
    }

    #[test]
    fn test_llm_config_default() {
        let config = LlmConfig::default();
        assert_eq!(config.model, "mistral-large-latest");
        assert_eq!(config.provider, LlmProvider::Mistral);
        assert!(config.api_key.is_empty());
        assert!(config.base_url.is_none());
        assert!(!config.is_configured());
        assert_eq!(config.effective_base_url(), "https://api.mistral.ai/v1");
    }

    #[test]
    fn test_llm_config_is_configured() {
        let mut config = LlmConfig::default();
        config.api_key = "   ".to_string();
        assert!(!config.is_configured());

        config.api_key = "secret".to_string();
        assert!(config.is_configured());
    }

    #[test]
    fn test_api_config_default() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 3000);
        assert!(config.key.is_none());
        assert!(config.allowed_origins.is_none());
    }

    #[test]
    fn test_schedule_config_default() {
        assert!(ScheduleConfig::default().seed_sample_events);
    }

    #[test]
    fn test_expand_env_vars() {
        // テスト用環境変数を設定
        unsafe {
            std::env::set_var("CA_CORE_TEST_VAR", "test_value");
        }

        let result = Config::expand_env_vars("prefix_${CA_CORE_TEST_VAR}_suffix");
        assert_eq!(result, "prefix_test_value_suffix");

        // 存在しない環境変数
        let result = Config::expand_env_vars("prefix_${CA_CORE_NONEXISTENT_VAR}_suffix");
        assert_eq!(result, "prefix__suffix");

        unsafe {
            std::env::remove_var("CA_CORE_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        let result = Config::expand_env_vars("no_vars_here $HOME");
        assert_eq!(result, "no_vars_here $HOME");
    }

    #[test]
    fn test_expand_env_vars_empty_name() {
        let result = Config::expand_env_vars("${}_content");
        assert_eq!(result, "_content");
    }

    #[test]
    fn test_toml_config_parsing() {
        let toml_content = r#"
[llm]
provider = "claude"
model = "claude-sonnet-4-20250514"
api_key = "test_key"
base_url = "https://api.example.com"
max_tokens = 2048

[api]
port = 8080
key = "api_key"
allowed_origins = ["http://localhost:5173"]

[schedule]
seed_sample_events = false
"#;

        let config = Config::from_toml_str(toml_content).unwrap();

        assert_eq!(config.llm.provider, LlmProvider::Claude);
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");
        assert_eq!(config.llm.api_key, "test_key");
        assert_eq!(config.llm.effective_base_url(), "https://api.example.com");
        assert_eq!(config.llm.max_tokens, 2048);

        assert_eq!(config.api.port, 8080);
        assert_eq!(config.api.key, Some("api_key".to_string()));
        assert_eq!(
            config.api.allowed_origins,
            Some(vec!["http://localhost:5173".to_string()])
        );

        assert!(!config.schedule.seed_sample_events);
    }

    #[test]
    fn test_toml_config_missing_key_is_degraded_not_error() {
        let config = Config::from_toml_str("[api]\nport = 4000\n").unwrap();
        assert!(!config.llm.is_configured());
        assert_eq!(config.llm.provider, LlmProvider::Mistral);
        assert_eq!(config.api.port, 4000);
        assert!(config.schedule.seed_sample_events);
    }

    #[test]
    fn test_toml_config_invalid() {
        let result = Config::from_toml_str("[llm\nmodel = ");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_toml_file_missing_is_io_error() {
        let result = Config::from_toml_file("does-not-exist/calendar-assistant.toml");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("FALSE"));
    }
}
