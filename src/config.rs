//! 程序配置
//!
//! 配置来源按优先级：环境变量 > TOML 配置文件 > 默认值。
//! 核心逻辑只读取配置，不会修改。

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translation: TranslationConfig,
    pub cache: CacheConfig,
    pub features: FeaturesConfig,
    pub review: ReviewConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
}

/// 翻译配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// 强制使用 AI 翻译
    pub force_ai: bool,
    /// 词数 <= 该值视为单词
    pub word_threshold: usize,
    /// 词数 <= 该值视为短语
    pub phrase_threshold: usize,
    /// 默认目标语言
    pub default_target_lang: String,
    pub local_dict: LocalDictConfig,
    pub online_dict: OnlineDictConfig,
    pub ai: AiConfig,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            force_ai: false,
            word_threshold: 1,
            phrase_threshold: 5,
            default_target_lang: "zh".to_string(),
            local_dict: LocalDictConfig::default(),
            online_dict: OnlineDictConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

/// 本地词典配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalDictConfig {
    pub enabled: bool,
    /// 词典 JSON 文件路径
    pub path: String,
}

impl Default for LocalDictConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "data/dict/en-zh.json".to_string(),
        }
    }
}

/// 在线词典配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OnlineDictConfig {
    /// youdao / iciba
    pub provider: String,
    /// 金山词霸 key
    pub api_key: String,
    /// 有道智云应用 ID
    pub app_key: String,
    /// 有道智云应用密钥
    pub app_secret: String,
    pub timeout_secs: u64,
}

impl Default for OnlineDictConfig {
    fn default() -> Self {
        Self {
            provider: "youdao".to_string(),
            api_key: String::new(),
            app_key: String::new(),
            app_secret: String::new(),
            timeout_secs: 5,
        }
    }
}

/// AI 翻译配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// openai / dashscope（均使用 OpenAI 兼容接口）
    pub provider: String,
    pub model: String,
    pub api_key: String,
    /// 为空时使用提供商的默认地址
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "dashscope".to_string(),
            model: "qwen-turbo".to_string(),
            api_key: String::new(),
            base_url: String::new(),
            timeout_secs: 15,
            max_tokens: 500,
            temperature: 0.3,
        }
    }
}

impl AiConfig {
    /// 是否配置了 API Key
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// 缓存配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub expire_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            expire_days: 30,
        }
    }
}

/// 功能开关
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// 查询次数达到阈值后自动保存词条
    pub auto_save: bool,
    pub auto_save_threshold: u64,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            auto_save: true,
            auto_save_threshold: 3,
        }
    }
}

/// 复习配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// 每日复习目标（供 UI 展示）
    pub daily_goal: u32,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self { daily_goal: 50 }
    }
}

/// 性能配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// 批量翻译时的最大并发数
    pub max_concurrent_translations: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_translations: 3,
        }
    }
}

/// 日志配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// 从 TOML 文件加载配置，缺失的字段使用默认值
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 加载配置：文件不存在或解析失败时退回默认值，然后叠加环境变量
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let base = if path.exists() {
            match Self::from_file(path) {
                Ok(config) => {
                    info!("✓ 已加载配置文件: {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("⚠️ 加载配置文件失败 ({})，使用默认配置", e);
                    Self::default()
                }
            }
        } else {
            warn!("⚠️ 配置文件 {} 不存在，使用默认配置", path.display());
            return Self::from_env();
        };

        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 仅使用默认值 + 环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default().with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 用环境变量覆盖配置（主要用于密钥）
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        let ai = &mut self.translation.ai;
        override_string("TRANSLEARN_AI_API_KEY", &mut ai.api_key);
        override_string("TRANSLEARN_AI_BASE_URL", &mut ai.base_url);
        override_string("TRANSLEARN_AI_PROVIDER", &mut ai.provider);
        override_string("TRANSLEARN_AI_MODEL", &mut ai.model);

        let online = &mut self.translation.online_dict;
        override_string("TRANSLEARN_ONLINE_DICT_PROVIDER", &mut online.provider);
        override_string("TRANSLEARN_ONLINE_DICT_API_KEY", &mut online.api_key);
        override_string("TRANSLEARN_YOUDAO_APP_KEY", &mut online.app_key);
        override_string("TRANSLEARN_YOUDAO_APP_SECRET", &mut online.app_secret);

        override_string("TRANSLEARN_LOCAL_DICT_PATH", &mut self.translation.local_dict.path);
        override_string("TRANSLEARN_LOG_LEVEL", &mut self.logging.level);
        override_parsed("TRANSLEARN_FORCE_AI", &mut self.translation.force_ai, "bool")?;
        override_parsed("TRANSLEARN_CACHE_ENABLED", &mut self.cache.enabled, "bool")?;

        Ok(self)
    }

    /// 校验配置的一致性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.translation;
        if t.word_threshold > t.phrase_threshold {
            return Err(ConfigError::invalid_value(
                "translation.word_threshold",
                format!(
                    "单词阈值 {} 不能大于短语阈值 {}",
                    t.word_threshold, t.phrase_threshold
                ),
            ));
        }
        if t.default_target_lang.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "translation.default_target_lang",
                "目标语言不能为空",
            ));
        }
        if self.performance.max_concurrent_translations == 0 {
            return Err(ConfigError::invalid_value(
                "performance.max_concurrent_translations",
                "并发数必须大于 0",
            ));
        }
        Ok(())
    }
}

fn override_string(var_name: &str, target: &mut String) {
    if let Ok(value) = std::env::var(var_name) {
        *target = value;
    }
}

fn override_parsed<T: std::str::FromStr>(
    var_name: &str,
    target: &mut T,
    expected_type: &str,
) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var(var_name) {
        *target = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value: value.clone(),
                expected_type: expected_type.to_string(),
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.translation.word_threshold, 1);
        assert_eq!(config.translation.phrase_threshold, 5);
        assert_eq!(config.cache.expire_days, 30);
        assert_eq!(config.features.auto_save_threshold, 3);
        assert_eq!(config.review.daily_goal, 50);
        assert!(!config.translation.ai.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [translation]
            force_ai = true
            phrase_threshold = 8

            [translation.ai]
            api_key = "sk-test"

            [cache]
            expire_days = 7
            "#,
        )
        .unwrap();

        assert!(config.translation.force_ai);
        assert_eq!(config.translation.phrase_threshold, 8);
        assert_eq!(config.translation.word_threshold, 1);
        assert!(config.translation.ai.is_configured());
        assert_eq!(config.translation.ai.model, "qwen-turbo");
        assert_eq!(config.cache.expire_days, 7);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = Config::default();
        config.translation.word_threshold = 6;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_from_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[translation\nforce_ai = ").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseFailed { .. }));
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.translation.default_target_lang, "zh");
    }
}
