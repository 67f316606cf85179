//! 错误类型定义
//!
//! 分为三类：
//! - `BackendError` - 翻译后端（本地词典 / 在线词典 / AI）返回的错误
//! - `StorageError` - 持久化层错误
//! - `ConfigError` - 配置加载与校验错误
//!
//! `AppError` 是对外暴露的统一错误。注意翻译失败通常不会以错误返回，
//! 而是以降级的 `TranslationResult` 返回，只有输入无效和存储写失败才会冒泡。

use thiserror::Error;

use crate::models::BackendKind;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入无效（例如空文本）
    #[error("输入无效: {0}")]
    InvalidInput(String),
    /// 翻译后端错误
    #[error("翻译后端错误: {0}")]
    Backend(#[from] BackendError),
    /// 存储错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 翻译后端错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// 词典中未收录
    #[error("{backend} 未找到: {text}")]
    NotFound { backend: BackendKind, text: String },
    /// 网络请求失败
    #[error("{backend} 请求失败: {message}")]
    Transport { backend: BackendKind, message: String },
    /// 认证失败（API Key 无效或缺失）
    #[error("{backend} 认证失败: {message}")]
    Auth { backend: BackendKind, message: String },
    /// 调用超时
    #[error("{backend} 调用超时 ({seconds}秒)")]
    Timeout { backend: BackendKind, seconds: u64 },
}

impl BackendError {
    /// 出错的后端
    pub fn backend(&self) -> BackendKind {
        match self {
            BackendError::NotFound { backend, .. }
            | BackendError::Transport { backend, .. }
            | BackendError::Auth { backend, .. }
            | BackendError::Timeout { backend, .. } => *backend,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
    }

    pub fn transport(backend: BackendKind, message: impl Into<String>) -> Self {
        BackendError::Transport {
            backend,
            message: message.into(),
        }
    }

    pub fn auth(backend: BackendKind, message: impl Into<String>) -> Self {
        BackendError::Auth {
            backend,
            message: message.into(),
        }
    }

    pub fn not_found(backend: BackendKind, text: impl Into<String>) -> Self {
        BackendError::NotFound {
            backend,
            text: text.into(),
        }
    }
}

/// 存储层错误
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// 存储不可用
    #[error("存储不可用: {0}")]
    Unavailable(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    InvalidValue { field: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建输入无效错误
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }
}

impl ConfigError {
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 存储层结果类型
pub type StorageResult<T> = Result<T, StorageError>;
