//! 翻译后端客户端 - 外部能力层
//!
//! 每个后端只负责“把一段文本翻译出来”，不关心缓存、路由和持久化：
//! - `LocalDictionary` - 本地 JSON 词典
//! - `OnlineDictionary` - 有道 / 金山词霸 HTTP 接口
//! - `AiTranslator` - OpenAI 兼容的大模型接口

pub mod ai_client;
pub mod local_dict;
pub mod online_dict;

pub use ai_client::AiTranslator;
pub use local_dict::LocalDictionary;
pub use online_dict::OnlineDictionary;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::models::{BackendKind, TranslationResult};

/// 翻译后端的统一接口
///
/// 未收录返回 `BackendError::NotFound`，网络 / 认证问题返回对应错误，
/// 由路由层决定是否降级。
#[async_trait]
pub trait Translator: Send + Sync {
    /// 后端类型
    fn kind(&self) -> BackendKind;

    /// 翻译文本
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationResult, BackendError>;
}
