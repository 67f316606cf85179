//! AI 翻译器 - 外部能力层
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 调用 OpenAI 兼容的 Chat Completion 接口
//! - `openai` 与 `dashscope`（通义千问兼容模式）共用同一套调用逻辑，只是默认地址不同
//!
//! 模型输出为空时返回带失败说明的结果（`translator_type = failed`），
//! 网络和认证问题以 `BackendError` 返回。

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use phf::phf_map;
use serde::Deserialize;
use tracing::{debug, warn};

use super::Translator;
use crate::config::AiConfig;
use crate::error::BackendError;
use crate::models::{BackendKind, EntryType, TranslationResult, TranslatorType};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// 提供商默认接口地址
static PROVIDER_BASE_URLS: phf::Map<&'static str, &'static str> = phf_map! {
    "openai" => OPENAI_BASE_URL,
    "dashscope" => "https://dashscope.aliyuncs.com/compatible-mode/v1",
};

/// 语言代码 → 提示词中的语言名称
static LANGUAGE_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "en" => "英语",
    "zh" => "中文",
    "ja" => "日语",
    "ko" => "韩语",
    "fr" => "法语",
    "de" => "德语",
    "es" => "西班牙语",
    "ru" => "俄语",
    "el" => "希腊语",
    "ar" => "阿拉伯语",
};

const SYSTEM_PROMPT: &str = "你是一个专业的翻译助手。";

/// 模型以 JSON 形式返回时的结构
#[derive(Debug, Deserialize)]
struct AiPayload {
    #[serde(default)]
    translation: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    domain: Option<String>,
}

/// AI 翻译器
pub struct AiTranslator {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AiTranslator {
    /// 创建 AI 翻译器
    ///
    /// `base_url` 为空时使用提供商的默认地址，未知提供商按 OpenAI 处理
    pub fn new(config: &AiConfig) -> Self {
        if !config.is_configured() {
            warn!("⚠️ AI API Key 未配置");
        }

        let base_url = if config.base_url.trim().is_empty() {
            let provider = config.provider.trim().to_lowercase();
            PROVIDER_BASE_URLS
                .get(provider.as_str())
                .copied()
                .unwrap_or_else(|| {
                    warn!("⚠️ 不支持的 AI 提供商: {}，按 OpenAI 兼容接口处理", provider);
                    OPENAI_BASE_URL
                })
                .to_string()
        } else {
            config.base_url.trim().to_string()
        };

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&base_url);

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 调用模型，返回 (回复内容, 消耗 token 数)
    async fn chat(&self, prompt: &str) -> Result<(Option<String>, Option<u32>), BackendError> {
        debug!("调用 AI 翻译，模型: {}", self.model);

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(map_openai_error)?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(map_openai_error)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(map_openai_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let tokens = response.usage.as_ref().map(|u| u.total_tokens);
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);

        Ok((content, tokens))
    }
}

#[async_trait]
impl Translator for AiTranslator {
    fn kind(&self) -> BackendKind {
        BackendKind::Ai
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationResult, BackendError> {
        let prompt = build_prompt(text, source_lang, target_lang);

        let (content, tokens) = self.chat(&prompt).await.inspect_err(|e| {
            warn!("⚠️ AI 翻译失败: {}", e);
        })?;

        let mut result = parse_content(content.as_deref(), source_lang, target_lang);
        result.tokens_used = tokens;
        Ok(result)
    }
}

/// 构建翻译提示词
fn build_prompt(text: &str, source_lang: &str, target_lang: &str) -> String {
    let source_name = LANGUAGE_NAMES.get(source_lang).copied().unwrap_or(source_lang);
    let target_name = LANGUAGE_NAMES.get(target_lang).copied().unwrap_or(target_lang);

    format!(
        "请将以下{source_name}文本翻译成{target_name}，要求：\n\
         1. 准确传达原意\n\
         2. 符合{target_name}表达习惯\n\
         3. 保持原文的语气和风格\n\
         \n\
         原文：\n\
         {text}\n\
         \n\
         请直接返回翻译结果，无需其他说明。"
    )
}

/// 解析模型回复
///
/// 优先按 JSON（translation / explanation / domain）解析，否则把整段文本当作译文。
/// 回复为空时返回失败结果。
fn parse_content(content: Option<&str>, source_lang: &str, target_lang: &str) -> TranslationResult {
    let content = content.map(str::trim).unwrap_or_default();
    let entry_type = EntryType::Sentence;

    if content.is_empty() {
        return TranslationResult::new("翻译失败: AI 返回内容为空", source_lang, target_lang, entry_type)
            .with_translator(TranslatorType::Failed);
    }

    if let Ok(payload) = serde_json::from_str::<AiPayload>(content) {
        return match payload.translation.filter(|t| !t.trim().is_empty()) {
            Some(translation) => {
                let mut result =
                    TranslationResult::new(translation.trim(), source_lang, target_lang, entry_type);
                result.explanation = payload.explanation;
                result.domain = payload.domain;
                result
            }
            None => TranslationResult::new(
                "翻译失败: 无法解析 AI 响应",
                source_lang,
                target_lang,
                entry_type,
            )
            .with_translator(TranslatorType::Failed),
        };
    }

    TranslationResult::new(content, source_lang, target_lang, entry_type)
}

fn map_openai_error(e: OpenAIError) -> BackendError {
    match &e {
        OpenAIError::ApiError(api) if is_auth_error(api.code.as_deref(), &api.message) => {
            BackendError::auth(BackendKind::Ai, api.message.clone())
        }
        _ => BackendError::transport(BackendKind::Ai, e.to_string()),
    }
}

fn is_auth_error(code: Option<&str>, message: &str) -> bool {
    matches!(code, Some("invalid_api_key") | Some("InvalidApiKey"))
        || message.to_lowercase().contains("api key")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_uses_language_names() {
        let prompt = build_prompt("hello world", "en", "zh");
        assert!(prompt.contains("请将以下英语文本翻译成中文"));
        assert!(prompt.contains("符合中文表达习惯"));
        assert!(prompt.contains("hello world"));

        let prompt = build_prompt("bonjour", "fr", "ja");
        assert!(prompt.contains("请将以下fr文本翻译成日语"));
    }

    #[test]
    fn test_parse_plain_text() {
        let result = parse_content(Some("  你好，世界  "), "en", "zh");
        assert_eq!(result.translation, "你好，世界");
        assert!(!result.is_degraded());
    }

    #[test]
    fn test_parse_json_payload() {
        let content = r#"{"translation": "机器学习", "explanation": "AI 的分支", "domain": "计算机"}"#;
        let result = parse_content(Some(content), "en", "zh");
        assert_eq!(result.translation, "机器学习");
        assert_eq!(result.explanation.as_deref(), Some("AI 的分支"));
        assert_eq!(result.domain.as_deref(), Some("计算机"));
    }

    #[test]
    fn test_parse_empty_or_unusable_is_failure() {
        let result = parse_content(None, "en", "zh");
        assert_eq!(result.translator_type, Some(TranslatorType::Failed));
        assert!(result.translation.starts_with("翻译失败"));

        let result = parse_content(Some("   "), "en", "zh");
        assert!(result.is_degraded());

        let result = parse_content(Some(r#"{"domain": "x"}"#), "en", "zh");
        assert!(result.is_degraded());
    }

    #[test]
    fn test_auth_error_detection() {
        assert!(is_auth_error(Some("invalid_api_key"), "Incorrect key"));
        assert!(is_auth_error(None, "Invalid API key provided"));
        assert!(!is_auth_error(Some("rate_limit_exceeded"), "Too many requests"));
    }

    #[test]
    fn test_unknown_provider_still_builds() {
        let config = AiConfig {
            provider: "unknown".to_string(),
            api_key: "sk-test".to_string(),
            ..Default::default()
        };
        let translator = AiTranslator::new(&config);
        assert_eq!(translator.model(), "qwen-turbo");
        assert_eq!(translator.kind(), BackendKind::Ai);
    }
}
