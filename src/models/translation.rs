//! 翻译相关的数据类型

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// 翻译后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// 本地词典（离线）
    LocalDictionary,
    /// 在线词典
    OnlineDictionary,
    /// AI 翻译
    Ai,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::LocalDictionary,
        BackendKind::OnlineDictionary,
        BackendKind::Ai,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::LocalDictionary => "local_dict",
            BackendKind::OnlineDictionary => "online_dict",
            BackendKind::Ai => "ai",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 翻译结果来源标记
///
/// 除了三个后端本身，还包含降级流程产生的标记，供 UI 区分展示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslatorType {
    LocalDict,
    OnlineDict,
    Ai,
    /// 本地词典未收录，由 AI 兜底翻译
    AiFallback,
    /// 本地词典未收录，且未配置 AI
    LocalDictNotFound,
    /// 翻译失败
    Failed,
}

impl TranslatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslatorType::LocalDict => "local_dict",
            TranslatorType::OnlineDict => "online_dict",
            TranslatorType::Ai => "ai",
            TranslatorType::AiFallback => "ai_fallback",
            TranslatorType::LocalDictNotFound => "local_dict_not_found",
            TranslatorType::Failed => "failed",
        }
    }

    /// 降级结果（提示信息而非真正的译文）
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            TranslatorType::LocalDictNotFound | TranslatorType::Failed
        )
    }

    /// 结果是否由 AI 产生
    pub fn used_ai(&self) -> bool {
        matches!(self, TranslatorType::Ai | TranslatorType::AiFallback)
    }
}

impl From<BackendKind> for TranslatorType {
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::LocalDictionary => TranslatorType::LocalDict,
            BackendKind::OnlineDictionary => TranslatorType::OnlineDict,
            BackendKind::Ai => TranslatorType::Ai,
        }
    }
}

impl Display for TranslatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 词条类型（按文本长度分类）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Word,
    Phrase,
    Sentence,
    Paragraph,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Word => "word",
            EntryType::Phrase => "phrase",
            EntryType::Sentence => "sentence",
            EntryType::Paragraph => "paragraph",
        }
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "word" => Ok(EntryType::Word),
            "phrase" => Ok(EntryType::Phrase),
            "sentence" => Ok(EntryType::Sentence),
            "paragraph" => Ok(EntryType::Paragraph),
            other => Err(format!("未知的词条类型: {}", other)),
        }
    }
}

/// 翻译结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translation: String,
    pub source_lang: String,
    pub target_lang: String,
    pub entry_type: EntryType,

    // --- 扩展信息 ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    // --- 元数据 ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translator_type: Option<TranslatorType>,
    /// 后端调用耗时（秒）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_time: Option<f64>,
    /// AI 消耗的 tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    /// 是否命中缓存
    #[serde(default)]
    pub from_cache: bool,
    /// 保存后的词条 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<u64>,
}

impl TranslationResult {
    /// 创建只有译文的结果
    pub fn new(
        translation: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
        entry_type: EntryType,
    ) -> Self {
        Self {
            translation: translation.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            entry_type,
            explanation: None,
            pronunciation: None,
            examples: Vec::new(),
            domain: None,
            translator_type: None,
            translation_time: None,
            tokens_used: None,
            from_cache: false,
            entry_id: None,
        }
    }

    pub fn with_translator(mut self, translator_type: TranslatorType) -> Self {
        self.translator_type = Some(translator_type);
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.translator_type
            .map(|t| t.is_degraded())
            .unwrap_or(false)
    }
}

impl Display for TranslationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.translation)
    }
}

/// 翻译上下文（来源应用、URL、周边文本）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
