//! 本地词典翻译器（离线查询）
//!
//! 词典文件是一个 JSON 对象，键为单词，值为词条：
//! ```json
//! { "hello": { "translation": "你好", "pronunciation": "/həˈləʊ/", "examples": ["Hello!"] } }
//! ```
//! 值也可以直接是译文字符串。

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use super::Translator;
use crate::error::BackendError;
use crate::models::{BackendKind, EntryType, TranslationResult};

/// 词典中的一条记录
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DictRecord {
    pub translation: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub pronunciation: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecord {
    Plain(String),
    Full(DictRecord),
}

impl From<RawRecord> for DictRecord {
    fn from(raw: RawRecord) -> Self {
        match raw {
            RawRecord::Plain(translation) => DictRecord {
                translation,
                ..Default::default()
            },
            RawRecord::Full(record) => record,
        }
    }
}

/// 本地词典翻译器
#[derive(Debug, Clone, Default)]
pub struct LocalDictionary {
    words: BTreeMap<String, DictRecord>,
}

impl LocalDictionary {
    /// 从文件加载词典
    ///
    /// 文件不存在或格式错误时返回空词典并记录警告，查询全部视为未收录
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("⚠️ 词典文件读取失败 ({}): {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_json_str(&content) {
            Ok(dict) => {
                info!("📖 本地词典加载完成，共 {} 个词条", dict.word_count());
                dict
            }
            Err(e) => {
                warn!("⚠️ 词典文件解析失败 ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// 从 JSON 文本解析词典
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, RawRecord> = serde_json::from_str(content)?;
        Ok(Self::from_entries(
            raw.into_iter().map(|(word, record)| (word, record.into())),
        ))
    }

    /// 从内存中的词条构建词典
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, DictRecord)>,
        S: AsRef<str>,
    {
        let words = entries
            .into_iter()
            .map(|(word, record)| (normalize(word.as_ref()), record))
            .collect();
        Self { words }
    }

    /// 词典词数
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn lookup(&self, word: &str) -> Option<&DictRecord> {
        self.words.get(&normalize(word))
    }
}

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

#[async_trait]
impl Translator for LocalDictionary {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalDictionary
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationResult, BackendError> {
        let Some(record) = self.lookup(text) else {
            debug!("本地词典未找到: {}", text.trim());
            return Err(BackendError::not_found(self.kind(), text.trim()));
        };

        debug!("本地词典查询成功: {} → {}", text.trim(), record.translation);

        let mut result =
            TranslationResult::new(&record.translation, source_lang, target_lang, EntryType::Word);
        result.explanation = record.explanation.clone();
        result.pronunciation = record.pronunciation.clone();
        result.examples = record.examples.clone();
        Ok(result)
    }
}
