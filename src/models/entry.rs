//! 词条模型
//!
//! `NewEntry` 是尚未保存的草稿，`VocabularyEntry` 是已持久化的词条。
//! 指纹（用于同一语言对下的唯一性）在构造草稿时立即计算。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::translation::{EntryType, TranslationContext, TranslationResult, TranslatorType};

/// 词条 ID
pub type EntryId = u64;

/// 初始难度系数
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// 词条唯一性键：(原文哈希, 源语言, 目标语言)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryFingerprint {
    pub text_hash: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl EntryFingerprint {
    pub fn compute(source_text: &str, source_lang: &str, target_lang: &str) -> Self {
        Self {
            text_hash: blake3::hash(source_text.trim().as_bytes())
                .to_hex()
                .to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        }
    }
}

/// 词条生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EntryState {
    Active,
    /// 软删除
    Deleted { deleted_at: DateTime<Utc> },
}

/// SM-2 调度状态
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub review_count: u32,
    pub correct_count: u32,
    pub last_review_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub proficiency: u8,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: 0,
            review_count: 0,
            correct_count: 0,
            last_review_at: None,
            next_review_at: None,
            proficiency: 0,
        }
    }
}

impl ReviewState {
    /// 是否从未复习过
    pub fn is_new(&self) -> bool {
        self.review_count == 0
    }
}

/// 来源信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub translator_type: Option<TranslatorType>,
    /// 翻译耗时（秒）
    pub translation_time: Option<f64>,
    pub source_app: Option<String>,
    pub source_url: Option<String>,
    pub context: Option<String>,
}

/// 待保存的词条草稿
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub source_text: String,
    pub translation: String,
    pub source_lang: String,
    pub target_lang: String,
    pub entry_type: EntryType,
    pub provenance: Provenance,
    fingerprint: EntryFingerprint,
}

impl NewEntry {
    pub fn new(
        source_text: impl Into<String>,
        translation: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
        entry_type: EntryType,
    ) -> Self {
        let source_text = source_text.into().trim().to_string();
        let source_lang = source_lang.into();
        let target_lang = target_lang.into();
        let fingerprint = EntryFingerprint::compute(&source_text, &source_lang, &target_lang);
        Self {
            source_text,
            translation: translation.into(),
            source_lang,
            target_lang,
            entry_type,
            provenance: Provenance::default(),
            fingerprint,
        }
    }

    /// 从翻译结果构建草稿
    pub fn from_translation(
        source_text: &str,
        result: &TranslationResult,
        context: Option<&TranslationContext>,
    ) -> Self {
        let mut entry = Self::new(
            source_text,
            result.translation.clone(),
            result.source_lang.clone(),
            result.target_lang.clone(),
            result.entry_type,
        );
        entry.provenance = Provenance {
            translator_type: result.translator_type,
            translation_time: result.translation_time,
            source_app: context.and_then(|c| c.app.clone()),
            source_url: context.and_then(|c| c.url.clone()),
            context: context.and_then(|c| c.text.clone()),
        };
        entry
    }

    pub fn fingerprint(&self) -> &EntryFingerprint {
        &self.fingerprint
    }
}

/// 已保存的词条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub id: EntryId,
    pub source_text: String,
    pub translation: String,
    pub source_lang: String,
    pub target_lang: String,
    pub entry_type: EntryType,
    pub fingerprint: EntryFingerprint,
    pub review: ReviewState,
    pub provenance: Provenance,
    pub state: EntryState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VocabularyEntry {
    /// 由草稿创建新词条（调度状态为初始值）
    pub fn from_new(id: EntryId, draft: NewEntry, now: DateTime<Utc>) -> Self {
        Self {
            id,
            source_text: draft.source_text,
            translation: draft.translation,
            source_lang: draft.source_lang,
            target_lang: draft.target_lang,
            entry_type: draft.entry_type,
            fingerprint: draft.fingerprint,
            review: ReviewState::default(),
            provenance: draft.provenance,
            state: EntryState::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, EntryState::Active)
    }

    /// 重新翻译时更新内容字段，调度状态保持不变
    pub fn update_content(&mut self, draft: &NewEntry, now: DateTime<Utc>) {
        self.translation = draft.translation.clone();
        self.entry_type = draft.entry_type;
        self.provenance.translator_type = draft.provenance.translator_type;
        self.provenance.translation_time = draft.provenance.translation_time;
        self.updated_at = now;
    }

    /// 应用一次复习结果
    pub fn apply_review(&mut self, update: &ReviewUpdate) {
        self.review.ease_factor = update.ease_factor;
        self.review.interval_days = update.interval_days;
        self.review.next_review_at = Some(update.next_review_at);
        self.review.proficiency = update.proficiency;

        if let ReviewOutcome::Answered { correct } = update.outcome {
            self.review.last_review_at = Some(update.reviewed_at);
            self.review.review_count += 1;
            if correct {
                self.review.correct_count += 1;
            }
        }

        self.updated_at = update.reviewed_at;
    }

    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.state = EntryState::Deleted { deleted_at: now };
        self.updated_at = now;
    }
}

/// 复习结果类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewOutcome {
    /// 一次正常作答
    Answered { correct: bool },
    /// 重置进度，不计入复习次数
    Reset,
}

/// 写回存储的复习数据
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewUpdate {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub next_review_at: DateTime<Utc>,
    pub proficiency: u8,
    pub reviewed_at: DateTime<Utc>,
    pub outcome: ReviewOutcome,
}
