//! 翻译路由 - 业务能力层
//!
//! - `BackendRegistry` 负责后端实例的懒加载，每种后端最多创建一次
//! - `TranslatorRouter` 按文本长度选择后端，并执行降级协议：
//!   本地词典未收录 → AI 兜底（未配置 AI 时返回提示结果）→ 双双失败时返回失败结果
//!
//! 路由层从不向调用方返回错误，所有失败都以降级结果表示。

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::clients::{AiTranslator, LocalDictionary, OnlineDictionary, Translator};
use crate::config::TranslationConfig;
use crate::error::BackendError;
use crate::models::{BackendKind, EntryType, TranslationResult, TranslatorType};
use crate::services::language_detector::LanguageDetector;
use crate::utils::truncate_text;

/// 本地词典查询的超时时间
const LOCAL_LOOKUP_TIMEOUT_SECS: u64 = 2;

/// 失败结果中保留的 AI 错误信息长度
const FALLBACK_ERROR_MAX_CHARS: usize = 100;

/// 后端注册表
///
/// 由组合根持有并注入路由。每种后端在第一次使用时创建，之后复用同一实例。
pub struct BackendRegistry {
    config: TranslationConfig,
    local: OnceCell<Arc<dyn Translator>>,
    online: OnceCell<Arc<dyn Translator>>,
    ai: OnceCell<Arc<dyn Translator>>,
}

impl BackendRegistry {
    pub fn new(config: TranslationConfig) -> Self {
        Self {
            config,
            local: OnceCell::new(),
            online: OnceCell::new(),
            ai: OnceCell::new(),
        }
    }

    /// 预置一个后端实例（测试中用桩实现替换真实后端）
    pub fn with_backend(mut self, translator: Arc<dyn Translator>) -> Self {
        let cell = OnceCell::new_with(Some(translator.clone()));
        match translator.kind() {
            BackendKind::LocalDictionary => self.local = cell,
            BackendKind::OnlineDictionary => self.online = cell,
            BackendKind::Ai => self.ai = cell,
        }
        self
    }

    fn cell(&self, kind: BackendKind) -> &OnceCell<Arc<dyn Translator>> {
        match kind {
            BackendKind::LocalDictionary => &self.local,
            BackendKind::OnlineDictionary => &self.online,
            BackendKind::Ai => &self.ai,
        }
    }

    /// 获取后端实例，首次调用时创建
    pub async fn get(&self, kind: BackendKind) -> Arc<dyn Translator> {
        self.cell(kind)
            .get_or_init(|| self.build(kind))
            .await
            .clone()
    }

    /// 后端是否已经创建
    pub fn is_initialized(&self, kind: BackendKind) -> bool {
        self.cell(kind).initialized()
    }

    async fn build(&self, kind: BackendKind) -> Arc<dyn Translator> {
        info!("🔧 初始化翻译后端: {}", kind);
        match kind {
            BackendKind::LocalDictionary => {
                Arc::new(LocalDictionary::load(&self.config.local_dict.path).await)
            }
            BackendKind::OnlineDictionary => {
                let dict = OnlineDictionary::new(&self.config.online_dict);
                info!("🌐 在线词典: {}", dict.provider());
                Arc::new(dict)
            }
            BackendKind::Ai => {
                let translator = AiTranslator::new(&self.config.ai);
                info!("🤖 AI 模型: {}", translator.model());
                Arc::new(translator)
            }
        }
    }

    /// 是否可以使用 AI（配置了 API Key 或预置了 AI 后端）
    pub fn ai_available(&self) -> bool {
        self.config.ai.is_configured() || self.ai.initialized()
    }

    /// 每种后端的调用超时
    pub fn timeout(&self, kind: BackendKind) -> Duration {
        let secs = match kind {
            BackendKind::LocalDictionary => LOCAL_LOOKUP_TIMEOUT_SECS,
            BackendKind::OnlineDictionary => self.config.online_dict.timeout_secs,
            BackendKind::Ai => self.config.ai.timeout_secs,
        };
        Duration::from_secs(secs)
    }
}

/// 路由结果
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    /// 翻译成功，`backend` 为实际给出结果的后端
    Translated {
        result: TranslationResult,
        backend: BackendKind,
    },
    /// 降级结果（未收录提示或失败说明），不应缓存或保存
    Degraded(TranslationResult),
}

impl RouteOutcome {
    pub fn into_result(self) -> TranslationResult {
        match self {
            RouteOutcome::Translated { result, .. } | RouteOutcome::Degraded(result) => result,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, RouteOutcome::Degraded(_))
    }
}

/// 翻译路由
pub struct TranslatorRouter {
    registry: Arc<BackendRegistry>,
    force_ai: bool,
    local_dict_enabled: bool,
    word_threshold: usize,
    phrase_threshold: usize,
}

impl TranslatorRouter {
    pub fn new(config: &TranslationConfig, registry: Arc<BackendRegistry>) -> Self {
        Self {
            registry,
            force_ai: config.force_ai,
            local_dict_enabled: config.local_dict.enabled,
            word_threshold: config.word_threshold,
            phrase_threshold: config.phrase_threshold,
        }
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// 文本长度分类
    pub fn classify(&self, text: &str) -> EntryType {
        LanguageDetector::classify_length(text, self.word_threshold, self.phrase_threshold)
    }

    /// 选择翻译后端
    ///
    /// | 条件 | 后端 |
    /// |------|------|
    /// | 强制 AI | AI |
    /// | 单词 | 本地词典（禁用时用在线词典） |
    /// | 短语 | 在线词典 |
    /// | 句子 / 段落 | AI |
    pub fn choose_backend(&self, text: &str, source_lang: &str, force_ai: bool) -> BackendKind {
        if force_ai || self.force_ai {
            return BackendKind::Ai;
        }

        let entry_type = self.classify(text);
        let backend = match entry_type {
            EntryType::Word if self.local_dict_enabled => BackendKind::LocalDictionary,
            EntryType::Word | EntryType::Phrase => BackendKind::OnlineDictionary,
            EntryType::Sentence | EntryType::Paragraph => BackendKind::Ai,
        };

        debug!("路由: {} ({}, {}) → {}", truncate_text(text, 30), source_lang, entry_type, backend);
        backend
    }

    /// 使用指定后端翻译，并执行降级协议
    pub async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        backend: BackendKind,
    ) -> RouteOutcome {
        let entry_type = self.classify(text);

        let outcome = match self.call(backend, text, source_lang, target_lang).await {
            Ok(result) => Self::accept(result, backend, TranslatorType::from(backend)),
            Err(e) if e.is_not_found() && backend == BackendKind::LocalDictionary => {
                self.fallback_to_ai(text, source_lang, target_lang).await
            }
            Err(e) => {
                warn!("⚠️ {} 翻译失败: {}", backend, e);
                RouteOutcome::Degraded(
                    TranslationResult::new(
                        format!("❌ 翻译失败\n\n{}", truncate_text(&e.to_string(), FALLBACK_ERROR_MAX_CHARS)),
                        source_lang,
                        target_lang,
                        entry_type,
                    )
                    .with_translator(TranslatorType::Failed),
                )
            }
        };

        with_entry_type(outcome, entry_type)
    }

    /// 自动选择后端并翻译
    pub async fn route(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        force_ai: bool,
    ) -> RouteOutcome {
        let backend = self.choose_backend(text, source_lang, force_ai);
        self.translate(text, source_lang, target_lang, backend).await
    }

    async fn call(
        &self,
        backend: BackendKind,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationResult, BackendError> {
        let translator = self.registry.get(backend).await;
        let limit = self.registry.timeout(backend);

        match tokio::time::timeout(limit, translator.translate(text, source_lang, target_lang)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                backend,
                seconds: limit.as_secs(),
            }),
        }
    }

    /// 后端返回了结果：带失败标记的视为降级，否则打上来源标记
    fn accept(mut result: TranslationResult, backend: BackendKind, tag: TranslatorType) -> RouteOutcome {
        if result.is_degraded() {
            return RouteOutcome::Degraded(result);
        }
        result.translator_type = Some(tag);
        RouteOutcome::Translated { result, backend }
    }

    async fn fallback_to_ai(&self, text: &str, source_lang: &str, target_lang: &str) -> RouteOutcome {
        let entry_type = self.classify(text);

        if !self.registry.ai_available() {
            info!("📭 本地词典未收录「{}」，AI 未配置", text);
            return RouteOutcome::Degraded(
                TranslationResult::new(
                    format!(
                        "❌ 本地词典未收录「{}」\n\n💡 提示：配置 AI 翻译可获得更多内容\n在配置文件中设置 translation.ai.api_key 或环境变量 TRANSLEARN_AI_API_KEY",
                        text
                    ),
                    source_lang,
                    target_lang,
                    entry_type,
                )
                .with_translator(TranslatorType::LocalDictNotFound),
            );
        }

        info!("🔁 本地词典未收录「{}」，尝试 AI 翻译", text);

        let ai_error = match self.call(BackendKind::Ai, text, source_lang, target_lang).await {
            Ok(result) if !result.is_degraded() => {
                return Self::accept(result, BackendKind::Ai, TranslatorType::AiFallback);
            }
            Ok(result) => result.translation,
            Err(e) => e.to_string(),
        };

        warn!("⚠️ AI 兜底翻译失败: {}", ai_error);
        let ai_error: String = ai_error.chars().take(FALLBACK_ERROR_MAX_CHARS).collect();
        RouteOutcome::Degraded(
            TranslationResult::new(
                format!(
                    "❌ 翻译失败\n\n本地词典未收录「{}」\nAI 翻译也失败了：{}",
                    text, ai_error
                ),
                source_lang,
                target_lang,
                entry_type,
            )
            .with_translator(TranslatorType::Failed),
        )
    }
}

fn with_entry_type(mut outcome: RouteOutcome, entry_type: EntryType) -> RouteOutcome {
    match &mut outcome {
        RouteOutcome::Translated { result, .. } | RouteOutcome::Degraded(result) => {
            result.entry_type = entry_type;
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::local_dict::DictRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 固定返回的桩后端
    struct StubTranslator {
        kind: BackendKind,
        reply: Result<String, BackendError>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl StubTranslator {
        fn ok(kind: BackendKind, translation: &str) -> Arc<Self> {
            Arc::new(Self {
                kind,
                reply: Ok(translation.to_string()),
                delay: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn err(kind: BackendKind, error: BackendError) -> Arc<Self> {
            Arc::new(Self {
                kind,
                reply: Err(error),
                delay: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow(kind: BackendKind, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                kind,
                reply: Ok("太慢了".to_string()),
                delay: Some(delay),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Translator for StubTranslator {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        async fn translate(
            &self,
            _text: &str,
            source_lang: &str,
            target_lang: &str,
        ) -> Result<TranslationResult, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply
                .clone()
                .map(|t| TranslationResult::new(t, source_lang, target_lang, EntryType::Word))
        }
    }

    fn dictionary() -> Arc<LocalDictionary> {
        Arc::new(LocalDictionary::from_entries([(
            "hello",
            DictRecord {
                translation: "你好".to_string(),
                ..Default::default()
            },
        )]))
    }

    fn router(config: TranslationConfig, registry: BackendRegistry) -> TranslatorRouter {
        TranslatorRouter::new(&config, Arc::new(registry))
    }

    #[test]
    fn test_choose_backend_table() {
        let config = TranslationConfig::default();
        let r = router(config.clone(), BackendRegistry::new(config));

        assert_eq!(r.choose_backend("hello", "en", false), BackendKind::LocalDictionary);
        assert_eq!(r.choose_backend("take it easy", "en", false), BackendKind::OnlineDictionary);
        assert_eq!(
            r.choose_backend("The quick brown fox jumps over the lazy dog.", "en", false),
            BackendKind::Ai
        );
        assert_eq!(r.choose_backend("hello", "en", true), BackendKind::Ai);
    }

    #[test]
    fn test_choose_backend_respects_config() {
        let mut config = TranslationConfig::default();
        config.local_dict.enabled = false;
        let r = router(config.clone(), BackendRegistry::new(config.clone()));
        assert_eq!(r.choose_backend("hello", "en", false), BackendKind::OnlineDictionary);

        config.force_ai = true;
        let r = router(config.clone(), BackendRegistry::new(config));
        assert_eq!(r.choose_backend("hello", "en", false), BackendKind::Ai);
    }

    #[tokio::test]
    async fn test_local_hit_is_tagged() {
        let config = TranslationConfig::default();
        let registry = BackendRegistry::new(config.clone()).with_backend(dictionary());
        let r = router(config, registry);

        let outcome = r.route("Hello", "en", "zh", false).await;
        assert!(!outcome.is_degraded());
        let result = outcome.into_result();
        assert_eq!(result.translation, "你好");
        assert_eq!(result.translator_type, Some(TranslatorType::LocalDict));
        assert_eq!(result.entry_type, EntryType::Word);
    }

    #[tokio::test]
    async fn test_miss_without_ai_returns_guidance() {
        let config = TranslationConfig::default();
        let registry = BackendRegistry::new(config.clone()).with_backend(dictionary());
        let r = router(config, registry);

        let outcome = r.route("xyzzynotaword", "en", "zh", false).await;
        assert!(outcome.is_degraded());
        let result = outcome.into_result();
        assert_eq!(result.translator_type, Some(TranslatorType::LocalDictNotFound));
        assert!(result.translation.contains("xyzzynotaword"));
        assert!(!r.registry().is_initialized(BackendKind::Ai));
    }

    #[tokio::test]
    async fn test_miss_falls_back_to_ai() {
        let config = TranslationConfig::default();
        let ai = StubTranslator::ok(BackendKind::Ai, "一个不存在的词");
        let registry = BackendRegistry::new(config.clone())
            .with_backend(dictionary())
            .with_backend(ai.clone());
        let r = router(config, registry);

        let outcome = r.route("xyzzynotaword", "en", "zh", false).await;
        match outcome {
            RouteOutcome::Translated { result, backend } => {
                assert_eq!(backend, BackendKind::Ai);
                assert_eq!(result.translator_type, Some(TranslatorType::AiFallback));
                assert_eq!(result.translation, "一个不存在的词");
            }
            RouteOutcome::Degraded(r) => panic!("意外降级: {}", r.translation),
        }
        assert_eq!(ai.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_failure_truncates_error() {
        let config = TranslationConfig::default();
        let long_message = "x".repeat(500);
        let ai = StubTranslator::err(BackendKind::Ai, BackendError::transport(BackendKind::Ai, long_message));
        let registry = BackendRegistry::new(config.clone())
            .with_backend(dictionary())
            .with_backend(ai);
        let r = router(config, registry);

        let result = r.route("xyzzynotaword", "en", "zh", false).await.into_result();
        assert_eq!(result.translator_type, Some(TranslatorType::Failed));
        let detail = result.translation.split("AI 翻译也失败了：").nth(1).unwrap();
        assert_eq!(detail.chars().count(), FALLBACK_ERROR_MAX_CHARS);
    }

    #[tokio::test]
    async fn test_other_backend_errors_degrade() {
        let config = TranslationConfig::default();
        let online = StubTranslator::err(
            BackendKind::OnlineDictionary,
            BackendError::auth(BackendKind::OnlineDictionary, "bad key"),
        );
        let registry = BackendRegistry::new(config.clone()).with_backend(online);
        let r = router(config, registry);

        let result = r.route("take it easy", "en", "zh", false).await.into_result();
        assert_eq!(result.translator_type, Some(TranslatorType::Failed));
        assert_eq!(result.entry_type, EntryType::Phrase);
        assert!(result.translation.contains("bad key"));
    }

    #[tokio::test]
    async fn test_timeout_degrades() {
        let mut config = TranslationConfig::default();
        config.ai.timeout_secs = 1;
        let ai = StubTranslator::slow(BackendKind::Ai, Duration::from_secs(5));
        let registry = BackendRegistry::new(config.clone()).with_backend(ai);
        let r = router(config, registry);

        let result = r.route("hello", "en", "zh", true).await.into_result();
        assert_eq!(result.translator_type, Some(TranslatorType::Failed));
        assert!(result.translation.contains("超时"));
    }

    #[tokio::test]
    async fn test_registry_builds_each_backend_once() {
        let mut config = TranslationConfig::default();
        config.local_dict.path = "/nonexistent/dict.json".to_string();
        let registry = Arc::new(BackendRegistry::new(config));

        assert!(!registry.is_initialized(BackendKind::LocalDictionary));
        let (a, b) = tokio::join!(
            registry.get(BackendKind::LocalDictionary),
            registry.get(BackendKind::LocalDictionary)
        );
        let c = registry.get(BackendKind::LocalDictionary).await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert!(registry.is_initialized(BackendKind::LocalDictionary));
        assert!(!registry.is_initialized(BackendKind::OnlineDictionary));
    }

    #[tokio::test]
    async fn test_registry_builds_configured_backends() {
        let registry = BackendRegistry::new(TranslationConfig::default());

        let online = registry.get(BackendKind::OnlineDictionary).await;
        let ai = registry.get(BackendKind::Ai).await;

        assert_eq!(online.kind(), BackendKind::OnlineDictionary);
        assert_eq!(ai.kind(), BackendKind::Ai);
        assert!(registry.is_initialized(BackendKind::OnlineDictionary));
        assert!(registry.is_initialized(BackendKind::Ai));
    }
}
