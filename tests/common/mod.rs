//! 集成测试共用的桩后端和组装函数

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use translearn::clients::local_dict::DictRecord;
use translearn::clients::LocalDictionary;
use translearn::infrastructure::MemoryStore;
use translearn::models::{BackendKind, EntryType, TranslationResult, TranslatorType};
use translearn::{App, BackendError, BackendRegistry, Config, Translator};

/// 固定返回的桩后端，记录调用次数
pub struct StubTranslator {
    kind: BackendKind,
    reply: Result<String, BackendError>,
    tokens: Option<u32>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubTranslator {
    pub fn ok(kind: BackendKind, translation: &str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            reply: Ok(translation.to_string()),
            tokens: None,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn ai(translation: &str, tokens: u32) -> Arc<Self> {
        Arc::new(Self {
            kind: BackendKind::Ai,
            reply: Ok(translation.to_string()),
            tokens: Some(tokens),
            delay: Some(Duration::from_millis(10)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn err(kind: BackendKind, error: BackendError) -> Arc<Self> {
        Arc::new(Self {
            kind,
            reply: Err(error),
            tokens: None,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
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
        let mut result = self
            .reply
            .clone()
            .map(|t| TranslationResult::new(t, source_lang, target_lang, EntryType::Sentence))?;
        result.tokens_used = self.tokens;
        Ok(result)
    }
}

/// 包含 hello / world / apple 的小词典
pub fn dictionary() -> Arc<LocalDictionary> {
    let record = |translation: &str| DictRecord {
        translation: translation.to_string(),
        ..Default::default()
    };
    Arc::new(LocalDictionary::from_entries([
        ("hello", record("你好")),
        ("world", record("世界")),
        ("apple", record("苹果")),
    ]))
}

/// 用内存存储和预置后端组装应用
pub fn app_with(config: Config, backends: Vec<Arc<dyn Translator>>) -> (App, Arc<MemoryStore>) {
    let registry = backends
        .into_iter()
        .fold(BackendRegistry::new(config.translation.clone()), |registry, backend| {
            registry.with_backend(backend)
        });
    let store = Arc::new(MemoryStore::new());
    let app = App::with_stores(config, registry, store.clone(), store.clone(), store.clone());
    (app, store)
}

/// 只带本地词典的应用
pub fn dictionary_app(config: Config) -> (App, Arc<MemoryStore>) {
    app_with(config, vec![dictionary() as Arc<dyn Translator>])
}

/// 构造一个可保存的翻译结果
pub fn saved_result(translation: &str) -> TranslationResult {
    TranslationResult::new(translation, "en", "zh", EntryType::Word)
        .with_translator(TranslatorType::LocalDict)
}
