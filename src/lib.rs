//! # TransLearn
//!
//! 划词翻译 + 生词本 + 间隔重复复习的核心库
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 存储接口与内存实现
//! - `EntryRepository` / `CacheRepository` / `StatsRepository`
//!
//! ### ② 外部能力层（Clients）
//! - `clients/` - 三个翻译后端，统一实现 `Translator`
//! - `LocalDictionary` - 本地 JSON 词典
//! - `OnlineDictionary` - 有道 / 金山词霸
//! - `AiTranslator` - OpenAI 兼容接口
//!
//! ### ③ 业务能力层（Services / Scheduling）
//! - `scheduling/` - SM-2 算法与复习调度（纯计算）
//! - `services/` - 语言检测、翻译路由（含降级协议）、翻译缓存
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/translation_service` - 翻译流程编排
//! - `orchestrator/review_service` - 复习流程编排
//! - `orchestrator/app` - 组合根
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod scheduling;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use clients::Translator;
pub use config::Config;
pub use error::{AppError, AppResult, BackendError, StorageError};
pub use infrastructure::MemoryStore;
pub use models::{Difficulty, TranslationResult, TranslatorType, VocabularyEntry};
pub use orchestrator::{App, ReviewService, TranslationService};
pub use scheduling::{ReviewScheduler, Sm2Algorithm};
pub use services::{BackendRegistry, LanguageDetector, TranslatorRouter};
