//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `translation_service` - 翻译编排
//! - 语言检测、缓存、路由、自动保存、每日统计
//! - 批量翻译（并发数受配置限制）
//!
//! ### `review_service` - 复习编排
//! - 到期查询、紧急程度分组、提交 / 重置 / 批量复习
//! - 复习统计、已掌握 / 薄弱词条
//!
//! ### `app` - 组合根
//! - 创建存储、后端注册表和服务
//!
//! ## 层次关系
//!
//! ```text
//! app
//!     ↓
//! translation_service / review_service
//!     ↓
//! services (能力层：language_detector / router / translation_cache)
//!     ↓
//! clients (后端) / scheduling (算法) / infrastructure (存储)
//! ```

pub mod app;
pub mod review_service;
pub mod translation_service;

pub use app::App;
pub use review_service::ReviewService;
pub use translation_service::TranslationService;
