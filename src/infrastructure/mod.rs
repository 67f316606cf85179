//! 基础设施层
//!
//! - `repository` - 存储接口（词条 / 缓存 / 统计）
//! - `memory` - 基于 DashMap 的内存实现

pub mod memory;
pub mod repository;

pub use memory::MemoryStore;
pub use repository::{CacheRepository, EntryRepository, SaveOutcome, StatsRepository};
