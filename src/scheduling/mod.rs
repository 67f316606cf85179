//! 间隔重复调度（纯计算，无状态）
//!
//! - `sm2` - SM-2 算法：下次复习时间、熟练度、质量评分映射
//! - `scheduler` - 到期判断、紧急程度、记忆保持率

pub mod scheduler;
pub mod sm2;

pub use scheduler::ReviewScheduler;
pub use sm2::{ReviewSchedule, Sm2Algorithm};
