/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化日志
///
/// `RUST_LOG` 环境变量优先，否则使用配置中的日志级别。
/// 重复调用是安全的（测试中多次初始化不会 panic）。
pub fn init(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(false)
        .try_init();
}

/// 在全局日志初始化之前执行 `f`（例如加载配置）
///
/// 执行期间临时使用 `info` 级别的订阅者，`f` 中的日志不会丢失
pub fn with_bootstrap<T>(f: impl FnOnce() -> T) -> T {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(BOOTSTRAP_LEVEL))
        .with_target(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

/// 启动阶段的日志级别
const BOOTSTRAP_LEVEL: &str = "info";

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    let t = &config.translation;
    info!("{}", "=".repeat(60));
    info!("🚀 TransLearn 启动");
    info!(
        "📖 本地词典: {} | 在线词典: {} | AI: {} ({})",
        if t.local_dict.enabled { "启用" } else { "禁用" },
        t.online_dict.provider,
        t.ai.provider,
        if t.ai.is_configured() { "已配置" } else { "未配置" }
    );
    info!(
        "🗂️ 缓存: {} ({} 天) | 自动保存阈值: {}",
        if config.cache.enabled { "启用" } else { "禁用" },
        config.cache.expire_days,
        config.features.auto_save_threshold
    );
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
