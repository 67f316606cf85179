use anyhow::Result;
use translearn::utils::logging;
use translearn::{App, Config};

/// 默认配置文件路径，可通过 `TRANSLEARN_CONFIG` 覆盖
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path =
        std::env::var("TRANSLEARN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    // 加载配置（此时全局日志尚未初始化）
    let config = logging::with_bootstrap(|| Config::load(&config_path))?;

    // 初始化日志
    logging::init(&config.logging.level);

    // 初始化并运行应用
    let texts: Vec<String> = std::env::args().skip(1).collect();
    App::initialize(config)?.run(&texts).await?;

    Ok(())
}
