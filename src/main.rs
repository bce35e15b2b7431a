use anyhow::Result;
use asta_badges::config::Config;
use asta_badges::orchestrator::App;
use asta_badges::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（config.toml 存在时先读文件，再用环境变量覆盖）
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
