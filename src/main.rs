use hangman_server::*;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化全局配置
    Config::init().map_err(|e| Error::Config(e.to_string()))?;
    let config = Config::get().ok_or_else(|| Error::Config("配置未初始化".to_string()))?;

    // 初始化日志
    tracing_subscriber::registry()
        .with(EnvFilter::new(config.log_filter()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("配置加载成功: {:?}", config);

    // 词表不可用时直接退出
    let words = WordSource::load_from_file(&config.word_list.file_path)?;

    let store = GameStore::from_config(&config.storage).await?;
    store.ensure_schema().await?;

    let service = Arc::new(GameService::new(
        store,
        words,
        config.game.legacy_status_labels,
    ));
    let server = HttpServer::new(service);

    let http_addr = config.http_addr()?.to_string();
    server.serve(&http_addr, &config.cors).await?;

    Ok(())
}
