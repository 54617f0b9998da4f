pub mod config;
pub mod game;
pub mod message;
pub mod network;
pub mod service;
pub mod storage;
pub mod word_source;

pub use config::Config;
pub use game::{Game, GameStatus, GuessOutcome};
pub use message::GameSummary;
pub use network::HttpServer;
pub use service::GameService;
pub use storage::*;
pub use word_source::WordSource;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("网络错误: {0}")]
    Network(#[from] anyhow::Error),
    #[error("参数错误: {0}")]
    Validation(String),
    #[error("游戏不存在: {0}")]
    NotFound(String),
    #[error("游戏已结束，当前状态: {0}")]
    InvalidTransition(GameStatus),
    #[error("游戏ID重复: {0}")]
    Duplicate(String),
    #[error("存储错误: {0}")]
    Storage(String),
    #[error("配置错误: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
