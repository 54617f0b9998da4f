use crate::config::{StorageBackend, StorageConfig};
use crate::game::{Game, GameId, GameStatus, INITIAL_TRIES};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

/// 当前存储结构版本
const SCHEMA_VERSION: &str = "1";

/// KEYS[1] = 游戏哈希, KEYS[2] = ID索引
/// ARGV = word_to_guess, tries_left, status, timestamp, id
static CREATE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return 0
end
redis.call('HSET', KEYS[1],
    'word_to_guess', ARGV[1],
    'used_characters', '',
    'tries_left', ARGV[2],
    'status', ARGV[3],
    'created_at', ARGV[4],
    'updated_at', ARGV[4])
redis.call('SADD', KEYS[2], ARGV[5])
return 1
"#,
    )
});

/// KEYS[1] = 游戏哈希
/// ARGV = used_characters, tries_left, status, updated_at
static UPDATE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return 0
end
redis.call('HSET', KEYS[1],
    'used_characters', ARGV[1],
    'tries_left', ARGV[2],
    'status', ARGV[3],
    'updated_at', ARGV[4])
return 1
"#,
    )
});

fn storage_error(e: impl Display) -> Error {
    Error::Storage(e.to_string())
}

/// 游戏存储，按ID持久化游戏记录
#[derive(Clone)]
pub enum GameStore {
    Redis(RedisGameStore),
    Memory(MemoryGameStore),
}

impl GameStore {
    /// 根据配置创建存储
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        match config.backend {
            StorageBackend::Redis => Ok(GameStore::Redis(
                RedisGameStore::new(&config.redis_url, &config.key_prefix).await?,
            )),
            StorageBackend::Memory => {
                warn!("使用内存存储，进程重启后游戏数据会丢失");
                Ok(GameStore::memory())
            }
        }
    }

    pub fn memory() -> Self {
        GameStore::Memory(MemoryGameStore::new())
    }

    /// 初始化存储结构，可重复调用
    pub async fn ensure_schema(&self) -> Result<()> {
        match self {
            GameStore::Redis(store) => store.ensure_schema().await,
            GameStore::Memory(_) => Ok(()),
        }
    }

    /// 创建新游戏，ID已存在时返回 `Error::Duplicate`
    pub async fn create(&self, id: &str, word_to_guess: &str) -> Result<Game> {
        let game = Game::new(id, word_to_guess);
        match self {
            GameStore::Redis(store) => store.create(&game).await?,
            GameStore::Memory(store) => store.create(&game)?,
        }
        Ok(game)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Game>> {
        match self {
            GameStore::Redis(store) => store.get(id).await,
            GameStore::Memory(store) => Ok(store.get(id)),
        }
    }

    /// 所有游戏，不保证顺序
    pub async fn list(&self) -> Result<Vec<Game>> {
        match self {
            GameStore::Redis(store) => store.list().await,
            GameStore::Memory(store) => Ok(store.list()),
        }
    }

    /// 写回游戏的可变字段（已猜字母、剩余次数、状态、更新时间）
    pub async fn update(&self, game: &Game) -> Result<()> {
        match self {
            GameStore::Redis(store) => store.update(game).await,
            GameStore::Memory(store) => store.update(game),
        }
    }
}

/// Redis 存储
///
/// 每局游戏保存为哈希 `{prefix}:game:{id}`，ID 索引为集合 `{prefix}:games`。
#[derive(Clone)]
pub struct RedisGameStore {
    manager: Arc<Mutex<ConnectionManager>>,
    prefix: String,
    schema: Arc<OnceCell<()>>,
}

impl RedisGameStore {
    pub async fn new(redis_url: &str, prefix: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(storage_error)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(storage_error)?;
        Ok(RedisGameStore {
            manager: Arc::new(Mutex::new(manager)),
            prefix: prefix.to_string(),
            schema: Arc::new(OnceCell::new()),
        })
    }

    fn game_key(&self, id: &str) -> String {
        format!("{}:game:{}", self.prefix, id)
    }

    fn index_key(&self) -> String {
        format!("{}:games", self.prefix)
    }

    fn schema_key(&self) -> String {
        format!("{}:schema", self.prefix)
    }

    /// 首次访问时写入结构版本标记，每个进程只执行一次
    pub async fn ensure_schema(&self) -> Result<()> {
        self.schema.get_or_try_init(|| self.init_schema()).await?;
        Ok(())
    }

    async fn init_schema(&self) -> Result<()> {
        let key = self.schema_key();
        let mut conn = self.manager.lock().await;
        let created: bool = conn
            .set_nx(&key, SCHEMA_VERSION)
            .await
            .map_err(storage_error)?;
        if created {
            info!("初始化存储结构: {} = {}", key, SCHEMA_VERSION);
            return Ok(());
        }

        let version: Option<String> = conn.get(&key).await.map_err(storage_error)?;
        match version.as_deref() {
            Some(SCHEMA_VERSION) => Ok(()),
            other => Err(Error::Storage(format!(
                "存储结构版本不匹配: 期望 {}, 实际 {:?}",
                SCHEMA_VERSION, other
            ))),
        }
    }

    async fn create(&self, game: &Game) -> Result<()> {
        self.ensure_schema().await?;
        let mut conn = self.manager.lock().await;
        let created: i32 = CREATE_SCRIPT
            .key(self.game_key(&game.id))
            .key(self.index_key())
            .arg(&game.word_to_guess)
            .arg(game.tries_left)
            .arg(game.status.code())
            .arg(game.created_at.to_rfc3339())
            .arg(&game.id)
            .invoke_async(&mut *conn)
            .await
            .map_err(storage_error)?;

        if created == 0 {
            return Err(Error::Duplicate(game.id.clone()));
        }
        debug!("保存新游戏: {}", game.id);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Game>> {
        self.ensure_schema().await?;
        let mut conn = self.manager.lock().await;
        let fields: HashMap<String, String> = conn
            .hgetall(self.game_key(id))
            .await
            .map_err(storage_error)?;
        game_from_fields(id, &fields)
    }

    async fn list(&self) -> Result<Vec<Game>> {
        self.ensure_schema().await?;
        let mut conn = self.manager.lock().await;
        let ids: Vec<String> = conn
            .smembers(self.index_key())
            .await
            .map_err(storage_error)?;

        let mut games = Vec::with_capacity(ids.len());
        for id in ids {
            let fields: HashMap<String, String> = conn
                .hgetall(self.game_key(&id))
                .await
                .map_err(storage_error)?;
            match game_from_fields(&id, &fields)? {
                Some(game) => games.push(game),
                None => warn!("索引中的游戏不存在: {}", id),
            }
        }
        Ok(games)
    }

    async fn update(&self, game: &Game) -> Result<()> {
        self.ensure_schema().await?;
        let mut conn = self.manager.lock().await;
        let updated: i32 = UPDATE_SCRIPT
            .key(self.game_key(&game.id))
            .arg(game.used_characters_string())
            .arg(game.tries_left)
            .arg(game.status.code())
            .arg(game.updated_at.to_rfc3339())
            .invoke_async(&mut *conn)
            .await
            .map_err(storage_error)?;

        if updated == 0 {
            return Err(Error::NotFound(game.id.clone()));
        }
        Ok(())
    }
}

/// 从 Redis 哈希字段解析游戏记录，哈希为空表示不存在
pub fn game_from_fields(id: &str, fields: &HashMap<String, String>) -> Result<Option<Game>> {
    if fields.is_empty() {
        return Ok(None);
    }

    let field = |name: &str| {
        fields
            .get(name)
            .ok_or_else(|| Error::Storage(format!("游戏 {} 缺少字段 {}", id, name)))
    };
    let timestamp = |name: &str| -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(field(name)?)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| Error::Storage(format!("游戏 {} 字段 {} 无效: {}", id, name, e)))
    };

    let tries_left = field("tries_left")?
        .parse::<u32>()
        .map_err(|e| Error::Storage(format!("游戏 {} 剩余次数无效: {}", id, e)))?;
    if tries_left > INITIAL_TRIES {
        return Err(Error::Storage(format!(
            "游戏 {} 剩余次数超出范围: {}",
            id, tries_left
        )));
    }
    let status = field("status")?
        .parse::<u8>()
        .ok()
        .and_then(GameStatus::from_code)
        .ok_or_else(|| Error::Storage(format!("游戏 {} 状态无效", id)))?;

    Ok(Some(Game {
        id: id.to_string(),
        word_to_guess: field("word_to_guess")?.clone(),
        used_characters: field("used_characters")?.chars().collect(),
        tries_left,
        status,
        created_at: timestamp("created_at")?,
        updated_at: timestamp("updated_at")?,
    }))
}

/// 内存存储，用于开发和测试
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    games: Arc<DashMap<GameId, Game>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn create(&self, game: &Game) -> Result<()> {
        match self.games.entry(game.id.clone()) {
            Entry::Occupied(_) => Err(Error::Duplicate(game.id.clone())),
            Entry::Vacant(entry) => {
                entry.insert(game.clone());
                Ok(())
            }
        }
    }

    fn get(&self, id: &str) -> Option<Game> {
        self.games.get(id).map(|entry| entry.value().clone())
    }

    fn list(&self) -> Vec<Game> {
        self.games.iter().map(|entry| entry.value().clone()).collect()
    }

    fn update(&self, game: &Game) -> Result<()> {
        let mut stored = self
            .games
            .get_mut(&game.id)
            .ok_or_else(|| Error::NotFound(game.id.clone()))?;
        stored.used_characters = game.used_characters.clone();
        stored.tries_left = game.tries_left;
        stored.status = game.status;
        stored.updated_at = game.updated_at;
        Ok(())
    }
}
