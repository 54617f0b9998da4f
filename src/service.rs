use crate::game::{self, Game, GameId, GuessOutcome};
use crate::storage::GameStore;
use crate::word_source::WordSource;
use crate::{Error, Result};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 游戏服务，串联词表、存储与猜测逻辑
pub struct GameService {
    store: GameStore,
    words: WordSource,
    /// 每局游戏一把锁，串行化同一进程内的读-改-写
    locks: DashMap<GameId, Arc<Mutex<()>>>,
    legacy_status_labels: bool,
}

impl GameService {
    pub fn new(store: GameStore, words: WordSource, legacy_status_labels: bool) -> Self {
        GameService {
            store,
            words,
            locks: DashMap::new(),
            legacy_status_labels,
        }
    }

    pub fn legacy_status_labels(&self) -> bool {
        self.legacy_status_labels
    }

    /// 开始新游戏
    pub async fn start_game(&self) -> Result<Game> {
        let id = Uuid::new_v4().simple().to_string();
        let word = self.words.pick_word();
        let game = self.store.create(&id, word).await?;
        info!("新游戏创建: {} (单词长度 {})", game.id, word.len());
        Ok(game)
    }

    pub async fn list_games(&self) -> Result<Vec<Game>> {
        let games = self.store.list().await?;
        debug!("查询游戏列表: {} 局", games.len());
        Ok(games)
    }

    pub async fn get_game(&self, id: &str) -> Result<Game> {
        debug!("查询游戏: {}", id);
        self.store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// 处理一次猜测
    ///
    /// 参数校验在读取游戏之前完成，被拒绝的请求不会修改任何状态。
    /// 同一局游戏的读-改-写在锁内串行执行，锁在空闲后从锁表移除。
    pub async fn guess(&self, id: &str, raw_character: Option<&str>) -> Result<Game> {
        let character = game::parse_guess(raw_character).inspect_err(|e| {
            warn!("游戏 {} 猜测参数无效: {}", id, e);
        })?;

        // 先确认游戏存在，未知ID不占用锁表
        self.get_game(id).await?;

        let lock = self
            .locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.guess_locked(id, character).await
        };

        // 没有其他请求持有或等待这把锁时移除
        drop(lock);
        self.locks
            .remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn guess_locked(&self, id: &str, character: char) -> Result<Game> {
        let mut game = self.get_game(id).await?;
        if game.status.is_terminal() {
            warn!("游戏 {} 已结束 ({})，拒绝猜测", id, game.status);
            return Err(Error::InvalidTransition(game.status));
        }

        let outcome = game.apply_guess(character)?;
        if outcome == GuessOutcome::AlreadyUsed {
            debug!("游戏 {} 重复猜测字母 '{}'，忽略", id, character);
            return Ok(game);
        }

        game.updated_at = Utc::now();
        self.store.update(&game).await?;

        if game.status.is_terminal() {
            info!("游戏 {} 结束: {}", id, game.status);
        } else {
            debug!(
                "游戏 {} 猜测 '{}': {:?}, 剩余次数 {}",
                id, character, outcome, game.tries_left
            );
        }
        Ok(game)
    }
}
