use crate::game::{Game, GameId};
use serde::{Deserialize, Serialize};

/// 返回给客户端的游戏摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: GameId,
    pub tries_left: u32,
    pub status: String,
    /// 进行中为掩码单词，结束后为完整答案
    pub word: String,
}

impl GameSummary {
    pub fn from_game(game: &Game, legacy_status_labels: bool) -> Self {
        GameSummary {
            id: game.id.clone(),
            tries_left: game.tries_left,
            status: game.status.label(legacy_status_labels).to_string(),
            word: game.visible_word(),
        }
    }
}

/// 猜测请求参数
#[derive(Debug, Default, Deserialize)]
pub struct GuessQuery {
    #[serde(rename = "char")]
    pub character: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
