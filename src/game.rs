use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 游戏ID类型
pub type GameId = String;

/// 新游戏的初始可用次数
pub const INITIAL_TRIES: u32 = 11;

/// 未猜中字母的占位符
pub const PLACEHOLDER: char = '.';

/// 游戏状态，Fail 和 Success 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    Busy,
    Fail,
    Success,
}

/// 状态 -> (存储编码, 标签, 旧版标签)
const STATUS_TABLE: [(GameStatus, u8, &str, &str); 3] = [
    (GameStatus::Busy, 0, "busy", "busy"),
    (GameStatus::Fail, 1, "fail", "fail"),
    (GameStatus::Success, 2, "success", "succes"),
];

impl GameStatus {
    fn entry(self) -> &'static (GameStatus, u8, &'static str, &'static str) {
        STATUS_TABLE
            .iter()
            .find(|(status, ..)| *status == self)
            .unwrap_or(&STATUS_TABLE[0])
    }

    /// 持久化使用的整数编码
    pub fn code(self) -> u8 {
        self.entry().1
    }

    pub fn from_code(code: u8) -> Option<Self> {
        STATUS_TABLE
            .iter()
            .find(|(_, c, ..)| *c == code)
            .map(|(status, ..)| *status)
    }

    /// 对外输出的状态字符串，legacy 为 true 时保留旧客户端依赖的 "succes" 拼写
    pub fn label(self, legacy: bool) -> &'static str {
        let &(_, _, label, legacy_label) = self.entry();
        if legacy { legacy_label } else { label }
    }

    pub fn is_terminal(self) -> bool {
        self != GameStatus::Busy
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label(false))
    }
}

/// 一次猜测的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// 字母已经猜过，游戏不变
    AlreadyUsed,
    /// 字母在单词中
    Hit,
    /// 字母不在单词中，扣除一次机会
    Miss,
}

/// 游戏记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub word_to_guess: String,
    pub used_characters: BTreeSet<char>,
    pub tries_left: u32,
    pub status: GameStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    /// 创建新的游戏记录
    pub fn new(id: impl Into<GameId>, word_to_guess: impl Into<String>) -> Self {
        let now = Utc::now();
        Game {
            id: id.into(),
            word_to_guess: word_to_guess.into(),
            used_characters: BTreeSet::new(),
            tries_left: INITIAL_TRIES,
            status: GameStatus::Busy,
            created_at: now,
            updated_at: now,
        }
    }

    /// 当前玩家可见的单词
    pub fn masked_word(&self) -> String {
        mask(&self.word_to_guess, &self.used_characters)
    }

    /// 对外展示的单词：进行中显示掩码，结束后揭晓答案
    pub fn visible_word(&self) -> String {
        if self.status.is_terminal() {
            self.word_to_guess.clone()
        } else {
            self.masked_word()
        }
    }

    /// 已猜字母按字母序拼接
    pub fn used_characters_string(&self) -> String {
        self.used_characters.iter().collect()
    }

    /// 应用一次猜测
    ///
    /// 调用方负责在此之前拒绝已结束的游戏；这里仍然检查一次，
    /// 终态下返回 `Error::InvalidTransition` 且不修改任何字段。
    /// 重复猜测同一个字母不是错误，返回 `GuessOutcome::AlreadyUsed`。
    pub fn apply_guess(&mut self, character: char) -> Result<GuessOutcome> {
        if self.status.is_terminal() {
            return Err(Error::InvalidTransition(self.status));
        }
        if !character.is_ascii_lowercase() {
            return Err(Error::Validation(format!("无效的字母: {:?}", character)));
        }

        if !self.used_characters.insert(character) {
            return Ok(GuessOutcome::AlreadyUsed);
        }

        let outcome = if self.word_to_guess.contains(character) {
            GuessOutcome::Hit
        } else {
            self.tries_left = self.tries_left.saturating_sub(1);
            GuessOutcome::Miss
        };

        // 先判断成功：最后一个字母与最后一次机会同时发生时算成功
        if self.masked_word() == self.word_to_guess {
            self.status = GameStatus::Success;
        } else if self.tries_left == 0 {
            self.status = GameStatus::Fail;
        }

        Ok(outcome)
    }
}

/// 把未猜中的字母替换为占位符
pub fn mask(word_to_guess: &str, used_characters: &BTreeSet<char>) -> String {
    word_to_guess
        .chars()
        .map(|c| {
            if used_characters.contains(&c) {
                c
            } else {
                PLACEHOLDER
            }
        })
        .collect()
}

/// 校验请求中的猜测参数，返回小写字母
pub fn parse_guess(raw: Option<&str>) -> Result<char> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(Error::Validation("缺少参数 char".to_string())),
    };

    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(c.to_ascii_lowercase()),
        (Some(_), None) => Err(Error::Validation(format!("char 必须是字母: {}", raw))),
        _ => Err(Error::Validation(format!("char 长度必须为1: {}", raw))),
    }
}

/// 游戏ID只允许小写字母和数字
pub fn is_valid_game_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}
