use std::fmt;

use serde::{Deserialize, Serialize};

/// 牌局内唯一的卡牌标识。
pub type CardId = u32;

/// 卡组数据：每一项在开局时展开为一对卡牌。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardData {
    pub name: String,
    #[serde(default, alias = "img")]
    pub image: String,
}

impl CardData {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
        }
    }

    /// 默认的六张编程语言卡面。
    pub fn sample_deck() -> Vec<CardData> {
        [
            ("Python", "./img/Python.svg"),
            ("JavaScript", "./img/JS.svg"),
            ("Java", "./img/Java.svg"),
            ("CSharp", "./img/CSharp.svg"),
            ("Go", "./img/Go.svg"),
            ("Ruby", "./img/Ruby.svg"),
        ]
        .into_iter()
        .map(|(name, image)| CardData::new(name, image))
        .collect()
    }
}

/// 桌面上的一张卡牌。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    face_up: bool,
}

impl Card {
    pub fn new(id: CardId, name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            image: image.into(),
            face_up: false,
        }
    }

    /// 由一项卡组数据生成一对卡牌，编号为 `first_id` 与 `first_id + 1`。
    pub fn pair_from(data: &CardData, first_id: CardId) -> [Card; 2] {
        [
            Card::new(first_id, data.name.clone(), data.image.clone()),
            Card::new(first_id + 1, data.name.clone(), data.image.clone()),
        ]
    }

    pub fn is_face_up(&self) -> bool {
        self.face_up
    }

    pub fn toggle(&mut self) {
        self.face_up = !self.face_up;
    }

    /// 同名即配对，与朝向和编号无关。
    pub fn matches(&self, other: &Card) -> bool {
        self.name == other.name
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GamePhase {
    Idle,
    Evaluating,
    Complete,
}

impl Default for GamePhase {
    fn default() -> Self {
        GamePhase::Idle
    }
}

/// 计时器读数，由已用秒数换算。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClockReading {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl ClockReading {
    pub fn from_seconds(total: u32) -> Self {
        Self {
            hours: total / 3600,
            minutes: (total / 60) % 60,
            seconds: total % 60,
        }
    }
}

impl fmt::Display for ClockReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IgnoreReason {
    EvaluationPending,
    AlreadyFaceUp,
    GameComplete,
    UnknownCard,
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    CardFlipped {
        card_id: CardId,
        moves: u32,
    },
    ClickIgnored {
        #[serde(skip_serializing_if = "Option::is_none")]
        card_id: Option<CardId>,
        reason: IgnoreReason,
    },
    EvaluationScheduled {
        first: CardId,
        second: CardId,
        delay_ms: u32,
    },
    PairMatched {
        first: CardId,
        second: CardId,
    },
    PairMismatched {
        first: CardId,
        second: CardId,
    },
    GameCompleted {
        moves: u32,
        elapsed_seconds: u32,
    },
    GameReset,
}

/// 对外导出的整体状态快照。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSnapshot {
    pub cards: Vec<Card>,
    pub columns: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flipped: Vec<CardId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched: Vec<CardId>,
    pub moves: u32,
    pub elapsed_seconds: u32,
    pub clock: ClockReading,
    pub phase: GamePhase,
    pub flip_duration_ms: u32,
    pub timer_running: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_face_state_both_ways() {
        let mut card = Card::new(0, "Go", "./img/Go.svg");
        assert!(!card.is_face_up());
        card.toggle();
        assert!(card.is_face_up());
        card.toggle();
        assert!(!card.is_face_up());
    }

    #[test]
    fn cards_match_by_name_only() {
        let [mut first, second] = Card::pair_from(&CardData::new("Ruby", "a.svg"), 4);
        first.toggle();
        let other = Card::new(9, "Rust", "a.svg");

        assert_eq!((first.id, second.id), (4, 5));
        assert!(first.matches(&second));
        assert!(second.matches(&first));
        assert!(!first.matches(&other));
    }

    #[test]
    fn clock_reading_pads_each_component() {
        assert_eq!(ClockReading::from_seconds(0).to_string(), "00:00:00");
        assert_eq!(ClockReading::from_seconds(65).to_string(), "00:01:05");
        assert_eq!(ClockReading::from_seconds(3_725).to_string(), "01:02:05");
        assert_eq!(ClockReading::from_seconds(360_000).to_string(), "100:00:00");
    }

    #[test]
    fn card_data_accepts_img_alias() {
        let data: CardData =
            serde_json::from_str(r#"{"name":"Go","img":"./img/Go.svg"}"#).expect("valid json");
        assert_eq!(data, CardData::new("Go", "./img/Go.svg"));
    }
}
