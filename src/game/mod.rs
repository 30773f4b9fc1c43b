//! 游戏核心逻辑模块（卡牌、牌桌、规则引擎等）。

pub mod board;
pub mod config;
pub mod rules;
pub mod state;
pub mod view;

pub use board::{column_count, Board, ClickListener};
pub use config::{
    ConfigError, FlipDuration, GameConfig, DEFAULT_FLIP_DURATION_MS, MAX_FLIP_DURATION_MS,
    MIN_FLIP_DURATION_MS,
};
pub use rules::MemoryGame;
pub use state::{
    Card, CardData, CardId, ClockReading, GameEvent, GamePhase, GameSnapshot, IgnoreReason,
};
pub use view::{GameView, Notice, NullView};
