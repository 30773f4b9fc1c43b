use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::state::CardData;

pub const MIN_FLIP_DURATION_MS: u32 = 350;
pub const MAX_FLIP_DURATION_MS: u32 = 3000;
pub const DEFAULT_FLIP_DURATION_MS: u32 = MIN_FLIP_DURATION_MS;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ConfigError {
    FlipDurationOutOfRange { requested: f64 },
    FlipDurationNotANumber,
    EmptyDeck,
    BlankCardName { index: usize },
    DuplicateCardName { name: String },
    InvalidJson { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FlipDurationOutOfRange { requested } => write!(
                f,
                "flip duration {requested} ms is outside {MIN_FLIP_DURATION_MS}-{MAX_FLIP_DURATION_MS} ms"
            ),
            ConfigError::FlipDurationNotANumber => write!(f, "flip duration is not a number"),
            ConfigError::EmptyDeck => write!(f, "card dataset is empty"),
            ConfigError::BlankCardName { index } => {
                write!(f, "card entry {index} has a blank name")
            }
            ConfigError::DuplicateCardName { name } => {
                write!(f, "card name {name:?} appears more than once")
            }
            ConfigError::InvalidJson { message } => write!(f, "invalid config json: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// 翻牌后等待判定的时长（毫秒），保证落在 [350, 3000] 之间。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct FlipDuration(u32);

impl FlipDuration {
    pub fn new(millis: f64) -> Result<Self, ConfigError> {
        if millis.is_nan() {
            return Err(ConfigError::FlipDurationNotANumber);
        }
        if millis < MIN_FLIP_DURATION_MS as f64 || millis > MAX_FLIP_DURATION_MS as f64 {
            return Err(ConfigError::FlipDurationOutOfRange { requested: millis });
        }
        Ok(Self(millis.round() as u32))
    }

    /// 非法值回退到默认时长，同时带回原因供界面提示。
    pub fn clamped(millis: f64) -> (Self, Option<ConfigError>) {
        match Self::new(millis) {
            Ok(duration) => (duration, None),
            Err(error) => (Self::default(), Some(error)),
        }
    }

    pub fn as_millis(self) -> u32 {
        self.0
    }
}

impl Default for FlipDuration {
    fn default() -> Self {
        Self(DEFAULT_FLIP_DURATION_MS)
    }
}

fn default_flip_duration() -> f64 {
    DEFAULT_FLIP_DURATION_MS as f64
}

/// 宽松读取毫秒数：数字原样使用，数字字符串按数值解析，其余一律视为 NaN，交给校验处理。
pub fn millis_from_value(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => text.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn loose_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(millis_from_value(&value))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    #[serde(default = "default_flip_duration", deserialize_with = "loose_millis")]
    pub flip_duration: f64,
    #[serde(default = "CardData::sample_deck")]
    pub cards: Vec<CardData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GameConfig {
    pub fn new(flip_duration: f64, cards: Vec<CardData>) -> Self {
        Self {
            flip_duration,
            cards,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|error| ConfigError::InvalidJson {
            message: error.to_string(),
        })
    }

    /// 校验卡组：非空、名称非空白且互不重复。
    pub fn validate_cards(cards: &[CardData]) -> Result<(), ConfigError> {
        if cards.is_empty() {
            return Err(ConfigError::EmptyDeck);
        }
        for (index, data) in cards.iter().enumerate() {
            if data.name.trim().is_empty() {
                return Err(ConfigError::BlankCardName { index });
            }
            if cards[..index].iter().any(|prior| prior.name == data.name) {
                return Err(ConfigError::DuplicateCardName {
                    name: data.name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(default_flip_duration(), CardData::sample_deck())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_duration_accepts_inclusive_bounds() {
        assert_eq!(FlipDuration::new(350.0).map(FlipDuration::as_millis), Ok(350));
        assert_eq!(FlipDuration::new(3000.0).map(FlipDuration::as_millis), Ok(3000));
        assert_eq!(FlipDuration::new(900.0).map(FlipDuration::as_millis), Ok(900));
    }

    #[test]
    fn flip_duration_rejects_out_of_range_and_nan() {
        assert_eq!(
            FlipDuration::new(100.0),
            Err(ConfigError::FlipDurationOutOfRange { requested: 100.0 })
        );
        assert_eq!(
            FlipDuration::new(3000.5),
            Err(ConfigError::FlipDurationOutOfRange { requested: 3000.5 })
        );
        assert_eq!(
            FlipDuration::new(f64::NAN),
            Err(ConfigError::FlipDurationNotANumber)
        );
    }

    #[test]
    fn clamped_falls_back_to_default() {
        let (duration, warning) = FlipDuration::clamped(100.0);
        assert_eq!(duration.as_millis(), 350);
        assert!(warning.is_some());

        let (duration, warning) = FlipDuration::clamped(900.0);
        assert_eq!(duration.as_millis(), 900);
        assert!(warning.is_none());
    }

    #[test]
    fn config_json_fills_defaults() {
        let config = GameConfig::from_json(r#"{"flipDuration": 1000}"#).expect("valid config");
        assert_eq!(config.flip_duration, 1000.0);
        assert_eq!(config.cards.len(), 6);
        assert_eq!(config.seed, None);

        let config = GameConfig::from_json(
            r#"{"cards": [{"name": "Go", "img": "./img/Go.svg"}], "seed": 7}"#,
        )
        .expect("valid config");
        assert_eq!(config.flip_duration, 350.0);
        assert_eq!(config.cards, vec![CardData::new("Go", "./img/Go.svg")]);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn config_json_tolerates_non_numeric_flip_duration() {
        let config = GameConfig::from_json(r#"{"flipDuration": "900"}"#).expect("valid config");
        assert_eq!(config.flip_duration, 900.0);

        for raw in [r#"{"flipDuration": "fast"}"#, r#"{"flipDuration": null}"#] {
            let config = GameConfig::from_json(raw).expect("valid config");
            assert!(config.flip_duration.is_nan());
            assert_eq!(
                FlipDuration::clamped(config.flip_duration).1,
                Some(ConfigError::FlipDurationNotANumber)
            );
        }
    }

    #[test]
    fn config_json_reports_parse_errors() {
        let error = GameConfig::from_json("{").expect_err("truncated json");
        assert!(matches!(error, ConfigError::InvalidJson { .. }));
    }

    #[test]
    fn validate_cards_catches_bad_datasets() {
        assert_eq!(GameConfig::validate_cards(&[]), Err(ConfigError::EmptyDeck));
        assert_eq!(
            GameConfig::validate_cards(&[CardData::new("Go", ""), CardData::new("  ", "")]),
            Err(ConfigError::BlankCardName { index: 1 })
        );
        assert_eq!(
            GameConfig::validate_cards(&[CardData::new("Go", "a"), CardData::new("Go", "b")]),
            Err(ConfigError::DuplicateCardName { name: "Go".into() })
        );
        assert!(GameConfig::validate_cards(&CardData::sample_deck()).is_ok());
    }
}
