use std::fmt;

use rand::Rng;

use super::config::{ConfigError, GameConfig};
use super::state::{Card, CardData, CardId};
use super::view::GameView;

const MIN_COLUMNS: usize = 2;
const MAX_COLUMNS: usize = 12;

/// 点击回调，参数为被点击卡牌的编号。
pub type ClickListener = Box<dyn FnMut(CardId)>;

/// 网格列数：牌数的一半，限制在 [2, 12]，并取偶数（11 进到 12）。
pub fn column_count(num_cards: usize) -> usize {
    let columns = (num_cards / 2).clamp(MIN_COLUMNS, MAX_COLUMNS);
    if columns % 2 == 0 {
        columns
    } else if columns == 11 {
        12
    } else {
        columns - 1
    }
}

/// 牌桌：持有全部卡牌及其排列顺序。
pub struct Board {
    cards: Vec<Card>,
    click_listener: Option<ClickListener>,
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("cards", &self.cards)
            .field("has_click_listener", &self.click_listener.is_some())
            .finish()
    }
}

impl Board {
    /// 每项卡组数据生成两张牌，编号按数据顺序连续分配。
    pub fn from_data(data: &[CardData]) -> Result<Self, ConfigError> {
        GameConfig::validate_cards(data)?;
        let cards = data
            .iter()
            .zip((0..).step_by(2))
            .flat_map(|(entry, first_id)| Card::pair_from(entry, first_id))
            .collect();
        Ok(Self {
            cards,
            click_listener: None,
        })
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn columns(&self) -> usize {
        column_count(self.cards.len())
    }

    pub fn index_of(&self, card_id: CardId) -> Option<usize> {
        self.cards.iter().position(|card| card.id == card_id)
    }

    pub fn card(&self, card_id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    /// 翻转指定卡牌并同步到界面，返回翻转后的朝向。
    pub fn toggle<V: GameView + ?Sized>(&mut self, card_id: CardId, view: &mut V) -> Option<bool> {
        let index = self.index_of(card_id)?;
        let card = &mut self.cards[index];
        card.toggle();
        view.show_card(index, card.is_face_up());
        Some(card.is_face_up())
    }

    /// Fisher–Yates 原地洗牌。
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in (1..self.cards.len()).rev() {
            let j = rng.gen_range(0..=i);
            self.cards.swap(i, j);
        }
    }

    /// 把所有正面朝上的牌翻回背面，返回被翻动的位置。
    pub fn flip_all_down(&mut self) -> Vec<usize> {
        self.cards
            .iter_mut()
            .enumerate()
            .filter(|(_, card)| card.is_face_up())
            .map(|(index, card)| {
                card.toggle();
                index
            })
            .collect()
    }

    pub fn reset<R: Rng + ?Sized, V: GameView + ?Sized>(&mut self, rng: &mut R, view: &mut V) {
        self.shuffle(rng);
        self.flip_all_down();
        view.render_board(&self.cards, self.columns());
    }

    pub fn set_click_listener(&mut self, listener: impl FnMut(CardId) + 'static) {
        self.click_listener = Some(Box::new(listener));
    }

    pub fn clear_click_listener(&mut self) {
        self.click_listener = None;
    }

    /// 由界面在卡牌被点击时调用。未注册回调或位置越界时返回 `false`。
    pub fn notify_clicked(&mut self, index: usize) -> bool {
        let Some(card_id) = self.cards.get(index).map(|card| card.id) else {
            return false;
        };
        match self.click_listener.as_mut() {
            Some(listener) => {
                listener(card_id);
                true
            }
            None => false,
        }
    }
}
