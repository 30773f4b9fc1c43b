pub mod game;
pub mod timers;
pub mod utils;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

pub use game::{
    column_count, Board, Card, CardData, CardId, ClockReading, ConfigError, FlipDuration,
    GameConfig, GameEvent, GamePhase, GameSnapshot, GameView, IgnoreReason, MemoryGame, Notice,
    NullView,
};
pub use timers::{BrowserScheduler, Job, ManualScheduler, Scheduler, TICK_INTERVAL_MS};

use timers::browser::SharedGame;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

#[wasm_bindgen]
extern "C" {
    /// 宿主页面传入的界面对象，按方法名鸭子类型调用。
    pub type JsGameView;

    #[wasm_bindgen(method, js_name = renderBoard)]
    fn render_board(this: &JsGameView, cards: JsValue, columns: u32);

    #[wasm_bindgen(method, js_name = showCard)]
    fn show_card(this: &JsGameView, index: u32, face_up: bool);

    #[wasm_bindgen(method, js_name = updateMoves)]
    fn update_moves(this: &JsGameView, moves: u32);

    #[wasm_bindgen(method, js_name = updateClock)]
    fn update_clock(this: &JsGameView, hours: String, minutes: String, seconds: String);

    #[wasm_bindgen(method)]
    fn notify(this: &JsGameView, notice: JsValue);
}

/// 待送达宿主的提示。引擎借用期间只入队，释放借用后再调用 JS 的 `notify`，
/// 这样宿主在回调里可以直接 `restart()`。
#[derive(Clone)]
struct Outbox {
    view: Rc<JsGameView>,
    queue: Rc<RefCell<VecDeque<Notice>>>,
    armed: Rc<Cell<bool>>,
}

impl Outbox {
    fn new(view: JsGameView) -> Self {
        Self {
            view: Rc::new(view),
            queue: Rc::default(),
            armed: Rc::default(),
        }
    }

    fn post(&self, notice: Notice) {
        self.queue.borrow_mut().push_back(notice);
        if self.armed.replace(true) {
            return;
        }
        // 定时器回调里产生的提示没有 `with_game` 收尾，交给下一轮事件循环。
        let outbox = self.clone();
        Timeout::new(0, move || outbox.deliver()).forget();
    }

    fn deliver(&self) {
        self.armed.set(false);
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(notice) = next else {
                break;
            };
            match to_value(&notice) {
                Ok(notice) => self.view.notify(notice),
                Err(error) => utils::warn(&format!("failed to serialize notice: {error}")),
            }
        }
    }
}

struct HostView {
    inner: Rc<JsGameView>,
    outbox: Outbox,
}

impl HostView {
    fn new(outbox: &Outbox) -> Self {
        Self {
            inner: Rc::clone(&outbox.view),
            outbox: outbox.clone(),
        }
    }
}

impl GameView for HostView {
    fn render_board(&mut self, cards: &[Card], columns: usize) {
        match to_value(cards) {
            Ok(cards) => self.inner.render_board(cards, columns as u32),
            Err(error) => utils::warn(&format!("failed to serialize board: {error}")),
        }
    }

    fn show_card(&mut self, index: usize, face_up: bool) {
        self.inner.show_card(index as u32, face_up);
    }

    fn update_moves(&mut self, moves: u32) {
        self.inner.update_moves(moves);
    }

    fn update_clock(&mut self, clock: ClockReading) {
        self.inner.update_clock(
            format!("{:02}", clock.hours),
            format!("{:02}", clock.minutes),
            format!("{:02}", clock.seconds),
        );
    }

    fn notify(&mut self, notice: &Notice) {
        self.outbox.post(notice.clone());
    }
}

fn to_js_error(error: ConfigError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn events_json(events: Vec<GameEvent>) -> Result<String, JsValue> {
    serde_json::to_string(&events).map_err(serde_to_js_error)
}

fn parse_config(config: JsValue) -> Result<GameConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(GameConfig::default());
    }
    if let Some(json) = config.as_string() {
        return GameConfig::from_json(&json).map_err(to_js_error);
    }
    serde_wasm_bindgen::from_value(config).map_err(JsValue::from)
}

/// 浏览器端的游戏句柄。
#[wasm_bindgen]
pub struct MemoryMatch {
    game: SharedGame<HostView>,
    outbox: Outbox,
}

impl MemoryMatch {
    fn with_game<T>(
        &self,
        action: impl FnOnce(&mut MemoryGame<HostView, BrowserScheduler<HostView>>) -> T,
    ) -> Result<T, JsValue> {
        let result = {
            let mut game = self
                .game
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str("game is busy"))?;
            action(&mut *game)
        };
        self.outbox.deliver();
        Ok(result)
    }
}

#[wasm_bindgen]
impl MemoryMatch {
    /// `config` 可以是 JS 对象、JSON 字符串或 `undefined`（使用默认卡组）。
    #[wasm_bindgen(constructor)]
    pub fn new(view: JsGameView, config: JsValue) -> Result<MemoryMatch, JsValue> {
        let config = parse_config(config)?;
        let outbox = Outbox::new(view);
        let game = MemoryGame::new(
            config,
            HostView::new(&outbox),
            BrowserScheduler::detached(),
        )
        .map_err(to_js_error)?;
        let game = BrowserScheduler::share(game);
        outbox.deliver();
        Ok(MemoryMatch { game, outbox })
    }

    /// 处理第 `index` 个位置的点击，返回事件的 JSON 数组。
    pub fn click(&self, index: u32) -> Result<String, JsValue> {
        let events = self.with_game(|game| game.click(index as usize))?;
        events_json(events)
    }

    pub fn restart(&self) -> Result<String, JsValue> {
        let events = self.with_game(|game| game.reset())?;
        events_json(events)
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        let snapshot = self.with_game(|game| game.snapshot())?;
        serde_json::to_string(&snapshot).map_err(serde_to_js_error)
    }

    pub fn columns(&self) -> Result<u32, JsValue> {
        self.with_game(|game| game.board().columns() as u32)
    }

    pub fn moves(&self) -> Result<u32, JsValue> {
        self.with_game(|game| game.moves())
    }

    #[wasm_bindgen(js_name = "elapsedSeconds")]
    pub fn elapsed_seconds(&self) -> Result<u32, JsValue> {
        self.with_game(|game| game.elapsed_seconds())
    }
}

#[wasm_bindgen(js_name = "columnCount")]
pub fn column_count_js(num_cards: u32) -> u32 {
    column_count(num_cards as usize) as u32
}

/// 返回默认卡组，方便前端预加载图片。
#[wasm_bindgen(js_name = "sampleDeck")]
pub fn sample_deck() -> Result<JsValue, JsValue> {
    to_value(&CardData::sample_deck()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "formatClock")]
pub fn format_clock(seconds: u32) -> String {
    ClockReading::from_seconds(seconds).to_string()
}
