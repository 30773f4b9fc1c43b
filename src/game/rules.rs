use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use super::{
    board::Board,
    config::{ConfigError, FlipDuration, GameConfig},
    state::{CardId, ClockReading, GameEvent, GamePhase, GameSnapshot, IgnoreReason},
    view::{GameView, Notice},
};
use crate::timers::{Job, Scheduler, TICK_INTERVAL_MS};
use crate::utils;

/// 记忆翻牌的规则引擎。
///
/// 引擎持有牌桌、界面与调度器；翻开第二张牌后通过调度器延时判定，
/// 计时器以可取消的重复任务句柄保存，句柄存在即表示正在计时。
pub struct MemoryGame<V: GameView, S: Scheduler> {
    board: Board,
    clicks: Rc<RefCell<VecDeque<CardId>>>,
    flipped: Vec<CardId>,
    matched: BTreeSet<CardId>,
    moves: u32,
    elapsed_seconds: u32,
    clock: Option<S::Task>,
    pending_evaluation: Option<S::Task>,
    // 每次重置递增，旧一轮排下的判定任务到期时直接忽略。
    round: u64,
    flip_duration: FlipDuration,
    rng: SmallRng,
    view: V,
    scheduler: S,
}

impl<V: GameView, S: Scheduler> MemoryGame<V, S> {
    pub fn new(config: GameConfig, mut view: V, scheduler: S) -> Result<Self, ConfigError> {
        let mut board = Board::from_data(&config.cards)?;

        let (flip_duration, warning) = FlipDuration::clamped(config.flip_duration);
        if let Some(error) = warning {
            utils::warn(&format!(
                "{error}; falling back to {} ms",
                flip_duration.as_millis()
            ));
            view.notify(&Notice::InvalidFlipDuration {
                requested: config.flip_duration,
                applied: flip_duration.as_millis(),
            });
        }

        let clicks = Rc::new(RefCell::new(VecDeque::new()));
        let inbox = Rc::clone(&clicks);
        board.set_click_listener(move |card_id| inbox.borrow_mut().push_back(card_id));

        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let mut game = Self {
            board,
            clicks,
            flipped: Vec::with_capacity(2),
            matched: BTreeSet::new(),
            moves: 0,
            elapsed_seconds: 0,
            clock: None,
            pending_evaluation: None,
            round: 0,
            flip_duration,
            rng,
            view,
            scheduler,
        };
        game.board.reset(&mut game.rng, &mut game.view);
        game.refresh_counters();
        Ok(game)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub(crate) fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn flipped(&self) -> &[CardId] {
        &self.flipped
    }

    pub fn matched(&self) -> &BTreeSet<CardId> {
        &self.matched
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn clock(&self) -> ClockReading {
        ClockReading::from_seconds(self.elapsed_seconds)
    }

    pub fn flip_duration(&self) -> FlipDuration {
        self.flip_duration
    }

    pub fn timer_running(&self) -> bool {
        self.clock.is_some()
    }

    pub fn is_complete(&self) -> bool {
        !self.board.is_empty() && self.matched.len() == self.board.len()
    }

    pub fn phase(&self) -> GamePhase {
        if self.is_complete() {
            GamePhase::Complete
        } else if self.flipped.len() == 2 {
            GamePhase::Evaluating
        } else {
            GamePhase::Idle
        }
    }

    /// 界面报告第 `index` 个位置被点击；经由牌桌的点击回调转交给引擎。
    pub fn click(&mut self, index: usize) -> Vec<GameEvent> {
        if !self.board.notify_clicked(index) {
            return vec![GameEvent::ClickIgnored {
                card_id: None,
                reason: IgnoreReason::UnknownCard,
            }];
        }

        let mut events = Vec::new();
        loop {
            let next = self.clicks.borrow_mut().pop_front();
            let Some(card_id) = next else {
                break;
            };
            events.extend(self.on_card_clicked(card_id));
        }
        events
    }

    pub fn on_card_clicked(&mut self, card_id: CardId) -> Vec<GameEvent> {
        if let Some(reason) = self.rejection(card_id) {
            return vec![GameEvent::ClickIgnored {
                card_id: Some(card_id),
                reason,
            }];
        }

        self.start_timer();
        self.moves += 1;
        self.view.update_moves(self.moves);
        self.board.toggle(card_id, &mut self.view);
        self.flipped.push(card_id);

        let mut events = vec![GameEvent::CardFlipped {
            card_id,
            moves: self.moves,
        }];

        if let &[first, second] = self.flipped.as_slice() {
            let delay_ms = self.flip_duration.as_millis();
            let task = self.scheduler.once(
                delay_ms,
                Job::EvaluateMatch { round: self.round },
            );
            self.pending_evaluation = Some(task);
            events.push(GameEvent::EvaluationScheduled {
                first,
                second,
                delay_ms,
            });
        }

        events
    }

    fn rejection(&self, card_id: CardId) -> Option<IgnoreReason> {
        if self.is_complete() {
            return Some(IgnoreReason::GameComplete);
        }
        if self.flipped.len() >= 2 {
            return Some(IgnoreReason::EvaluationPending);
        }
        match self.board.card(card_id) {
            None => Some(IgnoreReason::UnknownCard),
            Some(card) if card.is_face_up() => Some(IgnoreReason::AlreadyFaceUp),
            Some(_) => None,
        }
    }

    pub fn evaluate_match(&mut self, round: u64) -> Vec<GameEvent> {
        if round != self.round {
            utils::log(&format!(
                "ignoring evaluation from round {round}, current round is {}",
                self.round
            ));
            return Vec::new();
        }
        let &[first, second] = self.flipped.as_slice() else {
            return Vec::new();
        };

        self.pending_evaluation = None;
        self.flipped.clear();

        let is_pair = match (self.board.card(first), self.board.card(second)) {
            (Some(a), Some(b)) => a.matches(b),
            _ => false,
        };

        if !is_pair {
            self.board.toggle(first, &mut self.view);
            self.board.toggle(second, &mut self.view);
            return vec![GameEvent::PairMismatched { first, second }];
        }

        self.matched.extend([first, second]);
        let mut events = vec![GameEvent::PairMatched { first, second }];

        if self.is_complete() {
            self.stop_timer();
            let elapsed = self.clock();
            utils::log(&format!(
                "all pairs found in {} moves, {elapsed}",
                self.moves
            ));
            self.view.notify(&Notice::Completed {
                moves: self.moves,
                elapsed,
            });
            events.push(GameEvent::GameCompleted {
                moves: self.moves,
                elapsed_seconds: self.elapsed_seconds,
            });
        }

        events
    }

    pub fn tick(&mut self) {
        if self.clock.is_none() {
            return;
        }
        self.elapsed_seconds += 1;
        self.view.update_clock(self.clock());
    }

    pub fn start_timer(&mut self) {
        if self.clock.is_some() {
            return;
        }
        self.clock = Some(self.scheduler.every(TICK_INTERVAL_MS, Job::Tick));
    }

    pub fn stop_timer(&mut self) {
        // 丢弃句柄即取消重复任务。
        self.clock = None;
    }

    pub fn reset(&mut self) -> Vec<GameEvent> {
        self.pending_evaluation = None;
        self.round += 1;
        self.flipped.clear();
        self.matched.clear();
        self.moves = 0;
        self.elapsed_seconds = 0;
        self.stop_timer();
        self.board.reset(&mut self.rng, &mut self.view);
        self.refresh_counters();
        vec![GameEvent::GameReset]
    }

    /// 执行调度器交回的到期任务。
    pub fn run(&mut self, job: Job) -> Vec<GameEvent> {
        match job {
            Job::EvaluateMatch { round } => self.evaluate_match(round),
            Job::Tick => {
                self.tick();
                Vec::new()
            }
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            cards: self.board.cards().to_vec(),
            columns: self.board.columns(),
            flipped: self.flipped.clone(),
            matched: self.matched.iter().copied().collect(),
            moves: self.moves,
            elapsed_seconds: self.elapsed_seconds,
            clock: self.clock(),
            phase: self.phase(),
            flip_duration_ms: self.flip_duration.as_millis(),
            timer_running: self.timer_running(),
        }
    }

    fn refresh_counters(&mut self) {
        self.view.update_moves(self.moves);
        self.view.update_clock(self.clock());
    }
}
