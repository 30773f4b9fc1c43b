use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::{Interval, Timeout};

use super::{Job, Scheduler};
use crate::game::{GameView, MemoryGame};
use crate::utils;

/// 浏览器端共享的引擎实例。
pub type SharedGame<V> = Rc<RefCell<MemoryGame<V, BrowserScheduler<V>>>>;
type WeakGame<V> = Weak<RefCell<MemoryGame<V, BrowserScheduler<V>>>>;

/// 基于 `setTimeout` / `setInterval` 的调度器，回调通过弱引用回到引擎。
pub struct BrowserScheduler<V: GameView + 'static> {
    game: WeakGame<V>,
}

/// gloo 的定时器在 drop 时会自动清除。
pub enum BrowserTask {
    Timeout(Timeout),
    Interval(Interval),
}

impl<V: GameView + 'static> BrowserScheduler<V> {
    /// 尚未绑定引擎的调度器；引擎放进 `Rc` 之后再调用 [`BrowserScheduler::share`]。
    pub fn detached() -> Self {
        Self { game: Weak::new() }
    }

    /// 把引擎包装为共享实例，并让调度器回指到它。
    pub fn share(game: MemoryGame<V, BrowserScheduler<V>>) -> SharedGame<V> {
        let shared = Rc::new(RefCell::new(game));
        shared.borrow_mut().scheduler_mut().game = Rc::downgrade(&shared);
        shared
    }
}

fn dispatch<V: GameView + 'static>(game: &WeakGame<V>, job: Job) {
    let Some(game) = game.upgrade() else {
        return;
    };
    let borrowed = game.try_borrow_mut();
    let events = match borrowed {
        Ok(mut engine) => engine.run(job),
        Err(_) => {
            utils::warn(&format!("game is busy, dropping scheduled {job:?}"));
            return;
        }
    };
    // 定时触发的事件没有调用方接收，写入控制台。
    if events.is_empty() {
        return;
    }
    match serde_json::to_string(&events) {
        Ok(json) => utils::log(&format!("scheduled {job:?}: {json}")),
        Err(error) => utils::warn(&format!("failed to serialize events: {error}")),
    }
}

impl<V: GameView + 'static> Scheduler for BrowserScheduler<V> {
    type Task = BrowserTask;

    fn once(&mut self, delay_ms: u32, job: Job) -> BrowserTask {
        let game = self.game.clone();
        BrowserTask::Timeout(Timeout::new(delay_ms, move || dispatch(&game, job)))
    }

    fn every(&mut self, period_ms: u32, job: Job) -> BrowserTask {
        let game = self.game.clone();
        BrowserTask::Interval(Interval::new(period_ms, move || dispatch(&game, job)))
    }
}
