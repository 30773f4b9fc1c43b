use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::{Job, Scheduler};
use crate::game::{GameEvent, GameView, MemoryGame};

#[derive(Debug, Clone)]
struct Entry {
    id: u64,
    due: u64,
    period: Option<u64>,
    job: Job,
}

#[derive(Debug, Default)]
struct Timeline {
    now: u64,
    next_id: u64,
    entries: Vec<Entry>,
}

impl Timeline {
    fn push(&mut self, delay: u64, period: Option<u64>, job: Job) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            due: self.now + delay,
            period,
            job,
        });
        id
    }

    fn pop_due(&mut self, until: u64) -> Option<Job> {
        let position = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= until)
            .min_by_key(|(_, entry)| (entry.due, entry.id))
            .map(|(index, _)| index)?;

        let Entry {
            due, period, job, ..
        } = self.entries[position].clone();
        self.now = self.now.max(due);
        match period {
            Some(period) => self.entries[position].due = due + period,
            None => {
                self.entries.remove(position);
            }
        }
        Some(job)
    }
}

/// 虚拟时钟调度器：时间只在调用 `advance` / `drive` 时前进。
///
/// 克隆共享同一条时间线，测试或无头宿主可以一边把它交给引擎，一边自己推进时间。
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    timeline: Rc<RefCell<Timeline>>,
}

/// 虚拟时钟上的任务句柄，丢弃即取消。
#[derive(Debug)]
pub struct ManualTask {
    id: u64,
    timeline: Weak<RefCell<Timeline>>,
}

impl Drop for ManualTask {
    fn drop(&mut self) {
        if let Some(timeline) = self.timeline.upgrade() {
            timeline
                .borrow_mut()
                .entries
                .retain(|entry| entry.id != self.id);
        }
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.timeline.borrow().now
    }

    pub fn pending(&self) -> usize {
        self.timeline.borrow().entries.len()
    }

    /// 推进时间并按到期顺序返回任务。返回的任务不会再受之后的取消影响。
    pub fn advance(&self, millis: u64) -> Vec<Job> {
        let target = self.now() + millis;
        let mut jobs = Vec::new();
        while let Some(job) = self.pop_due(target) {
            jobs.push(job);
        }
        self.timeline.borrow_mut().now = target;
        jobs
    }

    /// 推进时间，并把每个到期任务立即交给引擎执行。
    pub fn drive<V: GameView>(
        &self,
        game: &mut MemoryGame<V, ManualScheduler>,
        millis: u64,
    ) -> Vec<GameEvent> {
        let target = self.now() + millis;
        let mut events = Vec::new();
        while let Some(job) = self.pop_due(target) {
            events.extend(game.run(job));
        }
        self.timeline.borrow_mut().now = target;
        events
    }

    fn pop_due(&self, until: u64) -> Option<Job> {
        self.timeline.borrow_mut().pop_due(until)
    }

    fn schedule(&self, delay: u64, period: Option<u64>, job: Job) -> ManualTask {
        let id = self.timeline.borrow_mut().push(delay, period, job);
        ManualTask {
            id,
            timeline: Rc::downgrade(&self.timeline),
        }
    }
}

impl Scheduler for ManualScheduler {
    type Task = ManualTask;

    fn once(&mut self, delay_ms: u32, job: Job) -> ManualTask {
        self.schedule(u64::from(delay_ms), None, job)
    }

    fn every(&mut self, period_ms: u32, job: Job) -> ManualTask {
        let period = u64::from(period_ms.max(1));
        self.schedule(period, Some(period), job)
    }
}
