//! 定时任务：一次性延时与固定间隔重复。

pub mod browser;
pub mod manual;

use serde::{Deserialize, Serialize};

pub use browser::{BrowserScheduler, BrowserTask};
pub use manual::{ManualScheduler, ManualTask};

/// 计时器的刷新间隔。
pub const TICK_INTERVAL_MS: u32 = 1000;

/// 到期后交回引擎执行的任务。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Job {
    EvaluateMatch { round: u64 },
    Tick,
}

/// 调度器。返回的任务句柄在被丢弃时取消对应任务。
pub trait Scheduler {
    type Task;

    fn once(&mut self, delay_ms: u32, job: Job) -> Self::Task;
    fn every(&mut self, period_ms: u32, job: Job) -> Self::Task;
}
