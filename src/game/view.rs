use serde::{Deserialize, Serialize};

use super::state::{Card, ClockReading};

/// 面向玩家的提示消息，以事件形式交给界面，不阻塞引擎。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Notice {
    InvalidFlipDuration { requested: f64, applied: u32 },
    Completed { moves: u32, elapsed: ClockReading },
}

/// 渲染协作者。引擎只通过这里与界面交互。
pub trait GameView {
    fn render_board(&mut self, cards: &[Card], columns: usize);
    fn show_card(&mut self, index: usize, face_up: bool);
    fn update_moves(&mut self, moves: u32);
    fn update_clock(&mut self, clock: ClockReading);
    fn notify(&mut self, notice: &Notice);
}

/// 不做任何渲染的界面，适合无头运行。
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl GameView for NullView {
    fn render_board(&mut self, _cards: &[Card], _columns: usize) {}
    fn show_card(&mut self, _index: usize, _face_up: bool) {}
    fn update_moves(&mut self, _moves: u32) {}
    fn update_clock(&mut self, _clock: ClockReading) {}
    fn notify(&mut self, _notice: &Notice) {}
}

#[cfg(test)]
pub(crate) mod recording {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Default)]
    pub struct ViewLog {
        pub renders: Vec<(Vec<String>, usize)>,
        pub flips: Vec<(usize, bool)>,
        pub moves: Vec<u32>,
        pub clocks: Vec<ClockReading>,
        pub notices: Vec<Notice>,
    }

    /// 记录所有界面调用，测试里通过共享的 `ViewLog` 检查。
    #[derive(Debug, Default, Clone)]
    pub struct RecordingView {
        pub log: Rc<RefCell<ViewLog>>,
    }

    impl GameView for RecordingView {
        fn render_board(&mut self, cards: &[Card], columns: usize) {
            let names = cards.iter().map(|card| card.name.clone()).collect();
            self.log.borrow_mut().renders.push((names, columns));
        }

        fn show_card(&mut self, index: usize, face_up: bool) {
            self.log.borrow_mut().flips.push((index, face_up));
        }

        fn update_moves(&mut self, moves: u32) {
            self.log.borrow_mut().moves.push(moves);
        }

        fn update_clock(&mut self, clock: ClockReading) {
            self.log.borrow_mut().clocks.push(clock);
        }

        fn notify(&mut self, notice: &Notice) {
            self.log.borrow_mut().notices.push(notice.clone());
        }
    }
}
