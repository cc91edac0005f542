use crate::model::{Point, Rect, Topology, WindowSnapshot};
use std::fmt;

/// Смещение от начала монитора, куда ставится перемещаемое окно
pub const PLACEMENT_INSET: Point = Point { x: 100, y: 100 };

/// Корректирующее действие для одного окна на одном тике
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorrectiveAction {
    /// Целевое окно: снять максимизацию, перенести на второй монитор, поверх всех
    MoveToSecondaryAndRaise,
    /// Обычное окно вне основного монитора: снять максимизацию и вернуть
    MoveToMain,
    NoAction,
}

impl fmt::Display for CorrectiveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MoveToSecondaryAndRaise => "move-to-secondary+raise",
            Self::MoveToMain => "move-to-main",
            Self::NoAction => "none",
        };
        f.write_str(name)
    }
}

/// Всё, что нужно для решения по окнам на одном тике.
///
/// Строится заново каждый тик из текущей топологии, поэтому все решения тика
/// согласованы между собой и не зависят от предыдущих тиков.
#[derive(Debug, Clone, Copy)]
pub struct PlacementContext<'a> {
    pub topology: Topology,
    pub target_title: &'a str,
}

impl<'a> PlacementContext<'a> {
    pub fn new(topology: Topology, target_title: &'a str) -> Self {
        Self {
            topology,
            target_title,
        }
    }

    pub fn is_target(&self, window: &WindowSnapshot) -> bool {
        window.title.contains(self.target_title)
    }

    pub fn is_fully_on_main(&self, window: &WindowSnapshot) -> bool {
        self.topology.main.contains_rect(&window.geometry)
    }

    /// Таблица решений: целевое окно важнее особого, особое важнее положения
    pub fn decide(&self, window: &WindowSnapshot) -> CorrectiveAction {
        if self.is_target(window) {
            CorrectiveAction::MoveToSecondaryAndRaise
        } else if window.is_special || self.is_fully_on_main(window) {
            CorrectiveAction::NoAction
        } else {
            CorrectiveAction::MoveToMain
        }
    }

    /// Куда переместить окно для данного действия
    pub fn destination(&self, action: CorrectiveAction) -> Option<Point> {
        let monitor = match action {
            CorrectiveAction::MoveToSecondaryAndRaise => self.topology.secondary,
            CorrectiveAction::MoveToMain => self.topology.main,
            CorrectiveAction::NoAction => return None,
        };
        Some(inset_origin(&monitor))
    }
}

fn inset_origin(monitor: &Rect) -> Point {
    Point::new(
        monitor.x.saturating_add(PLACEMENT_INSET.x),
        monitor.y.saturating_add(PLACEMENT_INSET.y),
    )
}
