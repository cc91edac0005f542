use super::monitor::Rect;
use smallvec::SmallVec;
use std::fmt;

/// Идентификатор окна верхнего уровня (XID)
pub type WindowHandle = u32;

/// Тип окна из `_NET_WM_WINDOW_TYPE`, значимый для классификации
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Dock,
    Desktop,
    Other,
}

/// Набор типов окна; обычно один-два элемента
pub type WindowKinds = SmallVec<[WindowKind; 4]>;

/// Факты об окне, нужные для классификации, собранные за один тик
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub handle: WindowHandle,
    pub title: String,
    pub geometry: Rect,
    /// Док, панель или рабочий стол: такие окна не перемещаются
    pub is_special: bool,
}

impl WindowSnapshot {
    /// Собрать снимок из результатов запросов к окну.
    ///
    /// Без заголовка или геометрии окно пропускается на этот тик.
    /// Отсутствие типа означает обычное окно.
    pub fn from_parts(
        handle: WindowHandle,
        title: Option<String>,
        geometry: Option<Rect>,
        kinds: Option<&[WindowKind]>,
    ) -> Option<Self> {
        Some(Self {
            handle,
            title: title?,
            geometry: geometry?,
            is_special: kinds.is_some_and(is_special_kind_set),
        })
    }
}

impl fmt::Display for WindowSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x} \"{}\" {}", self.handle, self.title, self.geometry)
    }
}

fn is_special_kind_set(kinds: &[WindowKind]) -> bool {
    kinds
        .iter()
        .any(|kind| matches!(kind, WindowKind::Dock | WindowKind::Desktop))
}
