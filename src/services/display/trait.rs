use crate::error::Result;
use crate::model::{OutputInfo, Point, Rect, WindowHandle, WindowKinds};

/// Связь с оконной системой.
///
/// `Ok(None)` означает, что значение сейчас недоступно (окно исчезло, ошибка
/// протокола): элемент пропускается до следующего тика. `Err` означает, что
/// само соединение разорвано, и это фатально.
///
/// Мутации работают по принципу fire-and-forget: подтверждения не ждут.
pub trait DisplayBackend {
    /// Выходы дисплея в порядке перечисления
    fn outputs(&mut self) -> Result<Option<Vec<OutputInfo>>>;

    /// Управляемые окна верхнего уровня
    fn client_list(&mut self) -> Result<Option<Vec<WindowHandle>>>;

    fn window_title(&mut self, window: WindowHandle) -> Result<Option<String>>;

    /// Размер окна и его начало в координатах корневого окна
    fn window_geometry(&mut self, window: WindowHandle) -> Result<Option<Rect>>;

    fn window_kinds(&mut self, window: WindowHandle) -> Result<Option<WindowKinds>>;

    /// Снять максимизацию по обеим осям
    fn unmaximize(&mut self, window: WindowHandle) -> Result<()>;

    fn move_window(&mut self, window: WindowHandle, position: Point) -> Result<()>;

    /// Подсказка оконному менеджеру держать окно поверх остальных
    fn set_always_on_top(&mut self, window: WindowHandle) -> Result<()>;

    fn pointer_position(&mut self) -> Result<Option<Point>>;

    fn warp_pointer(&mut self, position: Point) -> Result<()>;

    /// Отправить накопленные запросы
    fn flush(&mut self) -> Result<()>;
}
