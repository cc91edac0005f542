use crate::error::Result;
use crate::model::{OutputInfo, Point, Rect, WindowHandle, WindowKind, WindowKinds};
use crate::debug_if_enabled;

use super::r#trait::DisplayBackend;

/// Окно эмулируемого рабочего стола
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeWindow {
    pub handle: WindowHandle,
    pub title: Option<String>,
    pub geometry: Option<Rect>,
    pub kinds: Option<WindowKinds>,
    pub maximized: bool,
    pub above: bool,
}

impl FakeWindow {
    pub fn new(handle: WindowHandle, title: &str, geometry: Rect) -> Self {
        Self {
            handle,
            title: Some(title.to_string()),
            geometry: Some(geometry),
            kinds: None,
            maximized: false,
            above: false,
        }
    }

    pub fn with_kind(mut self, kind: WindowKind) -> Self {
        self.kinds.get_or_insert_with(WindowKinds::new).push(kind);
        self
    }

    pub fn with_maximized(mut self) -> Self {
        self.maximized = true;
        self
    }

    #[allow(dead_code)]
    pub fn without_title(mut self) -> Self {
        self.title = None;
        self
    }
}

/// Мутация, отправленная бэкенду
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Unmaximize(WindowHandle),
    Move(WindowHandle, Point),
    SetAbove(WindowHandle),
    WarpPointer(Point),
}

/// Эмулируемый рабочий стол для режима сухого запуска и тестов.
///
/// Мутации только логируются и применяются к собственному состоянию, поэтому
/// цикл сходится так же, как на настоящем X-сервере. Как и у реального
/// оконного менеджера, перемещение максимизированного окна ничего не меняет.
///
/// Журнал мутаций ведётся только после `with_recording()`: демо-режим тикает
/// 20 раз в секунду без остановки, и журнал рос бы бесконечно.
#[derive(Debug, Clone)]
pub struct DryRunDisplay {
    outputs: Vec<OutputInfo>,
    windows: Vec<FakeWindow>,
    pointer: Point,
    outputs_available: bool,
    client_list_available: bool,
    recording: bool,
    mutations: Vec<Mutation>,
}

impl DryRunDisplay {
    pub fn new(outputs: Vec<OutputInfo>, windows: Vec<FakeWindow>, pointer: Point) -> Self {
        Self {
            outputs,
            windows,
            pointer,
            outputs_available: true,
            client_list_available: true,
            recording: false,
            mutations: Vec::new(),
        }
    }

    /// Включает журнал мутаций
    #[allow(dead_code)]
    pub fn with_recording(mut self) -> Self {
        self.recording = true;
        self
    }

    /// Два монитора 1920x1080 рядом и несколько окон в неправильных местах
    pub fn demo() -> Self {
        let outputs = vec![
            OutputInfo {
                name: "eDP-1".to_string(),
                connected: true,
                crtc: Some(Rect::new(0, 0, 1920, 1080)),
            },
            OutputInfo {
                name: "HDMI-1".to_string(),
                connected: true,
                crtc: Some(Rect::new(1920, 0, 1920, 1080)),
            },
        ];

        let windows = vec![
            FakeWindow::new(0x0120_0001, "Terminal - dry_run", Rect::new(40, 40, 800, 600)),
            FakeWindow::new(
                0x0120_0002,
                "Customer Ticket Info #4 - dry_run",
                Rect::new(50, 50, 400, 300),
            ),
            FakeWindow::new(0x0120_0003, "Browser - dry_run", Rect::new(2100, 120, 1200, 800))
                .with_maximized(),
            FakeWindow::new(0x0120_0004, "Panel - dry_run", Rect::new(1920, 1040, 1920, 40))
                .with_kind(WindowKind::Dock),
        ];

        Self::new(outputs, windows, Point::new(2500, 500))
    }

    #[allow(dead_code)]
    pub fn set_outputs(&mut self, outputs: Vec<OutputInfo>) {
        self.outputs = outputs;
    }

    /// Выключенный список выходов ведёт себя как ошибка протокола RandR
    #[allow(dead_code)]
    pub fn set_outputs_available(&mut self, available: bool) {
        self.outputs_available = available;
    }

    #[allow(dead_code)]
    pub fn set_client_list_available(&mut self, available: bool) {
        self.client_list_available = available;
    }

    #[allow(dead_code)]
    pub fn set_pointer(&mut self, pointer: Point) {
        self.pointer = pointer;
    }

    #[allow(dead_code)]
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn window(&self, handle: WindowHandle) -> Option<&FakeWindow> {
        self.windows.iter().find(|w| w.handle == handle)
    }

    pub fn window_mut(&mut self, handle: WindowHandle) -> Option<&mut FakeWindow> {
        self.windows.iter_mut().find(|w| w.handle == handle)
    }

    #[allow(dead_code)]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    #[allow(dead_code)]
    pub fn clear_mutations(&mut self) {
        self.mutations.clear();
    }

    fn record(&mut self, mutation: Mutation) {
        if self.recording {
            self.mutations.push(mutation);
        }
    }

    fn label(&self, handle: WindowHandle) -> String {
        self.window(handle)
            .and_then(|w| w.title.clone())
            .unwrap_or_else(|| format!("0x{:08x}", handle))
    }
}

impl DisplayBackend for DryRunDisplay {
    fn outputs(&mut self) -> Result<Option<Vec<OutputInfo>>> {
        Ok(self.outputs_available.then(|| self.outputs.clone()))
    }

    fn client_list(&mut self) -> Result<Option<Vec<WindowHandle>>> {
        Ok(self
            .client_list_available
            .then(|| self.windows.iter().map(|w| w.handle).collect()))
    }

    fn window_title(&mut self, window: WindowHandle) -> Result<Option<String>> {
        Ok(self.window(window).and_then(|w| w.title.clone()))
    }

    fn window_geometry(&mut self, window: WindowHandle) -> Result<Option<Rect>> {
        Ok(self.window(window).and_then(|w| w.geometry))
    }

    fn window_kinds(&mut self, window: WindowHandle) -> Result<Option<WindowKinds>> {
        Ok(self.window(window).and_then(|w| w.kinds.clone()))
    }

    fn unmaximize(&mut self, window: WindowHandle) -> Result<()> {
        debug_if_enabled!("[DRY RUN] Снятие максимизации: {}", self.label(window));
        self.record(Mutation::Unmaximize(window));
        if let Some(w) = self.window_mut(window) {
            w.maximized = false;
        }
        Ok(())
    }

    fn move_window(&mut self, window: WindowHandle, position: Point) -> Result<()> {
        debug_if_enabled!("[DRY RUN] Перемещение {} в {}", self.label(window), position);
        self.record(Mutation::Move(window, position));
        if let Some(geometry) = self
            .window_mut(window)
            .filter(|w| !w.maximized)
            .and_then(|w| w.geometry.as_mut())
        {
            geometry.x = position.x;
            geometry.y = position.y;
        }
        Ok(())
    }

    fn set_always_on_top(&mut self, window: WindowHandle) -> Result<()> {
        debug_if_enabled!("[DRY RUN] Поверх всех: {}", self.label(window));
        self.record(Mutation::SetAbove(window));
        if let Some(w) = self.window_mut(window) {
            w.above = true;
        }
        Ok(())
    }

    fn pointer_position(&mut self) -> Result<Option<Point>> {
        Ok(Some(self.pointer))
    }

    fn warp_pointer(&mut self, position: Point) -> Result<()> {
        debug_if_enabled!("[DRY RUN] Перемещение курсора в {}", position);
        self.record(Mutation::WarpPointer(position));
        self.pointer = position;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
