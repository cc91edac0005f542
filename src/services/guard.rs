use crate::config::Config;
use crate::error::Result;
use crate::model::{Rect, Topology, WindowSnapshot};
use crate::policy::{confine_pointer, CorrectiveAction, PlacementContext};
use crate::services::display::DisplayBackend;
use crate::{debug_if_enabled, trace_if_enabled};
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Пауза между тиками
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Сколько ждать после снятия максимизации, прежде чем двигать окно
pub const SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Что было сделано за один тик
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Окон в `_NET_CLIENT_LIST`
    pub windows: usize,
    /// Окон без заголовка или геометрии
    pub skipped: usize,
    pub pinned_to_secondary: usize,
    pub moved_to_main: usize,
    pub pointer_warped: bool,
}

/// Управляющий цикл: каждый тик заново строит топологию, классифицирует все
/// окна, применяет действия и ограничивает курсор.
pub struct WindowGuard<B: DisplayBackend> {
    backend: B,
    target_title: String,
    topology: Topology,
    tick_interval: Duration,
    settle_delay: Duration,
}

impl<B: DisplayBackend> WindowGuard<B> {
    pub fn new(config: &Config, backend: B) -> Self {
        info!("Инициализация WindowGuard для окна \"{}\"", config.title);

        Self {
            backend,
            target_title: config.title.clone(),
            topology: Topology::default(),
            tick_interval: TICK_INTERVAL,
            settle_delay: SETTLE_DELAY,
        }
    }

    #[allow(dead_code)]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    #[allow(dead_code)]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    #[allow(dead_code)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[allow(dead_code)]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Работает, пока соединение с оконной системой живо
    pub async fn run(mut self) -> Result<()> {
        info!("WindowGuard запущен, интервал {:?}", self.tick_interval);

        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let report = self.tick().await?;
            trace_if_enabled!("Тик завершён: {:?}", report);
        }
    }

    /// Один проход: топология → снимки → действия → курсор → flush
    pub async fn tick(&mut self) -> Result<TickReport> {
        let mut report = TickReport::default();

        self.refresh_topology()?;

        // Топология фиксируется на весь тик
        let ctx = PlacementContext::new(self.topology, &self.target_title);

        let snapshots = snapshot_windows(&mut self.backend, &mut report)?;
        for window in &snapshots {
            apply_action(&mut self.backend, &ctx, window, self.settle_delay, &mut report).await?;
        }

        report.pointer_warped = confine(&mut self.backend, &self.topology.main)?;

        self.backend.flush()?;
        Ok(report)
    }

    fn refresh_topology(&mut self) -> Result<()> {
        let Some(outputs) = self.backend.outputs()? else {
            debug!("Список выходов недоступен, сохраняется прежняя топология");
            return Ok(());
        };

        let previous = self.topology;
        let active = self.topology.refresh(&outputs);

        if self.topology != previous {
            info!("Топология мониторов: {}", self.topology);
            if active < 2 {
                warn!("Активных мониторов: {}, второй монитор остаётся прежним", active);
            } else if active > 2 {
                warn!("Активных мониторов: {}, лишние игнорируются", active);
            }
            for output in outputs.iter().filter(|o| o.connected) {
                debug!("Выход {}: {:?}", output.name, output.crtc);
            }
        }

        Ok(())
    }
}

fn snapshot_windows<B: DisplayBackend>(
    backend: &mut B,
    report: &mut TickReport,
) -> Result<Vec<WindowSnapshot>> {
    let Some(handles) = backend.client_list()? else {
        debug!("_NET_CLIENT_LIST недоступен, окна пропускаются на этом тике");
        return Ok(Vec::new());
    };
    report.windows = handles.len();

    let mut snapshots = Vec::with_capacity(handles.len());
    for handle in handles {
        let title = backend.window_title(handle)?;
        let geometry = match title {
            Some(_) => backend.window_geometry(handle)?,
            None => None,
        };
        let kinds = match geometry {
            Some(_) => backend.window_kinds(handle)?,
            None => None,
        };

        match WindowSnapshot::from_parts(handle, title, geometry, kinds.as_deref()) {
            Some(snapshot) => snapshots.push(snapshot),
            None => {
                report.skipped += 1;
                trace_if_enabled!("Окно 0x{:08x} пропущено: нет заголовка или геометрии", handle);
            }
        }
    }

    Ok(snapshots)
}

async fn apply_action<B: DisplayBackend>(
    backend: &mut B,
    ctx: &PlacementContext<'_>,
    window: &WindowSnapshot,
    settle_delay: Duration,
    report: &mut TickReport,
) -> Result<()> {
    let action = ctx.decide(window);
    let Some(destination) = ctx.destination(action) else {
        return Ok(());
    };

    // Сдвиг максимизированного окна ни на что не влияет
    backend.unmaximize(window.handle)?;
    backend.flush()?;
    sleep(settle_delay).await;

    backend.move_window(window.handle, destination)?;

    match action {
        CorrectiveAction::MoveToSecondaryAndRaise => {
            backend.set_always_on_top(window.handle)?;
            report.pinned_to_secondary += 1;
            debug_if_enabled!("✅ Окно '{}' удерживается на втором мониторе", window.title);
        }
        CorrectiveAction::MoveToMain => {
            report.moved_to_main += 1;
            info!("↩️ Окно {} возвращено на основной монитор в {}", window, destination);
        }
        CorrectiveAction::NoAction => {}
    }

    Ok(())
}

fn confine<B: DisplayBackend>(backend: &mut B, main: &Rect) -> Result<bool> {
    let Some(pointer) = backend.pointer_position()? else {
        return Ok(false);
    };
    let Some(confined) = confine_pointer(pointer, main) else {
        return Ok(false);
    };

    trace_if_enabled!("Курсор {} возвращён на основной монитор: {}", pointer, confined);
    backend.warp_pointer(confined)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OutputInfo, Point, WindowKind};
    use crate::services::display::{DryRunDisplay, FakeWindow, Mutation};

    const TARGET: u32 = 0x0120_0002;
    const BROWSER: u32 = 0x0120_0003;
    const DOCK: u32 = 0x0120_0004;

    fn guard(display: DryRunDisplay) -> WindowGuard<DryRunDisplay> {
        WindowGuard::new(&Config::default(), display.with_recording())
            .with_settle_delay(Duration::ZERO)
    }

    fn output(name: &str, rect: Rect) -> OutputInfo {
        OutputInfo {
            name: name.to_string(),
            connected: true,
            crtc: Some(rect),
        }
    }

    fn origin_of(guard: &WindowGuard<DryRunDisplay>, handle: u32) -> Point {
        guard.backend().window(handle).unwrap().geometry.unwrap().origin()
    }

    #[tokio::test]
    async fn test_first_tick_enforces_policy() {
        let mut guard = guard(DryRunDisplay::demo());
        let report = guard.tick().await.unwrap();

        assert_eq!(guard.topology().main, Rect::new(0, 0, 1920, 1080));
        assert_eq!(guard.topology().secondary, Rect::new(1920, 0, 1920, 1080));

        assert_eq!(report.windows, 4);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.pinned_to_secondary, 1);
        assert_eq!(report.moved_to_main, 1);
        assert!(report.pointer_warped);

        assert_eq!(origin_of(&guard, TARGET), Point::new(2020, 100));
        assert!(guard.backend().window(TARGET).unwrap().above);
        assert_eq!(origin_of(&guard, BROWSER), Point::new(100, 100));
        assert!(!guard.backend().window(BROWSER).unwrap().maximized);
        assert_eq!(origin_of(&guard, DOCK), Point::new(1920, 1040));
        assert_eq!(origin_of(&guard, 0x0120_0001), Point::new(40, 40));
        assert_eq!(guard.backend().pointer(), Point::new(1918, 500));
    }

    #[tokio::test]
    async fn test_second_tick_only_repins_target() {
        let mut guard = guard(DryRunDisplay::demo());
        guard.tick().await.unwrap();
        guard.backend_mut().clear_mutations();

        let report = guard.tick().await.unwrap();

        assert_eq!(report.moved_to_main, 0);
        assert_eq!(report.pinned_to_secondary, 1);
        assert!(!report.pointer_warped);
        assert_eq!(
            guard.backend().mutations(),
            &[
                Mutation::Unmaximize(TARGET),
                Mutation::Move(TARGET, Point::new(2020, 100)),
                Mutation::SetAbove(TARGET),
            ]
        );
    }

    #[tokio::test]
    async fn test_unmaximize_precedes_move() {
        let mut guard = guard(DryRunDisplay::demo());
        guard.tick().await.unwrap();

        let browser: Vec<_> = guard
            .backend()
            .mutations()
            .iter()
            .filter(|m| matches!(m, Mutation::Unmaximize(BROWSER) | Mutation::Move(BROWSER, _)))
            .copied()
            .collect();

        assert_eq!(
            browser,
            vec![Mutation::Unmaximize(BROWSER), Mutation::Move(BROWSER, Point::new(100, 100))]
        );
    }

    #[tokio::test]
    async fn test_untitled_window_is_skipped() {
        let display = DryRunDisplay::new(
            vec![
                output("eDP-1", Rect::new(0, 0, 1920, 1080)),
                output("HDMI-1", Rect::new(1920, 0, 1920, 1080)),
            ],
            vec![FakeWindow::new(9, "unused", Rect::new(2000, 50, 300, 200)).without_title()],
            Point::new(10, 10),
        );
        let mut guard = guard(display);

        let report = guard.tick().await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.moved_to_main, 0);
        assert!(guard.backend().mutations().is_empty());
    }

    #[tokio::test]
    async fn test_desktop_window_off_main_stays() {
        let display = DryRunDisplay::new(
            vec![
                output("eDP-1", Rect::new(0, 0, 1920, 1080)),
                output("HDMI-1", Rect::new(1920, 0, 1920, 1080)),
            ],
            vec![FakeWindow::new(5, "Taskbar", Rect::new(1920, 0, 1920, 1080))
                .with_kind(WindowKind::Desktop)],
            Point::new(10, 10),
        );
        let mut guard = guard(display);

        let report = guard.tick().await.unwrap();

        assert_eq!(report.moved_to_main, 0);
        assert_eq!(origin_of(&guard, 5), Point::new(1920, 0));
    }

    #[tokio::test]
    async fn test_topology_is_rebuilt_every_tick() {
        let mut guard = guard(DryRunDisplay::demo());
        guard.tick().await.unwrap();

        // Второй монитор отключили: основной меняется, второй остаётся прежним
        guard
            .backend_mut()
            .set_outputs(vec![output("HDMI-1", Rect::new(1920, 0, 1920, 1080))]);
        guard.backend_mut().set_pointer(Point::new(500, 500));

        let report = guard.tick().await.unwrap();

        assert_eq!(guard.topology().main, Rect::new(1920, 0, 1920, 1080));
        assert_eq!(guard.topology().secondary, Rect::new(1920, 0, 1920, 1080));
        assert_eq!(guard.backend().pointer(), Point::new(1922, 500));
        // Терминал и браузер теперь вне основного монитора
        assert_eq!(report.moved_to_main, 2);
        assert_eq!(origin_of(&guard, 0x0120_0001), Point::new(2020, 100));
    }

    #[tokio::test]
    async fn test_no_outputs_before_first_detection() {
        let display = DryRunDisplay::new(
            Vec::new(),
            vec![FakeWindow::new(1, "Customer Ticket Info", Rect::new(50, 50, 400, 300))],
            Point::new(0, 0),
        );
        let mut guard = guard(display);

        guard.tick().await.unwrap();

        assert_eq!(guard.topology(), Topology::default());
        assert_eq!(origin_of(&guard, 1), Point::new(100, 100));
    }

    #[tokio::test]
    async fn test_failed_output_query_keeps_topology() {
        let mut guard = guard(DryRunDisplay::demo());
        guard.tick().await.unwrap();
        let before = guard.topology();

        // RandR вернул ошибку, а выходы за это время изменились
        guard.backend_mut().set_outputs_available(false);
        guard
            .backend_mut()
            .set_outputs(vec![output("DP-2", Rect::new(0, 0, 2560, 1440))]);

        let report = guard.tick().await.unwrap();

        assert_eq!(guard.topology(), before);
        assert_eq!(report.moved_to_main, 0);
        assert_eq!(report.pinned_to_secondary, 1);
        assert_eq!(origin_of(&guard, TARGET), Point::new(2020, 100));

        // Как только запрос снова проходит, топология перестраивается
        guard.backend_mut().set_outputs_available(true);
        guard.tick().await.unwrap();
        assert_eq!(guard.topology().main, Rect::new(0, 0, 2560, 1440));
    }

    #[tokio::test]
    async fn test_missing_client_list_still_confines_pointer() {
        let mut guard = guard(DryRunDisplay::demo());
        guard.backend_mut().set_client_list_available(false);

        let report = guard.tick().await.unwrap();

        assert_eq!(report.windows, 0);
        assert_eq!(report.pinned_to_secondary, 0);
        assert_eq!(report.moved_to_main, 0);
        assert!(report.pointer_warped);
        assert_eq!(guard.backend().pointer(), Point::new(1918, 500));
        assert_eq!(
            guard.backend().mutations(),
            &[Mutation::WarpPointer(Point::new(1918, 500))]
        );
        // Окна не тронуты
        assert_eq!(origin_of(&guard, TARGET), Point::new(50, 50));
    }

    #[tokio::test]
    async fn test_demo_mode_does_not_accumulate_mutations() {
        let display = DryRunDisplay::demo();
        let mut guard = WindowGuard::new(&Config::default(), display)
            .with_settle_delay(Duration::ZERO);

        for _ in 0..500 {
            guard.tick().await.unwrap();
        }

        assert!(guard.backend().mutations().is_empty());
        assert_eq!(origin_of(&guard, TARGET), Point::new(2020, 100));
    }
}
