use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod model;
mod policy;
mod services;
mod utils;

use config::{Config, DEFAULT_CONFIG_PATH};
use services::{DisplayBackend, DryRunDisplay, WindowGuard, X11Display};

#[derive(Parser, Debug)]
#[command(name = "window-guard")]
#[command(about = "Держит целевое окно на втором мониторе, остальные окна и курсор на основном")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Режим сухого запуска (эмулируемый рабочий стол вместо X-сервера)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Инициализация системы логирования
    init_tracing(&args.log_level)?;

    info!("Запуск window-guard v{}", env!("CARGO_PKG_VERSION"));

    // Загрузка конфигурации
    let config = Config::load(&args.config)?;
    info!("Целевое окно: \"{}\" (конфигурация: {})", config.title, args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - X-сервер не используется");
        guard_until_signal(WindowGuard::new(&config, DryRunDisplay::demo())).await
    } else {
        let display = X11Display::connect().context("💥 Не удалось подключиться к X-серверу")?;
        guard_until_signal(WindowGuard::new(&config, display)).await
    }
}

async fn guard_until_signal<B: DisplayBackend>(guard: WindowGuard<B>) -> Result<()> {
    tokio::select! {
        result = guard.run() => {
            result.context("WindowGuard остановлен из-за ошибки")?;
        }
        signal = signal::ctrl_c() => match signal {
            Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
            Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
        },
    }

    info!("window-guard завершил работу");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
