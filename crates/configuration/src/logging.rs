use crate::settings::Logging;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global tracing subscriber.
///
/// Logs go to stderr and, when `settings.directory` is set, to a daily-rolling
/// file as well. The returned guard flushes the file writer on drop, so the
/// caller must keep it alive for the lifetime of the process.
pub fn init_tracing(settings: &Logging) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr));

    match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &settings.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            if let Err(e) = registry.with(fmt::layer().with_ansi(false).with_writer(writer)).try_init() {
                eprintln!("tracing subscriber already installed: {}", e);
            }
            Some(guard)
        }
        None => {
            if let Err(e) = registry.try_init() {
                eprintln!("tracing subscriber already installed: {}", e);
            }
            None
        }
    }
}
