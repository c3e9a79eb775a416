use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output shape for the node's logs. `Json` emits Bunyan-formatted structured
/// logs suitable for shipping to a log aggregator; `Text` emits
/// human-readable lines for interactive use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// `Json` when stdout is not a TTY (e.g. under systemd/a container),
    /// `Text` otherwise.
    pub fn auto_detect() -> Self {
        use std::io::IsTerminal;
        if std::io::stdout().is_terminal() {
            LogFormat::Text
        } else {
            LogFormat::Json
        }
    }
}

/// Installs the global `tracing` subscriber. Call once, at process startup.
///
/// `debug` raises the default filter from `info` to `debug` for the node's
/// own crates when `RUST_LOG` is not set.
pub fn init_logging(format: LogFormat, debug: bool) {
    let default_directive = if debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    match format {
        LogFormat::Json => {
            let formatting_layer = BunyanFormattingLayer::new("spn-node".into(), std::io::stdout);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(JsonStorageLayer)
                .with(formatting_layer)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer())
                .init();
        }
    }
}
