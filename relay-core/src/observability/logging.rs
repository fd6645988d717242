use crate::config::LoggingConfig;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_INIT: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber once. `RUST_LOG` wins over `config.level`.
pub fn setup_logging(config: &LoggingConfig) {
    LOG_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.level));

        let registry = tracing_subscriber::registry().with(filter);

        let result = if config.format.eq_ignore_ascii_case("json") {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_current_span(true),
                )
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_target(true))
                .try_init()
        };

        if let Err(e) = result {
            eprintln!("logging already initialised: {}", e);
        }
    });
}

/// Logs under the `workflow` target with the submission's identifying fields.
#[macro_export]
macro_rules! log_workflow {
    ($level:ident, $submission:expr, $($arg:tt)*) => {
        tracing::$level!(
            target: "workflow",
            email = %$submission.email,
            task = %$submission.task,
            round = $submission.round.number(),
            nonce = ?$submission.nonce,
            $($arg)*
        );
    };
}
