pub mod config;
pub mod host;
pub mod logging_system;
pub mod retry;

pub use config::{Config, ConfigError, LogFormat, LogLevel};
pub use host::{Host, HostStats};
pub use logging_system::{LoggingSystem, setup_logging};
pub use retry::RetryPolicy;

use crate::output::HttpOutput;
use std::process;
use tokio::io::BufReader;
use tracing::{error, info, warn};

pub struct App {
    host: Host<HttpOutput>,
}

impl App {
    pub fn from_config(config: &Config) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let output_config = config.output_config();

        info!("Starting rask-http-output v{}", crate::VERSION);
        info!(
            "Configuration: endpoint={}, method={}, serializer={:?}, bulk_request={}, rate_limit_msec={}",
            output_config.endpoint_url,
            output_config.http_method,
            output_config.effective_serializer(),
            output_config.bulk_request,
            output_config.rate_limit_msec
        );

        let output = HttpOutput::new(output_config)?;
        let host = Host::new(output, config.tag.clone(), config.batch_size, config.retry_policy());

        Ok(Self { host })
    }

    /// Forwards stdin until EOF or Ctrl+C.
    pub async fn run(self) -> Result<HostStats, Box<dyn std::error::Error + Send + Sync>> {
        let reader = BufReader::new(tokio::io::stdin());

        let stats = tokio::select! {
            result = self.host.run(reader) => result?,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, pending records are not delivered");
                HostStats::default()
            }
        };

        let metrics = self.host.output().metrics();
        info!(
            "Finished: {} lines, {} delivered, {} dropped, {} malformed; {} requests ({} ok, {} skipped, {} recoverable, {} rejected, {} transport errors)",
            stats.lines_read,
            stats.records_delivered,
            stats.records_dropped,
            stats.malformed_lines,
            metrics.attempts,
            metrics.successes,
            metrics.skipped,
            metrics.recoverable_failures,
            metrics.rejected,
            metrics.transport_failures
        );

        Ok(stats)
    }
}

// Main entry point for the application
pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = match Config::from_args(std::env::args_os()) {
        Ok(config) => config,
        Err(ConfigError::Cli(e)) => e.exit(),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(2);
        }
    };

    setup_logging(config.log_level, config.log_format)?;

    let app = match App::from_config(&config) {
        Ok(app) => app,
        Err(e) => {
            error!("Initialization error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = app.run().await {
        error!("Application error: {}", e);
        process::exit(1);
    }

    Ok(())
}
