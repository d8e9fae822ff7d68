use std::sync::Arc;

use anyhow::{Context, Result};

use logdumper::app::App;
use logdumper::bridge;
use logdumper::config::{self, Config};
use logdumper::logger::Logger;
use logdumper::registry::LoggerRegistry;
use logdumper::scope;

fn main() -> Result<()> {
    let config = Config::load()?;

    // Root logger shared by the panel, the demo and the tracing bridge
    let logger: Arc<Logger> = Arc::new(Logger::new(config.logger.clone()));

    // Route tracing events into the logger BEFORE any tracing calls
    let logs_dir = config::logs_dir().context("Could not determine home directory")?;
    let log_file = bridge::init_logging(Arc::clone(&logger), &logs_dir)?;

    tracing::info!(
        session = logdumper::logger::session_id(),
        log_file = %log_file.path.display(),
        "Session started"
    );

    let registry = Arc::new(LoggerRegistry::new(logger));
    scope::provide_registry(registry, || {
        let mut app = App::new(&config)?;
        app.run()
    })
}
