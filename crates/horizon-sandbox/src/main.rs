use std::io::Write;

use horizon_sandbox::{demo, DemoSettings};
use horizon_sandbox_core::{init_global_registry, SandboxError, TracingSink};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = DemoSettings::load()?;

    // RUST_LOG wins over the configured filter.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.log_filter)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;

    let registry = init_global_registry();
    match demo::run(&settings, &registry, TracingSink::shared()) {
        Ok(ticks) => {
            tracing::debug!(
                target: "horizon_sandbox::demo",
                ticks,
                live = registry.live_count(),
                "exiting"
            );
            Ok(())
        }
        Err(SandboxError::Fatal(err)) => {
            tracing::error!(target: "horizon_sandbox::demo", reason = err.reason(), "{err}");
            let _ = std::io::stderr().flush();
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}
