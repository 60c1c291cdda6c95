use a3c::cli::Options;
use a3c::TrainingCoordinator;
use clap::Parser;
use std::error::Error;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging()?;
    let opts = Options::parse();
    info!(?opts, "options");

    let coordinator = TrainingCoordinator::new(
        opts.env_config(),
        opts.model_config(),
        opts.sink_config(),
        opts.coordinator_config(),
    );
    let summary = coordinator.run(opts.nb_episodes, opts.num_workers())?;
    println!("{}", summary);
    Ok(())
}
