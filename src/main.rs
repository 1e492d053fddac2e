use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::error;

use weather_etl::config::{DEFAULT_CONFIG_PATH, PipelineConfig};
use weather_etl::ingestion::{CompositeObserver, FileObserver, IngestionObserver, LogObserver, ReqwestHttp};
use weather_etl::load::JsonLinesStore;
use weather_etl::pipeline::Pipeline;
use weather_etl::scheduler::{run_daily, DailySchedule};
use weather_etl::PipelineError;

#[derive(Debug, Parser)]
#[command(name = "weather-etl", version, about = "Daily weather ETL into an append-only store")]
struct Cli {
    /// Pipeline config file (JSON).
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Run the pipeline once and exit instead of starting the daily scheduler.
    #[arg(long)]
    once: bool,

    /// OpenWeatherMap credential; overrides the key in the config file.
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Also append ingestion outcomes to this file.
    #[arg(long)]
    ingestion_log: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let mut config = PipelineConfig::from_path(&cli.config)?;
    if let Some(key) = cli.api_key {
        config = config.with_api_key(key);
    }
    let schedule = DailySchedule::from_config(&config.schedule)?;
    let mut store = JsonLinesStore::open(&config.store.target, &config.store.namespace, &config.store.collection);

    let mut observers: Vec<Arc<dyn IngestionObserver>> = vec![Arc::new(LogObserver)];
    if let Some(path) = cli.ingestion_log {
        observers.push(Arc::new(FileObserver::new(path)));
    }
    let pipeline = Pipeline::new(config, ReqwestHttp::new()).with_observer(Arc::new(CompositeObserver::new(observers)));

    if cli.once {
        pipeline.run(&mut store)?;
        return Ok(());
    }
    run_daily(schedule, || pipeline.run(&mut store))
}
