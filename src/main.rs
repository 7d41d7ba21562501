use anyhow::Context;
use churn_predict::app::{batch, inspect, single, stream};
use churn_predict::config::Command;
use churn_predict::utils::error::ErrorSeverity;
use churn_predict::utils::{logger, validation::Validate};
use churn_predict::{
    AppConfig, ArtifactStore, BatchPipeline, ChurnError, CliConfig, InferenceAdapter, LocalStorage,
};
use clap::Parser;
use std::path::Path;

fn exit_code(e: &ChurnError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report_and_exit(context: &str, e: &ChurnError) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e));
}

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let mut config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(exit_code(&e));
        }
    };
    cli.apply_overrides(&mut config);

    logger::init_cli_logger(cli.verbose, &config.logging.level, config.logging.log_format());
    tracing::info!("🚀 Starting churn-predict");
    tracing::debug!("Effective config: {:?}", config);

    if let Err(e) = config.validate() {
        report_and_exit("Configuration validation failed", &e);
    }

    // Nothing is served until both artifacts are loaded.
    let artifacts = match ArtifactStore::from_config(&config).load() {
        Ok(artifacts) => artifacts,
        Err(e) => report_and_exit("Artifact loading failed", &e),
    };
    let adapter = InferenceAdapter::from_artifacts(&artifacts);

    match &cli.command {
        Command::Predict(args) => {
            let record = args.to_record();
            match single::predict_single(&adapter, &record) {
                Ok(prediction) if args.json => {
                    println!("{}", single::render_prediction_json(&prediction)?);
                }
                Ok(prediction) => println!("{}", single::render_prediction(&prediction)),
                Err(e) => report_and_exit("Prediction failed", &e),
            }
        }
        Command::Batch(args) => {
            let storage = LocalStorage::new(config.export.output_path.clone());
            let monitor_enabled = config.monitoring_enabled();
            if monitor_enabled {
                tracing::info!("🔍 System monitoring enabled");
            }
            let pipeline =
                BatchPipeline::new_with_monitoring(adapter, storage, config, monitor_enabled);

            match pipeline.run(Path::new(&args.input)) {
                Ok(outcome) => println!("{}", batch::render_outcome(&outcome)),
                Err(e) => report_and_exit("Batch prediction failed", &e),
            }
        }
        Command::Stream => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            stream::run_stream(&adapter, stdin.lock(), stdout.lock())
                .context("prediction stream ended")?;
        }
        Command::Inspect => println!("{}", inspect::render_summary(&artifacts)),
    }

    Ok(())
}
