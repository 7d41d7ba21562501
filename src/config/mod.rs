pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{BatchArgs, CliConfig, Command, PredictArgs};

#[cfg(feature = "cli")]
mod cli {
    use super::toml_config::AppConfig;
    use crate::domain::model::{Contract, CustomerRecord, Gender, InternetService, PaymentMethod};
    use clap::{Args, Parser, Subcommand};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "churn-predict")]
    #[command(about = "Predict customer churn with a pre-trained model")]
    pub struct CliConfig {
        /// Path to TOML configuration file (default: churn-config.toml if present)
        #[arg(short, long, global = true)]
        pub config: Option<String>,

        /// Directory holding preprocessing.json and best_model_voting.json
        #[arg(long, global = true)]
        pub artifact_dir: Option<String>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        /// Emit logs as JSON lines
        #[arg(long, global = true)]
        pub log_json: bool,

        /// Log CPU and memory usage around batch scoring
        #[arg(long, global = true)]
        pub monitor: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Predict churn for a single customer
        Predict(PredictArgs),
        /// Predict churn for every row of a CSV file
        Batch(BatchArgs),
        /// Read one JSON customer record per stdin line and answer each on stdout
        Stream,
        /// Show what the loaded artifacts expect and contain
        Inspect,
    }

    #[derive(Debug, Clone, Args)]
    pub struct PredictArgs {
        #[arg(long, value_enum, default_value = "Male")]
        pub gender: Gender,

        /// 1 for senior citizens
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
        pub senior_citizen: u8,

        /// Tenure in months
        #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(i64).range(0..=72))]
        pub tenure: i64,

        #[arg(long, default_value_t = 50.0)]
        pub monthly_charges: f64,

        #[arg(long, default_value_t = 1000.0)]
        pub total_charges: f64,

        #[arg(long, value_enum, default_value = "Month-to-month")]
        pub contract: Contract,

        #[arg(long, value_enum, default_value = "DSL")]
        pub internet_service: InternetService,

        #[arg(long, value_enum, default_value = "Electronic check")]
        pub payment_method: PaymentMethod,

        /// Print the prediction as JSON
        #[arg(long)]
        pub json: bool,
    }

    impl PredictArgs {
        pub fn to_record(&self) -> CustomerRecord {
            CustomerRecord {
                gender: self.gender,
                senior_citizen: self.senior_citizen,
                tenure: self.tenure,
                monthly_charges: self.monthly_charges,
                total_charges: self.total_charges,
                contract: self.contract,
                internet_service: self.internet_service,
                payment_method: self.payment_method,
            }
        }
    }

    #[derive(Debug, Clone, Args)]
    pub struct BatchArgs {
        /// CSV file with one customer per row
        pub input: String,

        #[arg(long)]
        pub output_dir: Option<String>,

        /// Export file name; may contain {timestamp}
        #[arg(long)]
        pub file_name: Option<String>,

        /// Write the CSV inside a ZIP archive
        #[arg(long)]
        pub compress: bool,

        /// Number of rows shown in the preview
        #[arg(long)]
        pub preview: Option<usize>,

        /// Also export the churn probability of every row
        #[arg(long)]
        pub with_probability: bool,
    }

    impl CliConfig {
        /// Command line flags win over the configuration file.
        pub fn apply_overrides(&self, config: &mut AppConfig) {
            if let Some(dir) = &self.artifact_dir {
                config.artifacts.dir = dir.clone();
            }
            if self.log_json {
                config.logging.format = "json".to_string();
            }
            if self.monitor {
                config.monitoring.enabled = true;
            }
            if let Command::Batch(args) = &self.command {
                if let Some(dir) = &args.output_dir {
                    config.export.output_path = dir.clone();
                }
                if let Some(name) = &args.file_name {
                    config.export.file_name = name.clone();
                }
                if let Some(rows) = args.preview {
                    config.export.preview_rows = rows;
                }
                config.export.compress |= args.compress;
                config.export.with_probability |= args.with_probability;
            }
        }
    }

}
