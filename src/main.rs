use clap::Parser;
use dotenv::dotenv;
use tracing::error;

use statarb::cli::{
    BacktestCliConfig, Cli, Commands, DataCliConfig, LiveCliConfig, ScanCliConfig,
};
use statarb::commands::{run_backtest, run_live, run_scan};
use statarb::config::StatArbConfig;
use statarb::observability::init_tracing;

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli.verbose, cli.json_logs) {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StatArbConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Backtest {
            data,
            mode,
            step,
            output_dir,
        } => {
            let overrides = BacktestCliConfig {
                data: DataCliConfig::from(data),
                mode,
                step,
                output_dir,
            };
            run_backtest(config, overrides).await
        }
        Commands::Scan {
            data,
            mode,
            max_pairs,
            output,
        } => {
            let overrides = ScanCliConfig {
                data: DataCliConfig::from(data),
                mode,
                max_pairs,
                output,
            };
            run_scan(config, overrides).await
        }
        Commands::Live {
            provider,
            executor,
            pairs_file,
            interval_secs,
            max_ticks,
        } => {
            let overrides = LiveCliConfig {
                provider,
                executor,
                pairs_file,
                interval_secs,
                max_ticks,
            };
            run_live(config, overrides).await
        }
    }
}
