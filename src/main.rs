use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use upgrade_preflight::{
    ClusterReader, CliArgs, EXIT_ERROR, LoggingConfig, RunConfig, StaticCluster, checks,
    init_logging, run_preflight,
};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let logging_config = LoggingConfig::from_env();
    let _guard = match init_logging(logging_config) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to initialize logging: {err}");
            std::process::exit(EXIT_ERROR);
        }
    };

    let config = match RunConfig::from_args(args) {
        Ok(config) => config,
        Err(err) => {
            error!(category = err.category(), "{err}");
            eprintln!("error: {err}");
            std::process::exit(err.exit_code());
        }
    };

    info!(qps = config.throttle.qps, burst = config.throttle.burst, "cluster client throttling");
    let cluster: Arc<dyn ClusterReader> = match &config.cluster_snapshot {
        Some(path) => match StaticCluster::from_snapshot(path) {
            Ok(cluster) => cluster.into_shared(),
            Err(err) => {
                error!("{err:#}");
                eprintln!("error: {err:#}");
                std::process::exit(EXIT_ERROR);
            }
        },
        None => {
            warn!("no cluster snapshot given, assessing an empty cluster");
            StaticCluster::new().into_shared()
        }
    };

    let registry = checks::builtin_registry();

    match run_preflight(&config, &registry, cluster).await {
        Ok(outcome) => {
            print!("{}", outcome.report);
            std::process::exit(outcome.exit_code(config.fail_on));
        }
        Err(err) => {
            error!(category = err.category(), "{err}");
            eprintln!("error: {err}");
            std::process::exit(err.exit_code());
        }
    }
}
