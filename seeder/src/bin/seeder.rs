use std::{
    env,
    io::{self, Write},
    net::SocketAddr,
    path::PathBuf,
};

use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use seeder::{
    config::{self, Config},
    ingest::{self, Ingest},
};
use time::OffsetDateTime;
use tokio::{runtime::Builder, signal};
use tracing::{debug, error, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

/// Environment variable holding YAML configuration contents. Takes
/// precedence over `--config-path`.
const CONFIG_ENV: &str = "SEEDER_CONFIG";

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Seeder configuration error: {0}")]
    Config(#[from] config::Error),
    #[error("Seeder ingest returned an error: {0}")]
    Ingest(#[from] ingest::Error),
    #[error("Parsing Prometheus address failed: {0}")]
    PrometheusAddr(#[from] std::net::AddrParseError),
    #[error("Failed to install Prometheus exporter: {0}")]
    Prometheus(#[from] metrics_exporter_prometheus::BuildError),
}

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Cli {
    /// path on disk to the configuration file, built-in defaults apply when
    /// absent
    #[clap(long)]
    config_path: Option<PathBuf>,
    /// address to serve prometheus metrics on, e.g. 0.0.0.0:9000
    #[clap(long)]
    prometheus_addr: Option<String>,
}

fn get_config(args: &Cli, config: Option<String>) -> Result<Config, Error> {
    let config = if let Some(contents) = config {
        debug!("Using config from env var '{CONFIG_ENV}'");
        Config::from_yaml(&contents)
    } else if let Some(path) = &args.config_path {
        debug!("Attempting to open configuration file at: {}", path.display());
        Config::load(path)
    } else {
        debug!("No configuration supplied, using defaults");
        Ok(Config::default())
    };
    config.map_err(|err| {
        error!("Configuration validation failed: {err}");
        Error::Config(err)
    })
}

async fn inner_main<W>(
    config: Config,
    prometheus_addr: Option<SocketAddr>,
    out: &mut W,
) -> Result<(), Error>
where
    W: Write,
{
    if let Some(addr) = prometheus_addr {
        info!("Serving Prometheus metrics on {addr}");
        PrometheusBuilder::new().with_http_listener(addr).install()?;
    }

    let ingest = Ingest::new(&config, OffsetDateTime::now_utc())?;
    tokio::select! {
        res = ingest.spin(out) => {
            let summary = res?;
            debug!("{summary:?}");
            Ok(())
        }
        _ = signal::ctrl_c() => {
            info!("received ctrl-c");
            Ok(())
        }
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_ansi(false)
        .with_writer(io::stderr)
        .finish()
        .init();

    let version = env!("CARGO_PKG_VERSION");
    info!("Starting seeder {version} run.");

    let args = Cli::parse();
    let config = get_config(&args, env::var(CONFIG_ENV).ok())?;
    let prometheus_addr = args
        .prometheus_addr
        .as_deref()
        .map(str::parse::<SocketAddr>)
        .transpose()?;

    let runtime = Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let res = runtime.block_on(inner_main(config, prometheus_addr, &mut out));
    info!("Bye. :)");
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_use_defaults() {
        let args = Cli::parse_from(["seeder"]);
        let config = get_config(&args, None).expect("Could not build default config");
        assert_eq!(config, Config::default());
        assert!(args.prometheus_addr.is_none());
    }

    #[test]
    fn env_contents_take_precedence_over_path() {
        let args = Cli::parse_from(["seeder", "--config-path", "/does/not/exist.yaml"]);
        let config = get_config(&args, Some("total_records: 4\n".to_string()))
            .expect("Could not build config from contents");
        assert_eq!(config.total_records, 4);
    }

    #[test]
    fn missing_config_path_is_an_error() {
        let args = Cli::parse_from(["seeder", "--config-path", "/does/not/exist.yaml"]);
        let err = get_config(&args, None).expect_err("missing config file accepted");
        assert!(matches!(err, Error::Config(config::Error::ReadFile { .. })));
    }

    #[tokio::test]
    async fn unreachable_target_exits_with_error() {
        let addr = {
            let listener =
                std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind listener");
            listener.local_addr().expect("listener has no address")
        };
        let config = Config {
            target_uri: format!("http://{addr}/api/v1/ingest")
                .parse()
                .expect("invalid uri"),
            ..Config::default()
        };

        let mut out = Vec::new();
        let res = inner_main(config, None, &mut out).await;
        assert!(matches!(res, Err(Error::Ingest(_))));
        assert!(out.is_empty());
    }
}
