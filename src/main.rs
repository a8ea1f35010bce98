#![warn(rust_2018_idioms)]

use std::env;
use std::process::ExitCode;

use tracing_appender::non_blocking::WorkerGuard;
use vault_kv::SecretClient;
use vault_sync::{Bootstrap, MapTarget, ProcessEnv, SyncSettings};

// Single-threaded so the bootstrap's environment writes cannot race a worker
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _guard = init_logger();

    let client = match SecretClient::builder()
        .application_name(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to configure Vault client");
            return ExitCode::FAILURE;
        }
    };

    if client.config().address.is_empty() {
        tracing::warn!("VAULT_ADDR is empty, secrets will not be fetched");
    }

    let sync_settings = SyncSettings::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Invalid Vault sync settings, using defaults");
        SyncSettings::default()
    });

    let mut config = MapTarget::default();
    let report = Bootstrap::new(sync_settings)
        .run(&client, &mut ProcessEnv, &mut config)
        .await;
    tracing::debug!(?report, "Vault bootstrap finished");

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: vault-read <secret-path>");
        return ExitCode::from(2);
    };

    match client.read(&path).await {
        Some(secret) => match serde_json::to_string_pretty(&secret) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to render secret");
                ExitCode::FAILURE
            }
        },
        None => ExitCode::FAILURE,
    }
}

fn init_logger() -> Option<WorkerGuard> {
    use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
    use tracing_log::LogTracer;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::{EnvFilter, Registry};

    if !env::var("JSON_LOG").map_or(false, |s| s.parse().unwrap_or_default()) {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
        return None;
    }

    // Redirect the logs from log library to tracing's subscribers.
    LogTracer::init().expect("Unable to setup log tracer!");

    let app_name = concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION")).to_string();

    // Secrets go to stdout, so logs use stderr
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let bunyan_formatting_layer = BunyanFormattingLayer::new(app_name, non_blocking_writer);
    let subscriber = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(JsonStorageLayer)
        .with(bunyan_formatting_layer);
    tracing::subscriber::set_global_default(subscriber).expect("Unable to set global subscriber");
    Some(guard)
}
