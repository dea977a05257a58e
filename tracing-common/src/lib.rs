use std::{collections::HashMap, time::Duration};

use color_eyre::{eyre::WrapErr, Result};
use opentelemetry_otlp::WithExportConfig;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

fn default_filter(crate_name: &str) -> String {
    format!("warn,{crate_name}=trace,db=debug,tower_http=debug")
}

pub fn setup_tracing(crate_name: &str) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter(crate_name));

    let env_filter = EnvFilter::builder()
        .parse(&rust_log)
        .wrap_err_with(|| format!("Couldn't create env filter from {rust_log}"))?;

    let opentelemetry_layer = if let Ok(honeycomb_key) = std::env::var("HONEYCOMB_API_KEY") {
        let mut map = HashMap::<String, String>::new();
        map.insert("x-honeycomb-team".to_string(), honeycomb_key);
        map.insert("x-honeycomb-dataset".to_string(), crate_name.to_string());

        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .http()
                    .with_endpoint("https://api.honeycomb.io/v1/traces")
                    .with_timeout(Duration::from_secs(3))
                    .with_headers(map),
            )
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .wrap_err("Failed to install the OTLP exporter")?;

        println!("Honeycomb layer configured");

        Some(OpenTelemetryLayer::new(tracer))
    } else {
        println!("Skipping Honeycomb layer");

        None
    };

    let heirarchical = HierarchicalLayer::default()
        .with_writer(std::io::stdout)
        .with_indent_lines(true)
        .with_indent_amount(2)
        .with_thread_names(true)
        .with_thread_ids(true)
        .with_verbose_exit(true)
        .with_verbose_entry(true)
        .with_targets(true);

    Registry::default()
        .with(heirarchical)
        .with(opentelemetry_layer)
        .with(sentry_tracing::layer())
        .with(env_filter)
        .try_init()
        .wrap_err("Failed to install the tracing subscriber")?;

    Ok(())
}

/// Sentry only turns on when `SENTRY_DSN` is set. Keep the guard alive for the life of the process.
pub fn setup_sentry() -> Option<sentry::ClientInitGuard> {
    let Ok(sentry_dsn) = std::env::var("SENTRY_DSN") else {
        println!("Sentry not configured in this environment");

        return None;
    };

    let release = sentry::release_name!().unwrap_or_else(|| "dev".into());

    println!("Sentry enabled");

    Some(sentry::init((
        sentry_dsn,
        sentry::ClientOptions {
            traces_sample_rate: 0.5,
            release: Some(release),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_targets_the_binary() {
        let filter = default_filter("flavorhub");

        assert_eq!(filter, "warn,flavorhub=trace,db=debug,tower_http=debug");
        assert!(EnvFilter::builder().parse(&filter).is_ok());
    }
}
