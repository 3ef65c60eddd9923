use std::sync::Once;

use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

static TRACING: Once = Once::new();

/// Installs a bunyan subscriber for tests when `TEST_LOG` is set, e.g.
/// `TEST_LOG=1 cargo test | bunyan`. Output is discarded otherwise.
pub(crate) fn init_test_tracing() {
    TRACING.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        if std::env::var("TEST_LOG").is_ok() {
            let subscriber = Registry::default()
                .with(env_filter)
                .with(JsonStorageLayer)
                .with(BunyanFormattingLayer::new("sdam_client".into(), std::io::stdout));
            let _ = LogTracer::init();
            let _ = set_global_default(subscriber);
        } else {
            let subscriber = Registry::default()
                .with(env_filter)
                .with(JsonStorageLayer)
                .with(BunyanFormattingLayer::new("sdam_client".into(), std::io::sink));
            let _ = LogTracer::init();
            let _ = set_global_default(subscriber);
        }
    });
}
