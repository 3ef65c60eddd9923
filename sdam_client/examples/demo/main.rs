use sdam_client::{
    SdamConfiguration, ServerAddress, ServerDescription, ServerType, TopologyMonitor,
};
use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();
    let set_name = std::env::var("SDAM_SET_NAME").unwrap_or_else(|_| "rs0".to_string());

    let seed: ServerAddress = "localhost:27017".parse()?;
    let secondary: ServerAddress = "localhost:27018".parse()?;
    let config = SdamConfiguration::new(
        vec![seed.clone()],
        None,
        SdamConfiguration::DEFAULT_HEARTBEAT_FREQUENCY,
        Some(set_name.clone()),
    )?;
    let monitor = TopologyMonitor::new(config);

    let primary = ServerDescription::builder()
        .with_address(seed.clone())
        .with_type(ServerType::RSPrimary)
        .with_set_name(set_name.as_str())
        .with_set_version(1)
        .with_hosts([seed.clone(), secondary.clone()])
        .build()?;
    let member = ServerDescription::builder()
        .with_address(secondary.clone())
        .with_type(ServerType::RSSecondary)
        .with_set_name(set_name.as_str())
        .with_hosts([seed.clone(), secondary.clone()])
        .build()?;

    for description in [primary, member] {
        match monitor.on_server_description(description).await {
            Ok(Some(change)) => println!("{:#?}", change),
            Ok(None) => println!("No topology change"),
            Err(e) => {
                tracing::error!("Error happened: {}", &e);
                return Err(e.into());
            }
        }
    }

    let topology = monitor.topology_description().await?;
    println!("{:#?}", topology);

    Ok(())
}

fn setup_tracing() {
    // Redirect all `log`'s events to the subscriber
    LogTracer::init().expect("Failed to set logger");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let formatting_layer = BunyanFormattingLayer::new("sdam-client-demo".into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    set_global_default(subscriber).expect("Failed to set subscriber");
}
