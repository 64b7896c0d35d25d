use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use ndnfw_core::{ChannelTransport, ForwarderConfig, Interest, Name, PendingEntry, Status, TerminalOutcome};
use ndnfw_strategy::{Forwarder, TelemetrySample};

const CONFIG: &str = r#"
default_max_outstanding = 2

[[faces]]
id = 1

[[faces]]
id = 2

[[faces]]
id = 3
max_outstanding = 8

[[routes]]
prefix = "/video"
nexthops = [{ face = 1, cost = 10 }, { face = 2, cost = 5 }]
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let (transport, mut wire) = ChannelTransport::new();
    let config = ForwarderConfig::from_toml_str(CONFIG)?;
    let forwarder = Arc::new(Forwarder::from_config(config, Arc::new(transport))?);

    let mut events = forwarder.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::info!("event: {:?}", event);
        }
    });
    tokio::spawn(async move {
        while let Some((face, interest)) = wire.recv().await {
            tracing::info!("wire: {} out on {}", interest.name, face);
        }
    });

    // The prober reports face 1 healthy and fast.
    let prefix: Name = "/video".parse()?;
    forwarder.on_telemetry_update(&prefix, 1.into(), TelemetrySample::Status(Status::Green))?;
    forwarder.on_telemetry_update(&prefix, 1.into(), TelemetrySample::Rtt(Duration::from_millis(20)))?;

    for (nonce, segment) in ["seg=0", "seg=1", "seg=2"].iter().enumerate() {
        let name: Name = format!("/video/{}", segment).parse()?;
        let interest = Interest::new(name, nonce as u32).with_payload(Bytes::from_static(b"quality=720p"));
        let entry = PendingEntry::new(interest, 3.into());

        let outcome = forwarder.decide(&entry);
        tracing::info!("{} -> {:?}", entry.name(), outcome);

        tokio::time::sleep(Duration::from_millis(5)).await;
        match outcome.face() {
            Some(via) => forwarder.on_request_terminal(&entry, TerminalOutcome::Satisfied { via }),
            None => forwarder.on_request_terminal(&entry, TerminalOutcome::TimedOut),
        };
    }

    for candidate in forwarder.best_n(&prefix, 8) {
        tracing::info!(
            "{} status={} srtt={:?} cost={} score={:.3}",
            candidate.face(),
            candidate.status(),
            candidate.srtt(),
            candidate.routing_cost(),
            candidate.score()
        );
    }

    tokio::time::sleep(Duration::from_millis(10)).await;
    Ok(())
}
