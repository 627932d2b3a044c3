//! Two actor systems in one process, wired through the registry.
//!
//! A relay on the hub system is armed to forward into a collector; a beacon
//! relay on the satellite system is asked to generate. The element crosses
//! the wire twice and arrives at the collector still carrying the beacon's
//! identity as sender.
//!
//! Run with: cargo run --example relay_chain
use std::time::Duration;

use telegraph::prelude::*;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

struct Collector {
    tx: mpsc::UnboundedSender<(String, ActorUri)>,
}

#[async_trait]
impl Actor for Collector {
    async fn receive(&mut self, _ctx: &mut Context, msg: Message, sender: ActorRef) {
        if let Message::Element { payload } = msg {
            let _ = self.tx.send((payload, sender.uri().clone()));
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let hub_config = SystemConfig {
        log_sent: true,
        log_received: true,
        ..SystemConfig::remote("127.0.0.1", 2727)
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "telegraph={}",
            hub_config.log_level
        )))
        .init();

    let registry = Registry::new();
    let hub = registry.create_system("Hub", hub_config).await?;
    let satellite = ActorSystem::new("Satellite", SystemConfig::remote("127.0.0.1", 5050)).await?;

    satellite.spawn(RelayActor::new("42.1:7.3:0.0:9.9"), "beacon")?;
    let relay = registry.create_actor(RelayActor::new("n/a"), "relay")?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let collector = hub.spawn(Collector { tx }, "collector")?;

    // Arm the hub relay, then ask the beacon to generate with the relay as
    // sender so the element flows beacon -> relay -> collector.
    relay.tell(
        Message::Reference {
            target: collector.uri().clone(),
        },
        &ActorRef::no_sender(),
    );
    let beacon = registry.remote_actor("Satellite", "127.0.0.1", 5050, "/user/beacon")?;
    beacon.tell(Message::Generate, &relay);

    let (payload, from) = tokio::time::timeout(Duration::from_secs(3), rx.recv())
        .await?
        .ok_or("collector stopped")?;
    println!("collected element {:?} sent by {}", payload, from);

    registry.shutdown().await;
    satellite.terminate().await;
    Ok(())
}
