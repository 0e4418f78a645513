use roomcast::{listener, EventTemplate, MemoryRelay, Room, RoomConfigPartial, RoomResult, WILDCARD};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> RoomResult<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomcast=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let secret = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "roomcast demo secret".to_string());

    info!("Starting roomcast loopback demo");

    let relay = MemoryRelay::new();
    let alice = Room::new(Arc::new(relay.client("alice")), &secret, RoomConfigPartial::new())?;
    let bob = Room::new(Arc::new(relay.client("bob")), &secret, RoomConfigPartial::new())?;

    bob.on(
        "chat",
        &listener(|delivery| {
            if let (Some(payload), Some(envelope)) = (delivery.payload(), delivery.envelope()) {
                info!(from = %envelope.pubkey, payload = %payload, "bob received chat");
            }
        }),
    );
    bob.on(
        WILDCARD,
        &listener(|delivery| info!(event_name = delivery.event_name, "bob saw dispatch")),
    );

    alice.ready().await?;
    bob.ready().await?;
    info!(room_id = %alice.id(), "Both participants connected");

    alice
        .publish("chat", &json!({ "text": "hello bob" }), EventTemplate::new())
        .await?;

    // Give bob's subscription task a moment to drain
    tokio::time::sleep(Duration::from_millis(50)).await;

    info!(members = ?bob.members(), cached = bob.history().len(), "Room state seen by bob");
    if bob.history().is_empty() {
        warn!("bob did not receive anything");
    }

    alice.leave();
    bob.leave();
    Ok(())
}
