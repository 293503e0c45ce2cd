use anyhow::{Context, Result};
use axum::Router;
use bridge_core::{init_tracing, InboundEvent};
use bridge_lark::webhook::{self, WebhookState};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::api::{self, ApiState};
use crate::components::{build_components, BridgeComponents};
use crate::config::{mask_secret, BotConfig};
use crate::router::EventRouter;

/// Inbound events buffered between the webhook and the consumer.
const EVENT_QUEUE_CAPACITY: usize = 256;

/// Main entry: validate config, init logging, build components, then serve webhook + API until `cancel` fires.
#[instrument(skip(config, cancel))]
pub async fn run_bridge(config: BotConfig, cancel: CancellationToken) -> Result<()> {
    config.validate()?;
    init_tracing(&config.log_file)?;

    info!(
        app_id = %config.lark.app_id,
        app_secret = %mask_secret(&config.lark.app_secret),
        api_base_url = %config.lark.api_base_url,
        database_path = %config.database_path,
        port = config.port,
        app_env = %config.app_env,
        "Initializing bridge"
    );

    let components = build_components(&config).await?;
    serve(&config, components, cancel).await
}

/// Spawns the event consumer and serves HTTP on `config.port` with graceful shutdown on `cancel`.
/// Returns once the server has stopped and the consumer has finished its in-flight event.
pub async fn serve(
    config: &BotConfig,
    components: BridgeComponents,
    cancel: CancellationToken,
) -> Result<()> {
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let consumer = tokio::spawn(consume_events(rx, components.router.clone(), cancel.clone()));

    let app = http_app(config, &components, tx);
    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!(
        port = config.port,
        webhook = webhook::WEBHOOK_PATH,
        "Bridge started, listening for events and API calls"
    );

    let shutdown = cancel.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server failed");

    cancel.cancel();
    let handled = consumer.await.context("Event consumer task failed")?;
    info!(handled, "Bridge stopped");
    served
}

/// Webhook and API routes on one router.
pub fn http_app(config: &BotConfig, components: &BridgeComponents, tx: mpsc::Sender<InboundEvent>) -> Router {
    let webhook_state = WebhookState::new(config.lark.verification_token.clone(), tx);
    let api_state = ApiState::new(components.dispatcher.clone(), config.broadcast_text.clone());
    Router::new()
        .merge(webhook::routes(webhook_state))
        .merge(api::routes(api_state))
}

/// Single consumer: routes events one at a time until cancellation or channel close.
/// On cancellation the channel is closed to new events and the ones already queued (and acknowledged)
/// are still routed. Returns the number routed.
pub async fn consume_events(
    mut rx: mpsc::Receiver<InboundEvent>,
    router: EventRouter,
    cancel: CancellationToken,
) -> usize {
    let mut handled = 0;
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Cancellation requested, event consumer stopping");
                break;
            }
            event = rx.recv() => match event {
                Some(event) => event,
                None => {
                    info!("Event channel closed, event consumer stopping");
                    break;
                }
            },
        };
        router.route(&event).await;
        handled += 1;
    }

    rx.close();
    while let Ok(event) = rx.try_recv() {
        router.route(&event).await;
        handled += 1;
    }
    if handled > 0 {
        debug!(handled, "Event consumer drained");
    }
    handled
}
