//! Courier server: wires the transport, aggregation engine, forward
//! pipeline and HTTP surface together.

use crate::aggregator::{TurnAggregator, TurnSink};
use crate::config::CourierConfig;
use crate::dispatcher::ReplyDispatcher;
use crate::gateway::Gateway;
use crate::pipeline::BrainPipeline;
use crate::routes;
use crate::state::ConversationStore;
use anyhow::Result;
use axum::Extension;
use axum::http::{HeaderMap, Request};
use axum::response::Response;
use courier_brain::BrainClient;
use courier_channels::{ChannelTransport, InboundEvent, SocketGatewayTransport};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub transport: Arc<dyn ChannelTransport>,
    pub inbound_tx: mpsc::Sender<InboundEvent>,
    pub default_country_code: String,
    pub address_suffix: String,
}

pub async fn doctor(config_path: Option<PathBuf>) -> Result<()> {
    let cfg = CourierConfig::load(config_path).await?;
    let transport = build_transport(&cfg)?;
    let transport_connected = transport.is_connected().await;
    tracing::info!(
        brain_endpoint = %cfg.brain_endpoint(),
        quiet_period_ms = cfg.debounce.quiet_period_ms,
        transport_api = %cfg.transport.api_base_url,
        transport_connected,
        "config ok"
    );
    Ok(())
}

pub async fn send_one_shot(
    config_path: Option<PathBuf>,
    recipient: &str,
    message: &str,
) -> Result<()> {
    let cfg = CourierConfig::load(config_path).await?;
    let transport = build_transport(&cfg)?;
    let receipt = transport.send_text(recipient, message).await?;
    tracing::info!(
        recipient,
        message_id = ?receipt.message_id,
        "one-shot message sent"
    );
    Ok(())
}

pub async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    let cfg = CourierConfig::load(config_path).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.server.port));
    tracing::info!(
        bind_addr = %addr,
        brain_endpoint = %cfg.brain_endpoint(),
        brain_timeout_seconds = cfg.brain.request_timeout_seconds,
        quiet_period_ms = cfg.debounce.quiet_period_ms,
        stale_after_seconds = cfg.transport.stale_after_seconds,
        exit_phrases = ?cfg.conversation.exit_phrases,
        transport_api = %cfg.transport.api_base_url,
        http_timeout_seconds = cfg.server.http_timeout_seconds,
        http_max_in_flight = cfg.server.http_max_in_flight,
        "server configuration loaded"
    );
    let listener = preflight_bind_listener(addr).await?;

    let transport = build_transport(&cfg)?;
    let brain = BrainClient::new(
        &cfg.brain_endpoint(),
        Duration::from_secs(cfg.brain.request_timeout_seconds),
    )?;
    let state = Arc::new(ConversationStore::new());
    let dispatcher = Arc::new(ReplyDispatcher::new(
        transport.clone(),
        state.clone(),
        cfg.conversation.fallback_text.clone(),
    ));
    let pipeline = Arc::new(BrainPipeline::new(brain, state.clone(), dispatcher));
    let aggregator = TurnAggregator::new(
        Duration::from_millis(cfg.debounce.quiet_period_ms),
        pipeline as Arc<dyn TurnSink>,
    );

    let (inbound_tx, inbound_rx) = mpsc::channel(1024);
    let gateway = Arc::new(Gateway::new(
        state.clone(),
        aggregator,
        &cfg.conversation.exit_phrases,
        cfg.transport.stale_after_seconds,
        inbound_rx,
    ));
    let shutdown = CancellationToken::new();
    let gateway_handle = gateway.start(shutdown.child_token());
    tracing::info!("gateway started");

    let app_state = Arc::new(AppState {
        transport: transport.clone(),
        inbound_tx,
        default_country_code: cfg.transport.default_country_code.clone(),
        address_suffix: cfg.transport.address_suffix.clone(),
    });

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id_from_headers(request.headers())
            )
        })
        .on_response(
            |response: &Response, latency: Duration, _span: &tracing::Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    "http request completed"
                );
            },
        );

    let app = routes::router()
        .layer(Extension(app_state))
        .layer(GlobalConcurrencyLimitLayer::new(cfg.server.http_max_in_flight))
        .layer(TimeoutLayer::new(Duration::from_secs(
            cfg.server.http_timeout_seconds,
        )))
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    tracing::info!(%addr, "courier serving");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;
    tracing::info!("http server shutdown completed");

    shutdown.cancel();
    match gateway_handle.await {
        Ok(()) => tracing::info!("gateway shutdown completed"),
        Err(e) => tracing::error!(error = %e, "gateway task join failed during shutdown"),
    }

    Ok(())
}

fn build_transport(cfg: &CourierConfig) -> Result<Arc<dyn ChannelTransport>> {
    Ok(Arc::new(
        SocketGatewayTransport::new(&cfg.transport.api_base_url)?
            .with_api_token(cfg.transport.api_token.clone()),
    ))
}

async fn preflight_bind_listener(addr: SocketAddr) -> Result<tokio::net::TcpListener> {
    tracing::info!(%addr, "preflight bind check starting");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("preflight bind failed for {addr}: {e}"))?;
    tracing::info!(%addr, "preflight bind check passed");
    Ok(listener)
}

fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "missing".to_string())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler; falling back to ctrl_c only");
                if let Err(ctrlc_err) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %ctrlc_err, "failed to await ctrl-c signal");
                }
                shutdown.cancel();
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("received ctrl-c; beginning graceful shutdown");
            }
            _ = terminate.recv() => {
                tracing::warn!("received SIGTERM; beginning graceful shutdown");
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to await ctrl-c signal");
        } else {
            tracing::warn!("received ctrl-c; beginning graceful shutdown");
        }
    }
    shutdown.cancel();
}
