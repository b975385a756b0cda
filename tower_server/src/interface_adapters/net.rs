// WebSocket change stream: pushes tower events and state to subscribed clients.
// The stream is one-way; client text frames are ignored.

use crate::interface_adapters::protocol::{GameStateDto, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::rand_id;
use crate::use_cases::{GameStateSnapshot, TowerEvent, TowerHandle};

use axum::{
    Error,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch};
use tracing::{Instrument, debug, info, info_span, warn};

const LOG_THROTTLE: Duration = Duration::from_secs(2);

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    EventsClosed,
    StateClosed,
}

enum LoopControl {
    Continue,
    Disconnect,
}

struct StreamCtx {
    events_rx: broadcast::Receiver<TowerEvent>,
    state_rx: watch::Receiver<GameStateSnapshot>,
    msgs_out: u64,
    bytes_out: u64,
    lag_recovery_count: u64,
    last_lag_log: Instant,
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    // Connection id for correlating logs; subscribers are anonymous.
    let span = info_span!("conn", conn_id = rand_id());
    ws.on_upgrade(move |socket| handle_socket(socket, state.tower).instrument(span))
}

async fn handle_socket(mut socket: WebSocket, tower: TowerHandle) {
    // Subscribe before the first send so no event falls between snapshot and stream.
    let mut ctx = StreamCtx {
        events_rx: tower.subscribe(),
        state_rx: tower.watch_state(),
        msgs_out: 0,
        bytes_out: 0,
        lag_recovery_count: 0,
        last_lag_log: Instant::now() - LOG_THROTTLE,
    };

    let initial = ctx.state_rx.borrow_and_update().clone();
    match send_state(&mut socket, initial).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
        }
        Err(e) => {
            warn!(error = ?e, "failed to send initial state");
            return;
        }
    }
    info!("subscriber connected");

    if let Err(e) = run_stream_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "stream loop exited with error");
    }
    info!(
        msgs_out = ctx.msgs_out,
        bytes_out = ctx.bytes_out,
        lag_recoveries = ctx.lag_recovery_count,
        "subscriber disconnected"
    );
}

async fn run_stream_loop(socket: &mut WebSocket, ctx: &mut StreamCtx) -> Result<(), NetError> {
    let StreamCtx {
        events_rx,
        state_rx,
        msgs_out,
        bytes_out,
        lag_recovery_count,
        last_lag_log,
    } = ctx;

    loop {
        let control = tokio::select! {
            incoming = socket.recv() => handle_incoming_ws(incoming),

            event = events_rx.recv() => match event {
                Ok(event) => {
                    let bytes = send_message(socket, &ServerMessage::from(event)).await?;
                    *msgs_out += 1;
                    *bytes_out += bytes as u64;
                    LoopControl::Continue
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    if should_log(last_lag_log) {
                        warn!(missed = n, "tower events lagged; sending state snapshot");
                    }
                    // Resync strategy: the latest state supersedes the missed events.
                    *lag_recovery_count += 1;
                    let latest = state_rx.borrow_and_update().clone();
                    let bytes = send_state(socket, latest).await?;
                    *msgs_out += 1;
                    *bytes_out += bytes as u64;
                    LoopControl::Continue
                }
                Err(broadcast::error::RecvError::Closed) => return Err(NetError::EventsClosed),
            },

            changed = state_rx.changed() => {
                changed.map_err(|_| NetError::StateClosed)?;
                let latest = state_rx.borrow_and_update().clone();
                let bytes = send_state(socket, latest).await?;
                *msgs_out += 1;
                *bytes_out += bytes as u64;
                LoopControl::Continue
            }
        };

        if let LoopControl::Disconnect = control {
            if let Err(err) = socket.close().await {
                debug!(error = ?err, "socket close error");
            }
            return Ok(());
        }
    }
}

fn handle_incoming_ws(incoming: Option<Result<Message, Error>>) -> LoopControl {
    match incoming {
        Some(Ok(Message::Close(_))) | None => LoopControl::Disconnect,
        Some(Ok(Message::Text(_) | Message::Binary(_))) => {
            debug!("ignoring client frame on event stream");
            LoopControl::Continue
        }
        Some(Ok(Message::Ping(_) | Message::Pong(_))) => LoopControl::Continue,
        Some(Err(e)) => {
            debug!(error = ?e, "websocket receive error");
            LoopControl::Disconnect
        }
    }
}

async fn send_state(socket: &mut WebSocket, state: GameStateSnapshot) -> Result<usize, NetError> {
    send_message(socket, &ServerMessage::GameState(GameStateDto::from(state))).await
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}
