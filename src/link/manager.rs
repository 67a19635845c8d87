//! # Connection Manager
//!
//! Owns the single WebSocket session to the remote controller. One long-lived
//! tokio task runs the whole lifecycle (dial, handshake, keepalive, receive
//! loop, reconnect with backoff) and everything else talks to it through
//! non-blocking handles.
//!
//! ## Session Lifecycle:
//! 1. **Idle**: no session wanted; outbound messages are drained and dropped
//! 2. **Connecting**: dial with timeout, send the `hello` frame
//! 3. **Connected**: reported optimistically after a short grace delay, no
//!    server acknowledgment is awaited
//! 4. **Failed**: receive loop observed a transport failure
//! 5. **Reconnecting**: capped exponential backoff, then dial again
//!
//! ## Failure Detection:
//! The receive loop is the sole reconnect trigger. A failed send (keepalive
//! included) is logged and reflected in status but never schedules a
//! reconnect itself; the broken socket surfaces through the receive arm
//! immediately after.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, sleep_until, timeout, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::config::LinkConfig;
use crate::error::{LinkError, LinkResult};
use crate::link::backoff::BackoffPolicy;
use crate::link::channel::MessageChannel;
use crate::message::OutboundMessage;
use crate::status::{ConnectionStatus, StatusPublisher};

type WsSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Control messages posted by the handle into the link task.
#[derive(Debug)]
enum LinkCommand {
    Connect,
    Disconnect,
}

/// How one driven session ended.
enum SessionEnd {
    /// Explicit disconnect; return to idle
    Disconnect,
    /// Explicit connect while a session was live; redial immediately
    Restart,
    /// Transport failure with its reason; go through backoff
    Failed(String),
}

/// Outcome of one dial attempt.
enum Attempt {
    Socket(Box<WsSocket>),
    Failed(String),
    Disconnect,
    Restart,
}

/// Handle to the link task.
///
/// ## Thread Safety:
/// All methods are non-blocking; they post control messages to the task that
/// exclusively owns the socket, the backoff state, and the timers. Dropping
/// the handle aborts the task and the session with it.
pub struct ConnectionManager {
    commands: mpsc::UnboundedSender<LinkCommand>,
    channel: MessageChannel,
    task: JoinHandle<()>,
}

impl ConnectionManager {
    /// Spawn the link task. The task starts idle; nothing is dialed until
    /// [`connect`](Self::connect) is called.
    pub fn start(config: LinkConfig, status: StatusPublisher) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::channel(config.outbound_capacity);

        let task = tokio::spawn(link_task(config, status, cmd_rx, out_rx));

        Self {
            commands: cmd_tx,
            channel: MessageChannel::new(out_tx),
            task,
        }
    }

    /// Open (or re-open) the session. Cancels any session already live and
    /// re-runs the full connect sequence.
    pub fn connect(&self) {
        let _ = self.commands.send(LinkCommand::Connect);
    }

    /// Close the session and cancel all reconnect timers. The link task
    /// returns to idle and stays there until the next connect.
    pub fn disconnect(&self) {
        let _ = self.commands.send(LinkCommand::Disconnect);
    }

    /// Publish handle for the outbound funnel.
    pub fn channel(&self) -> MessageChannel {
        self.channel.clone()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The link task: idle until told to connect, then run the
/// attempt/drive/backoff cycle until told to disconnect.
async fn link_task(
    config: LinkConfig,
    status: StatusPublisher,
    mut commands: mpsc::UnboundedReceiver<LinkCommand>,
    mut outbound: mpsc::Receiver<OutboundMessage>,
) {
    let mut backoff = BackoffPolicy::new(
        Duration::from_millis(config.backoff_initial_ms),
        Duration::from_millis(config.backoff_max_ms),
    );

    loop {
        // Idle: drain and drop outbound traffic until a connect arrives.
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(LinkCommand::Connect) => break,
                    Some(LinkCommand::Disconnect) => {}
                    None => return,
                },
                maybe = outbound.recv() => match maybe {
                    Some(msg) => debug!("No session open, dropping {:?}", msg),
                    None => return,
                },
            }
        }

        // Session cycle: runs until an explicit disconnect.
        'session: loop {
            status.set_connection(ConnectionStatus::Connecting);
            info!("Connecting to {}", config.url);

            let failure = match attempt(&config, &mut commands, &mut outbound).await {
                Attempt::Socket(socket) => {
                    match drive_session(
                        *socket,
                        &config,
                        &status,
                        &mut backoff,
                        &mut commands,
                        &mut outbound,
                    )
                    .await
                    {
                        SessionEnd::Disconnect => break 'session,
                        SessionEnd::Restart => continue 'session,
                        SessionEnd::Failed(reason) => reason,
                    }
                }
                Attempt::Failed(reason) => reason,
                Attempt::Disconnect => break 'session,
                Attempt::Restart => continue 'session,
            };

            status.set_connection(ConnectionStatus::Error(failure.clone()));

            // Backoff before the next attempt. An explicit connect skips the
            // remaining delay; only reaching `connected` resets the policy.
            let delay = backoff.next_delay();
            status.set_connection(ConnectionStatus::Reconnecting { retry_in: delay });
            info!("Link lost ({}), reconnecting in {}ms", failure, delay.as_millis());

            let deadline = Instant::now() + delay;
            loop {
                tokio::select! {
                    _ = sleep_until(deadline) => break,
                    cmd = commands.recv() => match cmd {
                        Some(LinkCommand::Connect) => break,
                        Some(LinkCommand::Disconnect) => break 'session,
                        None => return,
                    },
                    maybe = outbound.recv() => match maybe {
                        Some(msg) => debug!("No session open, dropping {:?}", msg),
                        None => return,
                    },
                }
            }
        }

        status.set_connection(ConnectionStatus::Disconnected);
        info!("Disconnected");
    }
}

/// Dial once, with a timeout, while staying responsive to control messages
/// and draining outbound traffic (no session is open yet, so it drops).
async fn attempt(
    config: &LinkConfig,
    commands: &mut mpsc::UnboundedReceiver<LinkCommand>,
    outbound: &mut mpsc::Receiver<OutboundMessage>,
) -> Attempt {
    let dialing = dial(config);
    tokio::pin!(dialing);

    loop {
        tokio::select! {
            result = &mut dialing => {
                return match result {
                    Ok(socket) => Attempt::Socket(Box::new(socket)),
                    Err(err) => {
                        warn!("Connect failed: {}", err);
                        Attempt::Failed(err.to_string())
                    }
                };
            }
            cmd = commands.recv() => match cmd {
                Some(LinkCommand::Connect) => return Attempt::Restart,
                Some(LinkCommand::Disconnect) | None => return Attempt::Disconnect,
            },
            maybe = outbound.recv() => match maybe {
                Some(msg) => debug!("Still connecting, dropping {:?}", msg),
                None => return Attempt::Disconnect,
            },
        }
    }
}

async fn dial(config: &LinkConfig) -> LinkResult<WsSocket> {
    match timeout(config.connect_timeout(), connect_async(config.url.as_str())).await {
        Ok(Ok((socket, _response))) => Ok(socket),
        Ok(Err(err)) => Err(err.into()),
        Err(_) => Err(LinkError::Transport(format!(
            "connect timed out after {}ms",
            config.connect_timeout_ms
        ))),
    }
}

/// Drive one live session to its end.
///
/// Sends the `hello` frame, then multiplexes the grace timer, control
/// messages, outbound traffic, the keepalive interval, and the receive loop
/// over the split socket until something ends the session.
async fn drive_session(
    socket: WsSocket,
    config: &LinkConfig,
    status: &StatusPublisher,
    backoff: &mut BackoffPolicy,
    commands: &mut mpsc::UnboundedReceiver<LinkCommand>,
    outbound: &mut mpsc::Receiver<OutboundMessage>,
) -> SessionEnd {
    let (mut sink, mut stream) = socket.split();

    // Handshake, purely for observability on the remote side. No reply is
    // awaited; an encoding failure drops the frame like any other message.
    let hello = OutboundMessage::Hello {
        from: config.hello_from.clone(),
    };
    match hello.to_wire() {
        Ok(frame) => {
            if let Err(err) = sink.send(WsMessage::Text(frame)).await {
                warn!("Handshake send failed: {}", err);
                return SessionEnd::Failed(err.to_string());
            }
            debug!("Sent hello as '{}'", config.hello_from);
        }
        Err(err) => error!("Dropping handshake frame: {}", err),
    }

    // Optimistic grace delay: `connected` is reported once this fires, not
    // when the server says anything.
    let grace = sleep(config.connect_grace());
    tokio::pin!(grace);
    let mut connected = false;

    let mut keepalive = interval_at(
        Instant::now() + config.keepalive_interval(),
        config.keepalive_interval(),
    );
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut grace, if !connected => {
                connected = true;
                backoff.reset();
                status.set_connection(ConnectionStatus::Connected);
                info!("Connected to {}", config.url);
            }

            cmd = commands.recv() => match cmd {
                Some(LinkCommand::Connect) => {
                    info!("Connect requested over a live session, redialing");
                    let _ = sink.close().await;
                    return SessionEnd::Restart;
                }
                Some(LinkCommand::Disconnect) | None => {
                    let _ = sink.close().await;
                    return SessionEnd::Disconnect;
                }
            },

            maybe = outbound.recv() => match maybe {
                Some(msg) => match msg.to_wire() {
                    Ok(frame) => {
                        if let Err(err) = sink.send(WsMessage::Text(frame)).await {
                            // Status only; the receive loop stays the sole
                            // reconnect trigger.
                            warn!("Send failed: {}", err);
                            status.set_connection(ConnectionStatus::Error(err.to_string()));
                        }
                    }
                    Err(err) => error!("Dropping unencodable message: {}", err),
                },
                None => {
                    let _ = sink.close().await;
                    return SessionEnd::Disconnect;
                }
            },

            _ = keepalive.tick() => {
                if let Err(err) = sink.send(WsMessage::Text("ping".to_string())).await {
                    warn!("Keepalive send failed: {}", err);
                }
            }

            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Close(reason))) => {
                    let detail = match reason {
                        Some(frame) => format!("closed by server: {}", frame.reason),
                        None => "closed by server".to_string(),
                    };
                    return SessionEnd::Failed(detail);
                }
                Some(Ok(msg)) => {
                    // Inbound payloads are acks we do not interpret.
                    debug!("Discarding inbound frame ({} bytes)", msg.len());
                }
                Some(Err(err)) => {
                    warn!("Receive failed: {}", err);
                    return SessionEnd::Failed(err.to_string());
                }
                None => {
                    return SessionEnd::Failed("connection stream ended".to_string());
                }
            },
        }
    }
}
