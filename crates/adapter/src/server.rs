//! TCP server for the control adapter
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking. The server never touches the engine:
//! validated commands go to the game loop over a bounded channel, and
//! whatever the game loop sends back is routed to clients by id.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::core::parse_direction;
use crate::protocol::*;
use crate::runtime::{InboundCommand, InboundPayload, OutboundMessage};
use crate::types::{GameAction, GameConfig, DEFAULT_BOARD_SIZE, DEFAULT_WIN_TILE};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_pending_commands: usize,
    /// Advertised in `welcome`.
    pub board_size: usize,
    /// Advertised in `welcome`.
    pub win_tile: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7788,
            max_pending_commands: 10,
            board_size: DEFAULT_BOARD_SIZE,
            win_tile: DEFAULT_WIN_TILE,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    ///
    /// - `TWENTY48_AI_HOST`: bind address (default "127.0.0.1")
    /// - `TWENTY48_AI_PORT`: port (default 7788)
    /// - `TWENTY48_AI_MAX_PENDING`: command queue depth (default 10)
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();

        let host = env::var("TWENTY48_AI_HOST").unwrap_or(defaults.host);
        let port = env::var("TWENTY48_AI_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);

        let max_pending_commands = env::var("TWENTY48_AI_MAX_PENDING")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.max_pending_commands);

        Self {
            host,
            port,
            max_pending_commands,
            ..defaults
        }
    }

    /// Advertise the dimensions of the game being served.
    pub fn with_game(mut self, game: &GameConfig) -> Self {
        self.board_size = game.size;
        self.win_tile = game.win_tile;
        self
    }
}

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(Vec::new()),
        }
    }

    /// Check if the adapter is disabled via `TWENTY48_AI_DISABLED`
    pub fn is_disabled() -> bool {
        std::env::var("TWENTY48_AI_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    async fn is_handshaken(&self, client_id: usize) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.handshaken)
            .unwrap_or(false)
    }

    /// Record `seq` if it is strictly greater than the client's last one.
    async fn check_and_update_seq(&self, client_id: usize, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };

        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }

    async fn send_to(&self, client_id: usize, msg: ClientOutbound) {
        let clients = self.clients.read().await;
        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
            let _ = c.tx.send(msg);
        }
    }

    async fn broadcast(&self, msg: ClientOutbound) {
        let clients = self.clients.read().await;
        for c in clients.iter().filter(|c| c.handshaken && c.stream_observations) {
            let _ = c.tx.send(msg.clone());
        }
    }
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: usize,
    pub addr: SocketAddr,
    pub stream_observations: bool,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    pub tx: mpsc::UnboundedSender<ClientOutbound>,
}

#[derive(Debug, Clone)]
pub enum ClientOutbound {
    Welcome(WelcomeMessage),
    Ack(AckMessage),
    Error(ErrorMessage),
    Observation(ObservationMessage),
}

impl ClientOutbound {
    fn write_json(&self, buf: &mut Vec<u8>) -> serde_json::Result<()> {
        match self {
            ClientOutbound::Welcome(m) => serde_json::to_writer(buf, m),
            ClientOutbound::Ack(m) => serde_json::to_writer(buf, m),
            ClientOutbound::Error(m) => serde_json::to_writer(buf, m),
            ClientOutbound::Observation(m) => serde_json::to_writer(buf, m),
        }
    }
}

/// Start the TCP server
///
/// Binds `config.host:config.port` (port 0 picks a free port) and reports the
/// bound address through `ready_tx`. Runs until the listener fails.
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    let bound = listener.local_addr()?;
    info!("adapter listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config));
    let mut client_id_counter = 0usize;

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match msg {
                    OutboundMessage::ToClientAck { client_id, ack } => {
                        state.send_to(client_id, ClientOutbound::Ack(ack)).await;
                    }
                    OutboundMessage::ToClientObservation { client_id, obs } => {
                        state.send_to(client_id, ClientOutbound::Observation(obs)).await;
                    }
                    OutboundMessage::BroadcastObservation { obs } => {
                        state.broadcast(ClientOutbound::Observation(obs)).await;
                    }
                }
            }
        });
    }

    // Accept incoming connections
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        info!("client {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, state, command_tx).await {
                warn!("client {} error: {:#}", client_id, e);
            }
            info!("client {} disconnected", client_id);
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            addr,
            stream_observations: false,
            handshaken: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    // Writer task: one JSON document per line.
    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(1024);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            if msg.write_json(&mut buf).is_err() {
                continue;
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() || writer.flush().await.is_err() {
                break;
            }
        }
    });

    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        debug!("client {} <- {}", client_id, trimmed);

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, hello.seq).await
                {
                    let message = "seq must be strictly increasing";
                    reject(&tx, client_id, hello.seq, ErrorCode::InvalidCommand, message);
                    continue;
                }

                if !is_compatible_version(&hello.protocol_version) {
                    let message = format!(
                        "protocol version {} not supported (server speaks {})",
                        hello.protocol_version, PROTOCOL_VERSION
                    );
                    reject(&tx, client_id, hello.seq, ErrorCode::ProtocolMismatch, &message);
                    break;
                }

                {
                    let mut clients = state.clients.write().await;
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.stream_observations = hello.stream_observations;
                    }
                }
                info!(
                    "client {} handshaken as {} {}",
                    client_id, hello.client.name, hello.client.version
                );

                let welcome = create_welcome(
                    hello.seq,
                    client_id as u64,
                    state.config.board_size,
                    state.config.win_tile,
                );
                let _ = tx.send(ClientOutbound::Welcome(welcome));

                // Ask the game loop for an immediate snapshot.
                if hello.stream_observations
                    && command_tx
                        .try_send(InboundCommand {
                            client_id,
                            seq: hello.seq,
                            payload: InboundPayload::SnapshotRequest,
                        })
                        .is_err()
                {
                    let message = "command queue is full, initial observation skipped";
                    reject(&tx, client_id, hello.seq, ErrorCode::Backpressure, message);
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if !state.is_handshaken(client_id).await {
                    let message = "send hello before command";
                    reject(&tx, client_id, cmd.seq, ErrorCode::HandshakeRequired, message);
                    continue;
                }

                if !state.check_and_update_seq(client_id, cmd.seq).await {
                    let message = "seq must be strictly increasing";
                    reject(&tx, client_id, cmd.seq, ErrorCode::InvalidCommand, message);
                    continue;
                }

                let action = match map_command(&cmd) {
                    Ok(action) => action,
                    Err((code, message)) => {
                        reject(&tx, client_id, cmd.seq, code, &message);
                        continue;
                    }
                };

                // Backpressure: bounded queue. The game loop acks once applied.
                if command_tx
                    .try_send(InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload: InboundPayload::Command(action),
                    })
                    .is_err()
                {
                    let message = "command queue is full";
                    reject(&tx, client_id, cmd.seq, ErrorCode::Backpressure, message);
                }
            }

            Ok(ParsedMessage::Unknown(unknown)) => {
                let message = "unknown message type";
                reject(&tx, client_id, unknown.seq, ErrorCode::InvalidCommand, message);
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                let message = format!("JSON parse error: {}", e);
                reject(&tx, client_id, seq, ErrorCode::InvalidCommand, &message);
            }
        }
    }

    {
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != client_id);
    }

    drop(tx);
    let _ = write_task.await;

    Ok(())
}

fn reject(
    tx: &mpsc::UnboundedSender<ClientOutbound>,
    client_id: usize,
    seq: u64,
    code: ErrorCode,
    message: &str,
) {
    warn!("client {} seq {}: {:?}: {}", client_id, seq, code, message);
    let _ = tx.send(ClientOutbound::Error(create_error(seq, code, message)));
}

/// Map a protocol command onto a game action.
fn map_command(cmd: &CommandMessage) -> Result<GameAction, (ErrorCode, String)> {
    let action = cmd.action.as_str();
    if action.eq_ignore_ascii_case("move") {
        let Some(direction) = cmd.direction.as_deref() else {
            return Err((ErrorCode::InvalidArgument, "move requires a direction".to_string()));
        };
        let dir = parse_direction(direction)
            .map_err(|e| (ErrorCode::InvalidArgument, e.to_string()))?;
        Ok(GameAction::Move(dir))
    } else if action.eq_ignore_ascii_case("restart") {
        Ok(GameAction::Restart)
    } else {
        Err((ErrorCode::InvalidArgument, format!("unknown action: {}", cmd.action)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    #[test]
    fn test_map_move_command() {
        let cmd = create_command(1, "move", Some("left"));
        assert_eq!(map_command(&cmd), Ok(GameAction::Move(Direction::Left)));

        let cmd = create_command(2, "Move", Some("UP"));
        assert_eq!(map_command(&cmd), Ok(GameAction::Move(Direction::Up)));
    }

    #[test]
    fn test_map_restart_command() {
        let cmd = create_command(1, "restart", None);
        assert_eq!(map_command(&cmd), Ok(GameAction::Restart));
    }

    #[test]
    fn test_map_rejects_bad_arguments() {
        let (code, _) = map_command(&create_command(1, "move", Some("north"))).unwrap_err();
        assert_eq!(code, ErrorCode::InvalidArgument);

        let (code, msg) = map_command(&create_command(1, "move", None)).unwrap_err();
        assert_eq!(code, ErrorCode::InvalidArgument);
        assert!(msg.contains("direction"));

        let (code, _) = map_command(&create_command(1, "undo", None)).unwrap_err();
        assert_eq!(code, ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_server_config_with_game() {
        let game = GameConfig::default().with_size(5).with_win_tile(512);
        let config = ServerConfig::default().with_game(&game);
        assert_eq!(config.board_size, 5);
        assert_eq!(config.win_tile, 512);
        assert_eq!(config.port, 7788);
    }

    #[tokio::test]
    async fn test_seq_must_increase() {
        let state = ServerState::new(ServerConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        state.clients.write().await.push(ClientHandle {
            id: 1,
            addr: "127.0.0.1:1".parse().unwrap(),
            stream_observations: false,
            handshaken: true,
            last_seq: None,
            tx,
        });

        assert!(state.check_and_update_seq(1, 5).await);
        assert!(!state.check_and_update_seq(1, 5).await);
        assert!(!state.check_and_update_seq(1, 4).await);
        assert!(state.check_and_update_seq(1, 6).await);
    }
}
