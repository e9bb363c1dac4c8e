use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use tui_2048::adapter::protocol::{create_command, create_hello, PROTOCOL_VERSION};
use tui_2048::adapter::server::{run_server, ServerConfig};
use tui_2048::adapter::{Dispatcher, InboundCommand, InboundPayload, OutboundMessage};
use tui_2048::core::{GameState, Grid, SimpleRng};
use tui_2048::types::{Direction, GameAction};

struct Harness {
    addr: SocketAddr,
    server: JoinHandle<()>,
    game_loop: JoinHandle<()>,
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.server.abort();
        self.game_loop.abort();
    }
}

/// Server plus a game loop task that owns the engine, like the binary.
async fn start(grid: Grid) -> Harness {
    let config = ServerConfig {
        port: 0,
        max_pending_commands: 8,
        ..ServerConfig::default()
    };

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<InboundCommand>(8);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let _ = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await;
    });

    let game_loop = tokio::spawn(async move {
        let mut game = GameState::from_grid(grid, 2048, SimpleRng::new(1)).unwrap();
        let mut dispatcher = Dispatcher::new();
        while let Some(cmd) = cmd_rx.recv().await {
            for msg in dispatcher.handle(&mut game, cmd) {
                let _ = out_tx.send(msg);
            }
        }
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");

    Harness {
        addr,
        server,
        game_loop,
    }
}

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect failed");
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn send_line(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn send<T: serde::Serialize>(&mut self, msg: &T) {
        let line = serde_json::to_string(msg).unwrap();
        self.send_line(&line).await;
    }

    async fn recv(&mut self) -> serde_json::Value {
        let line = tokio::time::timeout(Duration::from_secs(2), self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()
            .expect("connection closed");
        serde_json::from_str(&line).unwrap()
    }

    /// Hello plus the welcome and initial observation.
    async fn handshake(&mut self) -> serde_json::Value {
        self.send(&create_hello(1, "e2e-test", PROTOCOL_VERSION)).await;
        let welcome = self.recv().await;
        assert_eq!(welcome["type"], "welcome");
        let obs = self.recv().await;
        assert_eq!(obs["type"], "observation");
        obs
    }
}

fn two_twos() -> Grid {
    Grid::from_rows(&[[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap()
}

#[tokio::test]
async fn hello_command_ack_and_observation() {
    let harness = start(two_twos()).await;
    let mut client = Client::connect(harness.addr).await;

    client.send(&create_hello(1, "e2e-test", PROTOCOL_VERSION)).await;
    let welcome = client.recv().await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["seq"], 1);
    assert_eq!(welcome["protocol_version"], PROTOCOL_VERSION);
    assert_eq!(welcome["board_size"], 4);
    assert_eq!(welcome["win_tile"], 2048);

    let initial = client.recv().await;
    assert_eq!(initial["type"], "observation");
    assert_eq!(initial["board"]["cells"][0], serde_json::json!([2, 2, 0, 0]));
    assert_eq!(initial["status"], "playing");

    client.send(&create_command(2, "move", Some("left"))).await;
    let ack = client.recv().await;
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["seq"], 2);
    assert_eq!(ack["status"], "ok");
    assert_eq!(ack["changed"], true);
    assert_eq!(ack["score_delta"], 4);

    let obs = client.recv().await;
    assert_eq!(obs["type"], "observation");
    assert_eq!(obs["score"], 4);
    assert_eq!(obs["board"]["cells"][0][0], 4);
    assert_eq!(obs["move_count"], 1);
    assert_eq!(obs["last_move"], "left");
    assert!(obs["seq"].as_u64().unwrap() > initial["seq"].as_u64().unwrap());
}

#[tokio::test]
async fn blocked_move_acks_unchanged_without_observation() {
    let harness = start(two_twos()).await;
    let mut client = Client::connect(harness.addr).await;
    client.handshake().await;

    client.send(&create_command(2, "move", Some("up"))).await;
    let ack = client.recv().await;
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["changed"], false);
    assert_eq!(ack["score_delta"], 0);

    // The next line belongs to the next command, not to a stray observation.
    client.send(&create_command(3, "restart", None)).await;
    let ack = client.recv().await;
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["seq"], 3);
    let obs = client.recv().await;
    assert_eq!(obs["type"], "observation");
    assert_eq!(obs["episode_id"], 1);
    assert_eq!(obs["score"], 0);
}

#[tokio::test]
async fn command_before_hello_requires_handshake() {
    let harness = start(two_twos()).await;
    let mut client = Client::connect(harness.addr).await;

    client.send(&create_command(1, "move", Some("left"))).await;
    let err = client.recv().await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "handshake_required");
    assert_eq!(err["seq"], 1);
}

#[tokio::test]
async fn invalid_arguments_and_stale_seq_are_rejected() {
    let harness = start(two_twos()).await;
    let mut client = Client::connect(harness.addr).await;
    client.handshake().await;

    client.send(&create_command(2, "move", Some("north"))).await;
    let err = client.recv().await;
    assert_eq!(err["code"], "invalid_argument");

    client.send(&create_command(3, "jump", None)).await;
    let err = client.recv().await;
    assert_eq!(err["code"], "invalid_argument");

    client.send(&create_command(3, "restart", None)).await;
    let err = client.recv().await;
    assert_eq!(err["code"], "invalid_command");

    client.send_line("{this is not json").await;
    let err = client.recv().await;
    assert_eq!(err["code"], "invalid_command");

    client.send_line(r#"{"type":"control","seq":10}"#).await;
    let err = client.recv().await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 10);
}

#[tokio::test]
async fn protocol_mismatch_closes_connection() {
    let harness = start(two_twos()).await;
    let mut client = Client::connect(harness.addr).await;

    client.send(&create_hello(1, "old-bot", "0.9.0")).await;
    let err = client.recv().await;
    assert_eq!(err["code"], "protocol_mismatch");

    let next = tokio::time::timeout(Duration::from_secs(2), client.lines.next_line())
        .await
        .expect("timed out waiting for close")
        .unwrap();
    assert!(next.is_none());
}

#[tokio::test]
async fn observers_see_other_clients_moves() {
    let harness = start(two_twos()).await;
    let mut player = Client::connect(harness.addr).await;
    let mut watcher = Client::connect(harness.addr).await;
    player.handshake().await;
    watcher.handshake().await;

    player.send(&create_command(2, "move", Some("left"))).await;
    assert_eq!(player.recv().await["type"], "ack");

    let obs = watcher.recv().await;
    assert_eq!(obs["type"], "observation");
    assert_eq!(obs["score"], 4);
}

#[tokio::test]
async fn backpressure_returns_error() {
    let config = ServerConfig {
        port: 0,
        max_pending_commands: 1,
        ..ServerConfig::default()
    };

    // Nobody drains the command queue.
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<InboundCommand>(1);
    let (_out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let _ = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await;
    });
    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .unwrap()
        .unwrap();

    let mut client = Client::connect(addr).await;
    let mut hello = create_hello(1, "e2e-test", PROTOCOL_VERSION);
    hello.stream_observations = false;
    client.send(&hello).await;
    assert_eq!(client.recv().await["type"], "welcome");

    client.send(&create_command(2, "move", Some("left"))).await;
    client.send(&create_command(3, "move", Some("right"))).await;
    let err = client.recv().await;
    assert_eq!(err["code"], "backpressure");
    assert_eq!(err["seq"], 3);

    let queued = cmd_rx.recv().await.unwrap();
    assert_eq!(queued.seq, 2);
    assert_eq!(
        queued.payload,
        InboundPayload::Command(GameAction::Move(Direction::Left))
    );

    server.abort();
}

#[tokio::test]
async fn full_queue_on_hello_reports_backpressure() {
    let config = ServerConfig {
        port: 0,
        max_pending_commands: 1,
        ..ServerConfig::default()
    };

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<InboundCommand>(1);
    let (_out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let _ = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await;
    });
    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .unwrap()
        .unwrap();

    // A non-streaming player fills the only queue slot.
    let mut player = Client::connect(addr).await;
    let mut hello = create_hello(1, "player", PROTOCOL_VERSION);
    hello.stream_observations = false;
    player.send(&hello).await;
    assert_eq!(player.recv().await["type"], "welcome");
    player.send(&create_command(2, "move", Some("left"))).await;

    // Wait until the move is queued before the watcher says hello.
    let mut queued = false;
    for _ in 0..100 {
        if !cmd_rx.is_empty() {
            queued = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(queued, "move was never queued");

    let mut watcher = Client::connect(addr).await;
    watcher.send(&create_hello(1, "watcher", PROTOCOL_VERSION)).await;
    assert_eq!(watcher.recv().await["type"], "welcome");
    let err = watcher.recv().await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "backpressure");
    assert_eq!(err["seq"], 1);

    assert_eq!(cmd_rx.recv().await.unwrap().seq, 2);
    server.abort();
}
