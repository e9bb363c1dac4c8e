//! Adapter runtime integration.
//!
//! Bridges the sync game loop with the async TCP server. The game loop stays
//! the single owner of the [`GameState`]; it drains commands with
//! [`Adapter::pump`] and the replies flow back over a channel.

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::core::GameState;
use crate::protocol::{build_observation, create_ack, AckMessage, ObservationMessage};
use crate::server::{run_server, ServerConfig, ServerState};
use crate::types::{GameAction, GameConfig};

/// Command delivered to the game loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    /// A validated move or restart.
    Command(GameAction),
    /// Send the current observation to this client only.
    SnapshotRequest,
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClientAck { client_id: usize, ack: AckMessage },
    ToClientObservation { client_id: usize, obs: ObservationMessage },
    /// Sent to every handshaken client that streams observations.
    BroadcastObservation { obs: ObservationMessage },
}

/// Applies inbound commands to a game and produces the replies.
///
/// Owns the observation sequence counter so observations are numbered
/// monotonically regardless of which client triggered them.
#[derive(Debug, Default)]
pub struct Dispatcher {
    obs_seq: u64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_observation(&mut self, game: &GameState) -> ObservationMessage {
        self.obs_seq += 1;
        build_observation(&game.snapshot(), self.obs_seq)
    }

    /// Apply one command. Commands get an ack echoing their `seq`, followed
    /// by an observation broadcast when the game changed.
    pub fn handle(&mut self, game: &mut GameState, cmd: InboundCommand) -> Vec<OutboundMessage> {
        match cmd.payload {
            InboundPayload::SnapshotRequest => vec![OutboundMessage::ToClientObservation {
                client_id: cmd.client_id,
                obs: self.next_observation(game),
            }],
            InboundPayload::Command(action) => {
                let result = game.apply_action(action);
                let mut out = vec![OutboundMessage::ToClientAck {
                    client_id: cmd.client_id,
                    ack: create_ack(cmd.seq, result.changed, result.score_delta),
                }];
                if result.changed {
                    out.push(self.broadcast(game));
                }
                out
            }
        }
    }

    /// Observation for every streaming client.
    pub fn broadcast(&mut self, game: &GameState) -> OutboundMessage {
        OutboundMessage::BroadcastObservation {
            obs: self.next_observation(game),
        }
    }
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    dispatcher: Dispatcher,
}

impl Adapter {
    /// Start the adapter from environment variables.
    ///
    /// Returns `Ok(None)` if `TWENTY48_AI_DISABLED` is set.
    pub fn start_from_env(game: &GameConfig) -> Result<Option<Self>> {
        if ServerState::is_disabled() {
            info!("adapter disabled via TWENTY48_AI_DISABLED");
            return Ok(None);
        }
        Self::start(ServerConfig::from_env().with_game(game)).map(Some)
    }

    /// Spawn the server on a dedicated tokio runtime.
    pub fn start(config: ServerConfig) -> Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();

        let rt = Runtime::new().context("failed to create tokio runtime")?;
        rt.spawn(async move {
            if let Err(e) = run_server(config, cmd_tx, out_rx, None).await {
                warn!("adapter stopped: {:#}", e);
            }
        });

        Ok(Self {
            _rt: rt,
            cmd_rx,
            out_tx,
            dispatcher: Dispatcher::new(),
        })
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }

    /// Apply every pending command to `game`. Returns how many were handled.
    pub fn pump(&mut self, game: &mut GameState) -> usize {
        let mut handled = 0;
        while let Some(cmd) = self.try_recv() {
            for msg in self.dispatcher.handle(game, cmd) {
                self.send(msg);
            }
            handled += 1;
        }
        handled
    }

    /// Tell streaming clients about a change made outside the adapter
    /// (for example a keypress in the terminal).
    pub fn publish(&mut self, game: &GameState) {
        let msg = self.dispatcher.broadcast(game);
        self.send(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Grid, SimpleRng};
    use crate::types::Direction;

    fn game() -> GameState {
        let grid = Grid::from_rows(&[[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        GameState::from_grid(grid, 2048, SimpleRng::new(7)).unwrap()
    }

    fn command(seq: u64, action: GameAction) -> InboundCommand {
        InboundCommand {
            client_id: 3,
            seq,
            payload: InboundPayload::Command(action),
        }
    }

    #[test]
    fn effective_move_acks_then_broadcasts() {
        let mut game = game();
        let mut dispatcher = Dispatcher::new();

        let out = dispatcher.handle(&mut game, command(5, GameAction::Move(Direction::Left)));
        assert_eq!(out.len(), 2);
        match &out[0] {
            OutboundMessage::ToClientAck { client_id, ack } => {
                assert_eq!(*client_id, 3);
                assert_eq!(ack.seq, 5);
                assert!(ack.changed);
                assert_eq!(ack.score_delta, 4);
            }
            other => panic!("expected ack, got {:?}", other),
        }
        match &out[1] {
            OutboundMessage::BroadcastObservation { obs } => {
                assert_eq!(obs.seq, 1);
                assert_eq!(obs.score, 4);
                assert_eq!(obs.board.cells[0][0], 4);
                assert_eq!(obs.move_count, 1);
            }
            other => panic!("expected broadcast, got {:?}", other),
        }
    }

    #[test]
    fn noop_move_only_acks() {
        let mut game = game();
        let before = game.snapshot();
        let mut dispatcher = Dispatcher::new();

        // Nothing can move up from the top row.
        let out = dispatcher.handle(&mut game, command(1, GameAction::Move(Direction::Up)));
        assert_eq!(out.len(), 1);
        match &out[0] {
            OutboundMessage::ToClientAck { ack, .. } => {
                assert!(!ack.changed);
                assert_eq!(ack.score_delta, 0);
            }
            other => panic!("expected ack, got {:?}", other),
        }
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn snapshot_request_targets_one_client() {
        let mut game = game();
        let mut dispatcher = Dispatcher::new();
        let out = dispatcher.handle(
            &mut game,
            InboundCommand {
                client_id: 9,
                seq: 1,
                payload: InboundPayload::SnapshotRequest,
            },
        );
        assert!(matches!(
            out.as_slice(),
            [OutboundMessage::ToClientObservation { client_id: 9, .. }]
        ));
    }

    #[test]
    fn observation_seq_is_monotonic() {
        let mut game = game();
        let mut dispatcher = Dispatcher::new();
        let seqs: Vec<u64> = (0..3)
            .map(|_| match dispatcher.broadcast(&game) {
                OutboundMessage::BroadcastObservation { obs } => obs.seq,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(seqs, vec![1, 2, 3]);

        let out = dispatcher.handle(&mut game, command(2, GameAction::Restart));
        match out.last() {
            Some(OutboundMessage::BroadcastObservation { obs }) => {
                assert_eq!(obs.seq, 4);
                assert_eq!(obs.episode_id, 1);
            }
            other => panic!("expected broadcast, got {:?}", other),
        }
    }
}
