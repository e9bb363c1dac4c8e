//! Game state module - the board engine
//!
//! Owns the grid, the score and the cached status, and applies moves:
//! slide, then (only if something moved) spawn one tile, add the merge score
//! and recompute the status.
//!
//! # Terminal states
//!
//! `Won` and `Lost` are terminal. Moves applied in a terminal state are no-ops
//! that report `changed = false` and the terminal status; only [`GameState::reset`]
//! returns the game to `Playing`.

use arrayvec::ArrayVec;
use log::{debug, info};
use rand::Rng;

use crate::board::{is_tile_value, Grid, Spawned};
use crate::error::{EngineError, Result};
use crate::rng::SimpleRng;
use crate::slide::slide;
use crate::snapshot::GameSnapshot;
use crate::status::compute_status;
use crate::types::*;

/// Outcome of a single move, built fresh per call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    /// Whether any tile moved or merged (and a tile was spawned)
    pub changed: bool,
    /// Grid after the move and spawn
    pub grid: Grid,
    /// Sum of the merged values gained by this move
    pub score_delta: u64,
    /// Status after the move
    pub status: GameStatus,
}

/// Check a configuration before building a game from it.
///
/// Rejects grids smaller than 2x2 and win tiles that are not a power of two
/// of at least 4 (a 2 would be won by the first spawn).
pub fn validate_config(config: &GameConfig) -> Result<()> {
    if config.size < MIN_BOARD_SIZE {
        return Err(EngineError::invalid(format!(
            "grid size must be at least {MIN_BOARD_SIZE}, got {}",
            config.size
        )));
    }
    if config.win_tile < 4 || !is_tile_value(config.win_tile) {
        return Err(EngineError::invalid(format!(
            "win tile must be a power of two >= 4, got {}",
            config.win_tile
        )));
    }
    Ok(())
}

/// Parse a direction name, rejecting anything but the four directions.
pub fn parse_direction(s: &str) -> Result<Direction> {
    Direction::from_str(s).ok_or_else(|| EngineError::invalid(format!("unknown direction {s:?}")))
}

/// Map a numeric direction (0=Up, 1=Down, 2=Left, 3=Right).
pub fn direction_from_index(index: u8) -> Result<Direction> {
    Direction::from_index(index)
        .ok_or_else(|| EngineError::invalid(format!("direction index {index} is not in 0..=3")))
}

/// Parse a game action (a direction or `restart`).
pub fn parse_action(s: &str) -> Result<GameAction> {
    GameAction::from_str(s).ok_or_else(|| EngineError::invalid(format!("unknown action {s:?}")))
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState<R = SimpleRng> {
    config: GameConfig,
    grid: Grid,
    score: u64,
    /// Cached `compute_status(grid, win_tile)`, refreshed on every mutation.
    status: GameStatus,
    rng: R,
    /// Monotonic episode id (increments on reset).
    episode_id: u32,
    /// Number of moves that changed the grid in this episode.
    move_count: u32,
    last_move: Option<Direction>,
    last_score_delta: u64,
    last_spawn: Option<Spawned>,
}

impl GameState<SimpleRng> {
    /// Create a game driven by [`SimpleRng`], seeded from `config.seed` or,
    /// when absent, from OS entropy.
    pub fn seeded(config: GameConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => SimpleRng::new(seed),
            None => SimpleRng::from_entropy(),
        };
        Self::new(config, rng)
    }
}

impl<R: Rng> GameState<R> {
    /// Create a new game: an empty grid with two spawned tiles and score 0.
    pub fn new(config: GameConfig, rng: R) -> Result<Self> {
        validate_config(&config)?;
        let mut state = Self {
            config,
            grid: Grid::new(config.size)?,
            score: 0,
            status: GameStatus::Playing,
            rng,
            episode_id: 0,
            move_count: 0,
            last_move: None,
            last_score_delta: 0,
            last_spawn: None,
        };
        state.place_initial_tiles();
        info!(
            "new {}x{} game (win tile {})",
            config.size, config.size, config.win_tile
        );
        Ok(state)
    }

    /// Create a classic game (win tile 2048) on an N x N grid.
    pub fn with_size(size: usize, rng: R) -> Result<Self> {
        Self::new(GameConfig::default().with_size(size), rng)
    }

    /// Resume from an explicit grid with score 0.
    ///
    /// Used by test harnesses and bots that need a specific position.
    pub fn from_grid(grid: Grid, win_tile: u32, rng: R) -> Result<Self> {
        let config = GameConfig::default()
            .with_size(grid.size())
            .with_win_tile(win_tile);
        validate_config(&config)?;
        let status = compute_status(&grid, win_tile);
        Ok(Self {
            config,
            grid,
            score: 0,
            status,
            rng,
            episode_id: 0,
            move_count: 0,
            last_move: None,
            last_score_delta: 0,
            last_spawn: None,
        })
    }

    fn place_initial_tiles(&mut self) {
        for _ in 0..INITIAL_TILES {
            self.last_spawn = self.grid.spawn_tile(&mut self.rng);
        }
        self.status = compute_status(&self.grid, self.config.win_tile);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn size(&self) -> usize {
        self.grid.size()
    }

    pub fn win_tile(&self) -> u32 {
        self.config.win_tile
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn last_move(&self) -> Option<Direction> {
        self.last_move
    }

    /// Tile placed by the most recent spawn, if any
    pub fn last_spawn(&self) -> Option<Spawned> {
        self.last_spawn
    }

    pub fn max_tile(&self) -> u32 {
        self.grid.max_tile()
    }

    pub fn empty_count(&self) -> usize {
        self.grid.empty_count()
    }

    /// Whether moving in `dir` would change the grid
    pub fn can_move(&self, dir: Direction) -> bool {
        !self.status.is_terminal() && slide(&self.grid, dir).changed
    }

    /// Directions that would change the grid, in [`Direction::ALL`] order
    pub fn legal_moves(&self) -> ArrayVec<Direction, 4> {
        Direction::ALL
            .into_iter()
            .filter(|&dir| self.can_move(dir))
            .collect()
    }

    /// Apply a move.
    ///
    /// If nothing moves, grid, score, status and RNG are left exactly as they
    /// were and no tile is spawned.
    pub fn apply_move(&mut self, dir: Direction) -> MoveResult {
        if self.status.is_terminal() {
            debug!("ignoring {} in terminal state {:?}", dir.as_str(), self.status);
            return self.unchanged();
        }

        let outcome = slide(&self.grid, dir);
        if !outcome.changed {
            debug!("{} does not move any tile", dir.as_str());
            return self.unchanged();
        }

        self.grid = outcome.grid;
        self.last_spawn = self.grid.spawn_tile(&mut self.rng);
        self.score += outcome.score_delta;
        self.move_count += 1;
        self.last_move = Some(dir);
        self.last_score_delta = outcome.score_delta;
        self.refresh_status();

        MoveResult {
            changed: true,
            grid: self.grid.clone(),
            score_delta: outcome.score_delta,
            status: self.status,
        }
    }

    /// Apply a front-end action. `Restart` resets and reports `changed`.
    pub fn apply_action(&mut self, action: GameAction) -> MoveResult {
        match action {
            GameAction::Move(dir) => self.apply_move(dir),
            GameAction::Restart => {
                self.reset();
                MoveResult {
                    changed: true,
                    grid: self.grid.clone(),
                    score_delta: 0,
                    status: self.status,
                }
            }
        }
    }

    /// Parse and apply a textual action such as `"left"` or `"restart"`.
    ///
    /// Unknown input is rejected without touching the game.
    pub fn apply_command(&mut self, command: &str) -> Result<MoveResult> {
        let action = parse_action(command)?;
        Ok(self.apply_action(action))
    }

    /// Spawn one tile outside of a move. Returns `None` on a full grid.
    pub fn spawn_tile(&mut self) -> Option<Spawned> {
        let spawned = self.grid.spawn_tile(&mut self.rng)?;
        self.last_spawn = Some(spawned);
        self.refresh_status();
        Some(spawned)
    }

    /// Start a fresh episode with the same configuration and RNG stream.
    pub fn reset(&mut self) {
        let n = self.config.size;
        self.grid = Grid::from_parts(n, vec![0; n * n]);
        self.score = 0;
        self.episode_id = self.episode_id.wrapping_add(1);
        self.move_count = 0;
        self.last_move = None;
        self.last_score_delta = 0;
        self.last_spawn = None;
        self.place_initial_tiles();
        info!("episode {} started", self.episode_id);
    }

    fn refresh_status(&mut self) {
        let before = self.status;
        self.status = compute_status(&self.grid, self.config.win_tile);
        if self.status != before && self.status.is_terminal() {
            info!(
                "episode {} ended: {} with score {} after {} moves",
                self.episode_id,
                self.status.as_str(),
                self.score,
                self.move_count
            );
        }
    }

    fn unchanged(&self) -> MoveResult {
        MoveResult {
            changed: false,
            grid: self.grid.clone(),
            score_delta: 0,
            status: self.status,
        }
    }

    /// Copy the game into `out`, reusing its cell buffer.
    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.size = self.grid.size();
        out.cells.clear();
        out.cells.extend_from_slice(self.grid.cells());
        out.score = self.score;
        out.status = self.status;
        out.win_tile = self.config.win_tile;
        out.max_tile = self.grid.max_tile();
        out.empty_cells = self.grid.empty_count();
        out.episode_id = self.episode_id;
        out.move_count = self.move_count;
        out.last_move = self.last_move;
        out.last_score_delta = self.last_score_delta;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }
}
