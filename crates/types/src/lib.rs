//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the application.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, terminal rendering, control protocol).
//!
//! # Board Dimensions
//!
//! The classic game is played on a 4x4 grid with a 2048 target tile. Both are
//! configurable through [`GameConfig`]:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_BOARD_SIZE` | 4 | Grid dimension N (N x N cells) |
//! | `MIN_BOARD_SIZE` | 2 | Smallest playable grid |
//! | `DEFAULT_WIN_TILE` | 2048 | Tile value that wins the game |
//! | `INITIAL_TILES` | 2 | Tiles placed on a fresh grid |
//!
//! # Spawn Rule
//!
//! After every move that changes the grid, one tile is spawned on a uniformly
//! chosen empty cell: a `2` with probability 0.9, a `4` with probability
//! `SPAWN_FOUR_PROBABILITY` (0.1).
//!
//! # Examples
//!
//! ```
//! use tui_2048_types::{Direction, GameAction, GameStatus, DEFAULT_BOARD_SIZE};
//!
//! // Parse from string (case-insensitive)
//! assert_eq!(Direction::from_str("Up"), Some(Direction::Up));
//! assert_eq!(Direction::from_str("sideways"), None);
//!
//! // Directions come in opposite pairs
//! assert_eq!(Direction::Left.opposite(), Direction::Right);
//!
//! // Actions wrap directions
//! assert_eq!(GameAction::from_str("left"), Some(GameAction::Move(Direction::Left)));
//! assert_eq!(GameAction::from_str("restart"), Some(GameAction::Restart));
//!
//! assert!(GameStatus::Lost.is_terminal());
//! assert_eq!(DEFAULT_BOARD_SIZE, 4);
//! ```

/// Default grid dimension (4x4)
pub const DEFAULT_BOARD_SIZE: usize = 4;

/// Smallest grid dimension the engine accepts
pub const MIN_BOARD_SIZE: usize = 2;

/// Default tile value that wins the game
pub const DEFAULT_WIN_TILE: u32 = 2048;

/// Number of tiles placed when a game starts
pub const INITIAL_TILES: usize = 2;

/// Probability that a spawned tile is a 4 instead of a 2
pub const SPAWN_FOUR_PROBABILITY: f64 = 0.1;

/// Value of the common spawned tile
pub const SPAWN_LOW_VALUE: u32 = 2;

/// Value of the rare spawned tile
pub const SPAWN_HIGH_VALUE: u32 = 4;


/// The four move directions
///
/// Tiles slide toward the named edge of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions, in index order
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Parse direction from string (case-insensitive)
    ///
    /// Accepts full names or single letters: "up" | "u", "down" | "d",
    /// "left" | "l", "right" | "r".
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_2048_types::Direction;
    ///
    /// assert_eq!(Direction::from_str("up"), Some(Direction::Up));
    /// assert_eq!(Direction::from_str("R"), Some(Direction::Right));
    /// assert_eq!(Direction::from_str("north"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "up" | "u" => Some(Direction::Up),
            "down" | "d" => Some(Direction::Down),
            "left" | "l" => Some(Direction::Left),
            "right" | "r" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Numeric index (0=Up, 1=Down, 2=Left, 3=Right)
    pub fn index(&self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// Inverse of [`Direction::index`]. Returns `None` for values above 3.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Game status, derived from the grid after every move
///
/// - **Playing**: at least one move is still possible and no tile equals the target
/// - **Won**: some tile equals the win threshold
/// - **Lost**: the grid is full and no two orthogonal neighbours are equal
///
/// `Won` and `Lost` are terminal until the game is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::Playing)
    }

    /// Convert to lowercase string for the control protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Playing => "playing",
            GameStatus::Won => "won",
            GameStatus::Lost => "lost",
        }
    }
}

/// Actions a front end can apply to a game
///
/// These are produced by both keyboard input and the control adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Slide all tiles in the given direction
    Move(Direction),
    /// Discard the current game and start a fresh one
    Restart,
}

impl GameAction {
    /// Parse action from string
    ///
    /// Accepts any [`Direction::from_str`] spelling, the camelCase forms
    /// `moveUp`/`moveDown`/`moveLeft`/`moveRight`, and `restart` | `new`.
    pub fn from_str(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "restart" | "new" | "reset" => return Some(GameAction::Restart),
            _ => {}
        }
        let dir = lower.strip_prefix("move").unwrap_or(&lower);
        Direction::from_str(dir).map(GameAction::Move)
    }

    /// Convert to camelCase string for the control protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::Move(Direction::Up) => "moveUp",
            GameAction::Move(Direction::Down) => "moveDown",
            GameAction::Move(Direction::Left) => "moveLeft",
            GameAction::Move(Direction::Right) => "moveRight",
            GameAction::Restart => "restart",
        }
    }
}

/// Game configuration
///
/// `size` and `win_tile` are validated by the engine when a game is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Grid dimension N
    pub size: usize,
    /// Tile value that wins the game
    pub win_tile: u32,
    /// RNG seed; `None` lets the front end pick one
    pub seed: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_BOARD_SIZE,
            win_tile: DEFAULT_WIN_TILE,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Create from environment variables
    ///
    /// - `TWENTY48_SIZE`: grid dimension (default 4)
    /// - `TWENTY48_WIN_TILE`: winning tile value (default 2048)
    /// - `TWENTY48_SEED`: RNG seed (default: none)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        use std::env;

        let size = env::var("TWENTY48_SIZE")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_BOARD_SIZE);

        let win_tile = env::var("TWENTY48_WIN_TILE")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_WIN_TILE);

        let seed = env::var("TWENTY48_SEED")
            .ok()
            .and_then(|s| s.trim().parse().ok());

        Self {
            size,
            win_tile,
            seed,
        }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_win_tile(mut self, win_tile: u32) -> Self {
        self.win_tile = win_tile;
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }
}
