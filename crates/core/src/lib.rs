//! Core game logic module - pure, deterministic, and testable
//!
//! This module contains all the game rules, state management, and simulation logic.
//! It has **no dependencies** on UI, networking, or I/O, making it:
//!
//! - **Deterministic**: Same seed produces identical games (for bots and replays)
//! - **Testable**: Comprehensive unit tests for all game rules
//! - **Portable**: Can run in any environment (terminal, headless, test harness)
//!
//! # Module Structure
//!
//! - [`board`]: N x N grid storage, tile spawning, neighbour checks
//! - [`slide`]: orient → collapse → unorient move algorithm
//! - [`status`]: win/lose detection
//! - [`game_state`]: the engine: grid + score + status, move/reset lifecycle
//! - [`rng`]: seedable LCG usable anywhere a `rand::Rng` is expected
//! - [`snapshot`]: render-ready copies of the game for views and the adapter
//!
//! # Game Rules
//!
//! - A move slides every tile toward one edge; equal neighbours merge into
//!   their sum, and a tile merges at most once per move
//! - The score grows by the value of every merged tile
//! - A move that changes nothing spawns nothing and scores nothing
//! - After every effective move one tile (2 at 90%, 4 at 10%) spawns on a
//!   random empty cell
//! - Reaching the win tile (2048 by default) wins; a full grid with no equal
//!   neighbours loses
//!
//! # Example
//!
//! ```
//! use tui_2048_core::{GameState, Grid, SimpleRng};
//! use tui_2048_core::types::{Direction, GameStatus};
//!
//! let grid = Grid::from_rows(&[[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
//! let mut game = GameState::from_grid(grid, 2048, SimpleRng::new(12345)).unwrap();
//!
//! let result = game.apply_move(Direction::Left);
//! assert!(result.changed);
//! assert_eq!(result.score_delta, 4);
//! assert_eq!(result.grid.get(0, 0), Some(4));
//! assert_eq!(game.status(), GameStatus::Playing);
//! ```

pub mod board;
pub mod error;
pub mod game_state;
pub mod rng;
pub mod slide;
pub mod snapshot;
pub mod status;

pub use tui_2048_types as types;

// Re-export commonly used types for convenience
pub use board::{is_tile_value, Grid, Spawned};
pub use error::EngineError;
pub use game_state::{
    direction_from_index, parse_action, parse_direction, validate_config, GameState, MoveResult,
};
pub use rng::SimpleRng;
pub use slide::{collapse_row, orient, slide, unorient, Slide};
pub use snapshot::GameSnapshot;
pub use status::{compute_status, has_moves};
