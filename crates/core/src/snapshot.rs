use crate::types::{Direction, GameStatus, DEFAULT_BOARD_SIZE, DEFAULT_WIN_TILE};

/// Render-ready copy of a game, handed to views and the control adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    pub size: usize,
    /// Row-major cells, `size * size` long
    pub cells: Vec<u32>,
    pub score: u64,
    pub status: GameStatus,
    pub win_tile: u32,
    pub max_tile: u32,
    pub empty_cells: usize,
    pub episode_id: u32,
    pub move_count: u32,
    pub last_move: Option<Direction>,
    pub last_score_delta: u64,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        self.size = DEFAULT_BOARD_SIZE;
        self.cells.clear();
        self.cells.resize(DEFAULT_BOARD_SIZE * DEFAULT_BOARD_SIZE, 0);
        self.score = 0;
        self.status = GameStatus::Playing;
        self.win_tile = DEFAULT_WIN_TILE;
        self.max_tile = 0;
        self.empty_cells = DEFAULT_BOARD_SIZE * DEFAULT_BOARD_SIZE;
        self.episode_id = 0;
        self.move_count = 0;
        self.last_move = None;
        self.last_score_delta = 0;
    }

    /// Cell at (row, col), 0 when out of bounds
    pub fn cell(&self, row: usize, col: usize) -> u32 {
        if row >= self.size || col >= self.size {
            return 0;
        }
        self.cells[row * self.size + col]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.cells.chunks_exact(self.size.max(1))
    }

    pub fn playable(&self) -> bool {
        !self.status.is_terminal()
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        let mut s = Self {
            size: 0,
            cells: Vec::new(),
            score: 0,
            status: GameStatus::Playing,
            win_tile: 0,
            max_tile: 0,
            empty_cells: 0,
            episode_id: 0,
            move_count: 0,
            last_move: None,
            last_score_delta: 0,
        };
        s.clear();
        s
    }
}
