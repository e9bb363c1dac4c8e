//! GameView: maps a `core::GameSnapshot` into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.
//!
//! Layout (top to bottom): title and score line, the boxed grid, a status
//! banner, and a key help line. The whole block is centred in the viewport.

use crate::core::GameSnapshot;
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::GameStatus;

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

const BOARD_BG: Rgb = Rgb::new(187, 173, 160);
const EMPTY_BG: Rgb = Rgb::new(205, 193, 180);
const DARK_TEXT: Rgb = Rgb::new(119, 110, 101);
const LIGHT_TEXT: Rgb = Rgb::new(249, 246, 242);

/// Rows of chrome around the board: header, blank, banner, help.
const CHROME_ROWS: u16 = 4;

/// Classic tile palette: (background, foreground) by value.
pub fn tile_colors(value: u32) -> (Rgb, Rgb) {
    match value {
        0 => (EMPTY_BG, DARK_TEXT),
        2 => (Rgb::new(238, 228, 218), DARK_TEXT),
        4 => (Rgb::new(237, 224, 200), DARK_TEXT),
        8 => (Rgb::new(242, 177, 121), LIGHT_TEXT),
        16 => (Rgb::new(245, 149, 99), LIGHT_TEXT),
        32 => (Rgb::new(246, 124, 95), LIGHT_TEXT),
        64 => (Rgb::new(246, 94, 59), LIGHT_TEXT),
        128 => (Rgb::new(237, 207, 114), LIGHT_TEXT),
        256 => (Rgb::new(237, 204, 97), LIGHT_TEXT),
        512 => (Rgb::new(237, 200, 80), LIGHT_TEXT),
        1024 => (Rgb::new(237, 197, 63), LIGHT_TEXT),
        2048 => (Rgb::new(237, 194, 46), LIGHT_TEXT),
        _ => (Rgb::new(60, 58, 50), LIGHT_TEXT),
    }
}

/// A lightweight terminal renderer for the 2048 grid.
pub struct GameView {
    /// Tile width in terminal columns.
    tile_w: u16,
    /// Tile height in terminal rows.
    tile_h: u16,
}

impl Default for GameView {
    fn default() -> Self {
        // 7x3 fits six digits and roughly matches a square on most fonts.
        Self {
            tile_w: 7,
            tile_h: 3,
        }
    }
}

impl GameView {
    pub fn new(tile_w: u16, tile_h: u16) -> Self {
        Self {
            tile_w: tile_w.max(1),
            tile_h: tile_h.max(1),
        }
    }

    /// Size of the boxed grid for an N x N snapshot, including gutters.
    ///
    /// `None` when the grid cannot fit in any terminal.
    pub fn board_dimensions(&self, n: usize) -> Option<(u16, u16)> {
        let side = |tile: u16| {
            n.checked_mul(usize::from(tile))
                .and_then(|v| v.checked_add(n.checked_add(1)?))
                .and_then(|v| u16::try_from(v).ok())
        };
        Some((side(self.tile_w)?, side(self.tile_h)?))
    }

    pub fn render(&self, snap: &GameSnapshot, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, viewport, &mut fb);
        fb
    }

    /// Render the snapshot into an existing framebuffer.
    ///
    /// Callers can reuse a framebuffer across frames; it is resized to the
    /// viewport and fully overwritten.
    pub fn render_into(&self, snap: &GameSnapshot, viewport: Viewport, fb: &mut FrameBuffer) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().into_cell(' '));

        let fits = self.board_dimensions(snap.size).and_then(|(w, h)| {
            let block_h = h.checked_add(CHROME_ROWS)?;
            (w <= viewport.width && block_h <= viewport.height).then_some((w, h, block_h))
        });
        let Some((board_w, board_h, block_h)) = fits else {
            let msg = match self.board_dimensions(snap.size) {
                Some((w, h)) => {
                    format!("Terminal too small: need {}x{}", w, h.saturating_add(CHROME_ROWS))
                }
                None => format!("Terminal too small for a {0}x{0} grid", snap.size),
            };
            let y = viewport.height / 2;
            fb.put_str_centered(0, viewport.width, y, &msg, CellStyle::default());
            return;
        };

        let x0 = (viewport.width - board_w) / 2;
        let y0 = (viewport.height - block_h) / 2;

        self.draw_header(fb, snap, x0, y0, board_w);
        self.draw_board(fb, snap, x0, y0 + 2);
        self.draw_banner(fb, snap, x0, y0 + 2 + board_h, board_w);

        let help = "arrows/wasd move  r new  q quit";
        let help_style = CellStyle::new(Rgb::new(130, 130, 130), Rgb::new(0, 0, 0));
        fb.put_str_centered(x0, board_w, y0 + 3 + board_h, help, help_style);
    }

    fn draw_header(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, x: u16, y: u16, w: u16) {
        let title_style = CellStyle::new(Rgb::new(237, 194, 46), Rgb::new(0, 0, 0)).bold();
        fb.put_str(x, y, &snap.win_tile.to_string(), title_style);

        let score = if snap.last_score_delta > 0 && snap.playable() {
            format!("Score {} (+{})", snap.score, snap.last_score_delta)
        } else {
            format!("Score {}", snap.score)
        };
        let len = score.chars().count() as u16;
        fb.put_str(x + w.saturating_sub(len), y, &score, CellStyle::default().bold());
    }

    fn draw_board(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, x: u16, y: u16) {
        let Some((board_w, board_h)) = self.board_dimensions(snap.size) else {
            return;
        };
        fb.fill_rect(x, y, board_w, board_h, ' ', CellStyle::new(DARK_TEXT, BOARD_BG));

        for row in 0..snap.size {
            for col in 0..snap.size {
                let tx = x + 1 + (col as u16) * (self.tile_w + 1);
                let ty = y + 1 + (row as u16) * (self.tile_h + 1);
                self.draw_tile(fb, tx, ty, snap.cell(row, col));
            }
        }
    }

    fn draw_tile(&self, fb: &mut FrameBuffer, x: u16, y: u16, value: u32) {
        let (bg, fg) = tile_colors(value);
        let style = CellStyle::new(fg, bg).bold();
        fb.fill_rect(x, y, self.tile_w, self.tile_h, ' ', style);
        if value != 0 {
            fb.put_str_centered(x, self.tile_w, y + self.tile_h / 2, &value.to_string(), style);
        }
    }

    fn draw_banner(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, x: u16, y: u16, w: u16) {
        let (msg, fg) = match snap.status {
            GameStatus::Won => ("You won! Press r for a new game.", Rgb::new(237, 194, 46)),
            GameStatus::Lost => ("Game over! Press r for a new game.", Rgb::new(246, 94, 59)),
            GameStatus::Playing => return,
        };
        fb.put_str_centered(x, w, y, msg, CellStyle::new(fg, Rgb::new(0, 0, 0)).bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_WIN_TILE;

    fn snapshot(rows: [[u32; 4]; 4], status: GameStatus) -> GameSnapshot {
        GameSnapshot {
            cells: rows.iter().flatten().copied().collect(),
            status,
            score: 1234,
            win_tile: DEFAULT_WIN_TILE,
            ..GameSnapshot::default()
        }
    }

    fn screen_text(fb: &FrameBuffer) -> String {
        (0..fb.height())
            .map(|y| fb.row_text(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn board_dimensions_include_gutters() {
        let view = GameView::default();
        assert_eq!(view.board_dimensions(4), Some((33, 17)));
        assert_eq!(GameView::new(5, 1).board_dimensions(3), Some((19, 7)));
        assert_eq!(view.board_dimensions(10_000), None);
        assert_eq!(view.board_dimensions(usize::MAX), None);
    }

    #[test]
    fn renders_tiles_and_score() {
        let snap = snapshot(
            [[2, 0, 0, 0], [0, 128, 0, 0], [0, 0, 0, 0], [0, 0, 0, 65536]],
            GameStatus::Playing,
        );
        let fb = GameView::default().render(&snap, Viewport::new(80, 24));
        let text = screen_text(&fb);

        assert!(text.contains("Score 1234"));
        assert!(text.contains("128"));
        assert!(text.contains("65536"));
        assert!(!text.contains("Game over"));
        assert!(text.contains("q quit"));
    }

    #[test]
    fn tile_cells_use_palette() {
        let snap = snapshot(
            [[2, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
            GameStatus::Playing,
        );
        let view = GameView::default();
        let fb = view.render(&snap, Viewport::new(33, 21));

        // Block is 33x21 so it starts at the origin; the first tile sits
        // inside the one-cell gutter below the two header rows.
        let first = fb.get(1, 3).unwrap();
        assert_eq!(first.style.bg, tile_colors(2).0);
        let empty = fb.get(1 + 8, 3).unwrap();
        assert_eq!(empty.style.bg, EMPTY_BG);
        let gutter = fb.get(0, 3).unwrap();
        assert_eq!(gutter.style.bg, BOARD_BG);
    }

    #[test]
    fn renders_terminal_banners() {
        let view = GameView::default();
        let won = view.render(&snapshot([[0; 4]; 4], GameStatus::Won), Viewport::new(80, 24));
        assert!(screen_text(&won).contains("You won!"));

        let lost = view.render(&snapshot([[0; 4]; 4], GameStatus::Lost), Viewport::new(80, 24));
        assert!(screen_text(&lost).contains("Game over!"));
    }

    #[test]
    fn oversized_grid_shows_hint() {
        let snap = GameSnapshot {
            size: 10_000,
            ..GameSnapshot::default()
        };
        let fb = GameView::default().render(&snap, Viewport::new(80, 24));
        assert!(screen_text(&fb).contains("Terminal too small for a 10000x10000 grid"));
    }

    #[test]
    fn small_viewport_shows_hint() {
        let snap = snapshot([[0; 4]; 4], GameStatus::Playing);
        let fb = GameView::default().render(&snap, Viewport::new(40, 10));
        assert!(screen_text(&fb).contains("Terminal too small"));
    }

    #[test]
    fn render_into_reuses_buffer() {
        let snap = snapshot([[4; 4]; 4], GameStatus::Playing);
        let view = GameView::default();
        let mut fb = FrameBuffer::new(1, 1);
        view.render_into(&snap, Viewport::new(60, 30), &mut fb);
        assert_eq!((fb.width(), fb.height()), (60, 30));
        assert_eq!(fb, view.render(&snap, Viewport::new(60, 30)));
    }
}
