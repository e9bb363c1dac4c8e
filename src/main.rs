//! Terminal 2048 runner (default binary).
//!
//! Uses crossterm for input and the framebuffer renderer from `tui-2048-term`.
//! When the control adapter is enabled, external clients drive the same game
//! over TCP; their commands are applied here, on the game loop, between frames.

use std::env;
use std::fs::OpenOptions;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use log::info;

use tui_2048::adapter::Adapter;
use tui_2048::core::{GameSnapshot, GameState};
use tui_2048::input::{handle_key_event, should_quit};
use tui_2048::term::{FrameBuffer, GameView, TerminalRenderer, Viewport};
use tui_2048::types::GameConfig;

/// How long to wait for a key before checking the adapter queue again.
const POLL_INTERVAL: Duration = Duration::from_millis(30);

fn main() -> Result<()> {
    init_logging()?;

    let config = GameConfig::from_env();
    let mut game = GameState::seeded(config).context("invalid game configuration")?;
    let mut adapter = Adapter::start_from_env(&config)?;

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, &mut game, adapter.as_mut());

    // Always try to restore terminal state.
    let _ = term.exit();
    info!(
        "exiting: score {} after {} moves in episode {}",
        game.score(),
        game.move_count(),
        game.episode_id()
    );
    result
}

/// The TUI owns the terminal, so logs only go somewhere when
/// `TWENTY48_LOG_PATH` names a file (or `RUST_LOG` asks for stderr).
fn init_logging() -> Result<()> {
    let path = env::var("TWENTY48_LOG_PATH")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let default_filter = if path.is_some() { "info" } else { "off" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));

    if let Some(path) = path {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file {path}"))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init().context("failed to initialise logging")?;
    Ok(())
}

fn run(
    term: &mut TerminalRenderer,
    game: &mut GameState,
    mut adapter: Option<&mut Adapter>,
) -> Result<()> {
    let view = GameView::default();
    let mut snap = GameSnapshot::default();
    let mut fb = FrameBuffer::new(0, 0);
    let mut dirty = true;

    loop {
        if let Some(adapter) = adapter.as_deref_mut() {
            if adapter.pump(game) > 0 {
                dirty = true;
            }
        }

        if dirty {
            let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
            game.snapshot_into(&mut snap);
            view.render_into(&snap, Viewport::new(w, h), &mut fb);
            term.draw_swap(&mut fb)?;
            dirty = false;
        }

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if should_quit(key) {
                    return Ok(());
                }

                if let Some(action) = handle_key_event(key) {
                    if game.apply_action(action).changed {
                        dirty = true;
                        if let Some(adapter) = adapter.as_deref_mut() {
                            adapter.publish(game);
                        }
                    }
                }
            }
            Event::Resize(_, _) => {
                term.invalidate();
                dirty = true;
            }
            _ => {}
        }
    }
}
