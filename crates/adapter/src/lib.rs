//! Adapter module - external control via TCP socket with JSON protocol
//!
//! This module lets bots and test harnesses play the game over a TCP socket.
//! The game loop keeps sole ownership of the engine; the server only
//! validates messages and passes commands over a channel.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7788)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Commanding**: Client sends `command` messages (`move` or `restart`)
//! 4. **Acknowledgment**: Each applied command is answered with an `ack`
//!    carrying `changed` and `score_delta`
//! 5. **Observation Streaming**: After every change the server sends an
//!    `observation` with the full board
//!
//! # Errors
//!
//! - `handshake_required`: command before hello
//! - `protocol_mismatch`: incompatible major protocol version
//! - `invalid_argument`: unknown action or direction
//! - `invalid_command`: malformed JSON, unknown type, non-increasing seq
//! - `backpressure`: command queue full
//!
//! # Environment Variables
//!
//! - `TWENTY48_AI_HOST`: Bind address (default: "127.0.0.1")
//! - `TWENTY48_AI_PORT`: Port number (default: 7788)
//! - `TWENTY48_AI_MAX_PENDING`: Command queue depth (default: 10)
//! - `TWENTY48_AI_DISABLED`: Set to "1" or "true" to disable adapter entirely
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":1234567890,"client":{"name":"bot","version":"0.1"},"protocol_version":"1.0.0"}
//! Server -> Client: {"type":"welcome","seq":1,"ts":1234567890,"protocol_version":"1.0.0","client_id":1,"board_size":4,"win_tile":2048}
//! Server -> Client: {"type":"observation","seq":1,"ts":1234567891,"board":{"size":4,"cells":[[0,2,0,0],...]},"score":0,"status":"playing",...}
//! Client -> Server: {"type":"command","seq":2,"ts":1234567892,"action":"move","direction":"left"}
//! Server -> Client: {"type":"ack","seq":2,"ts":1234567892,"status":"ok","changed":true,"score_delta":0}
//! ```
//!
//! # Testing
//!
//! ```bash
//! nc 127.0.0.1 7788
//! {"type":"hello","seq":1,"client":{"name":"nc"},"protocol_version":"1.0.0"}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use tui_2048_core as core;
pub use tui_2048_types as types;

// Re-export protocol types for convenience
pub use protocol::*;
pub use runtime::{Adapter, Dispatcher, InboundCommand, InboundPayload, OutboundMessage};
pub use server::{run_server, ServerConfig, ServerState};
