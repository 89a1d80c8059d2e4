//! Deterministic simulation harness for the lockstep file-transfer protocol.
//!
//! Turmoil-based [`Transport`](tftp_core::Transport) implementation, a
//! scripted client that speaks the protocol from the peer side, and seeded
//! file contents, so whole transfers run reproducibly under simulated time.

pub mod client;
pub mod contents;
pub mod sim_server;
pub mod sim_transport;

pub use client::ScriptedClient;
pub use contents::seeded_contents;
pub use sim_server::{SERVER_PORT, host_server};
pub use sim_transport::SimTransport;
