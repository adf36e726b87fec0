//! # Courier
//!
//! A process-isolated bridge for calling an external chat-completion
//! service from a host that cannot load network client libraries directly.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Host process                         │
//! │               Launcher (bridge module)                  │
//! │     spawn worker · enforce timeout · decode envelope    │
//! └─────────────────────────────────────────────────────────┘
//!                           │
//!            argv[1]        │        stdout: one JSON line
//!            request text   │        stderr: diagnostics
//!                           ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │            courier-worker (child process)               │
//! │              worker module + chat module                │
//! │     one HTTP chat-completion call, one Envelope         │
//! └─────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │             chat-completion service (HTTP)              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The launcher treats the worker as a black box with a one-line contract:
//! request in as the sole argument, exactly one [`bridge::Envelope`] out on
//! stdout, exit code 0 either way. Upstream failures ride inside a
//! `FAILED` envelope; only bridge-layer faults (spawn, timeout, corrupted
//! result channel) become [`bridge::BridgeError`]s.

pub mod bridge;
pub mod chat;
pub mod config;
pub mod worker;

pub use bridge::{BridgeError, BridgeResult, Envelope, Launcher, Reply, Status};
pub use chat::{ChatError, ChatProvider, HttpChatProvider};
pub use config::Settings;
