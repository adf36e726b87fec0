//! Process-isolation bridge between the host and the chat worker.
//!
//! The host never performs the network call itself. It dispatches the
//! request text through a [`Launcher`], which spawns the `courier-worker`
//! binary as an isolated child process and reads back a single structured
//! [`Envelope`] from the worker's stdout. Stderr is a free-form diagnostic
//! channel, captured but never parsed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Host process                           │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │                 Launcher                           │  │
//! │  │  - spawns courier-worker with the request as       │  │
//! │  │    its sole argument                               │  │
//! │  │  - enforces the timeout (kills on expiry)          │  │
//! │  │  - decodes one Envelope from stdout                │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │            argv[1] │            ▲ stdout: one JSON line   │
//! │                    │            │ stderr: diagnostics     │
//! └────────────────────┼────────────┼─────────────────────────┘
//!                      ▼            │
//! ┌──────────────────────────────────────────────────────────┐
//! │        courier-worker (short-lived child process)        │
//! │        one chat-completion call, one Envelope, exit 0    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures split cleanly in two: anything the *upstream service* did wrong
//! arrives as a `FAILED` envelope inside an `Ok(Reply)`; anything the
//! *bridge* did wrong (spawn, timeout, corrupted result channel) is a
//! [`BridgeError`].

mod envelope;
mod error;
mod launcher;

pub use envelope::{Envelope, Status};
pub use error::{BridgeError, BridgeResult};
pub use launcher::{resolve_worker_path, Launcher, Reply, DEFAULT_TIMEOUT_SECS, WORKER_BINARY};
