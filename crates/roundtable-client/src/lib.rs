//! # roundtable-client
//!
//! The session synchronization and playback layer.
//!
//! - **Session manager**: [`RoundtableClient`] — lifecycle state machine
//!   (`Idle → Joining → Active ↔ Paused → Ended`), join-deadline handling,
//!   supersede/teardown, optimistic pause/resume.
//! - **Delivery reconciler**: merges push and pull channel output into one
//!   deduplicated, sequence-ordered timeline per session.
//! - **Playback scheduler**: paces revelation of that timeline (typing
//!   delay, speed control, pause semantics) independent of arrival time.
//! - **Export**: transcript serialization (JSON / plain text).
//!
//! [`PresentationEvent`]s fan out to the rendering layer over a
//! `tokio::sync::broadcast` channel; subscribe via
//! [`RoundtableClient::subscribe`].
//!
//! Data flow: transport adapters → reconciler → scheduler → presentation
//! boundary. Control flow: the session manager starts and stops everything
//! and is the sole authority on session state.
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: roundtable-core, roundtable-transport.

#![deny(unsafe_code)]

pub mod config;
pub mod export;
pub mod reconciler;
pub mod scheduler;
pub mod session;

// Re-export main public API
pub use config::ClientConfig;
pub use export::{ExportOptions, TranscriptExporter};
pub use roundtable_core::events::PresentationEvent;
pub use session::context::SessionContext;
pub use session::manager::RoundtableClient;
