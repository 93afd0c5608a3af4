//! # roundtable-transport
//!
//! Delivery-channel adapters for the Roundtable client.
//!
//! - **Wire frames**: [`wire::ClientFrame`] / [`wire::ServerFrame`] — the
//!   JSON protocol of the push service, and the pull response body.
//! - **Push channel**: [`push::PushChannel`] trait and the
//!   [`push::WsPushChannel`] WebSocket implementation with reconnect.
//! - **Pull channel**: [`pull::PullChannel`] trait and the
//!   [`pull::HttpPullChannel`] polling client.
//! - **Session control**: [`control::SessionControl`] trait and the
//!   [`control::HttpSessionControl`] client for start/pause/resume/inject/leave.
//!
//! The two delivery channels make no ordering guarantee relative to each
//! other; reconciling their outputs is the client crate's job.
//!
//! ## Crate Position
//!
//! Adapter layer. Depends on: roundtable-core.
//! Depended on by: roundtable-client.

#![deny(unsafe_code)]

pub mod control;
pub mod errors;
pub mod pull;
pub mod push;
pub mod wire;

pub use control::{HttpSessionControl, SessionControl};
pub use errors::TransportError;
pub use pull::{HttpPullChannel, PullChannel};
pub use push::{PushChannel, PushEvent, WsPushChannel};
