//! # roundtable-core
//!
//! Foundation types, errors, branded IDs, and utilities for the Roundtable
//! live-discussion client.
//!
//! This crate provides the shared vocabulary the other Roundtable crates
//! depend on:
//!
//! - **Branded IDs**: [`ids::SessionId`], [`ids::ParticipantId`] as newtypes
//! - **Messages**: [`message::Message`], the wire-form [`message::MessageFrame`],
//!   and the dedup key [`message::MessageIdentity`]
//! - **Sessions**: [`session::SessionStatus`] state machine, [`session::Participant`]
//!   metadata, [`session::SessionInfo`] snapshots
//! - **Events**: [`events::PresentationEvent`] for the reveal/highlight boundary
//! - **Errors**: [`errors::CoreError`] taxonomy via `thiserror`
//! - **Retry**: [`retry::RetryConfig`] and backoff calculation
//! - **Constants**: participant bounds and default pacing intervals
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other roundtable crates.

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod events;
pub mod ids;
pub mod logging;
pub mod message;
pub mod retry;
pub mod session;
