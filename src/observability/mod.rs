// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! All diagnostic output of the engine goes through message types defined in
//! [`messages`]. Each message is a small struct with a `Display` impl for the
//! human-readable line and a [`messages::StructuredLog`] impl that emits the
//! same event with structured `tracing` fields at the right level.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::dispatch` - shotgun round lifecycle and batch deadlines
//! * `messages::provider` - per-provider unit events, worker pool and model sessions
//! * `messages::registry` - provider registration and resolution
//! * `messages::pipeline` - two-stage pipeline and result selection
//!
//! # Usage
//!
//! ```rust
//! use masq::observability::messages::{registry::ProviderNotFound, StructuredLog};
//!
//! let msg = ProviderNotFound { provider_id: "ghost" };
//! msg.log();
//! ```
//!
//! Installing a subscriber is the binary's job; the library only emits events.

pub mod messages;
