// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Providers backed by remote APIs.
//!
//! The wire protocol of each API lives with the caller. This module only sees
//! two collaborator shapes: a single-call [`RemoteBackend`] and a task queue
//! ([`TaskApi`]) that is driven to completion by [`PollingBackend`].

pub mod polling;
pub mod provider;

pub use polling::{PollPolicy, PollingBackend, TaskApi, TaskState};
pub use provider::{RemoteBackend, RemoteProvider};
