// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod serialization;

use tokio::task::JoinError;

/// Human-readable reason for a task that did not join cleanly.
pub fn join_error_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "task was aborted".to_string();
    }
    match err.try_into_panic() {
        Ok(payload) => {
            if let Some(message) = payload.downcast_ref::<&str>() {
                (*message).to_string()
            } else if let Some(message) = payload.downcast_ref::<String>() {
                message.clone()
            } else {
                "panic with a non-string payload".to_string()
            }
        }
        Err(err) => err.to_string(),
    }
}
