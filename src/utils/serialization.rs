// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Serde helpers shared by the report types.
//!
//! Reports are handed to presentation layers (chat UI, HTTP JSON, terminal),
//! so durations go out as fractional milliseconds and image payloads as
//! standard base64.

/// `Duration` <-> fractional milliseconds.
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = f64::deserialize(deserializer)?;
        if !millis.is_finite() || millis < 0.0 {
            return Err(serde::de::Error::custom("duration must be a non-negative number of milliseconds"));
        }
        Ok(Duration::from_secs_f64(millis / 1000.0))
    }
}

/// Optional payload bytes as a base64 string; `None` serializes as null.
pub mod payload_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::Serializer;
    use std::sync::Arc;

    pub fn serialize<S: Serializer>(value: &Option<Arc<[u8]>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }
}
