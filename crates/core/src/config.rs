//! Service runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the REST layer. Request handlers never read process-wide environment variables.

use crate::constants::{DEFAULT_MAX_BODY_BYTES, DEFAULT_REST_ADDR, MAX_BODY_BYTES_CEILING};
use crate::{ScribeError, ScribeResult};
use std::net::SocketAddr;

/// Service configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    rest_addr: SocketAddr,
    max_body_bytes: usize,
}

impl ServiceConfig {
    /// Create a new `ServiceConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ScribeError::InvalidInput` if `max_body_bytes` is zero or above the ceiling.
    pub fn new(rest_addr: SocketAddr, max_body_bytes: usize) -> ScribeResult<Self> {
        if max_body_bytes == 0 {
            return Err(ScribeError::InvalidInput(
                "max_body_bytes must be greater than zero".into(),
            ));
        }
        if max_body_bytes > MAX_BODY_BYTES_CEILING {
            return Err(ScribeError::InvalidInput(format!(
                "max_body_bytes exceeds the ceiling of {} bytes",
                MAX_BODY_BYTES_CEILING
            )));
        }

        Ok(Self {
            rest_addr,
            max_body_bytes,
        })
    }

    /// Resolve the whole configuration from optional raw values (typically environment
    /// variables read once by the binary).
    pub fn from_env_values(
        rest_addr: Option<String>,
        max_body_bytes: Option<String>,
    ) -> ScribeResult<Self> {
        Self::new(
            rest_addr_from_env_value(rest_addr)?,
            max_body_bytes_from_env_value(max_body_bytes)?,
        )
    }

    pub fn rest_addr(&self) -> SocketAddr {
        self.rest_addr
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            rest_addr: DEFAULT_REST_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000))),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the REST bind address from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default address.
pub fn rest_addr_from_env_value(value: Option<String>) -> ScribeResult<SocketAddr> {
    let raw = non_blank(value).unwrap_or_else(|| DEFAULT_REST_ADDR.to_string());
    raw.parse::<SocketAddr>()
        .map_err(|e| ScribeError::InvalidInput(format!("invalid REST address '{}': {}", raw, e)))
}

/// Parse the request body cap from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default cap.
pub fn max_body_bytes_from_env_value(value: Option<String>) -> ScribeResult<usize> {
    let Some(raw) = non_blank(value) else {
        return Ok(DEFAULT_MAX_BODY_BYTES);
    };
    raw.parse::<usize>()
        .map_err(|e| ScribeError::InvalidInput(format!("invalid max body bytes '{}': {}", raw, e)))
}
