//! Wire types for the peer RPC surface.

use serde::{Deserialize, Serialize};

/// JSON error body returned for failed peer requests.
///
/// Successful responses carry the raw value bytes instead, so peers never
/// pay for JSON framing on the hot path.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable failure description.
    pub error: String,
}
