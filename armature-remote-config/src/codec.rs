//! Client fetch serialization
//!
//! Renders a [`ResolvedConfig`] in the shape client SDKs expect from a
//! fetch: `{"status": 200, "eTag": "etag-…", "config": {"key": "value"}}`.

use crate::error::RemoteConfigResult;
use crate::resolver::ResolvedConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status reported for a successful fetch.
pub const FETCH_STATUS_OK: u16 = 200;

/// Client fetch response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: u16,

    /// Randomly suffixed token; only useful for cache busting
    #[serde(rename = "eTag")]
    pub e_tag: String,

    pub config: BTreeMap<String, String>,
}

impl FetchResponse {
    pub fn to_json(&self) -> RemoteConfigResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> RemoteConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Encodes resolved configs for client SDKs
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterValueCodec;

impl ParameterValueCodec {
    /// Build a fetch response with every value rendered as a string
    pub fn to_fetch_response(config: &ResolvedConfig) -> FetchResponse {
        FetchResponse {
            status: FETCH_STATUS_OK,
            e_tag: Self::generate_etag(),
            config: config
                .iter()
                .map(|(key, value)| (key.to_string(), value.as_string().to_string()))
                .collect(),
        }
    }

    /// Serialize a resolved config straight to fetch-response JSON
    pub fn encode(config: &ResolvedConfig) -> RemoteConfigResult<String> {
        Self::to_fetch_response(config).to_json()
    }

    fn generate_etag() -> String {
        let suffix: [u8; 8] = rand::random();
        format!("etag-{}", hex::encode(suffix))
    }
}
