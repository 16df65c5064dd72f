//! Yahoo-specific payloads
//!
//! The fantasy API wraps everything in arrays of single-key objects, so
//! instead of mirroring that shape in structs the roster and player
//! payloads are walked as `serde_json::Value`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::types::PlayerId;

/// Answer of the OAuth2 token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

/// Error envelope the API returns alongside 4xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub description: String,
}

/// Every `player_id` in the payload, in document order, without repeats
pub fn collect_player_ids(payload: &Value) -> Vec<PlayerId> {
    let mut ids = Vec::new();
    walk(payload, &mut |key, value| {
        if key == "player_id" {
            if let Some(id) = scalar_string(value) {
                let id = PlayerId::new(id);
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
    });
    ids
}

/// First string (or number) value stored under `key`
pub fn find_first_scalar(payload: &Value, key: &str) -> Option<String> {
    let mut found = None;
    walk(payload, &mut |k, value| {
        if found.is_none() && k == key {
            found = scalar_string(value);
        }
    });
    found
}

/// Team display name; player names are objects and are skipped
pub fn team_name(payload: &Value) -> Option<String> {
    find_first_scalar(payload, "name")
}

pub fn faab_balance(payload: &Value) -> Option<u32> {
    find_first_scalar(payload, "faab_balance").and_then(|v| v.parse().ok())
}

/// First player's full name
pub fn player_full_name(payload: &Value) -> Option<String> {
    find_first_scalar(payload, "full")
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn walk(value: &Value, visit: &mut dyn FnMut(&str, &Value)) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                visit(key, child);
                walk(child, visit);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, visit);
            }
        }
        _ => {}
    }
}
