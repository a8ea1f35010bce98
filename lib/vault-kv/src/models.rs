use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Schema-agnostic secret payload
pub type Secret = HashMap<String, Value>;

/// Secret data together with KV v2 version metadata, when the store sent any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretData {
    pub data: Secret,
    #[serde(default)]
    pub metadata: Option<KvVersion>,
}

/// Version information for a KV v2 secret
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvVersion {
    pub version: u64,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub deletion_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub destroyed: bool,
}

/// Extract the secret map from a KV v2 (`data.data`) or KV v1 (`data`) body.
///
/// Anything else, including error-shaped bodies, yields an empty map.
pub fn parse_envelope(body: &Value) -> Secret {
    let data = body.get("data");

    if let Some(Value::Object(v2)) = data.and_then(|d| d.get("data")) {
        return v2.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    }

    match data {
        Some(Value::Object(v1)) => v1.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => Secret::new(),
    }
}

impl KvVersion {
    /// Version metadata of a KV v2 body (`data.metadata`)
    pub fn from_envelope(body: &Value) -> Option<Self> {
        let metadata = body.get("data")?.get("metadata")?;

        let version = metadata.get("version")?.as_u64()?;
        let created_time: DateTime<Utc> = metadata.get("created_time")?.as_str()?.parse().ok()?;
        let deletion_time: Option<DateTime<Utc>> = metadata
            .get("deletion_time")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());
        let destroyed = metadata
            .get("destroyed")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Some(Self {
            version,
            created_time,
            deletion_time,
            destroyed,
        })
    }
}

impl SecretData {
    pub fn from_envelope(body: &Value) -> Self {
        Self {
            data: parse_envelope(body),
            metadata: KvVersion::from_envelope(body),
        }
    }
}
