use serde::{Deserialize, Serialize};

/// A suggested toddler activity as exposed at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub completion_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewActivity {
    pub category: String,
    pub title: String,
    pub description: String,
}

/// Fields to replace on an existing activity; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Identifier as it may arrive on the wire: text or a bare number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdRepr {
    Number(i64),
    Text(String),
}

impl IdRepr {
    pub fn parse(&self) -> Option<i64> {
        match self {
            IdRepr::Number(value) => Some(*value),
            IdRepr::Text(value) => value.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivityRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<IdRepr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_count: Option<i64>,
    #[serde(flatten)]
    pub patch: ActivityPatch,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub identifier: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvCheckResponse {
    pub environment: String,
    pub allow_production_writes: bool,
    pub writes_allowed: bool,
    pub time: String,
}
