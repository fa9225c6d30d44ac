//! GraphQL request envelope

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body accepted on the GraphQL endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphqlRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub variables: Option<Value>,
    #[serde(default, rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphqlRequest {
    /// Look up a variable, treating absent variables as null
    pub fn variable(&self, name: &str) -> Value {
        self.variables
            .as_ref()
            .and_then(|vars| vars.get(name))
            .cloned()
            .unwrap_or(Value::Null)
    }
}
