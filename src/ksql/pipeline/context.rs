//! Query assembly context
//!
//! Threaded through one compilation call. Every `with_*` method returns a new
//! context, so recursive processing of sub-expressions never observes state
//! written by a sibling.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Metadata key: the query has a GROUP BY stage (or is an aggregate query)
pub const META_GROUPED: &str = "grouped";
/// Metadata key: rendered grouping keys, see [`crate::ksql::builders::GroupKeys`]
pub const META_GROUP_KEYS: &str = "group_keys";
/// Metadata key: lambda parameter name to table alias map used by joins
pub const META_PARAMETER_ALIASES: &str = "parameter_aliases";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExecutionMode {
    PullQuery,
    #[default]
    PushQuery,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::PullQuery => write!(f, "PullQuery"),
            ExecutionMode::PushQuery => write!(f, "PushQuery"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QueryAssemblyContext {
    pub base_object: String,
    pub execution_mode: ExecutionMode,
    metadata: BTreeMap<String, Value>,
}

impl QueryAssemblyContext {
    pub fn new(base_object: impl Into<String>, execution_mode: ExecutionMode) -> Self {
        Self {
            base_object: base_object.into(),
            execution_mode,
            metadata: BTreeMap::new(),
        }
    }

    pub fn is_pull_query(&self) -> bool {
        self.execution_mode == ExecutionMode::PullQuery
    }

    pub fn with_metadata(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.metadata.insert(key.into(), value.into());
        next
    }

    pub fn with_execution_mode(&self, execution_mode: ExecutionMode) -> Self {
        Self {
            execution_mode,
            ..self.clone()
        }
    }

    pub fn with_base_object(&self, base_object: impl Into<String>) -> Self {
        Self {
            base_object: base_object.into(),
            ..self.clone()
        }
    }

    /// Typed metadata lookup; `None` when absent or of a different shape
    pub fn metadata<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.metadata
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn has_metadata(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }

    pub fn is_grouped(&self) -> bool {
        self.metadata::<bool>(META_GROUPED).unwrap_or(false)
    }

    pub fn debug_info(&self) -> String {
        let keys: Vec<&str> = self.metadata.keys().map(String::as_str).collect();
        format!(
            "Base: {}, Mode: {}, Metadata: [{}]",
            self.base_object,
            self.execution_mode,
            keys.join(", ")
        )
    }
}
