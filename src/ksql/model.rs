//! Entity metadata consumed by the DDL generator
//!
//! An [`EntityModel`] describes one stream or table: its ordered properties,
//! which of them form the key, and which are ignored. Models are plain data
//! and can be loaded from YAML.

use crate::ksql::error::{KsqlError, KsqlResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host-language type tag carried by properties and expression nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HostType {
    Bool,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    String,
    Char,
    DateTime,
    DateTimeOffset,
    Guid,
    Bytes,
    Enum(String),
    Nullable(Box<HostType>),
    Object(String),
    #[default]
    Unknown,
}

impl HostType {
    pub fn nullable(inner: HostType) -> Self {
        HostType::Nullable(Box::new(inner))
    }

    /// Strip a `Nullable` wrapper
    pub fn underlying(&self) -> &HostType {
        match self {
            HostType::Nullable(inner) => inner.underlying(),
            other => other,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, HostType::Nullable(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.underlying(), HostType::Bool)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self.underlying(),
            HostType::DateTime | HostType::DateTimeOffset
        )
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostType::Bool => write!(f, "bool"),
            HostType::Short => write!(f, "short"),
            HostType::Int => write!(f, "int"),
            HostType::Long => write!(f, "long"),
            HostType::Float => write!(f, "float"),
            HostType::Double => write!(f, "double"),
            HostType::Decimal => write!(f, "decimal"),
            HostType::String => write!(f, "string"),
            HostType::Char => write!(f, "char"),
            HostType::DateTime => write!(f, "DateTime"),
            HostType::DateTimeOffset => write!(f, "DateTimeOffset"),
            HostType::Guid => write!(f, "Guid"),
            HostType::Bytes => write!(f, "byte[]"),
            HostType::Enum(name) | HostType::Object(name) => write!(f, "{}", name),
            HostType::Nullable(inner) => write!(f, "{}?", inner),
            HostType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// DECIMAL precision and scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecimalPrecision {
    pub precision: u8,
    pub scale: u8,
}

impl DecimalPrecision {
    pub const fn new(precision: u8, scale: u8) -> Self {
        Self { precision, scale }
    }

    pub fn validate(&self) -> KsqlResult<()> {
        if self.precision == 0 || self.precision > 38 {
            return Err(KsqlError::validation(
                "DDL",
                format!(
                    "DECIMAL precision must be between 1 and 38, got {}",
                    self.precision
                ),
            ));
        }
        if self.scale > self.precision {
            return Err(KsqlError::validation(
                "DDL",
                format!(
                    "DECIMAL scale {} cannot exceed precision {}",
                    self.scale, self.precision
                ),
            ));
        }
        Ok(())
    }
}

impl Default for DecimalPrecision {
    fn default() -> Self {
        Self::new(38, 9)
    }
}

/// One declared property of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyModel {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: HostType,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub decimal: Option<DecimalPrecision>,
}

impl PropertyModel {
    pub fn new(name: impl Into<String>, ty: HostType) -> Self {
        Self {
            name: name.into(),
            ty,
            ignore: false,
            decimal: None,
        }
    }

    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn with_decimal(mut self, precision: u8, scale: u8) -> Self {
        self.decimal = Some(DecimalPrecision::new(precision, scale));
        self
    }
}

/// Metadata for one stream/table entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityModel {
    pub type_name: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyModel>,
    #[serde(default)]
    pub key_properties: Vec<String>,
}

impl EntityModel {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            topic: None,
            properties: Vec::new(),
            key_properties: Vec::new(),
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_property(mut self, property: PropertyModel) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_key(mut self, name: impl Into<String>) -> Self {
        self.key_properties.push(name.into());
        self
    }

    /// Properties that become columns, in declaration order
    pub fn columns(&self) -> impl Iterator<Item = &PropertyModel> {
        self.properties.iter().filter(|p| !p.ignore)
    }

    /// Key properties that are declared and not ignored
    pub fn keys(&self) -> Vec<&PropertyModel> {
        self.key_properties
            .iter()
            .filter_map(|key| self.columns().find(|p| p.name == *key))
            .collect()
    }

    /// Topic name, falling back to the lower-cased type name
    pub fn topic_name(&self) -> String {
        self.topic
            .clone()
            .unwrap_or_else(|| self.type_name.to_lowercase())
    }

    pub fn from_yaml_str(yaml: &str) -> KsqlResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Map a host type to its KSQL column type
///
/// `decimal` supplies precision and scale for DECIMAL columns.
pub fn map_ksql_type(ty: &HostType, decimal: DecimalPrecision) -> KsqlResult<String> {
    let mapped = match ty.underlying() {
        HostType::Short | HostType::Int => "INTEGER".to_string(),
        HostType::Long => "BIGINT".to_string(),
        HostType::Float | HostType::Double => "DOUBLE".to_string(),
        HostType::Decimal => {
            decimal.validate()?;
            format!("DECIMAL({},{})", decimal.precision, decimal.scale)
        }
        HostType::String | HostType::Char | HostType::Guid => "VARCHAR".to_string(),
        HostType::Bool => "BOOLEAN".to_string(),
        HostType::DateTime | HostType::DateTimeOffset => "TIMESTAMP".to_string(),
        HostType::Bytes => "BYTES".to_string(),
        other => return Err(KsqlError::unsupported_type(other.to_string())),
    };
    Ok(mapped)
}
