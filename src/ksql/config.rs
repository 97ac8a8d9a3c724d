//! Generator configuration
//!
//! Settings that shape DDL output (serialization formats, decimal defaults,
//! topic provisioning hints). Loadable from YAML:
//!
//! ```yaml
//! value_format: JSON
//! key_format: KAFKA
//! default_decimal:
//!   precision: 18
//!   scale: 2
//! partitions: 3
//! replicas: 1
//! ```

use crate::ksql::error::KsqlResult;
use crate::ksql::model::DecimalPrecision;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Serialization format of message keys or values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SerializationFormat {
    #[default]
    #[serde(alias = "avro")]
    Avro,
    #[serde(alias = "json")]
    Json,
    #[serde(alias = "protobuf")]
    Protobuf,
    #[serde(alias = "delimited")]
    Delimited,
    #[serde(alias = "kafka")]
    Kafka,
}

impl fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SerializationFormat::Avro => "AVRO",
            SerializationFormat::Json => "JSON",
            SerializationFormat::Protobuf => "PROTOBUF",
            SerializationFormat::Delimited => "DELIMITED",
            SerializationFormat::Kafka => "KAFKA",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub value_format: SerializationFormat,
    #[serde(default)]
    pub key_format: Option<SerializationFormat>,
    /// Used for DECIMAL properties that do not declare their own precision
    #[serde(default)]
    pub default_decimal: DecimalPrecision,
    #[serde(default)]
    pub partitions: Option<u32>,
    #[serde(default)]
    pub replicas: Option<u16>,
}

impl GeneratorConfig {
    pub fn from_yaml_str(yaml: &str) -> KsqlResult<Self> {
        let config: GeneratorConfig = serde_yaml::from_str(yaml)?;
        config.default_decimal.validate()?;
        log::debug!("Loaded generator config: {:?}", config);
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> KsqlResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    pub fn with_value_format(mut self, format: SerializationFormat) -> Self {
        self.value_format = format;
        self
    }

    pub fn with_default_decimal(mut self, precision: u8, scale: u8) -> Self {
        self.default_decimal = DecimalPrecision::new(precision, scale);
        self
    }
}
