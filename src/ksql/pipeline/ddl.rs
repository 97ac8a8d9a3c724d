//! DDL generation
//!
//! Schema-only `CREATE STREAM` / `CREATE TABLE` statements come from an
//! [`EntityModel`]; query-backed `CREATE STREAM ... AS` / `CREATE TABLE ... AS`
//! statements come from a LINQ chain and are only legal inside a model
//! creation scope.

use crate::ksql::ast::Expr;
use crate::ksql::builders::{BuilderRegistry, KsqlBuilderType};
use crate::ksql::config::GeneratorConfig;
use crate::ksql::error::{KsqlError, KsqlResult};
use crate::ksql::model::{map_ksql_type, EntityModel};
use crate::ksql::pipeline::context::{ExecutionMode, QueryAssemblyContext};
use crate::ksql::pipeline::generator::{validate_identifier, validate_topic, GeneratorBase};
use crate::ksql::pipeline::operations::QueryChain;
use crate::ksql::pipeline::structure::{QueryStructure, StatementKind};
use crate::ksql::scope::ModelCreationScope;

/// Builder types a DDL generator cannot work without
pub const DDL_REQUIRED_BUILDERS: &[KsqlBuilderType] = &[
    KsqlBuilderType::Select,
    KsqlBuilderType::Where,
    KsqlBuilderType::GroupBy,
    KsqlBuilderType::Window,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectKind {
    Stream,
    Table,
}

impl ObjectKind {
    fn keyword(&self) -> &'static str {
        match self {
            ObjectKind::Stream => "STREAM",
            ObjectKind::Table => "TABLE",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ObjectKind::Stream => "Stream",
            ObjectKind::Table => "Table",
        }
    }
}

pub struct DdlGenerator {
    base: GeneratorBase,
    config: GeneratorConfig,
}

impl DdlGenerator {
    /// Generator with the standard builder set
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            base: GeneratorBase::standard(),
            config,
        }
    }

    pub fn with_builders(config: GeneratorConfig, builders: BuilderRegistry) -> KsqlResult<Self> {
        Ok(Self {
            base: GeneratorBase::new(builders, DDL_REQUIRED_BUILDERS)?,
            config,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// `CREATE STREAM name (COL TYPE, ...) WITH (KAFKA_TOPIC='topic', VALUE_FORMAT='AVRO')`
    pub fn generate_create_stream(
        &self,
        name: &str,
        topic: &str,
        model: &EntityModel,
    ) -> KsqlResult<String> {
        self.create_object(ObjectKind::Stream, name, topic, model)
            .map_err(|e| {
                KsqlError::generation(
                    "CREATE STREAM generation",
                    format!("Stream: {}, Topic: {}", name, topic),
                    e,
                )
            })
    }

    /// As [`Self::generate_create_stream`] plus `KEY='K1, K2'` when the model declares keys
    pub fn generate_create_table(
        &self,
        name: &str,
        topic: &str,
        model: &EntityModel,
    ) -> KsqlResult<String> {
        self.create_object(ObjectKind::Table, name, topic, model)
            .map_err(|e| {
                KsqlError::generation(
                    "CREATE TABLE generation",
                    format!("Table: {}, Topic: {}", name, topic),
                    e,
                )
            })
    }

    /// `CREATE STREAM name AS SELECT ... EMIT CHANGES`
    pub fn generate_create_stream_as(
        &self,
        name: &str,
        base_object: &str,
        expr: &Expr,
    ) -> KsqlResult<String> {
        ModelCreationScope::ensure_active("CREATE STREAM AS")?;
        let kind = StatementKind::CreateStreamAs {
            name: name.to_string(),
        };
        self.create_object_as(kind, name, base_object, expr)
            .map_err(|e| {
                KsqlError::generation(
                    "CREATE STREAM AS generation",
                    format!("Stream: {}, Base: {}", name, base_object),
                    e,
                )
            })
    }

    /// `CREATE TABLE name AS SELECT ... EMIT CHANGES`
    pub fn generate_create_table_as(
        &self,
        name: &str,
        base_object: &str,
        expr: &Expr,
    ) -> KsqlResult<String> {
        ModelCreationScope::ensure_active("CREATE TABLE AS")?;
        let kind = StatementKind::CreateTableAs {
            name: name.to_string(),
        };
        self.create_object_as(kind, name, base_object, expr)
            .map_err(|e| {
                KsqlError::generation(
                    "CREATE TABLE AS generation",
                    format!("Table: {}, Base: {}", name, base_object),
                    e,
                )
            })
    }

    fn create_object(
        &self,
        kind: ObjectKind,
        name: &str,
        topic: &str,
        model: &EntityModel,
    ) -> KsqlResult<String> {
        validate_identifier(&format!("{} name", kind.label().to_lowercase()), name)?;
        validate_topic(topic)?;

        let columns = model
            .columns()
            .map(|property| {
                let decimal = property.decimal.unwrap_or(self.config.default_decimal);
                let ksql_type = map_ksql_type(&property.ty, decimal)?;
                Ok(format!("{} {}", property.name.to_uppercase(), ksql_type))
            })
            .collect::<KsqlResult<Vec<String>>>()?;
        if columns.is_empty() {
            return Err(KsqlError::validation(
                "DDL",
                format!("Entity '{}' has no columns", model.type_name),
            ));
        }

        let mut options = vec![
            format!("KAFKA_TOPIC='{}'", topic),
            format!("VALUE_FORMAT='{}'", self.config.value_format),
        ];
        if kind == ObjectKind::Table {
            let keys: Vec<String> = model
                .keys()
                .iter()
                .map(|p| p.name.to_uppercase())
                .collect();
            if !keys.is_empty() {
                options.push(format!("KEY='{}'", keys.join(", ")));
            }
        }
        if let Some(key_format) = self.config.key_format {
            options.push(format!("KEY_FORMAT='{}'", key_format));
        }
        if let Some(partitions) = self.config.partitions {
            options.push(format!("PARTITIONS={}", partitions));
        }
        if let Some(replicas) = self.config.replicas {
            options.push(format!("REPLICAS={}", replicas));
        }

        let statement = format!(
            "CREATE {} {} ({}) WITH ({})",
            kind.keyword(),
            name,
            columns.join(", "),
            options.join(", ")
        );
        log::debug!("Generated DDL: {}", statement);
        Ok(statement)
    }

    fn create_object_as(
        &self,
        kind: StatementKind,
        name: &str,
        base_object: &str,
        expr: &Expr,
    ) -> KsqlResult<String> {
        validate_identifier("object name", name)?;
        let chain = QueryChain::classify(expr)?;
        let base = match chain.source {
            Some(source) if base_object.is_empty() => source,
            _ => base_object,
        };
        let ctx = QueryAssemblyContext::new(base, ExecutionMode::PushQuery);

        let mut structure = QueryStructure::new(kind, base);
        let emit_final = self.base.assemble(&chain, &mut structure, &ctx)?;
        GeneratorBase::add_emit(&mut structure, emit_final);

        let statement = structure.render()?;
        log::debug!("Generated DDL: {}", statement);
        Ok(statement)
    }
}

impl Default for DdlGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}
