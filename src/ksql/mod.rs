// LINQ expression tree to KSQL compiler
// Clause builders, function registry and statement generators

pub mod ast;
pub mod builders;
pub mod config;
pub mod error;
pub mod functions;
pub mod model;
pub mod pipeline;
pub mod scope;
pub mod window;

// Re-export main API
pub use ast::{BinaryOp, Constant, Expr, UnaryOp};
pub use builders::{BuilderRegistry, KsqlBuilder, KsqlBuilderType};
pub use config::{GeneratorConfig, SerializationFormat};
pub use error::{KsqlError, KsqlResult};
pub use functions::FUNCTION_REGISTRY;
pub use model::{DecimalPrecision, EntityModel, HostType, PropertyModel};
pub use pipeline::{DdlGenerator, DmlGenerator, ExecutionMode, QueryAssemblyContext};
pub use scope::ModelCreationScope;
pub use window::{HoppingWindow, SessionWindow, TumblingWindow, WindowDef};

// Version and feature info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FEATURES: &[&str] = &[
    "create_stream_table",  // schema-only DDL from entity models
    "create_as_select",     // CREATE STREAM/TABLE ... AS SELECT
    "push_pull_queries",    // EMIT CHANGES / EMIT FINAL suffixing
    "windowing",            // TUMBLING, HOPPING, SESSION
    "group_by_composite",   // anonymous-object keys, g.Key.Field resolution
    "having_clause",
    "order_by",
    "stream_table_join",
    "limit",
    "aggregate_functions",  // COUNT, SUM, AVG, TOPK, LATEST_BY_OFFSET, ...
    "function_registry",
];
