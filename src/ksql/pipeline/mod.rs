// Query assembly pipeline: context, clause structure, chain classification
// and the DDL/DML statement generators built on top of them

pub mod context;
pub mod ddl;
pub mod dml;
pub mod generator;
pub mod operations;
pub mod structure;

pub use context::{ExecutionMode, QueryAssemblyContext};
pub use ddl::DdlGenerator;
pub use dml::DmlGenerator;
pub use generator::GeneratorBase;
pub use operations::{QueryChain, QueryOperation};
pub use structure::{QueryClause, QueryClauseType, QueryMetadata, QueryStructure, StatementKind};
