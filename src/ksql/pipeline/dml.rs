//! DML generation
//!
//! Ad-hoc `SELECT` statements. Push queries end with `EMIT CHANGES` (or
//! `EMIT FINAL` when the window asks for it); pull queries carry no suffix.

use crate::ksql::ast::Expr;
use crate::ksql::builders::{BuilderRegistry, KsqlBuilderType};
use crate::ksql::error::{KsqlError, KsqlResult};
use crate::ksql::pipeline::context::{ExecutionMode, QueryAssemblyContext, META_GROUPED};
use crate::ksql::pipeline::generator::GeneratorBase;
use crate::ksql::pipeline::operations::QueryChain;
use crate::ksql::pipeline::structure::{QueryClause, QueryClauseType, QueryStructure, StatementKind};

/// Builder types a DML generator cannot work without
pub const DML_REQUIRED_BUILDERS: &[KsqlBuilderType] =
    &[KsqlBuilderType::Select, KsqlBuilderType::Where];

fn execution_mode(is_pull_query: bool) -> ExecutionMode {
    if is_pull_query {
        ExecutionMode::PullQuery
    } else {
        ExecutionMode::PushQuery
    }
}

pub struct DmlGenerator {
    base: GeneratorBase,
}

impl DmlGenerator {
    pub fn new() -> Self {
        Self {
            base: GeneratorBase::standard(),
        }
    }

    pub fn with_builders(builders: BuilderRegistry) -> KsqlResult<Self> {
        Ok(Self {
            base: GeneratorBase::new(builders, DML_REQUIRED_BUILDERS)?,
        })
    }

    /// `SELECT * FROM source[ EMIT CHANGES]`
    pub fn generate_select_all(&self, source: &str, is_pull_query: bool) -> KsqlResult<String> {
        self.wrap("SELECT * generation", source, || {
            let mut structure = Self::structure(source);
            if !is_pull_query {
                GeneratorBase::add_emit(&mut structure, false);
            }
            structure.render()
        })
    }

    /// `SELECT * FROM source WHERE <cond>[ EMIT CHANGES]`
    pub fn generate_select_with_condition(
        &self,
        source: &str,
        expr: &Expr,
        is_pull_query: bool,
    ) -> KsqlResult<String> {
        self.wrap("SELECT with condition generation", source, || {
            let ctx = QueryAssemblyContext::new(source, execution_mode(is_pull_query));
            let condition = self.base.safe_build(KsqlBuilderType::Where, expr, &ctx)?;
            let mut structure = Self::structure(source);
            structure.add_clause(
                QueryClause::required(QueryClauseType::Where, condition).with_source(expr),
            );
            if !is_pull_query {
                GeneratorBase::add_emit(&mut structure, false);
            }
            structure.render()
        })
    }

    /// `SELECT COUNT(*) FROM source`
    pub fn generate_count_query(&self, source: &str) -> KsqlResult<String> {
        self.wrap("COUNT query generation", source, || {
            let mut structure = QueryStructure::new(StatementKind::Select, source);
            structure.add_clause(QueryClause::required(QueryClauseType::Select, "COUNT(*)"));
            structure.add_clause(QueryClause::required(QueryClauseType::From, source));
            structure.render()
        })
    }

    /// `SELECT <aggregates> FROM source`
    ///
    /// `expr` is a projection over the whole source, so aggregate columns need
    /// no GROUP BY.
    pub fn generate_aggregate_query(&self, source: &str, expr: &Expr) -> KsqlResult<String> {
        self.wrap("Aggregate query generation", source, || {
            let ctx = QueryAssemblyContext::new(source, ExecutionMode::PullQuery)
                .with_metadata(META_GROUPED, true);
            let columns = self.base.safe_build(KsqlBuilderType::Select, expr, &ctx)?;
            let mut structure = QueryStructure::new(StatementKind::Select, source);
            structure.add_clause(
                QueryClause::required(QueryClauseType::Select, columns).with_source(expr),
            );
            structure.add_clause(QueryClause::required(QueryClauseType::From, source));
            structure.render()
        })
    }

    /// Translate a complete LINQ chain rooted at `source`
    pub fn generate_linq_query(
        &self,
        source: &str,
        expr: &Expr,
        is_pull_query: bool,
    ) -> KsqlResult<String> {
        self.wrap("LINQ query generation", source, || {
            let chain = QueryChain::classify(expr)?;
            let ctx = QueryAssemblyContext::new(source, execution_mode(is_pull_query));
            log::debug!("Assembling query with context {}", ctx.debug_info());

            let mut structure = QueryStructure::new(StatementKind::Select, source);
            let emit_final = self.base.assemble(&chain, &mut structure, &ctx)?;
            if !is_pull_query || emit_final {
                GeneratorBase::add_emit(&mut structure, emit_final);
            }
            structure.render()
        })
    }

    fn structure(source: &str) -> QueryStructure {
        let mut structure = QueryStructure::new(StatementKind::Select, source);
        structure.add_clause(QueryClause::required(QueryClauseType::Select, "*"));
        structure.add_clause(QueryClause::required(QueryClauseType::From, source));
        structure
    }

    fn wrap(
        &self,
        operation: &str,
        source: &str,
        generate: impl FnOnce() -> KsqlResult<String>,
    ) -> KsqlResult<String> {
        match generate() {
            Ok(statement) => {
                log::debug!("Generated DML: {}", statement);
                Ok(statement)
            }
            Err(e) => Err(KsqlError::generation(
                operation,
                format!("Source: {}", source),
                e,
            )),
        }
    }
}

impl Default for DmlGenerator {
    fn default() -> Self {
        Self::new()
    }
}
