//! WHERE clause builder

use crate::ksql::ast::Expr;
use crate::ksql::builders::analysis::contains_aggregate;
use crate::ksql::builders::lowering::{lower, LoweringRules};
use crate::ksql::builders::{KsqlBuilder, KsqlBuilderType};
use crate::ksql::error::{KsqlError, KsqlResult};
use crate::ksql::pipeline::context::QueryAssemblyContext;

/// Renders filter predicates
///
/// Null comparisons become `IS [NOT] NULL`, boolean members become
/// `(Flag = true)` / `(Flag = false)`, and composite-key equality becomes a
/// conjunction of per-position equalities. Inequality is spelled `!=`.
/// Nested query operators (subqueries) are rejected during lowering.
pub struct WhereClauseBuilder;

impl WhereClauseBuilder {
    /// Same output as [`KsqlBuilder::build`]
    pub fn build_condition(&self, expr: &Expr) -> KsqlResult<String> {
        self.build(expr)
    }
}

impl KsqlBuilder for WhereClauseBuilder {
    fn builder_type(&self) -> KsqlBuilderType {
        KsqlBuilderType::Where
    }

    fn build_with_context(&self, expr: &Expr, ctx: &QueryAssemblyContext) -> KsqlResult<String> {
        let rules = LoweringRules::where_clause().with_context(ctx);
        let condition = lower(expr, &rules)?;
        if contains_aggregate(&condition) {
            return Err(KsqlError::validation(
                "WHERE",
                "Aggregate functions are not allowed in WHERE clause. Use HAVING clause instead.",
            ));
        }
        Ok(condition.to_string())
    }
}
