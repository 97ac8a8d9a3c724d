//! HAVING clause builder

use crate::ksql::ast::Expr;
use crate::ksql::builders::lowering::{lower, LoweringRules};
use crate::ksql::builders::{KsqlBuilder, KsqlBuilderType};
use crate::ksql::error::KsqlResult;
use crate::ksql::pipeline::context::QueryAssemblyContext;

/// Renders conditions over a grouped projection
///
/// Aggregate calls drop their grouping receiver (`g.Count()` -> `COUNT(*)`,
/// `g.Sum(x => x.Amount)` -> `SUM(Amount)`); operators follow the WHERE
/// table and parenthesization mirrors the source tree.
pub struct HavingClauseBuilder;

impl KsqlBuilder for HavingClauseBuilder {
    fn builder_type(&self) -> KsqlBuilderType {
        KsqlBuilderType::Having
    }

    fn build_with_context(&self, expr: &Expr, ctx: &QueryAssemblyContext) -> KsqlResult<String> {
        let rules = LoweringRules::having().with_context(ctx);
        Ok(lower(expr, &rules)?.to_string())
    }
}
