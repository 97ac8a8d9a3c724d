//! ORDER BY clause builder

use crate::ksql::ast::Expr;
use crate::ksql::builders::analysis::expr_any;
use crate::ksql::builders::lowering::{lower_value, LoweringRules};
use crate::ksql::builders::{KsqlBuilder, KsqlBuilderType};
use crate::ksql::error::{KsqlError, KsqlResult};
use crate::ksql::pipeline::context::QueryAssemblyContext;

pub const MAX_ORDER_BY_COLUMNS: usize = 5;

const ALLOWED_FUNCTIONS: &[&str] = &[
    "WindowStart",
    "WindowEnd",
    "RowTime",
    "ToUpper",
    "ToLower",
    "Abs",
    "Year",
    "Month",
    "Day",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Classify an ordering method: (direction, starts a new ordering)
pub fn ordering_method(name: &str) -> Option<(SortDirection, bool)> {
    match name {
        "OrderBy" => Some((SortDirection::Asc, true)),
        "OrderByDescending" => Some((SortDirection::Desc, true)),
        "ThenBy" => Some((SortDirection::Asc, false)),
        "ThenByDescending" => Some((SortDirection::Desc, false)),
        _ => None,
    }
}

struct OrderTerm {
    column: String,
    direction: SortDirection,
}

/// Renders `column DIRECTION` terms from an OrderBy/ThenBy chain
///
/// The chain is walked receiver-first so terms keep their declared order. A
/// later `OrderBy` restarts the ordering. Push queries do not guarantee
/// order, which is reported as an informational notice.
pub struct OrderByClauseBuilder;

impl OrderByClauseBuilder {
    fn is_complex(key: &Expr) -> bool {
        expr_any(key, &|node| match node {
            Expr::Binary { .. } | Expr::Conditional { .. } => true,
            Expr::MethodCall { name, .. } => !ALLOWED_FUNCTIONS.contains(&name.as_str()),
            _ => false,
        })
    }

    fn term(
        key: &Expr,
        direction: SortDirection,
        rules: &LoweringRules,
    ) -> KsqlResult<OrderTerm> {
        if Self::is_complex(key.strip_lambda()) {
            return Err(KsqlError::validation(
                "ORDER BY",
                "ORDER BY in KSQL should use simple column references. Complex expressions in ORDER BY may not be supported.",
            ));
        }
        Ok(OrderTerm {
            column: lower_value(key, rules)?.to_string(),
            direction,
        })
    }

    fn collect(expr: &Expr, rules: &LoweringRules, terms: &mut Vec<OrderTerm>) -> KsqlResult<()> {
        match expr {
            Expr::MethodCall {
                target: None,
                name,
                args,
                ..
            } if ordering_method(name).is_some() && args.len() == 2 => {
                Self::collect(&args[0], rules, terms)?;
                if let Some((direction, restart)) = ordering_method(name) {
                    if restart {
                        terms.clear();
                    } else if terms.is_empty() {
                        return Err(KsqlError::validation(
                            "ORDER BY",
                            format!("{} requires a preceding OrderBy or OrderByDescending", name),
                        ));
                    }
                    terms.push(Self::term(&args[1], direction, rules)?);
                }
                Ok(())
            }
            Expr::Lambda { .. } => {
                terms.push(Self::term(expr, SortDirection::Asc, rules)?);
                Ok(())
            }
            // Receiver of the first ordering call (source or earlier stages)
            _ => Ok(()),
        }
    }
}

impl KsqlBuilder for OrderByClauseBuilder {
    fn builder_type(&self) -> KsqlBuilderType {
        KsqlBuilderType::OrderBy
    }

    fn build_with_context(&self, expr: &Expr, ctx: &QueryAssemblyContext) -> KsqlResult<String> {
        let rules = LoweringRules::order_by().with_context(ctx);
        let mut terms = Vec::new();
        Self::collect(expr, &rules, &mut terms)?;

        if terms.len() > MAX_ORDER_BY_COLUMNS {
            return Err(KsqlError::validation(
                "ORDER BY",
                format!(
                    "ORDER BY supports maximum {} columns for optimal performance. Found {} columns. Consider reducing sort columns.",
                    MAX_ORDER_BY_COLUMNS,
                    terms.len()
                ),
            ));
        }

        log::info!(
            "ORDER BY in KSQL is limited to Pull Queries and specific scenarios. Push Queries (streaming) do not guarantee order due to distributed processing."
        );

        let rendered: Vec<String> = terms
            .iter()
            .map(|t| format!("{} {}", t.column, t.direction.keyword()))
            .collect();
        Ok(rendered.join(", "))
    }
}
