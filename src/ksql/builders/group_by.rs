//! GROUP BY clause builder

use crate::ksql::ast::{Expr, UnaryOp};
use crate::ksql::builders::analysis::{expr_children, expr_contains_aggregate};
use crate::ksql::builders::lowering::{lower_value, LoweringRules};
use crate::ksql::builders::{KsqlBuilder, KsqlBuilderType};
use crate::ksql::error::{KsqlError, KsqlResult};
use crate::ksql::pipeline::context::QueryAssemblyContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAX_GROUP_BY_KEYS: usize = 10;

/// Functions usable as grouping-key transforms
const ALLOWED_FUNCTIONS: &[&str] = &[
    "Year",
    "Month",
    "Day",
    "Hour",
    "Minute",
    "Second",
    "DayOfWeek",
    "DayOfYear",
    "WeekOfYear",
    "Substring",
    "Left",
    "Right",
    "ToUpper",
    "ToLower",
    "Upper",
    "Lower",
    "Floor",
    "Ceiling",
    "Round",
    "ToString",
];

/// Sequence-element accessors, which have no grouping equivalent
const SEQUENCE_METHODS: &[&str] = &[
    "First",
    "FirstOrDefault",
    "Last",
    "LastOrDefault",
    "Single",
    "SingleOrDefault",
    "ElementAt",
    "ElementAtOrDefault",
    "Skip",
    "Take",
];

/// Rendered grouping keys, recorded on the assembly context so later clauses
/// can resolve `g.Key` and `g.Key.Field`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupKeys {
    /// Column for a single, non-composite key
    pub single: Option<String>,
    /// Composite key member name to column
    pub members: BTreeMap<String, String>,
}

struct GroupKey {
    name: Option<String>,
    column: String,
}

/// Renders grouping keys as a comma-separated list
///
/// Composite keys flatten (recursively) into one column per member and
/// conversions are unwrapped. Only a fixed set of functions may transform a
/// key.
pub struct GroupByClauseBuilder;

impl GroupByClauseBuilder {
    fn check_functions(expr: &Expr) -> KsqlResult<()> {
        if let Expr::MethodCall { name, .. } = expr {
            if SEQUENCE_METHODS.contains(&name.as_str()) {
                return Err(KsqlError::unsupported(
                    "GROUP BY",
                    expr.kind(),
                    format!(
                        "Unsupported expression type in GROUP BY clause: {} ('{}')",
                        expr.kind(),
                        name
                    ),
                ));
            }
            if !ALLOWED_FUNCTIONS.contains(&name.as_str()) {
                return Err(KsqlError::validation(
                    "GROUP BY",
                    format!("Function '{}' is not allowed in GROUP BY clause", name),
                ));
            }
        }
        expr_children(expr)
            .into_iter()
            .try_for_each(Self::check_functions)
    }

    fn flatten(
        expr: &Expr,
        name: Option<String>,
        rules: &LoweringRules,
        keys: &mut Vec<GroupKey>,
    ) -> KsqlResult<()> {
        match expr {
            Expr::Lambda { body, .. } => Self::flatten(body, name, rules, keys),
            Expr::Unary {
                op: UnaryOp::Convert | UnaryOp::ConvertChecked,
                operand,
                ..
            } => Self::flatten(operand, name, rules, keys),
            Expr::New { members } => {
                for member in members {
                    let inferred = member.name.clone().or_else(|| match &member.value {
                        Expr::Member { name, .. } => Some(name.clone()),
                        _ => None,
                    });
                    Self::flatten(&member.value, inferred, rules, keys)?;
                }
                Ok(())
            }
            Expr::Parameter { .. } | Expr::Source { .. } => Err(KsqlError::unsupported(
                "GROUP BY",
                expr.kind(),
                format!(
                    "Unsupported expression type in GROUP BY clause: {}",
                    expr.kind()
                ),
            )),
            other => {
                keys.push(GroupKey {
                    name,
                    column: lower_value(other, rules)?.to_string(),
                });
                Ok(())
            }
        }
    }

    fn keys(expr: &Expr, ctx: &QueryAssemblyContext) -> KsqlResult<Vec<GroupKey>> {
        if expr_contains_aggregate(expr) {
            return Err(KsqlError::validation(
                "GROUP BY",
                "Aggregate functions are not allowed in GROUP BY clause",
            ));
        }
        Self::check_functions(expr)?;

        let rules = LoweringRules::group_by().with_context(ctx);
        let mut keys = Vec::new();
        Self::flatten(expr, None, &rules, &mut keys)?;

        if keys.len() > MAX_GROUP_BY_KEYS {
            return Err(KsqlError::validation(
                "GROUP BY",
                format!(
                    "GROUP BY supports maximum {} keys for optimal performance. Found {} keys. Consider using composite keys or data denormalization.",
                    MAX_GROUP_BY_KEYS,
                    keys.len()
                ),
            ));
        }
        Ok(keys)
    }

    /// Key columns for resolving `g.Key` references in later clauses
    pub fn group_keys(&self, expr: &Expr, ctx: &QueryAssemblyContext) -> KsqlResult<GroupKeys> {
        let keys = Self::keys(expr, ctx)?;
        let composite = matches!(unwrap_conversions(expr.strip_lambda()), Expr::New { .. });
        if composite {
            Ok(GroupKeys {
                single: None,
                members: keys
                    .into_iter()
                    .filter_map(|k| k.name.map(|name| (name, k.column)))
                    .collect(),
            })
        } else {
            Ok(GroupKeys {
                single: keys.into_iter().next().map(|k| k.column),
                members: BTreeMap::new(),
            })
        }
    }
}

fn unwrap_conversions(expr: &Expr) -> &Expr {
    match expr {
        Expr::Unary {
            op: UnaryOp::Convert | UnaryOp::ConvertChecked,
            operand,
            ..
        } => unwrap_conversions(operand),
        other => other,
    }
}

impl KsqlBuilder for GroupByClauseBuilder {
    fn builder_type(&self) -> KsqlBuilderType {
        KsqlBuilderType::GroupBy
    }

    fn build_with_context(&self, expr: &Expr, ctx: &QueryAssemblyContext) -> KsqlResult<String> {
        let columns: Vec<String> = Self::keys(expr, ctx)?
            .into_iter()
            .map(|k| k.column)
            .collect();
        Ok(columns.join(", "))
    }
}
