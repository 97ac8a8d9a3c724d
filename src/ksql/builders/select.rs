//! SELECT clause builder

use crate::ksql::ast::{Expr, NewMember};
use crate::ksql::builders::analysis::{contains_aggregate, has_non_aggregate_columns};
use crate::ksql::builders::lowering::{lower_value, LoweringRules, SqlExpr};
use crate::ksql::builders::{KsqlBuilder, KsqlBuilderType};
use crate::ksql::error::{KsqlError, KsqlResult};
use crate::ksql::pipeline::context::QueryAssemblyContext;
use std::collections::HashSet;

/// Renders projection lists
///
/// Anonymous-object projections become `expr AS alias` (or just `expr` when
/// the alias equals the expression), member access becomes a column name and
/// a bare parameter becomes `*`.
pub struct SelectClauseBuilder;

struct Projection {
    sql: SqlExpr,
    alias: Option<String>,
}

impl SelectClauseBuilder {
    fn inferred_alias(member: &NewMember, index: usize) -> String {
        if let Some(name) = &member.name {
            return name.clone();
        }
        match &member.value {
            Expr::Member { name, .. } => name.clone(),
            Expr::Unary { operand, .. } => match operand.as_ref() {
                Expr::Member { name, .. } => name.clone(),
                _ => format!("col{}", index),
            },
            _ => format!("col{}", index),
        }
    }

    fn projections(body: &Expr, rules: &LoweringRules) -> KsqlResult<Vec<Projection>> {
        match body {
            Expr::New { members } => members
                .iter()
                .enumerate()
                .map(|(index, member)| {
                    Ok(Projection {
                        sql: lower_value(&member.value, rules)?,
                        alias: Some(Self::inferred_alias(member, index)),
                    })
                })
                .collect(),
            other => Ok(vec![Projection {
                sql: lower_value(other, rules)?,
                alias: None,
            }]),
        }
    }

    fn render(projections: &[Projection]) -> String {
        let mut used: HashSet<String> = HashSet::new();
        let columns: Vec<String> = projections
            .iter()
            .map(|p| {
                let sql = p.sql.to_string();
                match &p.alias {
                    None => sql,
                    Some(alias) => {
                        let mut unique = alias.clone();
                        let mut suffix = 1;
                        while used.contains(&unique) {
                            unique = format!("{}_{}", alias, suffix);
                            suffix += 1;
                        }
                        used.insert(unique.clone());
                        if sql == unique {
                            sql
                        } else {
                            format!("{} AS {}", sql, unique)
                        }
                    }
                }
            })
            .collect();

        if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(", ")
        }
    }

    fn validate(projections: &[Projection], ctx: &QueryAssemblyContext) -> KsqlResult<()> {
        if ctx.is_grouped() {
            return Ok(());
        }
        let has_aggregate = projections.iter().any(|p| contains_aggregate(&p.sql));
        let has_plain = projections
            .iter()
            .any(|p| has_non_aggregate_columns(&p.sql));
        if has_aggregate && has_plain {
            return Err(KsqlError::validation(
                "SELECT",
                "SELECT clause cannot mix aggregate functions with non-aggregate columns without GROUP BY",
            ));
        }
        Ok(())
    }
}

impl KsqlBuilder for SelectClauseBuilder {
    fn builder_type(&self) -> KsqlBuilderType {
        KsqlBuilderType::Select
    }

    fn build_with_context(&self, expr: &Expr, ctx: &QueryAssemblyContext) -> KsqlResult<String> {
        let rules = LoweringRules::select().with_context(ctx);
        let projections = Self::projections(expr.strip_lambda(), &rules)?;
        Self::validate(&projections, ctx)?;
        Ok(Self::render(&projections))
    }
}
