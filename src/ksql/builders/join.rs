//! JOIN clause builder

use crate::ksql::ast::{Expr, UnaryOp};
use crate::ksql::builders::lowering::{lower_value, LoweringRules};
use crate::ksql::builders::select::SelectClauseBuilder;
use crate::ksql::builders::{KsqlBuilder, KsqlBuilderType};
use crate::ksql::error::{KsqlError, KsqlResult};
use crate::ksql::pipeline::context::{QueryAssemblyContext, META_PARAMETER_ALIASES};
use serde_json::json;

pub const OUTER_ALIAS: &str = "o";
pub const INNER_ALIAS: &str = "i";

/// Descriptor of one two-way join
#[derive(Debug, Clone, PartialEq)]
pub struct JoinInfo {
    pub outer_type: String,
    pub inner_type: String,
    pub outer_keys: Vec<String>,
    pub inner_keys: Vec<String>,
    /// Rendered SELECT list from the result selector, columns alias-qualified
    pub projection: String,
    pub outer_alias: String,
    pub inner_alias: String,
}

impl JoinInfo {
    pub fn on_condition(&self) -> String {
        let conditions: Vec<String> = self
            .outer_keys
            .iter()
            .zip(&self.inner_keys)
            .map(|(outer, inner)| {
                format!(
                    "{}.{} = {}.{}",
                    self.outer_alias, outer, self.inner_alias, inner
                )
            })
            .collect();
        conditions.join(" AND ")
    }

    /// Clause body: `Inner i ON o.K = i.K`
    pub fn render(&self) -> String {
        format!(
            "{} {} ON {}",
            self.inner_type,
            self.inner_alias,
            self.on_condition()
        )
    }
}

/// Renders `Join(outer, inner, outerKey, innerKey, result)` calls
pub struct JoinClauseBuilder;

impl JoinClauseBuilder {
    fn source_name(expr: &Expr) -> Option<&str> {
        match expr {
            Expr::Source { name } => Some(name.as_str()),
            Expr::MethodCall {
                target: None, args, ..
            } => args.first().and_then(Self::source_name),
            _ => None,
        }
    }

    fn key_columns(selector: &Expr, rules: &LoweringRules) -> KsqlResult<Vec<String>> {
        match selector {
            Expr::Lambda { body, .. } => Self::key_columns(body, rules),
            Expr::Unary {
                op: UnaryOp::Convert | UnaryOp::ConvertChecked,
                operand,
                ..
            } => Self::key_columns(operand, rules),
            Expr::New { members } => members
                .iter()
                .map(|m| Ok(lower_value(&m.value, rules)?.to_string()))
                .collect(),
            other => Ok(vec![lower_value(other, rules)?.to_string()]),
        }
    }

    pub fn analyze(&self, expr: &Expr, ctx: &QueryAssemblyContext) -> KsqlResult<JoinInfo> {
        let args = match expr {
            Expr::MethodCall {
                target: None,
                name,
                args,
                ..
            } if name == "Join" && args.len() == 5 => args,
            other => {
                return Err(KsqlError::unsupported(
                    "JOIN",
                    other.kind(),
                    "JOIN clause expects Join(outer, inner, outerKey, innerKey, resultSelector)",
                ));
            }
        };

        let outer_type = Self::source_name(&args[0])
            .map(str::to_string)
            .unwrap_or_else(|| ctx.base_object.clone());
        let inner_type = match &args[1] {
            Expr::Source { name } => name.clone(),
            other => {
                return Err(KsqlError::unsupported(
                    "JOIN",
                    other.kind(),
                    "The inner side of a JOIN must be a stream or table",
                ));
            }
        };

        let rules = LoweringRules::join();
        let outer_keys = Self::key_columns(&args[2], &rules)?;
        let inner_keys = Self::key_columns(&args[3], &rules)?;
        if outer_keys.len() != inner_keys.len() {
            return Err(KsqlError::validation(
                "JOIN",
                "Composite key expressions must have the same number of properties",
            ));
        }

        let result = &args[4];
        let params = result.lambda_params();
        let mut aliases = serde_json::Map::new();
        if let Some(outer) = params.first() {
            aliases.insert(outer.clone(), json!(OUTER_ALIAS));
        }
        if let Some(inner) = params.get(1) {
            aliases.insert(inner.clone(), json!(INNER_ALIAS));
        }
        let projection_ctx =
            ctx.with_metadata(META_PARAMETER_ALIASES, serde_json::Value::Object(aliases));
        let projection = SelectClauseBuilder.build_with_context(result, &projection_ctx)?;

        Ok(JoinInfo {
            outer_type,
            inner_type,
            outer_keys,
            inner_keys,
            projection,
            outer_alias: OUTER_ALIAS.to_string(),
            inner_alias: INNER_ALIAS.to_string(),
        })
    }
}

impl KsqlBuilder for JoinClauseBuilder {
    fn builder_type(&self) -> KsqlBuilderType {
        KsqlBuilderType::Join
    }

    fn build_with_context(&self, expr: &Expr, ctx: &QueryAssemblyContext) -> KsqlResult<String> {
        Ok(self.analyze(expr, ctx)?.render())
    }
}
