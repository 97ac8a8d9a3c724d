//! Shared generator logic
//!
//! Both DDL and DML generators classify a LINQ chain, dispatch each operation
//! to its clause builder through [`GeneratorBase::safe_build`], and append the
//! results to a [`QueryStructure`].

use crate::ksql::ast::{BinaryOp, Expr};
use crate::ksql::builders::{
    BuilderRegistry, GroupByClauseBuilder, JoinClauseBuilder, KsqlBuilderType,
};
use crate::ksql::error::{KsqlError, KsqlResult};
use crate::ksql::pipeline::context::{QueryAssemblyContext, META_GROUPED, META_GROUP_KEYS};
use crate::ksql::pipeline::operations::{QueryChain, QueryOperation};
use crate::ksql::pipeline::structure::{QueryClause, QueryClauseType, QueryStructure};
use regex::Regex;
use std::sync::LazyLock;

const EMIT_FINAL_SUFFIX: &str = " EMIT FINAL";

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern"));

static TOPIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,249}$").expect("valid topic pattern"));

/// Reject names that are not plain KSQL identifiers
pub fn validate_identifier(kind: &str, name: &str) -> KsqlResult<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(KsqlError::validation(
            "DDL",
            format!("Invalid {} '{}': expected a letter or underscore followed by letters, digits or underscores", kind, name),
        ))
    }
}

pub fn validate_topic(topic: &str) -> KsqlResult<()> {
    if TOPIC.is_match(topic) {
        Ok(())
    } else {
        Err(KsqlError::validation(
            "DDL",
            format!("Invalid Kafka topic name '{}'", topic),
        ))
    }
}

/// Clause-level state gathered from one chain
#[derive(Default)]
struct ChainStages<'a> {
    wheres: Vec<&'a Expr>,
    select: Option<&'a Expr>,
    group_by: Option<&'a Expr>,
    having: Option<&'a Expr>,
    ordering: Option<&'a Expr>,
    window: Option<&'a Expr>,
    take: Option<u64>,
    join: Option<&'a Expr>,
}

impl<'a> ChainStages<'a> {
    fn from_chain(chain: &QueryChain<'a>) -> KsqlResult<Self> {
        fn single<'e>(slot: &mut Option<&'e Expr>, value: &'e Expr, name: &str) -> KsqlResult<()> {
            if slot.is_some() {
                return Err(KsqlError::validation(
                    "QUERY",
                    format!("Multiple {} calls are not supported", name),
                ));
            }
            *slot = Some(value);
            Ok(())
        }

        let mut stages = ChainStages::default();
        for operation in &chain.operations {
            match *operation {
                QueryOperation::Where(predicate) => stages.wheres.push(predicate),
                QueryOperation::Select(selector) => single(&mut stages.select, selector, "Select")?,
                QueryOperation::GroupBy(key) => single(&mut stages.group_by, key, "GroupBy")?,
                QueryOperation::Having(predicate) => {
                    single(&mut stages.having, predicate, "Having")?
                }
                QueryOperation::OrderBy { call, .. } => stages.ordering = Some(call),
                QueryOperation::Window(window) => single(&mut stages.window, window, "Window")?,
                QueryOperation::Take(count) => stages.take = Some(count),
                QueryOperation::Join(call) => single(&mut stages.join, call, "Join")?,
            }
        }
        Ok(stages)
    }

    /// AND-combine every Where stage into one predicate
    fn predicate(&self) -> Option<Expr> {
        let mut bodies = self.wheres.iter().map(|p| p.strip_lambda().clone());
        let first = bodies.next()?;
        Some(bodies.fold(first, |acc, next| acc.binary(BinaryOp::AndAlso, next)))
    }
}

/// Builder registry plus the assembly steps shared by DDL and DML generation
pub struct GeneratorBase {
    builders: BuilderRegistry,
}

impl GeneratorBase {
    /// Fails when a builder type in `required` is not registered
    pub fn new(builders: BuilderRegistry, required: &[KsqlBuilderType]) -> KsqlResult<Self> {
        let missing = builders.missing(required);
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|t| t.to_string()).collect();
            return Err(KsqlError::config(format!(
                "Required builders are not registered: {}",
                names.join(", ")
            )));
        }
        Ok(Self { builders })
    }

    /// Every standard builder, so no required type can be missing
    pub fn standard() -> Self {
        Self {
            builders: BuilderRegistry::standard(),
        }
    }

    pub fn builders(&self) -> &BuilderRegistry {
        &self.builders
    }

    /// Invoke the builder for `builder_type`, wrapping any failure with the clause name
    pub fn safe_build(
        &self,
        builder_type: KsqlBuilderType,
        expr: &Expr,
        ctx: &QueryAssemblyContext,
    ) -> KsqlResult<String> {
        let builder = self.builders.get(builder_type).ok_or_else(|| {
            KsqlError::config(format!("No builder registered for {}", builder_type))
        })?;
        builder
            .build_with_context(expr, ctx)
            .map_err(|e| KsqlError::builder(builder_type.to_string(), format!("{} clause", builder_type), e))
    }

    /// Append SELECT through LIMIT clauses for `chain`
    ///
    /// Returns whether the window requested `EMIT FINAL`, which then replaces
    /// `EMIT CHANGES` at the end of the statement.
    pub fn assemble(
        &self,
        chain: &QueryChain<'_>,
        structure: &mut QueryStructure,
        ctx: &QueryAssemblyContext,
    ) -> KsqlResult<bool> {
        let stages = ChainStages::from_chain(chain)?;
        let mut ctx = ctx.clone();

        let group_by = match stages.group_by {
            Some(key) => {
                let keys_text = self.safe_build(KsqlBuilderType::GroupBy, key, &ctx)?;
                let keys = GroupByClauseBuilder.group_keys(key, &ctx)?;
                let keys = serde_json::to_value(keys)?;
                ctx = ctx
                    .with_metadata(META_GROUPED, true)
                    .with_metadata(META_GROUP_KEYS, keys);
                Some((keys_text, key))
            }
            None => None,
        };

        let join = match stages.join {
            Some(call) => {
                let text = self.safe_build(KsqlBuilderType::Join, call, &ctx)?;
                let info = JoinClauseBuilder.analyze(call, &ctx)?;
                Some((text, info, call))
            }
            None => None,
        };

        let select = match (stages.select, &join) {
            (Some(selector), _) => {
                QueryClause::required(
                    QueryClauseType::Select,
                    self.safe_build(KsqlBuilderType::Select, selector, &ctx)?,
                )
                .with_source(selector)
            }
            (None, Some((_, info, call))) => {
                QueryClause::required(QueryClauseType::Select, info.projection.clone())
                    .with_source(call)
            }
            (None, None) => QueryClause::required(QueryClauseType::Select, "*"),
        };
        structure.add_clause(select);

        let from = match &join {
            Some((_, info, _)) => format!("{} {}", ctx.base_object, info.outer_alias),
            None => ctx.base_object.clone(),
        };
        structure.add_clause(QueryClause::required(QueryClauseType::From, from));

        if let Some((text, _, call)) = join {
            structure.add_clause(QueryClause::optional(QueryClauseType::Join, text).with_source(call));
        }

        if let Some(predicate) = stages.predicate() {
            let text = self.safe_build(KsqlBuilderType::Where, &predicate, &ctx)?;
            structure.add_clause(QueryClause::optional(QueryClauseType::Where, text).with_source(&predicate));
        }

        let mut emit_final = false;
        if let Some(window) = stages.window {
            let text = self.safe_build(KsqlBuilderType::Window, window, &ctx)?;
            let text = match text.strip_suffix(EMIT_FINAL_SUFFIX) {
                Some(stripped) => {
                    emit_final = true;
                    stripped.to_string()
                }
                None => text,
            };
            structure.add_clause(QueryClause::optional(QueryClauseType::Window, text).with_source(window));
        }

        if let Some((text, key)) = group_by {
            structure.add_clause(QueryClause::optional(QueryClauseType::GroupBy, text).with_source(key));
        }

        if let Some(predicate) = stages.having {
            let text = self.safe_build(KsqlBuilderType::Having, predicate, &ctx)?;
            structure.add_clause(QueryClause::optional(QueryClauseType::Having, text).with_source(predicate));
        }

        if let Some(ordering) = stages.ordering {
            let text = self.safe_build(KsqlBuilderType::OrderBy, ordering, &ctx)?;
            structure.add_clause(QueryClause::optional(QueryClauseType::OrderBy, text).with_source(ordering));
        }

        if let Some(count) = stages.take {
            structure.add_clause(QueryClause::optional(QueryClauseType::Limit, count.to_string()));
        }

        Ok(emit_final)
    }

    /// Append the trailing EMIT clause
    pub fn add_emit(structure: &mut QueryStructure, emit_final: bool) {
        let mode = if emit_final { "FINAL" } else { "CHANGES" };
        structure.add_clause(QueryClause::required(QueryClauseType::EmitChanges, mode));
    }
}
