//! Clause builders
//!
//! Each builder validates one clause's expression and renders its text
//! without the clause keyword. Builders hold no state between calls, so one
//! registry can be shared across threads.

pub mod analysis;
pub mod group_by;
pub mod having;
pub mod join;
pub mod lowering;
pub mod order_by;
pub mod select;
pub mod where_clause;
pub mod window;

pub use group_by::{GroupByClauseBuilder, GroupKeys};
pub use having::HavingClauseBuilder;
pub use join::{JoinClauseBuilder, JoinInfo};
pub use lowering::{LoweringRules, MemberNaming, SqlExpr};
pub use order_by::OrderByClauseBuilder;
pub use select::SelectClauseBuilder;
pub use where_clause::WhereClauseBuilder;
pub use window::{format_duration, WindowClauseBuilder};

use crate::ksql::ast::Expr;
use crate::ksql::error::KsqlResult;
use crate::ksql::pipeline::context::QueryAssemblyContext;
use std::collections::HashMap;
use std::fmt;

/// Which clause a builder produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KsqlBuilderType {
    Select,
    Where,
    GroupBy,
    Having,
    Join,
    Window,
    Projection,
    OrderBy,
}

impl fmt::Display for KsqlBuilderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Clause builder contract
pub trait KsqlBuilder: Send + Sync {
    fn builder_type(&self) -> KsqlBuilderType;

    /// Render the clause body for `expr` within `ctx`
    fn build_with_context(&self, expr: &Expr, ctx: &QueryAssemblyContext) -> KsqlResult<String>;

    fn build(&self, expr: &Expr) -> KsqlResult<String> {
        self.build_with_context(expr, &QueryAssemblyContext::default())
    }
}

/// Builders keyed by the clause they produce
pub struct BuilderRegistry {
    builders: HashMap<KsqlBuilderType, Box<dyn KsqlBuilder>>,
}

impl BuilderRegistry {
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Registry with every standard clause builder
    pub fn standard() -> Self {
        Self::empty()
            .with(SelectClauseBuilder)
            .with(WhereClauseBuilder)
            .with(GroupByClauseBuilder)
            .with(HavingClauseBuilder)
            .with(OrderByClauseBuilder)
            .with(WindowClauseBuilder)
            .with(JoinClauseBuilder)
    }

    /// Register a builder, replacing any builder of the same type
    pub fn with(mut self, builder: impl KsqlBuilder + 'static) -> Self {
        self.builders.insert(builder.builder_type(), Box::new(builder));
        self
    }

    pub fn without(mut self, builder_type: KsqlBuilderType) -> Self {
        self.builders.remove(&builder_type);
        self
    }

    pub fn get(&self, builder_type: KsqlBuilderType) -> Option<&dyn KsqlBuilder> {
        self.builders.get(&builder_type).map(|b| b.as_ref())
    }

    pub fn contains(&self, builder_type: KsqlBuilderType) -> bool {
        self.builders.contains_key(&builder_type)
    }

    /// Types from `required` that have no registered builder
    pub fn missing(&self, required: &[KsqlBuilderType]) -> Vec<KsqlBuilderType> {
        required
            .iter()
            .copied()
            .filter(|t| !self.contains(*t))
            .collect()
    }
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
