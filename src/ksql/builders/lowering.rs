//! Expression lowering
//!
//! Translates host expression trees into a small SQL intermediate
//! representation ([`SqlExpr`]). Every clause builder lowers through here and
//! differs only in the [`LoweringRules`] it supplies: how member paths are
//! named, how inequality is spelled, and whether boolean/null idioms are
//! canonicalized in predicate positions.

use crate::ksql::ast::{BinaryOp, Constant, Expr, UnaryOp};
use crate::ksql::builders::group_by::GroupKeys;
use crate::ksql::builders::window::format_duration;
use crate::ksql::error::{KsqlError, KsqlResult};
use crate::ksql::functions::FUNCTION_REGISTRY;
use crate::ksql::model::HostType;
use crate::ksql::pipeline::context::{
    QueryAssemblyContext, META_GROUP_KEYS, META_PARAMETER_ALIASES,
};
use std::collections::BTreeMap;
use std::fmt;

/// Query operators that indicate a nested query when they appear inside a clause
const QUERY_OPERATORS: &[&str] = &[
    "Select",
    "SelectMany",
    "Where",
    "GroupBy",
    "Join",
    "OrderBy",
    "OrderByDescending",
];

const DATE_PART_MEMBERS: &[&str] = &[
    "Year",
    "Month",
    "Day",
    "Hour",
    "Minute",
    "Second",
    "DayOfWeek",
    "DayOfYear",
];

/// Lowered SQL expression
#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    /// `*`, optionally qualified by a table alias
    Star(Option<String>),
    Column(String),
    Literal(String),
    /// Function call by host method name, rendered through the registry
    Call {
        function: String,
        args: Vec<SqlExpr>,
        instance: bool,
    },
    Binary {
        op: &'static str,
        left: Box<SqlExpr>,
        right: Box<SqlExpr>,
    },
    /// Per-position equality of composite keys
    KeyEquality(Vec<(SqlExpr, SqlExpr)>),
    Not(Box<SqlExpr>),
    Negate(Box<SqlExpr>),
    IsNull {
        operand: Box<SqlExpr>,
        negated: bool,
    },
    Case {
        test: Box<SqlExpr>,
        if_true: Box<SqlExpr>,
        if_false: Box<SqlExpr>,
    },
}

impl SqlExpr {
    fn binary(op: &'static str, left: SqlExpr, right: SqlExpr) -> Self {
        SqlExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn children(&self) -> Vec<&SqlExpr> {
        match self {
            SqlExpr::Star(_) | SqlExpr::Column(_) | SqlExpr::Literal(_) => Vec::new(),
            SqlExpr::Call { args, .. } => args.iter().collect(),
            SqlExpr::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            SqlExpr::KeyEquality(pairs) => pairs.iter().flat_map(|(l, r)| [l, r]).collect(),
            SqlExpr::Not(inner) | SqlExpr::Negate(inner) => vec![inner.as_ref()],
            SqlExpr::IsNull { operand, .. } => vec![operand.as_ref()],
            SqlExpr::Case {
                test,
                if_true,
                if_false,
            } => vec![test.as_ref(), if_true.as_ref(), if_false.as_ref()],
        }
    }
}

impl fmt::Display for SqlExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlExpr::Star(None) => write!(f, "*"),
            SqlExpr::Star(Some(alias)) => write!(f, "{}.*", alias),
            SqlExpr::Column(name) => write!(f, "{}", name),
            SqlExpr::Literal(text) => write!(f, "{}", text),
            SqlExpr::Call {
                function,
                args,
                instance,
            } => {
                let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(
                    f,
                    "{}",
                    FUNCTION_REGISTRY.render_call(function, &rendered, *instance)
                )
            }
            SqlExpr::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
            SqlExpr::KeyEquality(pairs) => {
                let rendered: Vec<String> =
                    pairs.iter().map(|(l, r)| format!("{} = {}", l, r)).collect();
                if rendered.len() == 1 {
                    write!(f, "{}", rendered[0])
                } else {
                    write!(f, "({})", rendered.join(" AND "))
                }
            }
            SqlExpr::Not(inner) => write!(f, "NOT ({})", inner),
            SqlExpr::Negate(inner) => write!(f, "-{}", inner),
            SqlExpr::IsNull { operand, negated } => {
                if *negated {
                    write!(f, "{} IS NOT NULL", operand)
                } else {
                    write!(f, "{} IS NULL", operand)
                }
            }
            SqlExpr::Case {
                test,
                if_true,
                if_false,
            } => write!(f, "CASE WHEN {} THEN {} ELSE {} END", test, if_true, if_false),
        }
    }
}

/// How a member chain rooted at a lambda parameter is named
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberNaming {
    /// Only the accessed member (`e.Address.City` -> `City`)
    Leaf,
    /// Dotted path without the parameter (`e.Address.City` -> `Address.City`)
    Path,
}

/// Clause-specific lowering behavior
#[derive(Debug, Clone)]
pub struct LoweringRules {
    pub clause: &'static str,
    pub naming: MemberNaming,
    pub not_equal: &'static str,
    pub boolean_idioms: bool,
    pub parameter_aliases: BTreeMap<String, String>,
    pub group_keys: Option<GroupKeys>,
}

impl LoweringRules {
    fn base(clause: &'static str, naming: MemberNaming, not_equal: &'static str) -> Self {
        Self {
            clause,
            naming,
            not_equal,
            boolean_idioms: false,
            parameter_aliases: BTreeMap::new(),
            group_keys: None,
        }
    }

    pub fn select() -> Self {
        Self::base("SELECT", MemberNaming::Path, "<>")
    }

    pub fn where_clause() -> Self {
        Self {
            boolean_idioms: true,
            ..Self::base("WHERE", MemberNaming::Leaf, "!=")
        }
    }

    pub fn having() -> Self {
        Self {
            boolean_idioms: true,
            ..Self::base("HAVING", MemberNaming::Leaf, "!=")
        }
    }

    pub fn group_by() -> Self {
        Self::base("GROUP BY", MemberNaming::Leaf, "<>")
    }

    pub fn order_by() -> Self {
        Self::base("ORDER BY", MemberNaming::Leaf, "<>")
    }

    pub fn join() -> Self {
        Self::base("JOIN", MemberNaming::Leaf, "!=")
    }

    /// Pick up parameter aliases and grouping keys recorded on the context
    pub fn with_context(mut self, ctx: &QueryAssemblyContext) -> Self {
        if let Some(aliases) = ctx.metadata::<BTreeMap<String, String>>(META_PARAMETER_ALIASES) {
            self.parameter_aliases = aliases;
        }
        if let Some(keys) = ctx.metadata::<GroupKeys>(META_GROUP_KEYS) {
            self.group_keys = Some(keys);
        }
        self
    }

    pub fn with_alias(mut self, parameter: impl Into<String>, alias: impl Into<String>) -> Self {
        self.parameter_aliases.insert(parameter.into(), alias.into());
        self
    }
}

/// Lower `expr` under `rules`
///
/// Lambdas are unwrapped. With boolean idioms enabled the root is treated as
/// a predicate position.
pub fn lower(expr: &Expr, rules: &LoweringRules) -> KsqlResult<SqlExpr> {
    Lowerer { rules }.predicate(expr)
}

/// Lower `expr` as a value, never applying predicate idioms at the root
pub fn lower_value(expr: &Expr, rules: &LoweringRules) -> KsqlResult<SqlExpr> {
    Lowerer { rules }.value(expr)
}

/// Render a literal constant
pub fn render_constant(constant: &Constant, clause: &str) -> KsqlResult<String> {
    let text = match constant {
        Constant::Null => "NULL".to_string(),
        Constant::Bool(b) => b.to_string(),
        Constant::Int(i) => i.to_string(),
        Constant::Float(x) => x.to_string(),
        Constant::Decimal(d) => d.to_string(),
        Constant::String(s) => format!("'{}'", s.replace('\'', "''")),
        Constant::Duration(d) => format_duration(*d),
        Constant::Window(_) => {
            return Err(KsqlError::unsupported(
                clause,
                "Window",
                format!("Window definitions are not supported in {} clause", clause),
            ));
        }
    };
    Ok(text)
}

/// Whether `expr` is a boolean member access (`e.Flag`, `e.NullableFlag.Value`)
pub fn is_bool_member(expr: &Expr) -> bool {
    match expr {
        Expr::Member {
            target: Some(target),
            name,
            ty,
        } => {
            if name == "HasValue" {
                false
            } else if name == "Value" && target.host_type().is_nullable() {
                target.host_type().is_bool()
            } else {
                ty.is_bool()
            }
        }
        _ => false,
    }
}

pub fn is_query_operator(name: &str) -> bool {
    QUERY_OPERATORS.contains(&name)
}

struct Lowerer<'r> {
    rules: &'r LoweringRules,
}

impl Lowerer<'_> {
    fn clause(&self) -> &'static str {
        self.rules.clause
    }

    /// Predicate position: root of a condition or an operand of AND/OR/NOT
    fn predicate(&self, expr: &Expr) -> KsqlResult<SqlExpr> {
        if !self.rules.boolean_idioms {
            return self.value(expr);
        }
        match expr {
            Expr::Lambda { body, .. } => self.predicate(body),
            Expr::Binary { op, left, right } if op.is_logical() => Ok(SqlExpr::binary(
                logical_keyword(*op),
                self.predicate(left)?,
                self.predicate(right)?,
            )),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
                ..
            } => {
                if is_bool_member(operand) {
                    Ok(SqlExpr::binary(
                        "=",
                        self.value(operand)?,
                        SqlExpr::Literal("false".to_string()),
                    ))
                } else {
                    Ok(SqlExpr::Not(Box::new(self.predicate(operand)?)))
                }
            }
            e if is_bool_member(e) => Ok(SqlExpr::binary(
                "=",
                self.value(e)?,
                SqlExpr::Literal("true".to_string()),
            )),
            other => self.value(other),
        }
    }

    fn value(&self, expr: &Expr) -> KsqlResult<SqlExpr> {
        match expr {
            Expr::Lambda { body, .. } => self.value(body),
            Expr::Parameter { name, .. } => {
                Ok(SqlExpr::Star(self.rules.parameter_aliases.get(name).cloned()))
            }
            Expr::Member { target, name, .. } => self.member(target.as_deref(), name),
            Expr::MethodCall {
                target, name, args, ..
            } => self.method_call(target.as_deref(), name, args),
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::Not => Ok(SqlExpr::Not(Box::new(self.predicate(operand)?))),
                UnaryOp::Negate => Ok(SqlExpr::Negate(Box::new(self.value(operand)?))),
                UnaryOp::Convert | UnaryOp::ConvertChecked | UnaryOp::TypeAs => {
                    self.value(operand)
                }
                UnaryOp::ArrayLength => Ok(SqlExpr::Call {
                    function: "ArrayLength".to_string(),
                    args: vec![self.value(operand)?],
                    instance: false,
                }),
            },
            Expr::Constant(constant) => {
                Ok(SqlExpr::Literal(render_constant(constant, self.clause())?))
            }
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => Ok(SqlExpr::Case {
                test: Box::new(self.predicate(test)?),
                if_true: Box::new(self.value(if_true)?),
                if_false: Box::new(self.value(if_false)?),
            }),
            Expr::New { .. } | Expr::Source { .. } => Err(self.unsupported_node(expr)),
        }
    }

    fn unsupported_node(&self, expr: &Expr) -> KsqlError {
        KsqlError::unsupported(
            self.clause(),
            expr.kind(),
            format!(
                "Expression type '{}' is not supported in {} clause",
                expr.kind(),
                self.clause()
            ),
        )
    }

    fn qualify(&self, parameter: &str, column: String) -> String {
        match self.rules.parameter_aliases.get(parameter) {
            Some(alias) => format!("{}.{}", alias, column),
            None => column,
        }
    }

    fn member(&self, target: Option<&Expr>, name: &str) -> KsqlResult<SqlExpr> {
        let Some(target) = target else {
            return Ok(SqlExpr::Column(name.to_string()));
        };

        if name == "HasValue" {
            return Ok(SqlExpr::IsNull {
                operand: Box::new(self.value(target)?),
                negated: true,
            });
        }
        if name == "Value" && target.host_type().is_nullable() {
            return self.value(target);
        }
        if DATE_PART_MEMBERS.contains(&name) && target.host_type().is_temporal() {
            return Ok(SqlExpr::Call {
                function: name.to_string(),
                args: vec![self.value(target)?],
                instance: false,
            });
        }
        if name == "Length" && matches!(target.host_type(), HostType::String) {
            return Ok(SqlExpr::Call {
                function: "Length".to_string(),
                args: vec![self.value(target)?],
                instance: false,
            });
        }

        if let Some(column) = self.group_key_member(target, name) {
            return Ok(SqlExpr::Column(column));
        }

        let mut path = vec![name.to_string()];
        let mut current = target;
        loop {
            match current {
                Expr::Parameter { name: parameter, .. } => {
                    let column = match self.rules.naming {
                        MemberNaming::Leaf => name.to_string(),
                        MemberNaming::Path => {
                            path.reverse();
                            path.join(".")
                        }
                    };
                    return Ok(SqlExpr::Column(self.qualify(parameter, column)));
                }
                Expr::Member {
                    target: Some(inner),
                    name: segment,
                    ..
                } => {
                    path.push(segment.clone());
                    current = inner.as_ref();
                }
                Expr::Unary {
                    op: UnaryOp::Convert | UnaryOp::ConvertChecked | UnaryOp::TypeAs,
                    operand,
                    ..
                } => current = operand.as_ref(),
                other => {
                    return Err(KsqlError::unsupported(
                        self.clause(),
                        "MemberAccess",
                        format!(
                            "Member '{}' on a {} expression is not supported in {} clause",
                            name,
                            other.kind(),
                            self.clause()
                        ),
                    ));
                }
            }
        }
    }

    /// `g.Key` and `g.Key.Field` on a grouping parameter
    fn group_key_member(&self, target: &Expr, name: &str) -> Option<String> {
        let keys = self.rules.group_keys.as_ref()?;
        match target {
            Expr::Parameter { .. } if name == "Key" => {
                Some(keys.single.clone().unwrap_or_else(|| "Key".to_string()))
            }
            Expr::Member {
                target: Some(root),
                name: key,
                ..
            } if key == "Key" && matches!(root.as_ref(), Expr::Parameter { .. }) => {
                keys.members.get(name).cloned()
            }
            _ => None,
        }
    }

    fn method_call(&self, target: Option<&Expr>, name: &str, args: &[Expr]) -> KsqlResult<SqlExpr> {
        if is_query_operator(name) && args.iter().any(|a| matches!(a, Expr::Lambda { .. })) {
            return Err(KsqlError::validation(
                self.clause(),
                format!("Subqueries are not supported in {} clause in KSQL", self.clause()),
            ));
        }

        let aggregate = FUNCTION_REGISTRY.is_aggregate_function(name);
        let mut operands: Vec<&Expr> = Vec::with_capacity(args.len() + 1);
        if let Some(t) = target {
            if !aggregate {
                operands.push(t);
            }
        }
        // `g.Sum(x => x.Col)` arrives as `Sum(g, x => x.Col)`; drop the receiver only
        let skip_receiver = aggregate
            && target.is_none()
            && match args.split_first() {
                Some((Expr::Lambda { .. }, _)) | None => false,
                Some((Expr::Parameter { .. }, _)) => true,
                Some((_, rest)) => rest.iter().any(|a| matches!(a, Expr::Lambda { .. })),
            };
        operands.extend(args.iter().skip(usize::from(skip_receiver)));

        let lowered = operands
            .into_iter()
            .map(|operand| self.value(operand))
            .collect::<KsqlResult<Vec<_>>>()?;

        Ok(SqlExpr::Call {
            function: name.to_string(),
            args: lowered,
            instance: target.is_some(),
        })
    }

    fn binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> KsqlResult<SqlExpr> {
        if op.is_equality() {
            if right.is_null_constant() || left.is_null_constant() {
                let operand = if right.is_null_constant() { left } else { right };
                return Ok(SqlExpr::IsNull {
                    operand: Box::new(self.value(operand)?),
                    negated: op == BinaryOp::NotEqual,
                });
            }
            if let (Expr::New { members: lhs }, Expr::New { members: rhs }) = (left, right) {
                if lhs.len() != rhs.len() {
                    return Err(KsqlError::validation(
                        self.clause(),
                        "Composite key expressions must have the same number of properties",
                    ));
                }
                let pairs = lhs
                    .iter()
                    .zip(rhs)
                    .map(|(l, r)| Ok((self.value(&l.value)?, self.value(&r.value)?)))
                    .collect::<KsqlResult<Vec<_>>>()?;
                let equality = SqlExpr::KeyEquality(pairs);
                return Ok(if op == BinaryOp::NotEqual {
                    SqlExpr::Not(Box::new(equality))
                } else {
                    equality
                });
            }
        }

        if op.is_logical() {
            return Ok(SqlExpr::binary(
                logical_keyword(op),
                self.predicate(left)?,
                self.predicate(right)?,
            ));
        }

        if op == BinaryOp::Coalesce {
            return Ok(SqlExpr::Call {
                function: "Coalesce".to_string(),
                args: vec![self.value(left)?, self.value(right)?],
                instance: false,
            });
        }

        let symbol = match op {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => self.rules.not_equal,
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            unsupported => {
                return Err(KsqlError::unsupported(
                    self.clause(),
                    unsupported.to_string(),
                    format!(
                        "Operator {} is not supported in {} clause",
                        unsupported,
                        self.clause()
                    ),
                ));
            }
        };
        Ok(SqlExpr::binary(symbol, self.value(left)?, self.value(right)?))
    }
}

fn logical_keyword(op: BinaryOp) -> &'static str {
    if op == BinaryOp::AndAlso { "AND" } else { "OR" }
}
