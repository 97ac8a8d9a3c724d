/*!
# Host Expression Tree

This module defines the typed expression tree that the KSQL compiler consumes.
Trees mirror the shape of a quoted host-language lambda: member access, method
calls, operators, constants, conditionals, anonymous-object projections and
lambdas, plus a `Source` node naming the stream or table a LINQ chain starts
from.

## Key Features

- **Immutable**: builders and generators only borrow trees
- **Typed**: member, parameter, call and unary nodes carry a [`HostType`] so
  boolean and nullable idioms can be rendered correctly
- **Fluent construction**: query chains can be written the way they read in
  the host language

## Example

```rust
use ksql_linq::ksql::ast::Expr;
use ksql_linq::ksql::model::HostType;

// orders.Where(o => o.Amount > 100).Select(o => new { o.Id, o.Amount })
let o = Expr::param("o");
let query = Expr::source("orders")
    .filter(Expr::lambda(&["o"], o.member("Amount").gt(Expr::int(100))))
    .select(Expr::lambda(
        &["o"],
        Expr::anonymous(vec![o.member("Id"), o.typed_member("Amount", HostType::Decimal)]),
    ));
```
*/

use crate::ksql::model::HostType;
use crate::ksql::window::WindowDef;
use chrono::Duration;
use rust_decimal::Decimal;
use std::fmt;

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Duration(Duration),
    Window(WindowDef),
}

/// Binary operator kinds
///
/// Includes operators the translator rejects so that callers get a precise
/// unsupported-operator error instead of a construction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    AndAlso,
    OrElse,
    Coalesce,
    And,
    Or,
    ExclusiveOr,
    LeftShift,
    RightShift,
    Power,
    ArrayIndex,
}

impl BinaryOp {
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::AndAlso | BinaryOp::OrElse)
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Equal | BinaryOp::NotEqual)
    }

    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
            BinaryOp::Coalesce => "??",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::ExclusiveOr => "^",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::Power => "**",
            BinaryOp::ArrayIndex => "[]",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Unary operator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Negate,
    Convert,
    ConvertChecked,
    TypeAs,
    ArrayLength,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One member of an anonymous-object projection
///
/// `name` is `None` when the host inferred the member name from its value.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    pub name: Option<String>,
    pub value: Expr,
}

/// Host expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Parameter {
        name: String,
        ty: HostType,
    },
    Member {
        target: Option<Box<Expr>>,
        name: String,
        ty: HostType,
    },
    /// Instance calls carry a `target`; static and extension calls pass their
    /// receiver as the first argument.
    MethodCall {
        target: Option<Box<Expr>>,
        name: String,
        args: Vec<Expr>,
        ty: HostType,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        ty: HostType,
    },
    Constant(Constant),
    Conditional {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    New {
        members: Vec<NewMember>,
    },
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
    },
    Source {
        name: String,
    },
}

impl Expr {
    // Leaves

    pub fn param(name: impl Into<String>) -> Self {
        Expr::Parameter {
            name: name.into(),
            ty: HostType::Unknown,
        }
    }

    pub fn typed_param(name: impl Into<String>, ty: HostType) -> Self {
        Expr::Parameter {
            name: name.into(),
            ty,
        }
    }

    pub fn source(name: impl Into<String>) -> Self {
        Expr::Source { name: name.into() }
    }

    pub fn null() -> Self {
        Expr::Constant(Constant::Null)
    }

    pub fn bool(value: bool) -> Self {
        Expr::Constant(Constant::Bool(value))
    }

    pub fn int(value: i64) -> Self {
        Expr::Constant(Constant::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Expr::Constant(Constant::Float(value))
    }

    pub fn decimal(value: Decimal) -> Self {
        Expr::Constant(Constant::Decimal(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Constant(Constant::String(value.into()))
    }

    pub fn duration(value: Duration) -> Self {
        Expr::Constant(Constant::Duration(value))
    }

    pub fn window_def(def: WindowDef) -> Self {
        Expr::Constant(Constant::Window(def))
    }

    // Composite nodes

    pub fn member(&self, name: impl Into<String>) -> Self {
        self.typed_member(name, HostType::Unknown)
    }

    pub fn typed_member(&self, name: impl Into<String>, ty: HostType) -> Self {
        Expr::Member {
            target: Some(Box::new(self.clone())),
            name: name.into(),
            ty,
        }
    }

    /// Instance method call on `self`
    pub fn call(&self, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::MethodCall {
            target: Some(Box::new(self.clone())),
            name: name.into(),
            args,
            ty: HostType::Unknown,
        }
    }

    /// Extension method call with `self` as the receiver argument
    pub fn ext(&self, name: impl Into<String>, args: Vec<Expr>) -> Self {
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(self.clone());
        all.extend(args);
        Expr::static_call(name, all)
    }

    pub fn static_call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::MethodCall {
            target: None,
            name: name.into(),
            args,
            ty: HostType::Unknown,
        }
    }

    pub fn lambda(params: &[&str], body: Expr) -> Self {
        Expr::Lambda {
            params: params.iter().map(|p| p.to_string()).collect(),
            body: Box::new(body),
        }
    }

    /// Anonymous object with explicitly named members
    pub fn new_object(members: Vec<(&str, Expr)>) -> Self {
        Expr::New {
            members: members
                .into_iter()
                .map(|(name, value)| NewMember {
                    name: Some(name.to_string()),
                    value,
                })
                .collect(),
        }
    }

    /// Anonymous object whose member names are inferred from the values
    pub fn anonymous(values: Vec<Expr>) -> Self {
        Expr::New {
            members: values
                .into_iter()
                .map(|value| NewMember { name: None, value })
                .collect(),
        }
    }

    pub fn conditional(test: Expr, if_true: Expr, if_false: Expr) -> Self {
        Expr::Conditional {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    pub fn binary(self, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    pub fn equal(self, right: Expr) -> Self {
        self.binary(BinaryOp::Equal, right)
    }

    pub fn not_equal(self, right: Expr) -> Self {
        self.binary(BinaryOp::NotEqual, right)
    }

    pub fn gt(self, right: Expr) -> Self {
        self.binary(BinaryOp::GreaterThan, right)
    }

    pub fn ge(self, right: Expr) -> Self {
        self.binary(BinaryOp::GreaterThanOrEqual, right)
    }

    pub fn lt(self, right: Expr) -> Self {
        self.binary(BinaryOp::LessThan, right)
    }

    pub fn le(self, right: Expr) -> Self {
        self.binary(BinaryOp::LessThanOrEqual, right)
    }

    pub fn and(self, right: Expr) -> Self {
        self.binary(BinaryOp::AndAlso, right)
    }

    pub fn or(self, right: Expr) -> Self {
        self.binary(BinaryOp::OrElse, right)
    }

    pub fn coalesce(self, right: Expr) -> Self {
        self.binary(BinaryOp::Coalesce, right)
    }

    pub fn unary(self, op: UnaryOp, ty: HostType) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(self),
            ty,
        }
    }

    pub fn convert(self, ty: HostType) -> Self {
        self.unary(UnaryOp::Convert, ty)
    }

    // LINQ query operators

    pub fn filter(&self, predicate: Expr) -> Self {
        self.ext("Where", vec![predicate])
    }

    pub fn select(&self, selector: Expr) -> Self {
        self.ext("Select", vec![selector])
    }

    pub fn group_by(&self, key_selector: Expr) -> Self {
        self.ext("GroupBy", vec![key_selector])
    }

    pub fn having(&self, predicate: Expr) -> Self {
        self.ext("Having", vec![predicate])
    }

    pub fn order_by(&self, key_selector: Expr) -> Self {
        self.ext("OrderBy", vec![key_selector])
    }

    pub fn order_by_descending(&self, key_selector: Expr) -> Self {
        self.ext("OrderByDescending", vec![key_selector])
    }

    pub fn then_by(&self, key_selector: Expr) -> Self {
        self.ext("ThenBy", vec![key_selector])
    }

    pub fn then_by_descending(&self, key_selector: Expr) -> Self {
        self.ext("ThenByDescending", vec![key_selector])
    }

    pub fn window(&self, def: WindowDef) -> Self {
        self.ext("Window", vec![Expr::window_def(def)])
    }

    pub fn window_of(&self, size: Duration) -> Self {
        self.ext("Window", vec![Expr::duration(size)])
    }

    pub fn take(&self, count: i64) -> Self {
        self.ext("Take", vec![Expr::int(count)])
    }

    pub fn join(&self, inner: Expr, outer_key: Expr, inner_key: Expr, result: Expr) -> Self {
        self.ext("Join", vec![inner, outer_key, inner_key, result])
    }

    // Inspection

    /// Node kind name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Parameter { .. } => "Parameter",
            Expr::Member { .. } => "MemberAccess",
            Expr::MethodCall { .. } => "MethodCall",
            Expr::Binary { .. } => "Binary",
            Expr::Unary { .. } => "Unary",
            Expr::Constant(_) => "Constant",
            Expr::Conditional { .. } => "Conditional",
            Expr::New { .. } => "New",
            Expr::Lambda { .. } => "Lambda",
            Expr::Source { .. } => "Source",
        }
    }

    /// Static type of the node, when known
    pub fn host_type(&self) -> &HostType {
        match self {
            Expr::Parameter { ty, .. }
            | Expr::Member { ty, .. }
            | Expr::MethodCall { ty, .. }
            | Expr::Unary { ty, .. } => ty,
            _ => &HostType::Unknown,
        }
    }

    /// Body of a lambda, or the expression itself
    pub fn strip_lambda(&self) -> &Expr {
        match self {
            Expr::Lambda { body, .. } => body.strip_lambda(),
            other => other,
        }
    }

    pub fn lambda_params(&self) -> &[String] {
        match self {
            Expr::Lambda { params, .. } => params,
            _ => &[],
        }
    }

    pub fn is_null_constant(&self) -> bool {
        matches!(self, Expr::Constant(Constant::Null))
    }

    pub fn method_name(&self) -> Option<&str> {
        match self {
            Expr::MethodCall { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        let ty = self.host_type().clone();
        self.unary(UnaryOp::Not, ty)
    }
}

impl std::ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        let ty = self.host_type().clone();
        self.unary(UnaryOp::Negate, ty)
    }
}

macro_rules! arithmetic_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl std::ops::$trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                self.binary($op, rhs)
            }
        }
    };
}

arithmetic_op!(Add, add, BinaryOp::Add);
arithmetic_op!(Sub, sub, BinaryOp::Subtract);
arithmetic_op!(Mul, mul, BinaryOp::Multiply);
arithmetic_op!(Div, div, BinaryOp::Divide);
arithmetic_op!(Rem, rem, BinaryOp::Modulo);

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Int(i) => write!(f, "{}", i),
            Constant::Float(x) => write!(f, "{}", x),
            Constant::Decimal(d) => write!(f, "{}m", d),
            Constant::String(s) => write!(f, "\"{}\"", s),
            Constant::Duration(d) => write!(f, "TimeSpan({}ms)", d.num_milliseconds()),
            Constant::Window(def) => {
                let names: Vec<&str> = def.operations().iter().map(|op| op.name()).collect();
                write!(f, "Window[{}]", names.join("."))
            }
        }
    }
}

/// Host-style rendering used for diagnostics
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Parameter { name, .. } => write!(f, "{}", name),
            Expr::Member { target, name, .. } => match target {
                Some(t) => write!(f, "{}.{}", t, name),
                None => write!(f, "{}", name),
            },
            Expr::MethodCall {
                target, name, args, ..
            } => {
                let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                match target {
                    Some(t) => write!(f, "{}.{}({})", t, name, rendered.join(", ")),
                    None => write!(f, "{}({})", name, rendered.join(", ")),
                }
            }
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Unary { op, operand, ty } => match op {
                UnaryOp::Not => write!(f, "!{}", operand),
                UnaryOp::Negate => write!(f, "-{}", operand),
                UnaryOp::ArrayLength => write!(f, "{}.Length", operand),
                _ => write!(f, "({}){}", ty, operand),
            },
            Expr::Constant(c) => write!(f, "{}", c),
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => write!(f, "({} ? {} : {})", test, if_true, if_false),
            Expr::New { members } => {
                let rendered: Vec<String> = members
                    .iter()
                    .map(|m| match &m.name {
                        Some(name) => format!("{} = {}", name, m.value),
                        None => m.value.to_string(),
                    })
                    .collect();
                write!(f, "new {{ {} }}", rendered.join(", "))
            }
            Expr::Lambda { params, body } => {
                if params.len() == 1 {
                    write!(f, "{} => {}", params[0], body)
                } else {
                    write!(f, "({}) => {}", params.join(", "), body)
                }
            }
            Expr::Source { name } => write!(f, "{}", name),
        }
    }
}
