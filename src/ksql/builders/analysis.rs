//! Pure structural checks over host expressions and lowered SQL

use crate::ksql::ast::Expr;
use crate::ksql::builders::lowering::SqlExpr;
use crate::ksql::functions::FUNCTION_REGISTRY;

/// Direct children of a host expression node
pub fn expr_children(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::Parameter { .. } | Expr::Constant(_) | Expr::Source { .. } => Vec::new(),
        Expr::Member { target, .. } => target.iter().map(|t| t.as_ref()).collect(),
        Expr::MethodCall { target, args, .. } => target
            .iter()
            .map(|t| t.as_ref())
            .chain(args.iter())
            .collect(),
        Expr::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
        Expr::Unary { operand, .. } => vec![operand.as_ref()],
        Expr::Conditional {
            test,
            if_true,
            if_false,
        } => vec![test.as_ref(), if_true.as_ref(), if_false.as_ref()],
        Expr::New { members } => members.iter().map(|m| &m.value).collect(),
        Expr::Lambda { body, .. } => vec![body.as_ref()],
    }
}

/// Whether any node of the tree satisfies `predicate`
pub fn expr_any(expr: &Expr, predicate: &impl Fn(&Expr) -> bool) -> bool {
    predicate(expr) || expr_children(expr).into_iter().any(|c| expr_any(c, predicate))
}

/// Whether the host expression calls an aggregate function anywhere
pub fn expr_contains_aggregate(expr: &Expr) -> bool {
    expr_any(expr, &|node| {
        node.method_name()
            .is_some_and(|name| FUNCTION_REGISTRY.is_aggregate_function(name))
    })
}

pub fn sql_any(expr: &SqlExpr, predicate: &impl Fn(&SqlExpr) -> bool) -> bool {
    predicate(expr) || expr.children().into_iter().any(|c| sql_any(c, predicate))
}

fn is_aggregate_call(expr: &SqlExpr) -> bool {
    matches!(expr, SqlExpr::Call { function, .. } if FUNCTION_REGISTRY.is_aggregate_function(function))
}

pub fn contains_aggregate(expr: &SqlExpr) -> bool {
    sql_any(expr, &is_aggregate_call)
}

/// Whether a column is referenced outside every aggregate call
pub fn has_non_aggregate_columns(expr: &SqlExpr) -> bool {
    match expr {
        SqlExpr::Column(_) => true,
        e if is_aggregate_call(e) => false,
        other => other.children().into_iter().any(has_non_aggregate_columns),
    }
}
