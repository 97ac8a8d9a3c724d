//! Query operation classification
//!
//! A LINQ chain arrives as nested extension calls, innermost first:
//! `Select(Where(source, p), s)`. [`QueryChain::classify`] flattens it once
//! into typed operations in source order, so the generators never dispatch
//! on method-name strings themselves.

use crate::ksql::ast::{Constant, Expr};
use crate::ksql::builders::order_by::{ordering_method, SortDirection};
use crate::ksql::error::{KsqlError, KsqlResult};

/// Methods that do not change the query shape
const PASSTHROUGH_METHODS: &[&str] = &["AsQueryable", "AsEnumerable", "AsStream", "AsTable"];

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperation<'a> {
    Where(&'a Expr),
    Select(&'a Expr),
    GroupBy(&'a Expr),
    Having(&'a Expr),
    /// `call` is the ordering call itself; its receiver chain carries earlier terms
    OrderBy {
        call: &'a Expr,
        key: &'a Expr,
        direction: SortDirection,
        restart: bool,
    },
    /// Window descriptor or duration argument
    Window(&'a Expr),
    Take(u64),
    /// Whole `Join(outer, inner, outerKey, innerKey, result)` call
    Join(&'a Expr),
}

impl QueryOperation<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            QueryOperation::Where(_) => "Where",
            QueryOperation::Select(_) => "Select",
            QueryOperation::GroupBy(_) => "GroupBy",
            QueryOperation::Having(_) => "Having",
            QueryOperation::OrderBy { .. } => "OrderBy",
            QueryOperation::Window(_) => "Window",
            QueryOperation::Take(_) => "Take",
            QueryOperation::Join(_) => "Join",
        }
    }
}

/// Classified LINQ chain
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryChain<'a> {
    /// Name of the `Source` node at the root, if any
    pub source: Option<&'a str>,
    pub operations: Vec<QueryOperation<'a>>,
}

impl<'a> QueryChain<'a> {
    pub fn classify(expr: &'a Expr) -> KsqlResult<Self> {
        let mut chain = QueryChain::default();
        chain.walk(expr)?;
        Ok(chain)
    }

    pub fn count(&self, name: &str) -> usize {
        self.operations.iter().filter(|op| op.name() == name).count()
    }

    fn walk(&mut self, expr: &'a Expr) -> KsqlResult<()> {
        match expr {
            Expr::Lambda { body, .. } => self.walk(body),
            Expr::Source { name } => {
                self.source = Some(name.as_str());
                Ok(())
            }
            Expr::Parameter { .. } => Ok(()),
            Expr::MethodCall {
                target: None,
                name,
                args,
                ..
            } if !args.is_empty() => {
                self.walk(&args[0])?;
                self.classify_call(expr, name, args)
            }
            other => Err(KsqlError::unsupported(
                "QUERY",
                other.kind(),
                format!(
                    "Expression type '{}' cannot start or continue a query chain",
                    other.kind()
                ),
            )),
        }
    }

    fn classify_call(&mut self, call: &'a Expr, name: &str, args: &'a [Expr]) -> KsqlResult<()> {
        let argument = |index: usize| {
            args.get(index).ok_or_else(|| {
                KsqlError::validation("QUERY", format!("{} requires an argument", name))
            })
        };

        let operation = match name {
            "Where" => QueryOperation::Where(argument(1)?),
            "Select" => QueryOperation::Select(argument(1)?),
            "GroupBy" => QueryOperation::GroupBy(argument(1)?),
            "Having" => QueryOperation::Having(argument(1)?),
            "Window" => QueryOperation::Window(argument(1)?),
            "Join" => {
                if args.len() != 5 {
                    return Err(KsqlError::validation(
                        "JOIN",
                        "Join requires inner source, outer key, inner key and result selector",
                    ));
                }
                QueryOperation::Join(call)
            }
            "Take" | "Limit" => match argument(1)? {
                Expr::Constant(Constant::Int(n)) if *n >= 0 => QueryOperation::Take(*n as u64),
                _ => {
                    return Err(KsqlError::validation(
                        "LIMIT",
                        format!("{} requires a non-negative integer constant", name),
                    ));
                }
            },
            other => match ordering_method(other) {
                Some((direction, restart)) => QueryOperation::OrderBy {
                    call,
                    key: argument(1)?,
                    direction,
                    restart,
                },
                None if PASSTHROUGH_METHODS.contains(&other) => {
                    log::debug!("Ignoring pass-through query method '{}'", other);
                    return Ok(());
                }
                None => {
                    return Err(KsqlError::unsupported(
                        "QUERY",
                        other,
                        format!("Method '{}' is not supported in KSQL query chains", other),
                    ));
                }
            },
        };
        self.operations.push(operation);
        Ok(())
    }
}
