//! Host method to KSQL built-in function translation

pub mod registry;

pub use registry::{
    FunctionCategory, FunctionMapping, FunctionRegistry, InferredType, FUNCTION_REGISTRY,
};

use crate::ksql::ast::Expr;
use crate::ksql::builders::lowering::{lower_value, LoweringRules};
use crate::ksql::error::KsqlResult;

/// Render a single method call, e.g. `e.Name.ToUpper()` -> `UPPER(Name)`
///
/// Uses SELECT naming, so nested members keep their dotted path.
pub fn translate_method_call(expr: &Expr) -> KsqlResult<String> {
    Ok(lower_value(expr, &LoweringRules::select())?.to_string())
}
