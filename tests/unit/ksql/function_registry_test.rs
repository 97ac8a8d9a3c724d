/*!
Function registry tests
*/

use ksql_linq::ksql::functions::{FunctionCategory, InferredType, FUNCTION_REGISTRY};
use ksql_linq::ksql::functions::translate_method_call;
use ksql_linq::ksql::Expr;

#[test]
fn test_lookup_is_case_insensitive() {
    assert_eq!(FUNCTION_REGISTRY.ksql_name("toupper"), "UPPER");
    assert_eq!(FUNCTION_REGISTRY.ksql_name("LATESTBYOFFSET"), "LATEST_BY_OFFSET");
    assert_eq!(FUNCTION_REGISTRY.ksql_name("Ceiling"), "CEIL");
    assert_eq!(FUNCTION_REGISTRY.ksql_name("NoSuchMethod"), "NOSUCHMETHOD");
}

#[test]
fn test_aggregate_detection_by_host_or_ksql_name() {
    for name in ["Sum", "Count", "Average", "TopKDistinct", "COLLECT_LIST", "AVG"] {
        assert!(FUNCTION_REGISTRY.is_aggregate_function(name), "{} should be aggregate", name);
    }
    for name in ["ToUpper", "Coalesce", "WindowStart", "Unknown"] {
        assert!(!FUNCTION_REGISTRY.is_aggregate_function(name), "{} should not be aggregate", name);
    }
}

#[test]
fn test_type_inference() {
    let cases = [
        ("Avg", InferredType::Double),
        ("CountDistinct", InferredType::Bigint),
        ("EarliestByOffset", InferredType::Any),
        ("CollectSet", InferredType::Array),
        ("Histogram", InferredType::Map),
        ("ToUpper", InferredType::Unknown),
    ];
    for (name, expected) in cases {
        assert_eq!(FUNCTION_REGISTRY.infer_type_from_method_name(name), expected);
    }
    assert_eq!(InferredType::Bigint.to_string(), "BIGINT");
}

#[test]
fn test_render_call_forms() {
    let args = vec!["Name".to_string(), "'x'".to_string()];
    assert_eq!(FUNCTION_REGISTRY.render_call("StartsWith", &args, true), "STARTS_WITH(Name, 'x')");
    assert_eq!(FUNCTION_REGISTRY.render_call("IndexOf", &args, true), "(INSTR(Name, 'x') - 1)");
    assert_eq!(
        FUNCTION_REGISTRY.render_call("ToString", &["Id".to_string()], false),
        "CAST(Id AS VARCHAR)"
    );
    assert_eq!(FUNCTION_REGISTRY.render_call("Count", &[], false), "COUNT(*)");
    assert_eq!(FUNCTION_REGISTRY.render_call("RowTime", &[], false), "ROWTIME");
}

#[test]
fn test_functions_by_category() {
    let by_category = FUNCTION_REGISTRY.functions_by_category();
    for category in FunctionCategory::ALL {
        assert!(by_category.contains_key(&category), "missing {}", category);
    }
    let aggregates = &by_category[&FunctionCategory::Aggregate];
    assert!(aggregates.contains(&"LatestByOffset"));
    assert!(aggregates.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(FunctionCategory::Json.to_string(), "JSON");
}

#[test]
fn test_translate_method_call() {
    let e = Expr::param("e");
    assert_eq!(
        translate_method_call(&e.member("Email").call("EndsWith", vec![Expr::string("@corp.com")]))
            .unwrap(),
        "ENDS_WITH(Email, '@corp.com')"
    );
    assert_eq!(
        translate_method_call(&Expr::static_call(
            "Round",
            vec![e.member("Price"), Expr::int(2)]
        ))
        .unwrap(),
        "ROUND(Price, 2)"
    );
    assert_eq!(
        translate_method_call(&e.member("Address").member("City").call("ToLower", vec![]))
            .unwrap(),
        "LOWER(Address.City)"
    );
}
