/*!
GROUP BY clause builder tests
*/

use crate::unit::test_utils::{init_logger, lambda};
use ksql_linq::ksql::builders::GroupByClauseBuilder;
use ksql_linq::ksql::{Expr, HostType, KsqlBuilder};

fn build(body: Expr) -> String {
    GroupByClauseBuilder.build(&lambda("e", body)).unwrap()
}

#[test]
fn test_single_and_composite_keys() {
    init_logger();
    let e = Expr::param("e");
    assert_eq!(build(e.member("Region")), "Region");
    assert_eq!(
        build(Expr::anonymous(vec![e.member("Region"), e.member("Category")])),
        "Region, Category"
    );
}

#[test]
fn test_nested_composite_keys_flatten() {
    let e = Expr::param("e");
    let key = Expr::new_object(vec![
        ("Outer", Expr::anonymous(vec![e.member("Type")])),
        ("Id", e.member("Id")),
    ]);
    assert_eq!(build(key), "Type, Id");
}

#[test]
fn test_key_transforms() {
    let e = Expr::param("e");
    assert_eq!(build(e.member("Category").call("ToUpper", vec![])), "UPPER(Category)");
    assert_eq!(
        build(e.member("NullableValue").coalesce(Expr::int(0))),
        "COALESCE(NullableValue, 0)"
    );
    assert_eq!(
        build(e.typed_member("CreatedAt", HostType::DateTime).member("Year")),
        "YEAR(CreatedAt)"
    );
    assert_eq!(
        build(e.member("Id").convert(HostType::Object("object".to_string()))),
        "Id"
    );
    assert_eq!(build(Expr::int(1)), "1");
}

#[test]
fn test_disallowed_function() {
    let e = Expr::param("e");
    let key = lambda("e", e.member("Name").call("Trim", vec![]));

    let err = GroupByClauseBuilder.build(&key).unwrap_err();
    assert_eq!(err.to_string(), "Function 'Trim' is not allowed in GROUP BY clause");
}

#[test]
fn test_sequence_accessor_is_unsupported() {
    let e = Expr::param("e");
    let key = lambda("e", e.member("Items").ext("First", vec![]));

    let err = GroupByClauseBuilder.build(&key).unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn test_aggregate_is_rejected() {
    let e = Expr::param("e");
    let x = Expr::param("x");
    let key = lambda("e", e.ext("Sum", vec![lambda("x", x.member("Amount"))]));

    let err = GroupByClauseBuilder.build(&key).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Aggregate functions are not allowed in GROUP BY clause"
    );
}

#[test]
fn test_whole_parameter_is_unsupported() {
    let err = GroupByClauseBuilder
        .build(&lambda("e", Expr::param("e")))
        .unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn test_key_count_limit() {
    let e = Expr::param("e");
    let members: Vec<Expr> = (0..11).map(|i| e.member(format!("K{}", i))).collect();
    let key = lambda("e", Expr::anonymous(members));

    let err = GroupByClauseBuilder.build(&key).unwrap_err();
    assert_eq!(
        err.to_string(),
        "GROUP BY supports maximum 10 keys for optimal performance. Found 11 keys. Consider using composite keys or data denormalization."
    );

    let ten: Vec<Expr> = (0..10).map(|i| e.member(format!("K{}", i))).collect();
    assert!(GroupByClauseBuilder
        .build(&lambda("e", Expr::anonymous(ten)))
        .is_ok());
}
