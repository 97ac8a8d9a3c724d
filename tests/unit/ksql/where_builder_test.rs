/*!
WHERE clause builder tests
*/

use crate::unit::test_utils::{init_logger, lambda};
use ksql_linq::ksql::builders::WhereClauseBuilder;
use ksql_linq::ksql::{Expr, HostType, KsqlBuilder};

fn build(body: Expr) -> String {
    WhereClauseBuilder.build(&lambda("e", body)).unwrap()
}

#[test]
fn test_simple_comparison() {
    init_logger();
    let e = Expr::param("e");
    assert_eq!(build(e.member("Id").equal(Expr::int(1))), "(Id = 1)");
    assert_eq!(build(e.member("Id").not_equal(Expr::int(1))), "(Id != 1)");
    assert_eq!(build(e.member("Price").ge(Expr::float(9.5))), "(Price >= 9.5)");
}

#[test]
fn test_logical_operators_mirror_tree_shape() {
    let e = Expr::param("e");
    let predicate = e
        .member("A")
        .gt(Expr::int(1))
        .and(e.member("B").lt(Expr::int(2)))
        .or(e.member("C").equal(Expr::int(3)));

    assert_eq!(build(predicate), "(((A > 1) AND (B < 2)) OR (C = 3))");
}

#[test]
fn test_boolean_member_idioms() {
    let e = Expr::param("e");
    let active = e.typed_member("IsActive", HostType::Bool);

    assert_eq!(build(active.clone()), "(IsActive = true)");
    assert_eq!(build(!active.clone()), "(IsActive = false)");
    assert_eq!(
        build(active.and(e.member("Id").gt(Expr::int(0)))),
        "((IsActive = true) AND (Id > 0))"
    );
}

#[test]
fn test_nullable_boolean_value() {
    let e = Expr::param("e");
    let vip = e
        .typed_member("IsVip", HostType::nullable(HostType::Bool))
        .member("Value");

    assert_eq!(build(vip), "(IsVip = true)");
}

#[test]
fn test_null_comparisons() {
    let e = Expr::param("e");
    assert_eq!(build(e.member("Name").equal(Expr::null())), "Name IS NULL");
    assert_eq!(build(e.member("Name").not_equal(Expr::null())), "Name IS NOT NULL");

    let discount = e.typed_member("Discount", HostType::nullable(HostType::Decimal));
    assert_eq!(build(discount.member("HasValue")), "Discount IS NOT NULL");
}

#[test]
fn test_composite_key_equality() {
    let e = Expr::param("e");
    let predicate = Expr::anonymous(vec![e.member("A"), e.member("B")])
        .equal(Expr::anonymous(vec![Expr::int(1), Expr::int(2)]));

    assert_eq!(build(predicate), "(A = 1 AND B = 2)");
}

#[test]
fn test_composite_key_arity_mismatch() {
    let e = Expr::param("e");
    let predicate = Expr::anonymous(vec![e.member("A"), e.member("B")])
        .equal(Expr::anonymous(vec![Expr::int(1)]));

    let err = WhereClauseBuilder.build(&lambda("e", predicate)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Composite key expressions must have the same number of properties"
    );
}

#[test]
fn test_string_and_date_functions() {
    let e = Expr::param("e");
    assert_eq!(
        build(e.member("Name").call("Contains", vec![Expr::string("vip")])),
        "INSTR(Name, 'vip') > 0"
    );
    assert_eq!(
        build(
            e.typed_member("CreatedAt", HostType::DateTime)
                .member("Year")
                .equal(Expr::int(2024))
        ),
        "(YEAR(CreatedAt) = 2024)"
    );
}

#[test]
fn test_aggregate_is_rejected() {
    let e = Expr::param("e");
    let predicate = e.ext("Count", vec![]).gt(Expr::int(5));

    let err = WhereClauseBuilder.build(&lambda("e", predicate)).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "Aggregate functions are not allowed in WHERE clause. Use HAVING clause instead."
    );
}

#[test]
fn test_subquery_is_rejected() {
    let e = Expr::param("e");
    let t = Expr::param("t");
    let predicate = e
        .member("Tags")
        .ext("Select", vec![lambda("t", t.member("Name"))])
        .call("Contains", vec![Expr::string("vip")]);

    let err = WhereClauseBuilder.build(&lambda("e", predicate)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Subqueries are not supported in WHERE clause in KSQL"
    );
}

#[test]
fn test_build_condition_matches_build() {
    let e = Expr::param("e");
    let predicate = lambda("e", e.member("Id").equal(Expr::int(7)));
    assert_eq!(
        WhereClauseBuilder.build_condition(&predicate).unwrap(),
        WhereClauseBuilder.build(&predicate).unwrap()
    );
}
