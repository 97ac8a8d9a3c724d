/*!
JOIN clause builder tests
*/

use crate::unit::test_utils::{init_logger, lambda};
use ksql_linq::ksql::builders::JoinClauseBuilder;
use ksql_linq::ksql::{Expr, KsqlBuilder, QueryAssemblyContext};

fn customer_join(outer_key: Expr, inner_key: Expr) -> Expr {
    let o = Expr::param("o");
    let c = Expr::param("c");
    Expr::source("orders").join(
        Expr::source("customers"),
        outer_key,
        inner_key,
        Expr::lambda(
            &["o", "c"],
            Expr::new_object(vec![("Id", o.member("Id")), ("Name", c.member("Name"))]),
        ),
    )
}

#[test]
fn test_single_key_join() {
    init_logger();
    let o = Expr::param("o");
    let c = Expr::param("c");
    let join = customer_join(
        lambda("o", o.member("CustomerId")),
        lambda("c", c.member("Id")),
    );

    assert_eq!(
        JoinClauseBuilder.build(&join).unwrap(),
        "customers i ON o.CustomerId = i.Id"
    );

    let info = JoinClauseBuilder
        .analyze(&join, &QueryAssemblyContext::default())
        .unwrap();
    assert_eq!(info.outer_type, "orders");
    assert_eq!(info.inner_type, "customers");
    assert_eq!(info.projection, "o.Id AS Id, i.Name AS Name");
}

#[test]
fn test_composite_key_join() {
    let o = Expr::param("o");
    let c = Expr::param("c");
    let join = customer_join(
        lambda("o", Expr::anonymous(vec![o.member("CustomerId"), o.member("Region")])),
        lambda("c", Expr::anonymous(vec![c.member("Id"), c.member("Region")])),
    );

    let info = JoinClauseBuilder
        .analyze(&join, &QueryAssemblyContext::default())
        .unwrap();
    assert_eq!(info.outer_keys, vec!["CustomerId", "Region"]);
    assert_eq!(info.on_condition(), "o.CustomerId = i.Id AND o.Region = i.Region");
}

#[test]
fn test_key_arity_mismatch() {
    let o = Expr::param("o");
    let c = Expr::param("c");
    let join = customer_join(
        lambda("o", Expr::anonymous(vec![o.member("CustomerId"), o.member("Region")])),
        lambda("c", c.member("Id")),
    );

    let err = JoinClauseBuilder.build(&join).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Composite key expressions must have the same number of properties"
    );
}

#[test]
fn test_inner_side_must_be_a_source() {
    let o = Expr::param("o");
    let join = Expr::source("orders").join(
        o.member("Lines"),
        lambda("o", o.member("Id")),
        lambda("l", Expr::param("l").member("OrderId")),
        Expr::lambda(&["o", "l"], Expr::param("o")),
    );

    assert!(JoinClauseBuilder.build(&join).unwrap_err().is_unsupported());
}

#[test]
fn test_non_join_expression_is_unsupported() {
    let err = JoinClauseBuilder
        .build(&Expr::source("orders"))
        .unwrap_err();
    assert!(err.is_unsupported());
}
