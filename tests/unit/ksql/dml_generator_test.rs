/*!
DML generator tests
*/

use crate::unit::test_utils::{init_logger, lambda};
use chrono::Duration;
use ksql_linq::ksql::{DmlGenerator, Expr, HoppingWindow, KsqlError, TumblingWindow};

#[test]
fn test_select_all() {
    init_logger();
    let dml = DmlGenerator::new();
    assert_eq!(dml.generate_select_all("s1", false).unwrap(), "SELECT * FROM s1 EMIT CHANGES");
    assert_eq!(dml.generate_select_all("s1", true).unwrap(), "SELECT * FROM s1");
}

#[test]
fn test_select_with_condition() {
    let e = Expr::param("e");
    let predicate = lambda("e", e.member("Id").equal(Expr::int(1)));
    let dml = DmlGenerator::new();

    assert_eq!(
        dml.generate_select_with_condition("s1", &predicate, false).unwrap(),
        "SELECT * FROM s1 WHERE (Id = 1) EMIT CHANGES"
    );
    assert_eq!(
        dml.generate_select_with_condition("s1", &predicate, true).unwrap(),
        "SELECT * FROM s1 WHERE (Id = 1)"
    );
}

#[test]
fn test_count_and_aggregate_queries() {
    let dml = DmlGenerator::new();
    assert_eq!(dml.generate_count_query("t1").unwrap(), "SELECT COUNT(*) FROM t1");

    let e = Expr::param("e");
    let x = Expr::param("x");
    let projection = lambda(
        "e",
        Expr::new_object(vec![(
            "Last",
            e.ext("LatestByOffset", vec![lambda("x", x.member("Id"))]),
        )]),
    );
    assert_eq!(
        dml.generate_aggregate_query("t1", &projection).unwrap(),
        "SELECT LATEST_BY_OFFSET(Id) AS Last FROM t1"
    );
}

#[test]
fn test_full_chain_renders_in_clause_order() {
    let o = Expr::param("o");
    let g = Expr::param("g");
    let x = Expr::param("x");
    let query = Expr::source("orders")
        .filter(lambda("o", o.member("Amount").gt(Expr::int(100))))
        .window(TumblingWindow::of_minutes(5))
        .group_by(lambda("o", o.member("CustomerId")))
        .having(lambda("g", g.ext("Count", vec![]).gt(Expr::int(10))))
        .select(lambda(
            "g",
            Expr::new_object(vec![
                ("CustomerId", g.member("Key")),
                ("Total", g.ext("Sum", vec![lambda("o", o.member("Amount"))])),
            ]),
        ))
        .order_by(lambda("x", x.member("Total")));

    let sql = DmlGenerator::new()
        .generate_linq_query("orders", &query, false)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT CustomerId, SUM(Amount) AS Total FROM orders WHERE (Amount > 100) WINDOW TUMBLING (SIZE 5 MINUTES) GROUP BY CustomerId HAVING (COUNT(*) > 10) ORDER BY Total ASC EMIT CHANGES"
    );
}

#[test]
fn test_composite_group_key_members_resolve_to_columns() {
    let o = Expr::param("o");
    let g = Expr::param("g");
    let query = Expr::source("orders")
        .group_by(lambda("o", Expr::anonymous(vec![o.member("Type"), o.member("Region")])))
        .select(lambda(
            "g",
            Expr::new_object(vec![
                ("Type", g.member("Key").member("Type")),
                ("Count", g.ext("Count", vec![])),
            ]),
        ));

    assert_eq!(
        DmlGenerator::new()
            .generate_linq_query("orders", &query, false)
            .unwrap(),
        "SELECT Type, COUNT(*) AS Count FROM orders GROUP BY Type, Region EMIT CHANGES"
    );
}

#[test]
fn test_pull_query_with_where_stages_and_limit() {
    let o = Expr::param("o");
    let query = Expr::source("orders")
        .filter(lambda("o", o.member("A").gt(Expr::int(1))))
        .filter(lambda("o", o.member("B").lt(Expr::int(2))))
        .take(10);

    assert_eq!(
        DmlGenerator::new()
            .generate_linq_query("orders", &query, true)
            .unwrap(),
        "SELECT * FROM orders WHERE ((A > 1) AND (B < 2)) LIMIT 10"
    );
}

#[test]
fn test_join_query() {
    let o = Expr::param("o");
    let c = Expr::param("c");
    let query = Expr::source("orders").join(
        Expr::source("customers"),
        lambda("o", o.member("CustomerId")),
        lambda("c", c.member("Id")),
        Expr::lambda(
            &["o", "c"],
            Expr::new_object(vec![("Id", o.member("Id")), ("Name", c.member("Name"))]),
        ),
    );

    assert_eq!(
        DmlGenerator::new()
            .generate_linq_query("orders", &query, false)
            .unwrap(),
        "SELECT o.Id AS Id, i.Name AS Name FROM orders o JOIN customers i ON o.CustomerId = i.Id EMIT CHANGES"
    );
}

#[test]
fn test_hopping_emit_final() {
    let o = Expr::param("o");
    let query = Expr::source("clicks")
        .window(
            HoppingWindow::of_minutes(10)
                .advance_by(Duration::minutes(1))
                .emit_final(),
        )
        .group_by(lambda("o", o.member("Page")));

    assert_eq!(
        DmlGenerator::new()
            .generate_linq_query("clicks", &query, false)
            .unwrap(),
        "SELECT * FROM clicks WINDOW HOPPING (SIZE 10 MINUTES, ADVANCE BY 1 MINUTES) GROUP BY Page EMIT FINAL"
    );
}

#[test]
fn test_unsupported_chain_method_is_wrapped() {
    let query = Expr::source("orders").ext("Distinct", vec![]);

    let err = DmlGenerator::new()
        .generate_linq_query("orders", &query, false)
        .unwrap_err();
    assert!(matches!(err, KsqlError::Generation { .. }));
    assert!(err.is_unsupported());
    assert_eq!(
        err.to_string(),
        "LINQ query generation failed (Source: orders): Method 'Distinct' is not supported in KSQL query chains"
    );
}
