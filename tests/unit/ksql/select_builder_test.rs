/*!
SELECT clause builder tests
*/

use crate::unit::test_utils::{init_logger, lambda};
use ksql_linq::ksql::builders::SelectClauseBuilder;
use ksql_linq::ksql::pipeline::context::META_GROUPED;
use ksql_linq::ksql::{Expr, KsqlBuilder, KsqlError, QueryAssemblyContext};

#[test]
fn test_anonymous_projection_keeps_nested_path() {
    init_logger();
    let e = Expr::param("e");
    let selector = lambda(
        "e",
        Expr::new_object(vec![
            ("Id", e.member("Id")),
            ("City", e.member("Address").member("City")),
        ]),
    );

    let sql = SelectClauseBuilder.build(&selector).unwrap();
    assert_eq!(sql, "Id, Address.City AS City");
}

#[test]
fn test_inferred_member_names() {
    let e = Expr::param("e");
    let selector = lambda("e", Expr::anonymous(vec![e.member("Id"), e.member("Name")]));

    assert_eq!(SelectClauseBuilder.build(&selector).unwrap(), "Id, Name");
}

#[test]
fn test_whole_parameter_selects_star() {
    let selector = lambda("e", Expr::param("e"));
    assert_eq!(SelectClauseBuilder.build(&selector).unwrap(), "*");
}

#[test]
fn test_function_and_operator_projections() {
    let e = Expr::param("e");
    let selector = lambda(
        "e",
        Expr::new_object(vec![
            ("Upper", e.member("Name").call("ToUpper", vec![])),
            ("Changed", e.member("Old").not_equal(e.member("New"))),
            ("Value", e.member("Discount").coalesce(Expr::int(0))),
            ("Gross", e.member("Net") * Expr::float(1.2)),
        ]),
    );

    let sql = SelectClauseBuilder.build(&selector).unwrap();
    assert_eq!(
        sql,
        "UPPER(Name) AS Upper, (Old <> New) AS Changed, COALESCE(Discount, 0) AS Value, (Net * 1.2) AS Gross"
    );
}

#[test]
fn test_conditional_projection_renders_case() {
    let e = Expr::param("e");
    let selector = lambda(
        "e",
        Expr::new_object(vec![(
            "Size",
            Expr::conditional(
                e.member("Amount").gt(Expr::int(100)),
                Expr::string("L"),
                Expr::string("S"),
            ),
        )]),
    );

    assert_eq!(
        SelectClauseBuilder.build(&selector).unwrap(),
        "CASE WHEN (Amount > 100) THEN 'L' ELSE 'S' END AS Size"
    );
}

#[test]
fn test_mixing_aggregates_without_group_by_is_rejected() {
    let e = Expr::param("e");
    let x = Expr::param("x");
    let selector = lambda(
        "e",
        Expr::new_object(vec![
            ("Id", e.member("Id")),
            ("Total", e.ext("Sum", vec![lambda("x", x.member("Amount"))])),
        ]),
    );

    let err = SelectClauseBuilder.build(&selector).unwrap_err();
    assert!(matches!(err, KsqlError::Validation { .. }));
    assert_eq!(
        err.to_string(),
        "SELECT clause cannot mix aggregate functions with non-aggregate columns without GROUP BY"
    );

    let grouped = QueryAssemblyContext::default().with_metadata(META_GROUPED, true);
    assert_eq!(
        SelectClauseBuilder
            .build_with_context(&selector, &grouped)
            .unwrap(),
        "Id, SUM(Amount) AS Total"
    );
}

#[test]
fn test_only_aggregates_need_no_group_by() {
    let g = Expr::param("g");
    let x = Expr::param("x");
    let selector = lambda(
        "g",
        Expr::new_object(vec![
            ("Count", g.ext("Count", vec![])),
            ("Average", g.ext("Average", vec![lambda("x", x.member("Amount"))])),
        ]),
    );

    assert_eq!(
        SelectClauseBuilder.build(&selector).unwrap(),
        "COUNT(*) AS Count, AVG(Amount) AS Average"
    );
}

#[test]
fn test_suffixed_alias_skips_names_already_taken() {
    let e = Expr::param("e");
    let selector = lambda(
        "e",
        Expr::new_object(vec![
            ("Id_1", e.member("A")),
            ("Id", e.member("Id")),
            ("Id", e.member("B")),
        ]),
    );

    let sql = SelectClauseBuilder.build(&selector).unwrap();
    assert_eq!(sql, "A AS Id_1, Id, B AS Id_2");
    assert_eq!(sql.matches("AS Id_1").count(), 1);
}

#[test]
fn test_static_aggregate_calls_keep_their_arguments() {
    let e = Expr::param("e");
    let x = Expr::param("x");
    let build = |body: Expr| SelectClauseBuilder.build(&lambda("e", body)).unwrap();

    assert_eq!(
        build(Expr::new_object(vec![(
            "Big",
            Expr::static_call("Max", vec![e.member("A"), e.member("B")]),
        )])),
        "MAX(A, B) AS Big"
    );
    assert_eq!(
        build(Expr::new_object(vec![(
            "Total",
            Expr::static_call("Sum", vec![e.member("Amount")]),
        )])),
        "SUM(Amount) AS Total"
    );
    // receiver followed by a selector lambda is still an extension call
    assert_eq!(
        build(Expr::new_object(vec![(
            "Total",
            Expr::static_call("Sum", vec![e.member("Items"), lambda("x", x.member("Price"))]),
        )])),
        "SUM(Price) AS Total"
    );
}
