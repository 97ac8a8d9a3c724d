/*!
Query assembly context and structure tests
*/

use ksql_linq::ksql::pipeline::context::META_GROUPED;
use ksql_linq::ksql::pipeline::{
    ExecutionMode, QueryAssemblyContext, QueryClause, QueryClauseType, QueryStructure,
    StatementKind,
};
use ksql_linq::ksql::KsqlError;

#[test]
fn test_context_copies_on_write() {
    let base = QueryAssemblyContext::new("orders", ExecutionMode::PushQuery);
    let grouped = base.with_metadata(META_GROUPED, true);
    let pulled = grouped
        .with_execution_mode(ExecutionMode::PullQuery)
        .with_base_object("orders_table");

    assert!(!base.is_grouped());
    assert!(grouped.is_grouped());
    assert!(!grouped.is_pull_query());
    assert!(pulled.is_pull_query());
    assert_eq!(pulled.base_object, "orders_table");
    assert_eq!(
        pulled.debug_info(),
        "Base: orders_table, Mode: PullQuery, Metadata: [grouped]"
    );
}

#[test]
fn test_clauses_render_in_declared_order() {
    let mut structure = QueryStructure::new(StatementKind::Select, "orders");
    structure.add_clause(QueryClause::required(QueryClauseType::EmitChanges, "CHANGES"));
    structure.add_clause(QueryClause::optional(QueryClauseType::Limit, "10"));
    structure.add_clause(QueryClause::optional(QueryClauseType::Having, "(COUNT(*) > 1)"));
    structure.add_clause(QueryClause::optional(QueryClauseType::Window, "TUMBLING (SIZE 1 MINUTES)"));
    structure.add_clause(QueryClause::optional(QueryClauseType::GroupBy, "Region"));
    structure.add_clause(QueryClause::required(QueryClauseType::From, "orders"));
    structure.add_clause(QueryClause::required(QueryClauseType::Select, "Region, COUNT(*)"));

    assert_eq!(
        structure.render().unwrap(),
        "SELECT Region, COUNT(*) FROM orders WINDOW TUMBLING (SIZE 1 MINUTES) GROUP BY Region HAVING (COUNT(*) > 1) LIMIT 10 EMIT CHANGES"
    );
    assert!(structure.has_clause(QueryClauseType::GroupBy));
    assert!(!structure.has_clause(QueryClauseType::Join));
}

#[test]
fn test_empty_required_clause_fails() {
    let mut structure = QueryStructure::new(StatementKind::Select, "orders");
    structure.add_clause(QueryClause::required(QueryClauseType::Select, ""));
    structure.add_clause(QueryClause::required(QueryClauseType::From, "orders"));

    let err = structure.render().unwrap_err();
    assert!(matches!(err, KsqlError::Assembly { .. }));
    assert_eq!(
        err.to_string(),
        "Query assembly failed: Required Select clause has no content"
    );
}

#[test]
fn test_metadata_tracks_statement_category() {
    let ddl = QueryStructure::new(
        StatementKind::CreateTableAs {
            name: "totals".to_string(),
        },
        "orders",
    );
    assert_eq!(ddl.metadata.category, "DDL");
    assert_eq!(ddl.metadata.base_object, "orders");
    assert!(ddl.clauses().is_empty());
}
