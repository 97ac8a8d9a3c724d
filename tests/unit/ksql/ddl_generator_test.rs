/*!
DDL generator tests
*/

use crate::unit::test_utils::{init_logger, lambda, order_model};
use chrono::Duration;
use ksql_linq::ksql::builders::{BuilderRegistry, KsqlBuilderType};
use ksql_linq::ksql::{
    DdlGenerator, EntityModel, Expr, GeneratorConfig, HostType, KsqlError, ModelCreationScope,
    PropertyModel, SerializationFormat, TumblingWindow,
};

#[test]
fn test_create_stream() {
    init_logger();
    let sql = DdlGenerator::default()
        .generate_create_stream("orders_stream", "orders", &order_model())
        .unwrap();
    assert_eq!(
        sql,
        "CREATE STREAM orders_stream (ID INTEGER, CUSTOMERID BIGINT, AMOUNT DECIMAL(18,2), ISACTIVE BOOLEAN, CREATEDAT TIMESTAMP) WITH (KAFKA_TOPIC='orders', VALUE_FORMAT='AVRO')"
    );
}

#[test]
fn test_create_table_adds_key() {
    let model = order_model().with_key("CustomerId");
    let sql = DdlGenerator::default()
        .generate_create_table("orders_table", "orders", &model)
        .unwrap();
    assert!(sql.starts_with("CREATE TABLE orders_table (ID INTEGER, "));
    assert!(sql.ends_with("WITH (KAFKA_TOPIC='orders', VALUE_FORMAT='AVRO', KEY='ID, CUSTOMERID')"));
}

#[test]
fn test_config_shapes_with_clause_and_decimals() {
    let config = GeneratorConfig {
        key_format: Some(SerializationFormat::Kafka),
        partitions: Some(3),
        replicas: Some(2),
        ..GeneratorConfig::default()
    }
    .with_value_format(SerializationFormat::Json)
    .with_default_decimal(10, 4);

    let model = EntityModel::new("Price").with_property(PropertyModel::new("Value", HostType::Decimal));
    let sql = DdlGenerator::new(config)
        .generate_create_stream("prices", "prices", &model)
        .unwrap();
    assert_eq!(
        sql,
        "CREATE STREAM prices (VALUE DECIMAL(10,4)) WITH (KAFKA_TOPIC='prices', VALUE_FORMAT='JSON', KEY_FORMAT='KAFKA', PARTITIONS=3, REPLICAS=2)"
    );
}

#[test]
fn test_unsupported_property_type() {
    let model = EntityModel::new("Order")
        .with_property(PropertyModel::new("Status", HostType::Enum("OrderStatus".to_string())));

    let err = DdlGenerator::default()
        .generate_create_stream("orders", "orders", &model)
        .unwrap_err();
    assert!(matches!(err, KsqlError::Generation { .. }));
    assert!(matches!(err.root_cause(), KsqlError::UnsupportedType { .. }));
    assert_eq!(err.root_cause().to_string(), "Type 'OrderStatus' is not supported.");
    assert!(err.to_string().contains("Stream: orders, Topic: orders"));
}

#[test]
fn test_invalid_names_are_rejected() {
    let generator = DdlGenerator::default();
    assert!(generator
        .generate_create_stream("orders; DROP STREAM x", "orders", &order_model())
        .unwrap_err()
        .is_validation());
    assert!(generator
        .generate_create_stream("orders", "bad topic", &order_model())
        .unwrap_err()
        .is_validation());
}

#[test]
fn test_missing_required_builder() {
    let registry = BuilderRegistry::standard().without(KsqlBuilderType::GroupBy);
    let err = DdlGenerator::with_builders(GeneratorConfig::default(), registry)
        .err()
        .unwrap();
    assert!(matches!(err, KsqlError::Config { .. }));

    let without_join = BuilderRegistry::standard().without(KsqlBuilderType::Join);
    assert!(DdlGenerator::with_builders(GeneratorConfig::default(), without_join).is_ok());
}

#[test]
fn test_create_table_as_with_window_and_group_by() {
    let o = Expr::param("o");
    let g = Expr::param("g");
    let query = Expr::source("orders")
        .window(TumblingWindow::of_minutes(5))
        .group_by(lambda("o", o.member("Region")))
        .select(lambda(
            "g",
            Expr::new_object(vec![
                ("Region", g.member("Key")),
                ("OrderCount", g.ext("Count", vec![])),
            ]),
        ));

    let sql = ModelCreationScope::within(|| {
        DdlGenerator::default().generate_create_table_as("region_counts", "orders", &query)
    })
    .unwrap();
    assert_eq!(
        sql,
        "CREATE TABLE region_counts AS SELECT Region, COUNT(*) AS OrderCount FROM orders WINDOW TUMBLING (SIZE 5 MINUTES) GROUP BY Region EMIT CHANGES"
    );
}

#[test]
fn test_emit_final_moves_to_statement_end() {
    let o = Expr::param("o");
    let g = Expr::param("g");
    let query = Expr::source("orders")
        .window(TumblingWindow::of_minutes(5).emit_final())
        .group_by(lambda("o", o.member("Region")))
        .select(lambda(
            "g",
            Expr::new_object(vec![("Region", g.member("Key")), ("Total", g.ext("Count", vec![]))]),
        ));

    let sql = ModelCreationScope::within(|| {
        DdlGenerator::default().generate_create_table_as("region_totals", "orders", &query)
    })
    .unwrap();
    assert_eq!(
        sql,
        "CREATE TABLE region_totals AS SELECT Region, COUNT(*) AS Total FROM orders WINDOW TUMBLING (SIZE 5 MINUTES) GROUP BY Region EMIT FINAL"
    );
}

#[test]
fn test_builder_failure_is_wrapped_with_statement_context() {
    let o = Expr::param("o");
    let query = Expr::source("orders").window_of(Duration::days(45)).group_by(lambda("o", o.member("Region")));

    let err = ModelCreationScope::within(|| {
        DdlGenerator::default().generate_create_stream_as("long_windows", "orders", &query)
    })
    .unwrap_err();

    assert!(matches!(err, KsqlError::Generation { .. }));
    assert!(err.is_validation());
    assert_eq!(err.root_cause().to_string(), "Window size cannot exceed 30 days");
    assert_eq!(
        err.to_string(),
        "CREATE STREAM AS generation failed (Stream: long_windows, Base: orders): Window builder failed during Window clause: Window size cannot exceed 30 days"
    );
}

#[test]
fn test_duplicate_stage_is_rejected() {
    let o = Expr::param("o");
    let query = Expr::source("orders")
        .group_by(lambda("o", o.member("Region")))
        .group_by(lambda("o", o.member("Category")));

    let err = ModelCreationScope::within(|| {
        DdlGenerator::default().generate_create_table_as("t", "orders", &query)
    })
    .unwrap_err();
    assert_eq!(err.root_cause().to_string(), "Multiple GroupBy calls are not supported");
}
