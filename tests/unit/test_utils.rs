// tests/unit/test_utils.rs
use ksql_linq::ksql::{EntityModel, Expr, HostType, PropertyModel};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `param => body`
pub(crate) fn lambda(param: &str, body: Expr) -> Expr {
    Expr::lambda(&[param], body)
}

/// Order entity used across the DDL tests
pub(crate) fn order_model() -> EntityModel {
    EntityModel::new("Order")
        .with_topic("orders")
        .with_property(PropertyModel::new("Id", HostType::Int))
        .with_property(PropertyModel::new("CustomerId", HostType::Long))
        .with_property(PropertyModel::new("Amount", HostType::Decimal).with_decimal(18, 2))
        .with_property(PropertyModel::new("IsActive", HostType::Bool))
        .with_property(PropertyModel::new("CreatedAt", HostType::DateTime))
        .with_property(PropertyModel::new("InternalNote", HostType::String).ignored())
        .with_key("Id")
}
