// Clause builder tests
pub mod group_by_builder_test;
pub mod join_builder_test;
pub mod select_builder_test;
pub mod where_builder_test;

pub mod context_test;
pub mod function_registry_test;

// Statement generator tests
pub mod ddl_generator_test;
pub mod dml_generator_test;
