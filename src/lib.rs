//! # ksql-linq
//!
//! Compiles LINQ-style expression trees into KSQL statements: schema-only
//! `CREATE STREAM` / `CREATE TABLE`, query-backed `CREATE ... AS SELECT`, and
//! ad-hoc push or pull `SELECT` queries.
//!
//! ## Quick Start
//!
//! ```rust
//! use ksql_linq::ksql::{DmlGenerator, Expr};
//!
//! let e = Expr::param("e");
//! let query = Expr::source("orders")
//!     .filter(Expr::lambda(&["e"], e.member("Amount").gt(Expr::int(100))))
//!     .select(Expr::lambda(&["e"], e.member("Id")));
//!
//! let sql = DmlGenerator::new()
//!     .generate_linq_query("orders", &query, false)
//!     .unwrap();
//! assert_eq!(sql, "SELECT Id FROM orders WHERE (Amount > 100) EMIT CHANGES");
//! ```

#![allow(clippy::large_enum_variant)]

pub mod ksql;

pub use ksql::{KsqlError, KsqlResult};
