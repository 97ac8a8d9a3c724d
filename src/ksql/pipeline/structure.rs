//! Query structure
//!
//! Clauses are appended as they are produced and rendered once, in the
//! declared order of [`QueryClauseType`] regardless of insertion order.

use crate::ksql::error::{KsqlError, KsqlResult};
use chrono::{DateTime, Utc};
use std::fmt;

/// Clause kinds in rendering order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryClauseType {
    Select,
    From,
    Join,
    Where,
    Window,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    EmitChanges,
}

impl QueryClauseType {
    pub fn keyword(&self) -> &'static str {
        match self {
            QueryClauseType::Select => "SELECT",
            QueryClauseType::From => "FROM",
            QueryClauseType::Join => "JOIN",
            QueryClauseType::Where => "WHERE",
            QueryClauseType::Window => "WINDOW",
            QueryClauseType::GroupBy => "GROUP BY",
            QueryClauseType::Having => "HAVING",
            QueryClauseType::OrderBy => "ORDER BY",
            QueryClauseType::Limit => "LIMIT",
            QueryClauseType::EmitChanges => "EMIT",
        }
    }
}

impl fmt::Display for QueryClauseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One rendered clause; `content` excludes the keyword
#[derive(Debug, Clone, PartialEq)]
pub struct QueryClause {
    pub clause_type: QueryClauseType,
    pub content: String,
    pub required: bool,
    /// Source expression, for diagnostics only
    pub source: Option<String>,
}

impl QueryClause {
    pub fn required(clause_type: QueryClauseType, content: impl Into<String>) -> Self {
        Self {
            clause_type,
            content: content.into(),
            required: true,
            source: None,
        }
    }

    pub fn optional(clause_type: QueryClauseType, content: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(clause_type, content)
        }
    }

    pub fn with_source(mut self, source: impl fmt::Display) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn render(&self) -> String {
        format!("{} {}", self.clause_type.keyword(), self.content.trim())
    }
}

/// Kind of statement being assembled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    CreateStreamAs { name: String },
    CreateTableAs { name: String },
}

impl StatementKind {
    fn prefix(&self) -> Option<String> {
        match self {
            StatementKind::Select => None,
            StatementKind::CreateStreamAs { name } => Some(format!("CREATE STREAM {} AS", name)),
            StatementKind::CreateTableAs { name } => Some(format!("CREATE TABLE {} AS", name)),
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            StatementKind::Select => "DML",
            _ => "DDL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryMetadata {
    pub created_at: DateTime<Utc>,
    pub category: String,
    pub base_object: String,
}

#[derive(Debug, Clone)]
pub struct QueryStructure {
    pub kind: StatementKind,
    pub metadata: QueryMetadata,
    clauses: Vec<QueryClause>,
}

impl QueryStructure {
    pub fn new(kind: StatementKind, base_object: impl Into<String>) -> Self {
        let metadata = QueryMetadata {
            created_at: Utc::now(),
            category: kind.category().to_string(),
            base_object: base_object.into(),
        };
        Self {
            kind,
            metadata,
            clauses: Vec::new(),
        }
    }

    pub fn add_clause(&mut self, clause: QueryClause) {
        log::debug!(
            "Adding {} clause ({}): {}",
            clause.clause_type,
            if clause.required { "required" } else { "optional" },
            clause.content
        );
        self.clauses.push(clause);
    }

    pub fn clauses(&self) -> &[QueryClause] {
        &self.clauses
    }

    pub fn clause(&self, clause_type: QueryClauseType) -> Option<&QueryClause> {
        self.clauses.iter().find(|c| c.clause_type == clause_type)
    }

    pub fn has_clause(&self, clause_type: QueryClauseType) -> bool {
        self.clause(clause_type).is_some()
    }

    /// Render in clause order, dropping empty optional clauses
    pub fn render(&self) -> KsqlResult<String> {
        if let Some(missing) = self.clauses.iter().find(|c| c.required && c.is_empty()) {
            return Err(KsqlError::assembly(format!(
                "Required {} clause has no content",
                missing.clause_type
            )));
        }

        let mut parts: Vec<&QueryClause> = self.clauses.iter().filter(|c| !c.is_empty()).collect();
        if parts.is_empty() {
            return Err(KsqlError::assembly("No valid query clauses to assemble"));
        }
        parts.sort_by_key(|c| c.clause_type);

        let body = parts
            .iter()
            .map(|c| c.render())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(match self.kind.prefix() {
            Some(prefix) => format!("{} {}", prefix, body),
            None => body,
        })
    }
}
