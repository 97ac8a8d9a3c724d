//! WINDOW clause builder

use crate::ksql::ast::{Constant, Expr};
use crate::ksql::builders::analysis::expr_any;
use crate::ksql::builders::{KsqlBuilder, KsqlBuilderType};
use crate::ksql::error::{KsqlError, KsqlResult};
use crate::ksql::pipeline::context::QueryAssemblyContext;
use crate::ksql::window::{WindowDef, WindowOp};
use chrono::Duration;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Format a duration in the coarsest unit that represents it exactly
///
/// `300s` -> `5 MINUTES`, `90s` -> `90 SECONDS`, zero -> `0 SECONDS`.
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.num_milliseconds();
    if ms == 0 {
        return "0 SECONDS".to_string();
    }
    let units = [
        (MS_PER_DAY, "DAYS"),
        (MS_PER_HOUR, "HOURS"),
        (MS_PER_MINUTE, "MINUTES"),
        (MS_PER_SECOND, "SECONDS"),
    ];
    units
        .iter()
        .find(|(unit, _)| ms % unit == 0)
        .map(|(unit, name)| format!("{} {}", ms / unit, name))
        .unwrap_or_else(|| format!("{} MILLISECONDS", ms))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Tumbling,
    Hopping,
    Session,
}

/// Window configuration after folding the recorded operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowSpec {
    /// `None` until a Tumbling/Hopping/Session selection is recorded
    pub kind: Option<WindowKind>,
    pub size: Option<Duration>,
    pub advance_by: Option<Duration>,
    pub gap: Option<Duration>,
    pub retention: Option<Duration>,
    pub grace_period: Option<Duration>,
    pub emit_final: bool,
}

impl WindowSpec {
    /// Fold operations in order; later writes to a slot override earlier ones
    pub fn from_operations(operations: &[WindowOp]) -> Self {
        operations
            .iter()
            .fold(WindowSpec::default(), |spec, op| match op {
                WindowOp::TumblingWindow => WindowSpec {
                    kind: Some(WindowKind::Tumbling),
                    ..spec
                },
                WindowOp::HoppingWindow => WindowSpec {
                    kind: Some(WindowKind::Hopping),
                    ..spec
                },
                WindowOp::SessionWindow => WindowSpec {
                    kind: Some(WindowKind::Session),
                    ..spec
                },
                WindowOp::Size(d) => WindowSpec {
                    size: Some(*d),
                    ..spec
                },
                WindowOp::AdvanceBy(d) => WindowSpec {
                    advance_by: Some(*d),
                    ..spec
                },
                WindowOp::Gap(d) => WindowSpec {
                    gap: Some(*d),
                    ..spec
                },
                WindowOp::Retention(d) => WindowSpec {
                    retention: Some(*d),
                    ..spec
                },
                WindowOp::GracePeriod(d) => WindowSpec {
                    grace_period: Some(*d),
                    ..spec
                },
                WindowOp::EmitFinal => WindowSpec {
                    emit_final: true,
                    ..spec
                },
            })
    }

    pub fn from_def(def: &WindowDef) -> Self {
        Self::from_operations(def.operations())
    }

    /// Tumbling window of `size`
    pub fn tumbling(size: Duration) -> Self {
        WindowSpec {
            kind: Some(WindowKind::Tumbling),
            size: Some(size),
            ..WindowSpec::default()
        }
    }

    fn window_kind(&self) -> KsqlResult<WindowKind> {
        self.kind.ok_or_else(|| {
            KsqlError::validation(
                "WINDOW",
                "Window definition must specify window type (Tumbling, Hopping, or Session)",
            )
        })
    }

    fn validate(&self) -> KsqlResult<WindowKind> {
        let kind = self.window_kind()?;
        match kind {
            WindowKind::Tumbling | WindowKind::Hopping => {
                let label = if kind == WindowKind::Tumbling {
                    "TUMBLING"
                } else {
                    "HOPPING"
                };
                let size = self.size.ok_or_else(|| {
                    KsqlError::validation("WINDOW", format!("{} window requires Size", label))
                })?;
                validate_span("Window size", size)?;
                if let Some(advance) = self.advance_by {
                    validate_span("AdvanceBy", advance)?;
                    if kind == WindowKind::Hopping && advance > size {
                        log::warn!("AdvanceBy greater than Size may cause gaps in data coverage");
                    }
                }
            }
            WindowKind::Session => {
                let gap = self.gap.ok_or_else(|| {
                    KsqlError::validation("WINDOW", "SESSION window requires Gap")
                })?;
                validate_span("Session gap", gap)?;
                if gap > Duration::hours(24) {
                    log::warn!(
                        "Session gap of {} exceeds 24 hours; sessions may stay open for a long time",
                        format_duration(gap)
                    );
                }
                if self.retention.is_some() || self.grace_period.is_some() || self.emit_final {
                    log::warn!(
                        "SESSION windows do not support RETENTION, GRACE PERIOD, or EMIT FINAL options"
                    );
                }
            }
        }
        for (label, value) in [
            ("Retention", self.retention),
            ("Grace period", self.grace_period),
        ] {
            if value.is_some_and(|d| d < Duration::zero()) {
                return Err(KsqlError::validation(
                    "WINDOW",
                    format!("{} cannot be negative", label),
                ));
            }
        }
        Ok(kind)
    }

    fn render(&self, kind: WindowKind) -> String {
        let mut options = Vec::new();
        let head = match kind {
            WindowKind::Session => {
                let gap = self.gap.map(format_duration).unwrap_or_default();
                return format!("SESSION (GAP {})", gap);
            }
            WindowKind::Tumbling => "TUMBLING",
            WindowKind::Hopping => "HOPPING",
        };
        if let Some(size) = self.size {
            options.push(format!("SIZE {}", format_duration(size)));
        }
        if kind == WindowKind::Hopping {
            if let Some(advance) = self.advance_by {
                options.push(format!("ADVANCE BY {}", format_duration(advance)));
            }
        }
        if let Some(retention) = self.retention {
            options.push(format!("RETENTION {}", format_duration(retention)));
        }
        if let Some(grace) = self.grace_period {
            options.push(format!("GRACE PERIOD {}", format_duration(grace)));
        }
        let mut rendered = format!("{} ({})", head, options.join(", "));
        if self.emit_final {
            rendered.push_str(" EMIT FINAL");
        }
        rendered
    }
}

/// Sizes, advances and gaps: positive, at least one second, at most 30 days
fn validate_span(label: &str, value: Duration) -> KsqlResult<()> {
    let message = if value <= Duration::zero() {
        format!("{} must be greater than zero", label)
    } else if value > Duration::days(30) {
        format!("{} cannot exceed 30 days", label)
    } else if value < Duration::seconds(1) {
        format!("{} must be at least 1 second", label)
    } else {
        return Ok(());
    };
    Err(KsqlError::validation("WINDOW", message))
}

/// Renders window definitions
///
/// Accepts a window descriptor, a bare duration (a tumbling window of that
/// size), or a `Window(...)` call wrapping either.
pub struct WindowClauseBuilder;

impl WindowClauseBuilder {
    pub fn spec(&self, expr: &Expr) -> KsqlResult<WindowSpec> {
        match expr {
            Expr::Lambda { body, .. } => self.spec(body),
            Expr::Constant(Constant::Window(def)) => Ok(WindowSpec::from_def(def)),
            Expr::Constant(Constant::Duration(size)) => Ok(WindowSpec::tumbling(*size)),
            Expr::MethodCall {
                target: None,
                name,
                args,
                ..
            } if name == "Window" && args.len() == 2 => {
                if expr_any(&args[0], &|node| node.method_name() == Some("Window")) {
                    return Err(KsqlError::validation(
                        "WINDOW",
                        "Multiple Window calls are not supported",
                    ));
                }
                self.spec(&args[1])
            }
            other => Err(KsqlError::unsupported(
                "WINDOW",
                other.kind(),
                format!(
                    "Expression type '{}' is not supported in WINDOW clause",
                    other.kind()
                ),
            )),
        }
    }
}

impl KsqlBuilder for WindowClauseBuilder {
    fn builder_type(&self) -> KsqlBuilderType {
        KsqlBuilderType::Window
    }

    fn build_with_context(&self, expr: &Expr, _ctx: &QueryAssemblyContext) -> KsqlResult<String> {
        let spec = self.spec(expr)?;
        let kind = spec.validate()?;
        Ok(spec.render(kind))
    }
}
