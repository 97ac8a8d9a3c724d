//! Window descriptors
//!
//! A [`WindowDef`] records the window-configuration calls in the order they
//! were made. Nothing is resolved here: the window clause builder folds the
//! recorded operations, with the last write for each slot winning.

use chrono::Duration;

/// One recorded window-configuration call
#[derive(Debug, Clone, PartialEq)]
pub enum WindowOp {
    TumblingWindow,
    HoppingWindow,
    SessionWindow,
    Size(Duration),
    AdvanceBy(Duration),
    Gap(Duration),
    Retention(Duration),
    GracePeriod(Duration),
    EmitFinal,
}

impl WindowOp {
    pub fn name(&self) -> &'static str {
        match self {
            WindowOp::TumblingWindow => "TumblingWindow",
            WindowOp::HoppingWindow => "HoppingWindow",
            WindowOp::SessionWindow => "SessionWindow",
            WindowOp::Size(_) => "Size",
            WindowOp::AdvanceBy(_) => "AdvanceBy",
            WindowOp::Gap(_) => "Gap",
            WindowOp::Retention(_) => "Retention",
            WindowOp::GracePeriod(_) => "GracePeriod",
            WindowOp::EmitFinal => "EmitFinal",
        }
    }
}

/// Ordered list of window-configuration calls
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowDef {
    operations: Vec<WindowOp>,
}

impl WindowDef {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, op: WindowOp) -> Self {
        self.operations.push(op);
        self
    }

    pub fn tumbling_window(self) -> Self {
        self.push(WindowOp::TumblingWindow)
    }

    pub fn hopping_window(self) -> Self {
        self.push(WindowOp::HoppingWindow)
    }

    pub fn session_window(self) -> Self {
        self.push(WindowOp::SessionWindow)
    }

    pub fn size(self, size: Duration) -> Self {
        self.push(WindowOp::Size(size))
    }

    pub fn advance_by(self, advance: Duration) -> Self {
        self.push(WindowOp::AdvanceBy(advance))
    }

    pub fn gap(self, gap: Duration) -> Self {
        self.push(WindowOp::Gap(gap))
    }

    pub fn retention(self, retention: Duration) -> Self {
        self.push(WindowOp::Retention(retention))
    }

    pub fn grace_period(self, grace: Duration) -> Self {
        self.push(WindowOp::GracePeriod(grace))
    }

    pub fn emit_final(self) -> Self {
        self.push(WindowOp::EmitFinal)
    }

    pub fn operations(&self) -> &[WindowOp] {
        &self.operations
    }
}

/// Fixed, non-overlapping windows
pub struct TumblingWindow;

impl TumblingWindow {
    pub fn of(size: Duration) -> WindowDef {
        WindowDef::new().tumbling_window().size(size)
    }

    pub fn of_seconds(seconds: i64) -> WindowDef {
        Self::of(Duration::seconds(seconds))
    }

    pub fn of_minutes(minutes: i64) -> WindowDef {
        Self::of(Duration::minutes(minutes))
    }

    pub fn of_hours(hours: i64) -> WindowDef {
        Self::of(Duration::hours(hours))
    }
}

/// Fixed, overlapping windows
pub struct HoppingWindow;

impl HoppingWindow {
    pub fn of(size: Duration) -> WindowDef {
        WindowDef::new().hopping_window().size(size)
    }

    pub fn of_minutes(minutes: i64) -> WindowDef {
        Self::of(Duration::minutes(minutes))
    }
}

/// Activity-gap based windows
pub struct SessionWindow;

impl SessionWindow {
    pub fn of(gap: Duration) -> WindowDef {
        WindowDef::new().session_window().gap(gap)
    }

    pub fn of_minutes(minutes: i64) -> WindowDef {
        Self::of(Duration::minutes(minutes))
    }
}
