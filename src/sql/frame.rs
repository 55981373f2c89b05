//   Copyright (c) 2024-2026 Anton Kundenko <singaraiona@gmail.com>
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

// Window frame clauses: ROWS / RANGE / GROUPS with one or two bounds.
//
// Offsets are rendered as integer literals, so a frame never contributes
// parameters.

use crate::error::{ComposeError, Result};

/// Frame unit keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUnit {
    Rows,
    Range,
    /// Peer-group frames (PostgreSQL 11+, SQLite 3.28+).
    Groups,
}

impl FrameUnit {
    pub fn as_sql(self) -> &'static str {
        match self {
            FrameUnit::Rows => "ROWS",
            FrameUnit::Range => "RANGE",
            FrameUnit::Groups => "GROUPS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    UnboundedPreceding,
    Preceding,
    CurrentRow,
    Following,
    UnboundedFollowing,
}

impl BoundKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            BoundKind::UnboundedPreceding => "UNBOUNDED PRECEDING",
            BoundKind::Preceding => "PRECEDING",
            BoundKind::CurrentRow => "CURRENT ROW",
            BoundKind::Following => "FOLLOWING",
            BoundKind::UnboundedFollowing => "UNBOUNDED FOLLOWING",
        }
    }

    fn takes_offset(self) -> bool {
        matches!(self, BoundKind::Preceding | BoundKind::Following)
    }
}

/// One end of a window frame.
///
/// `offset` must be present and non-negative for `Preceding`/`Following` and
/// absent for every other kind. Checked when the frame is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBound {
    pub kind: BoundKind,
    pub offset: Option<i64>,
}

impl FrameBound {
    pub const fn new(kind: BoundKind, offset: Option<i64>) -> Self {
        FrameBound { kind, offset }
    }

    pub const fn unbounded_preceding() -> Self {
        FrameBound::new(BoundKind::UnboundedPreceding, None)
    }

    pub const fn preceding(offset: i64) -> Self {
        FrameBound::new(BoundKind::Preceding, Some(offset))
    }

    pub const fn current_row() -> Self {
        FrameBound::new(BoundKind::CurrentRow, None)
    }

    pub const fn following(offset: i64) -> Self {
        FrameBound::new(BoundKind::Following, Some(offset))
    }

    pub const fn unbounded_following() -> Self {
        FrameBound::new(BoundKind::UnboundedFollowing, None)
    }

    fn validate(&self) -> Result<()> {
        let kind = self.kind.as_sql();
        match (self.kind.takes_offset(), self.offset) {
            (true, None) => Err(ComposeError::config(format!(
                "{kind} frame bound requires an offset"
            ))),
            (true, Some(n)) if n < 0 => Err(ComposeError::config(format!(
                "frame offset must be non-negative, got {n} {kind}"
            ))),
            (false, Some(n)) => Err(ComposeError::config(format!(
                "{kind} frame bound does not take an offset (got {n})"
            ))),
            _ => Ok(()),
        }
    }

    /// Numeric ordering for frame bounds (lower = earlier in the window).
    fn position(&self) -> i64 {
        let n = self.offset.unwrap_or(0);
        match self.kind {
            BoundKind::UnboundedPreceding => i64::MIN,
            BoundKind::Preceding => -n,
            BoundKind::CurrentRow => 0,
            BoundKind::Following => n,
            BoundKind::UnboundedFollowing => i64::MAX,
        }
    }

    fn write_to(&self, out: &mut String) {
        if let Some(n) = self.offset {
            out.push_str(&n.to_string());
            out.push(' ');
        }
        out.push_str(self.kind.as_sql());
    }
}

/// A frame clause. Without `end` only the start bound is emitted; with it,
/// the `BETWEEN start AND end` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpec {
    pub unit: FrameUnit,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

impl FrameSpec {
    pub const fn new(unit: FrameUnit, start: FrameBound, end: Option<FrameBound>) -> Self {
        FrameSpec { unit, start, end }
    }

    pub const fn rows(start: FrameBound) -> Self {
        FrameSpec::new(FrameUnit::Rows, start, None)
    }

    pub const fn rows_between(start: FrameBound, end: FrameBound) -> Self {
        FrameSpec::new(FrameUnit::Rows, start, Some(end))
    }

    pub const fn range(start: FrameBound) -> Self {
        FrameSpec::new(FrameUnit::Range, start, None)
    }

    pub const fn range_between(start: FrameBound, end: FrameBound) -> Self {
        FrameSpec::new(FrameUnit::Range, start, Some(end))
    }

    pub const fn groups(start: FrameBound) -> Self {
        FrameSpec::new(FrameUnit::Groups, start, None)
    }

    pub const fn groups_between(start: FrameBound, end: FrameBound) -> Self {
        FrameSpec::new(FrameUnit::Groups, start, Some(end))
    }

    /// True when either bound carries an offset.
    pub fn has_offset(&self) -> bool {
        self.start.offset.is_some() || self.end.is_some_and(|e| e.offset.is_some())
    }

    pub fn validate(&self) -> Result<()> {
        self.start.validate()?;
        if let Some(end) = &self.end {
            end.validate()?;
        }

        if self.start.kind == BoundKind::UnboundedFollowing {
            return Err(ComposeError::config(
                "window frame cannot start at UNBOUNDED FOLLOWING",
            ));
        }
        if self
            .end
            .is_some_and(|e| e.kind == BoundKind::UnboundedPreceding)
        {
            return Err(ComposeError::config(
                "window frame cannot end at UNBOUNDED PRECEDING",
            ));
        }

        // The single-bound form ends at CURRENT ROW
        let end = self.end.unwrap_or(FrameBound::current_row());
        if self.start.position() > end.position() {
            return Err(ComposeError::config(
                "window frame start must not be after frame end",
            ));
        }
        Ok(())
    }
}

/// Render a frame clause, e.g. `ROWS BETWEEN 2 PRECEDING AND 2 FOLLOWING`.
pub fn render_frame(frame: &FrameSpec) -> Result<String> {
    frame.validate()?;

    let mut out = String::from(frame.unit.as_sql());
    out.push(' ');
    match &frame.end {
        None => frame.start.write_to(&mut out),
        Some(end) => {
            out.push_str("BETWEEN ");
            frame.start.write_to(&mut out);
            out.push_str(" AND ");
            end.write_to(&mut out);
        }
    }
    Ok(out)
}
