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

// Window expressions: FUNC(args) OVER (PARTITION BY ... ORDER BY ... frame).
//
// Builder methods consume and return the value, so two window expressions
// can never share an OVER clause. Emission order inside OVER is fixed: partition,
// order, frame.

use log::debug;

use crate::dialect::{check_alignment, Dialect};
use crate::error::{ComposeError, Result};
use crate::sql::expr::{render_list, ColumnRef, Direction, Expr, OrderBy, SelectItem};
use crate::sql::frame::{render_frame, FrameBound, FrameSpec, FrameUnit};
use crate::sql::SqlFragment;

/// Window function variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowFunc {
    // ranking
    RowNumber,
    Rank,
    DenseRank,
    PercentRank,
    CumeDist,
    Ntile,
    // value
    Lag,
    Lead,
    FirstValue,
    LastValue,
    NthValue,
    // aggregate over a window
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl WindowFunc {
    /// SQL function name.
    pub fn name(self) -> &'static str {
        match self {
            WindowFunc::RowNumber => "ROW_NUMBER",
            WindowFunc::Rank => "RANK",
            WindowFunc::DenseRank => "DENSE_RANK",
            WindowFunc::PercentRank => "PERCENT_RANK",
            WindowFunc::CumeDist => "CUME_DIST",
            WindowFunc::Ntile => "NTILE",
            WindowFunc::Lag => "LAG",
            WindowFunc::Lead => "LEAD",
            WindowFunc::FirstValue => "FIRST_VALUE",
            WindowFunc::LastValue => "LAST_VALUE",
            WindowFunc::NthValue => "NTH_VALUE",
            WindowFunc::Count => "COUNT",
            WindowFunc::Sum => "SUM",
            WindowFunc::Avg => "AVG",
            WindowFunc::Max => "MAX",
            WindowFunc::Min => "MIN",
        }
    }

    /// Accepted argument count, inclusive.
    pub fn arity(self) -> (usize, usize) {
        match self {
            WindowFunc::RowNumber
            | WindowFunc::Rank
            | WindowFunc::DenseRank
            | WindowFunc::PercentRank
            | WindowFunc::CumeDist => (0, 0),
            WindowFunc::Ntile => (1, 1),
            // value, offset, default
            WindowFunc::Lag | WindowFunc::Lead => (1, 3),
            WindowFunc::FirstValue | WindowFunc::LastValue => (1, 1),
            WindowFunc::NthValue => (2, 2),
            WindowFunc::Count
            | WindowFunc::Sum
            | WindowFunc::Avg
            | WindowFunc::Max
            | WindowFunc::Min => (1, 1),
        }
    }

    pub fn is_ranking(self) -> bool {
        matches!(
            self,
            WindowFunc::RowNumber
                | WindowFunc::Rank
                | WindowFunc::DenseRank
                | WindowFunc::PercentRank
                | WindowFunc::CumeDist
                | WindowFunc::Ntile
        )
    }

    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            WindowFunc::Count
                | WindowFunc::Sum
                | WindowFunc::Avg
                | WindowFunc::Max
                | WindowFunc::Min
        )
    }
}

// ---------------------------------------------------------------------------
// WindowSpec
// ---------------------------------------------------------------------------

/// The contents of an OVER clause. Column order is kept exactly as declared,
/// repeats included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSpec {
    pub partition_by: Vec<ColumnRef>,
    pub order_by: Vec<OrderBy>,
    pub frame: Option<FrameSpec>,
}

impl WindowSpec {
    pub fn new() -> Self {
        WindowSpec::default()
    }

    /// Append partition columns.
    pub fn partition_by<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        self.partition_by
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append one ordering column.
    pub fn order_by(mut self, column: impl Into<ColumnRef>, direction: Direction) -> Self {
        self.order_by.push(OrderBy::new(column, direction));
        self
    }

    pub fn order_by_asc(self, column: impl Into<ColumnRef>) -> Self {
        self.order_by(column, Direction::Asc)
    }

    pub fn order_by_desc(self, column: impl Into<ColumnRef>) -> Self {
        self.order_by(column, Direction::Desc)
    }

    /// Set (or replace) the frame clause.
    pub fn frame(mut self, frame: FrameSpec) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn rows(self, start: FrameBound) -> Self {
        self.frame(FrameSpec::rows(start))
    }

    pub fn rows_between(self, start: FrameBound, end: FrameBound) -> Self {
        self.frame(FrameSpec::rows_between(start, end))
    }

    pub fn range(self, start: FrameBound) -> Self {
        self.frame(FrameSpec::range(start))
    }

    pub fn range_between(self, start: FrameBound, end: FrameBound) -> Self {
        self.frame(FrameSpec::range_between(start, end))
    }

    pub fn groups_between(self, start: FrameBound, end: FrameBound) -> Self {
        self.frame(FrameSpec::groups_between(start, end))
    }

    /// No partition, no order, no frame: `OVER ()`.
    pub fn is_empty(&self) -> bool {
        self.partition_by.is_empty() && self.order_by.is_empty() && self.frame.is_none()
    }
}

// ---------------------------------------------------------------------------
// WindowExpr
// ---------------------------------------------------------------------------

/// A window function call together with its OVER specification.
///
/// Built by the constructors in [`crate::sql::functions`]. Compiling never
/// mutates it, so one value can be reused across many queries.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowExpr {
    pub func: WindowFunc,
    pub args: Vec<Expr>,
    pub spec: WindowSpec,
}

impl WindowExpr {
    pub fn new(func: WindowFunc, args: Vec<Expr>) -> Self {
        WindowExpr {
            func,
            args,
            spec: WindowSpec::default(),
        }
    }

    /// Replace the whole window specification.
    pub fn over(mut self, spec: WindowSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn partition_by<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        self.spec = self.spec.partition_by(columns);
        self
    }

    pub fn order_by(mut self, column: impl Into<ColumnRef>, direction: Direction) -> Self {
        self.spec = self.spec.order_by(column, direction);
        self
    }

    pub fn order_by_asc(self, column: impl Into<ColumnRef>) -> Self {
        self.order_by(column, Direction::Asc)
    }

    pub fn order_by_desc(self, column: impl Into<ColumnRef>) -> Self {
        self.order_by(column, Direction::Desc)
    }

    pub fn frame(mut self, frame: FrameSpec) -> Self {
        self.spec = self.spec.frame(frame);
        self
    }

    pub fn rows_between(self, start: FrameBound, end: FrameBound) -> Self {
        self.frame(FrameSpec::rows_between(start, end))
    }

    pub fn range_between(self, start: FrameBound, end: FrameBound) -> Self {
        self.frame(FrameSpec::range_between(start, end))
    }

    /// Projection item `FUNC(...) OVER (...) AS alias`.
    pub fn alias(self, alias: impl Into<String>) -> SelectItem {
        Expr::from(self).alias(alias)
    }

    pub fn compile(&self, dialect: &Dialect) -> Result<SqlFragment> {
        compile_window(self, dialect)
    }
}

/// Compile a window expression into a self-contained column expression.
///
/// Parameters are the function's own argument values; partition and order
/// columns are identifiers and never bind anything.
pub fn compile_window(w: &WindowExpr, dialect: &Dialect) -> Result<SqlFragment> {
    let name = w.func.name();
    let (min, max) = w.func.arity();
    if w.args.len() < min || w.args.len() > max {
        let expected = if min == max {
            format!("{min}")
        } else {
            format!("{min} to {max}")
        };
        return Err(ComposeError::config(format!(
            "{name} expects {expected} argument(s), got {}",
            w.args.len()
        )));
    }

    let spec = &w.spec;
    let mut out = SqlFragment::raw(name);
    out.push_str("(");
    render_list(&w.args, dialect, &mut out)?;
    out.push_str(") OVER (");

    if !spec.partition_by.is_empty() {
        out.push_str("PARTITION BY ");
        for (i, column) in spec.partition_by.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            column.render(dialect, &mut out)?;
        }
    }

    if !spec.order_by.is_empty() {
        if !spec.partition_by.is_empty() {
            out.push_str(" ");
        }
        out.push_str("ORDER BY ");
        for (i, order) in spec.order_by.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            order.render(dialect, &mut out)?;
        }
    }

    if let Some(frame) = &spec.frame {
        check_frame_ordering(frame, spec)?;
        if !spec.partition_by.is_empty() || !spec.order_by.is_empty() {
            out.push_str(" ");
        }
        out.push_str(&render_frame(frame)?);
    }

    out.push_str(")");
    check_alignment(&out)?;

    debug!(
        "compiled {name} window: {} partition, {} order column(s), frame={}, {} param(s)",
        spec.partition_by.len(),
        spec.order_by.len(),
        spec.frame.is_some(),
        out.params.len()
    );
    Ok(out)
}

/// RANGE offsets are measured on the single sort key; GROUPS needs peers.
fn check_frame_ordering(frame: &FrameSpec, spec: &WindowSpec) -> Result<()> {
    match frame.unit {
        FrameUnit::Range if frame.has_offset() && spec.order_by.len() != 1 => {
            Err(ComposeError::config(format!(
                "RANGE frame with an offset requires exactly one ORDER BY column, got {}",
                spec.order_by.len()
            )))
        }
        FrameUnit::Groups if spec.order_by.is_empty() => Err(ComposeError::config(
            "GROUPS frame requires an ORDER BY clause",
        )),
        _ => Ok(()),
    }
}
