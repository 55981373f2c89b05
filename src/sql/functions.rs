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

// Window function constructors, one per supported SQL function.
//
// Columns are passed as identifiers; numeric arguments (buckets, offsets,
// defaults) are bound parameters.

use crate::sql::expr::{ColumnRef, Expr};
use crate::sql::window::{WindowExpr, WindowFunc};
use crate::value::Value;

fn column(c: impl Into<ColumnRef>) -> Expr {
    Expr::Column(c.into())
}

fn bound(v: impl Into<Value>) -> Expr {
    Expr::Value(v.into())
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

pub fn row_number() -> WindowExpr {
    WindowExpr::new(WindowFunc::RowNumber, vec![])
}

pub fn rank() -> WindowExpr {
    WindowExpr::new(WindowFunc::Rank, vec![])
}

pub fn dense_rank() -> WindowExpr {
    WindowExpr::new(WindowFunc::DenseRank, vec![])
}

pub fn percent_rank() -> WindowExpr {
    WindowExpr::new(WindowFunc::PercentRank, vec![])
}

pub fn cume_dist() -> WindowExpr {
    WindowExpr::new(WindowFunc::CumeDist, vec![])
}

/// `NTILE(?)` splitting each partition into `buckets` groups.
pub fn ntile(buckets: i64) -> WindowExpr {
    WindowExpr::new(WindowFunc::Ntile, vec![bound(buckets)])
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// `LAG(column, ?)`
pub fn lag(c: impl Into<ColumnRef>, offset: i64) -> WindowExpr {
    WindowExpr::new(WindowFunc::Lag, vec![column(c), bound(offset)])
}

/// `LAG(column, ?, ?)` with a default for rows that have no predecessor.
pub fn lag_or(c: impl Into<ColumnRef>, offset: i64, default: impl Into<Value>) -> WindowExpr {
    WindowExpr::new(
        WindowFunc::Lag,
        vec![column(c), bound(offset), bound(default)],
    )
}

/// `LEAD(column, ?)`
pub fn lead(c: impl Into<ColumnRef>, offset: i64) -> WindowExpr {
    WindowExpr::new(WindowFunc::Lead, vec![column(c), bound(offset)])
}

pub fn lead_or(c: impl Into<ColumnRef>, offset: i64, default: impl Into<Value>) -> WindowExpr {
    WindowExpr::new(
        WindowFunc::Lead,
        vec![column(c), bound(offset), bound(default)],
    )
}

pub fn first_value(c: impl Into<ColumnRef>) -> WindowExpr {
    WindowExpr::new(WindowFunc::FirstValue, vec![column(c)])
}

pub fn last_value(c: impl Into<ColumnRef>) -> WindowExpr {
    WindowExpr::new(WindowFunc::LastValue, vec![column(c)])
}

/// `NTH_VALUE(column, ?)`, `n` counted from 1.
pub fn nth_value(c: impl Into<ColumnRef>, n: i64) -> WindowExpr {
    WindowExpr::new(WindowFunc::NthValue, vec![column(c), bound(n)])
}

// ---------------------------------------------------------------------------
// Aggregates over a window
// ---------------------------------------------------------------------------

pub fn count(c: impl Into<ColumnRef>) -> WindowExpr {
    WindowExpr::new(WindowFunc::Count, vec![column(c)])
}

/// `COUNT(*)`
pub fn count_all() -> WindowExpr {
    WindowExpr::new(WindowFunc::Count, vec![Expr::Star])
}

pub fn sum(c: impl Into<ColumnRef>) -> WindowExpr {
    WindowExpr::new(WindowFunc::Sum, vec![column(c)])
}

pub fn avg(c: impl Into<ColumnRef>) -> WindowExpr {
    WindowExpr::new(WindowFunc::Avg, vec![column(c)])
}

pub fn max(c: impl Into<ColumnRef>) -> WindowExpr {
    WindowExpr::new(WindowFunc::Max, vec![column(c)])
}

pub fn min(c: impl Into<ColumnRef>) -> WindowExpr {
    WindowExpr::new(WindowFunc::Min, vec![column(c)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    fn sql(w: WindowExpr) -> (String, Vec<Value>) {
        let f = w.compile(&Dialect::generic()).unwrap();
        (f.sql, f.params)
    }

    #[test]
    fn test_ranking_functions() {
        assert_eq!(sql(row_number()).0, "ROW_NUMBER() OVER ()");
        assert_eq!(sql(rank()).0, "RANK() OVER ()");
        assert_eq!(sql(dense_rank()).0, "DENSE_RANK() OVER ()");
        assert_eq!(sql(percent_rank()).0, "PERCENT_RANK() OVER ()");
        assert_eq!(sql(cume_dist()).0, "CUME_DIST() OVER ()");

        let (s, p) = sql(ntile(4).order_by_desc("salary"));
        assert_eq!(s, "NTILE(?) OVER (ORDER BY salary DESC)");
        assert_eq!(p, vec![Value::Int(4)]);
    }

    #[test]
    fn test_value_functions() {
        let (s, p) = sql(lag("salary", 1));
        assert_eq!(s, "LAG(salary, ?) OVER ()");
        assert_eq!(p, vec![Value::Int(1)]);

        let (s, p) = sql(lead_or("salary", 2, 0));
        assert_eq!(s, "LEAD(salary, ?, ?) OVER ()");
        assert_eq!(p, vec![Value::Int(2), Value::Int(0)]);

        let (s, p) = sql(lag_or("nickname", 1, "n/a"));
        assert_eq!(s, "LAG(nickname, ?, ?) OVER ()");
        assert_eq!(p, vec![Value::Int(1), Value::from("n/a")]);

        assert_eq!(sql(lead("salary", 1)).0, "LEAD(salary, ?) OVER ()");
        assert_eq!(sql(first_value("salary")).0, "FIRST_VALUE(salary) OVER ()");
        assert_eq!(sql(last_value("salary")).0, "LAST_VALUE(salary) OVER ()");

        let (s, p) = sql(nth_value("salary", 3));
        assert_eq!(s, "NTH_VALUE(salary, ?) OVER ()");
        assert_eq!(p, vec![Value::Int(3)]);
    }

    #[test]
    fn test_aggregate_functions() {
        assert_eq!(sql(count("amount")).0, "COUNT(amount) OVER ()");
        assert_eq!(sql(count_all()).0, "COUNT(*) OVER ()");
        assert_eq!(sql(sum("amount")).0, "SUM(amount) OVER ()");
        assert_eq!(sql(avg("amount")).0, "AVG(amount) OVER ()");
        assert_eq!(sql(max("amount")).0, "MAX(amount) OVER ()");
        assert_eq!(sql(min("amount")).0, "MIN(amount) OVER ()");
        assert!(sql(sum("amount")).1.is_empty());
    }

    #[test]
    fn test_qualified_argument() {
        assert_eq!(
            sql(sum("sales.amount").partition_by(["sales.customer_id"])).0,
            "SUM(sales.amount) OVER (PARTITION BY sales.customer_id)"
        );
    }
}
