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

// sql: CTE and window-expression compilers plus the minimal base query
// builder they compose with.
//
// Every compiler emits a `SqlFragment` whose `?` markers line up one-to-one
// with its parameter list. Fragments nest by concatenation; a `Dialect` turns
// the outermost fragment into a `Statement` in a single final pass.

pub mod cte;
pub mod expr;
pub mod frame;
pub mod functions;
pub mod query;
pub mod window;

use crate::dialect::Dialect;
use crate::error::Result;
use crate::value::Value;

/// SQL text with `?` markers and the parameters bound to them, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlFragment {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        SqlFragment {
            sql: sql.into(),
            params,
        }
    }

    /// A fragment without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        SqlFragment::new(sql, Vec::new())
    }

    pub fn push_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    /// Emit one `?` marker bound to `value`.
    pub fn push_param(&mut self, value: Value) {
        self.sql.push('?');
        self.params.push(value);
    }

    /// Append `other`'s text and its parameters after ours.
    pub fn append(&mut self, other: SqlFragment) {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
    }

    /// True when the text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.sql.trim().is_empty()
    }
}

/// A finished statement in the target dialect, ready for a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// The collaborator seam: anything that can compile itself into a fragment.
///
/// Implemented by the bundled `Select` and `RawQuery` builders and by composed
/// queries. An external query builder plugs in by implementing this trait.
pub trait CompileSql {
    /// Compile into a `?`-marked fragment. Identifiers follow `dialect`.
    fn compile_sql(&self, dialect: &Dialect) -> Result<SqlFragment>;

    /// Compile and finalise into a statement for `dialect`.
    fn to_statement(&self, dialect: &Dialect) -> Result<Statement> {
        dialect.finalize(self.compile_sql(dialect)?)
    }
}

impl CompileSql for SqlFragment {
    fn compile_sql(&self, _dialect: &Dialect) -> Result<SqlFragment> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_append_keeps_param_order() {
        let mut a = SqlFragment::raw("a = ");
        a.push_param(Value::Int(1));
        let mut b = SqlFragment::raw(" AND b = ");
        b.push_param(Value::Int(2));
        a.append(b);
        assert_eq!(a.sql, "a = ? AND b = ?");
        assert_eq!(a.params, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_blank_fragment() {
        assert!(SqlFragment::raw("  ").is_blank());
        assert!(SqlFragment::default().is_blank());
        assert!(!SqlFragment::raw("SELECT 1").is_blank());
    }
}
