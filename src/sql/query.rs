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

// Minimal base query builder: the collaborator the CTE and window compilers
// compose with.
//
// Only what composition needs is here: a projection list, one target
// relation (table or CTE), AND-ed filters, grouping, ordering and paging.

use crate::dialect::Dialect;
use crate::error::{ComposeError, Result};
use crate::sql::cte::With;
use crate::sql::expr::{render_path, ColumnRef, Direction, Expr, OrderBy, SelectItem};
use crate::sql::{CompileSql, SqlFragment};
use crate::value::Value;

/// The relation a query reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// A physical table, optionally schema-qualified as `"schema.table"`.
    Table(String),
    /// A CTE declared by the attached `WITH` clause (or by an enclosing one).
    Cte(String),
}

impl Relation {
    pub fn name(&self) -> &str {
        match self {
            Relation::Table(name) | Relation::Cte(name) => name,
        }
    }

    fn render(&self, dialect: &Dialect, out: &mut SqlFragment) -> Result<()> {
        let name = self.name();
        if name.is_empty() {
            return Err(ComposeError::config("relation name must not be empty"));
        }
        match self {
            Relation::Table(_) => render_path(name, "table", dialect, out),
            Relation::Cte(_) => {
                out.push_str(&dialect.quote_ident(name));
                Ok(())
            }
        }
    }
}

/// A SELECT statement builder. Every method returns the updated value.
#[derive(Debug, Clone, Default)]
pub struct Select {
    pub(crate) with: Option<With>,
    pub(crate) distinct: bool,
    pub(crate) projection: Vec<SelectItem>,
    from: Option<Relation>,
    filters: Vec<Expr>,
    pub(crate) group_by: Vec<ColumnRef>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    pub fn new() -> Self {
        Select::default()
    }

    /// `SELECT ... FROM table`
    pub fn from_table(table: impl Into<String>) -> Self {
        Select::new().table(table)
    }

    /// Redirect the query to a physical table.
    pub fn table(self, table: impl Into<String>) -> Self {
        self.target(Relation::Table(table.into()))
    }

    /// Redirect the query to a CTE by name.
    pub fn from_cte(self, name: impl Into<String>) -> Self {
        self.target(Relation::Cte(name.into()))
    }

    /// Set the target relation, replacing any previous one.
    pub fn target(mut self, relation: Relation) -> Self {
        self.from = Some(relation);
        self
    }

    /// Attach a WITH clause as the leading clause of this query.
    pub fn with(mut self, with: With) -> Self {
        self.with = Some(with);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn column(mut self, item: impl Into<SelectItem>) -> Self {
        self.projection.push(item.into());
        self
    }

    pub fn columns<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SelectItem>,
    {
        self.projection.extend(items.into_iter().map(Into::into));
        self
    }

    /// Add a predicate; multiple filters are joined with AND.
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn group_by<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        self.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

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

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn relation(&self) -> Option<&Relation> {
        self.from.as_ref()
    }

    /// Everything after the WITH prefix.
    fn compile_body(&self, dialect: &Dialect) -> Result<SqlFragment> {
        let mut out = SqlFragment::raw("SELECT ");
        if self.distinct {
            out.push_str("DISTINCT ");
        }

        if self.projection.is_empty() {
            out.push_str("*");
        } else {
            for (i, item) in self.projection.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                item.render(dialect, &mut out)?;
            }
        }

        if let Some(from) = &self.from {
            out.push_str(" FROM ");
            from.render(dialect, &mut out)?;
        }

        if !self.filters.is_empty() {
            out.push_str(" WHERE ");
            for (i, f) in self.filters.iter().enumerate() {
                if i > 0 {
                    out.push_str(" AND ");
                }
                f.render(dialect, &mut out)?;
            }
        }

        if !self.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            for (i, c) in self.group_by.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                c.render(dialect, &mut out)?;
            }
        }

        if !self.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            for (i, o) in self.order_by.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                o.render(dialect, &mut out)?;
            }
        }

        if let Some(n) = self.limit {
            out.push_str(&format!(" LIMIT {n}"));
        }
        if let Some(n) = self.offset {
            out.push_str(&format!(" OFFSET {n}"));
        }
        Ok(out)
    }
}

impl CompileSql for Select {
    fn compile_sql(&self, dialect: &Dialect) -> Result<SqlFragment> {
        let body = self.compile_body(dialect)?;
        match &self.with {
            Some(with) => {
                if let Some(Relation::Cte(name)) = &self.from {
                    with.ensure_declared(name)?;
                }
                with.prefix(body, dialect)
            }
            // A CTE relation without a local WITH is a reference to a CTE
            // declared by an enclosing statement.
            None => Ok(body),
        }
    }
}

/// A complete statement written by hand, with its parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQuery {
    sql: String,
    params: Vec<Value>,
}

impl RawQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        RawQuery {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind the next `?` placeholder.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
}

impl CompileSql for RawQuery {
    fn compile_sql(&self, _dialect: &Dialect) -> Result<SqlFragment> {
        if self.sql.trim().is_empty() {
            return Err(ComposeError::config("raw query SQL is empty"));
        }
        Ok(SqlFragment::new(self.sql.clone(), self.params.clone()))
    }
}
