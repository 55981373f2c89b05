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

// CTE compiler: assembles `WITH name AS (...), ... <base>` from compiled
// subqueries, and the `With` builder that drives it.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::dialect::{check_alignment, Dialect};
use crate::error::{ComposeError, Result};
use crate::sql::expr::{Expr, SelectItem};
use crate::sql::query::Select;
use crate::sql::{CompileSql, SqlFragment};

/// A compiled CTE: its name, optional column list and body fragment.
///
/// The body is opaque. Window expressions or nested CTEs inside it are
/// emitted verbatim between the parentheses.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSubquery {
    pub name: String,
    pub columns: Vec<String>,
    pub body: SqlFragment,
}

impl NamedSubquery {
    pub fn new(name: impl Into<String>, body: SqlFragment) -> Self {
        NamedSubquery {
            name: name.into(),
            columns: Vec::new(),
            body,
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Compile `query` and name the result.
    pub fn compile(
        name: impl Into<String>,
        query: &dyn CompileSql,
        dialect: &Dialect,
    ) -> Result<Self> {
        Ok(NamedSubquery::new(name, query.compile_sql(dialect)?))
    }
}

/// Prefix `base` with a WITH clause declaring `ctes` in order.
///
/// Parameters come out as every CTE's parameters in declaration order,
/// followed by the base query's.
pub fn compile_with(
    ctes: &[NamedSubquery],
    base: SqlFragment,
    dialect: &Dialect,
) -> Result<SqlFragment> {
    if ctes.is_empty() {
        return Err(ComposeError::config("WITH clause requires at least one CTE"));
    }
    if base.is_blank() {
        return Err(ComposeError::config("base query of a WITH clause is empty"));
    }

    let mut seen = HashSet::with_capacity(ctes.len());
    for cte in ctes {
        if cte.name.is_empty() {
            return Err(ComposeError::config("CTE name must not be empty"));
        }
        if !seen.insert(cte.name.as_str()) {
            return Err(ComposeError::config(format!(
                "duplicate CTE name '{}'",
                cte.name
            )));
        }
        if cte.body.is_blank() {
            return Err(ComposeError::config(format!(
                "CTE '{}' has an empty body",
                cte.name
            )));
        }
        if cte.columns.iter().any(|c| c.is_empty()) {
            return Err(ComposeError::config(format!(
                "CTE '{}' has an empty column name",
                cte.name
            )));
        }
    }

    let mut out = SqlFragment::raw("WITH ");
    for (i, cte) in ctes.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&dialect.quote_ident(&cte.name));
        if !cte.columns.is_empty() {
            let cols: Vec<String> = cte.columns.iter().map(|c| dialect.quote_ident(c)).collect();
            out.push_str(" (");
            out.push_str(&cols.join(", "));
            out.push_str(")");
        }
        out.push_str(" AS (");
        out.append(cte.body.clone());
        out.push_str(")");
    }
    out.push_str(" ");
    out.append(base);
    check_alignment(&out)?;

    debug!(
        "compiled WITH clause: {} CTE(s), {} parameter(s)",
        ctes.len(),
        out.params.len()
    );
    Ok(out)
}

// ---------------------------------------------------------------------------
// With builder
// ---------------------------------------------------------------------------

type SharedQuery = Arc<dyn CompileSql + Send + Sync>;

#[derive(Clone)]
struct CteDefinition {
    name: String,
    columns: Vec<String>,
    query: SharedQuery,
}

/// An ordered list of CTE declarations, compiled lazily against a dialect.
#[derive(Clone, Default)]
pub struct With {
    ctes: Vec<CteDefinition>,
}

impl fmt::Debug for With {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("With").field("ctes", &self.names()).finish()
    }
}

impl With {
    pub fn new() -> Self {
        With::default()
    }

    /// Declare `name AS (query)`.
    pub fn cte<Q>(self, name: impl Into<String>, query: Q) -> Self
    where
        Q: CompileSql + Send + Sync + 'static,
    {
        self.cte_with_columns(name, Vec::<String>::new(), query)
    }

    /// Declare `name (c1, c2, ...) AS (query)`.
    pub fn cte_with_columns<Q, I, S>(mut self, name: impl Into<String>, columns: I, query: Q) -> Self
    where
        Q: CompileSql + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ctes.push(CteDefinition {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            query: Arc::new(query),
        });
        self
    }

    /// Declare `name AS (SELECT *, <windows> FROM ...)` on top of `source`.
    ///
    /// `source` keeps its relation, filters, ordering and paging. Its
    /// projection is replaced, and GROUP BY and DISTINCT are dropped since
    /// neither is valid alongside `*` plus per-row windows. This is the usual
    /// shape for ranking rows and keeping the first per group.
    pub fn windowed<I, W>(self, name: impl Into<String>, source: Select, windows: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<SelectItem>,
    {
        let mut body = source;
        body.distinct = false;
        body.group_by.clear();
        body.projection = vec![SelectItem::from(Expr::Star)];
        body.projection.extend(windows.into_iter().map(Into::into));
        self.cte(name, body)
    }

    /// Declared names, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.ctes.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.ctes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ctes.is_empty()
    }

    /// Prefix an arbitrary base query with this WITH clause.
    pub fn attach<Q>(self, base: Q) -> ComposedQuery
    where
        Q: CompileSql + Send + Sync + 'static,
    {
        ComposedQuery {
            with: self,
            base: Arc::new(base),
        }
    }

    /// A query reading from the CTE `name`, carrying this WITH clause.
    pub fn select_from(&self, name: impl Into<String>) -> Select {
        Select::new().from_cte(name).with(self.clone())
    }

    pub(crate) fn ensure_declared(&self, name: &str) -> Result<()> {
        if self.ctes.iter().any(|c| c.name == name) {
            Ok(())
        } else {
            Err(ComposeError::config(format!(
                "CTE '{name}' is not declared in the WITH clause"
            )))
        }
    }

    pub(crate) fn compile_ctes(&self, dialect: &Dialect) -> Result<Vec<NamedSubquery>> {
        self.ctes
            .iter()
            .map(|c| {
                Ok(NamedSubquery::compile(c.name.clone(), c.query.as_ref(), dialect)?
                    .with_columns(c.columns.iter().cloned()))
            })
            .collect()
    }

    pub(crate) fn prefix(&self, base: SqlFragment, dialect: &Dialect) -> Result<SqlFragment> {
        compile_with(&self.compile_ctes(dialect)?, base, dialect)
    }
}

/// A WITH clause attached to a base query supplied by the caller.
#[derive(Clone)]
pub struct ComposedQuery {
    with: With,
    base: SharedQuery,
}

impl fmt::Debug for ComposedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedQuery")
            .field("with", &self.with)
            .finish_non_exhaustive()
    }
}

impl CompileSql for ComposedQuery {
    fn compile_sql(&self, dialect: &Dialect) -> Result<SqlFragment> {
        let base = self.base.compile_sql(dialect)?;
        self.with.prefix(base, dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::expr::col;
    use crate::sql::functions::row_number;
    use crate::sql::query::RawQuery;
    use crate::value::Value;

    fn generic() -> Dialect {
        Dialect::generic()
    }

    #[test]
    fn test_two_ctes_keep_declaration_order() {
        let ctes = vec![
            NamedSubquery::new("cte_one", SqlFragment::raw("SELECT 1")),
            NamedSubquery::new("cte_two", SqlFragment::raw("SELECT 2")),
        ];
        let f = compile_with(
            &ctes,
            SqlFragment::raw("SELECT * FROM cte_one JOIN cte_two ON 1 = 1"),
            &generic(),
        )
        .unwrap();
        assert_eq!(
            f.sql,
            "WITH cte_one AS (SELECT 1), cte_two AS (SELECT 2) \
             SELECT * FROM cte_one JOIN cte_two ON 1 = 1"
        );
    }

    #[test]
    fn test_params_follow_cte_then_base_order() {
        let ctes = vec![
            NamedSubquery::new("cte_one", SqlFragment::new("SELECT ?", vec![Value::Int(1)])),
            NamedSubquery::new("cte_two", SqlFragment::new("SELECT ?", vec![Value::Int(2)])),
        ];
        let base = SqlFragment::new("SELECT * FROM cte_one WHERE ?", vec![Value::Int(3)]);
        let f = compile_with(&ctes, base, &generic()).unwrap();
        assert_eq!(f.params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_duplicate_names() {
        let ctes = vec![
            NamedSubquery::new("dup", SqlFragment::raw("SELECT 1")),
            NamedSubquery::new("dup", SqlFragment::raw("SELECT 2")),
        ];
        let err = compile_with(&ctes, SqlFragment::raw("SELECT 1"), &generic()).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "configuration error: duplicate CTE name 'dup'");
    }

    #[test]
    fn test_unbound_placeholder_in_body() {
        let ctes = vec![NamedSubquery::new("cte_one", SqlFragment::raw("SELECT ?"))];
        let err = compile_with(&ctes, SqlFragment::raw("SELECT * FROM cte_one"), &generic())
            .unwrap_err();
        assert!(err.is_compilation());
        assert_eq!(
            err,
            ComposeError::ParameterMismatch {
                placeholders: 1,
                params: 0
            }
        );

        // Extra parameters are just as wrong as missing ones
        let base = SqlFragment::new("SELECT * FROM cte_one", vec![Value::Int(7)]);
        let ctes = vec![NamedSubquery::new("cte_one", SqlFragment::raw("SELECT 1"))];
        let err = compile_with(&ctes, base, &generic()).unwrap_err();
        assert!(err.is_compilation());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let ctes = vec![
            NamedSubquery::new("dept_totals", SqlFragment::raw("SELECT 1")),
            NamedSubquery::new("Dept_totals", SqlFragment::raw("SELECT 2")),
        ];
        let f = compile_with(&ctes, SqlFragment::raw("SELECT 1"), &generic()).unwrap();
        assert!(f.sql.starts_with("WITH dept_totals AS (SELECT 1), \"Dept_totals\" AS (SELECT 2)"));
    }

    #[test]
    fn test_empty_inputs() {
        let err = compile_with(&[], SqlFragment::raw("SELECT 1"), &generic()).unwrap_err();
        assert!(err.is_configuration());

        let ctes = vec![NamedSubquery::new("cte_one", SqlFragment::raw("SELECT 1"))];
        let err = compile_with(&ctes, SqlFragment::raw("  "), &generic()).unwrap_err();
        assert!(err.is_configuration());

        let ctes = vec![NamedSubquery::new("", SqlFragment::raw("SELECT 1"))];
        let err = compile_with(&ctes, SqlFragment::raw("SELECT 1"), &generic()).unwrap_err();
        assert!(err.is_configuration());

        let ctes = vec![NamedSubquery::new("cte_one", SqlFragment::default())];
        let err = compile_with(&ctes, SqlFragment::raw("SELECT 1"), &generic()).unwrap_err();
        assert!(err.to_string().contains("empty body"));
    }

    #[test]
    fn test_column_list() {
        let ctes = vec![NamedSubquery::new("dept_totals", SqlFragment::raw("SELECT 1, 2"))
            .with_columns(["dept", "Total Pay"])];
        let f = compile_with(&ctes, SqlFragment::raw("SELECT * FROM dept_totals"), &generic()).unwrap();
        assert_eq!(
            f.sql,
            "WITH dept_totals (dept, \"Total Pay\") AS (SELECT 1, 2) SELECT * FROM dept_totals"
        );
    }

    #[test]
    fn test_window_body_is_opaque() {
        let body = Select::from_table("employees")
            .column(Expr::Star)
            .column(row_number().order_by_desc("salary").alias("rn"));
        let with = With::new().cte("ranked", body);
        let f = with
            .attach(RawQuery::new("SELECT * FROM ranked"))
            .compile_sql(&generic())
            .unwrap();
        assert_eq!(
            f.sql,
            "WITH ranked AS (SELECT *, ROW_NUMBER() OVER (ORDER BY salary DESC) AS rn \
             FROM employees) SELECT * FROM ranked"
        );
    }

    #[test]
    fn test_select_from_cte() {
        let with = With::new().cte(
            "paid",
            Select::from_table("shop_orders").filter(col("paid_at").is_not_null()),
        );
        let q = with.select_from("paid").filter(col("amount").gt(10));
        let f = q.compile_sql(&generic()).unwrap();
        assert_eq!(
            f.sql,
            "WITH paid AS (SELECT * FROM shop_orders WHERE paid_at IS NOT NULL) \
             SELECT * FROM paid WHERE amount > ?"
        );
        assert_eq!(f.params, vec![Value::Int(10)]);
    }

    #[test]
    fn test_select_from_undeclared_cte() {
        let with = With::new().cte("paid", Select::from_table("shop_orders"));
        let err = with.select_from("unpaid").compile_sql(&generic()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("'unpaid'"));
    }

    #[test]
    fn test_windowed_drops_grouping() {
        let source = Select::from_table("wx_users")
            .distinct()
            .group_by(["unionid"])
            .filter(col("unionid").is_not_null());
        let with = With::new().windowed(
            "ranked",
            source,
            [row_number().partition_by(["unionid"]).alias("rn")],
        );
        let f = with.select_from("ranked").compile_sql(&generic()).unwrap();
        assert_eq!(
            f.sql,
            "WITH ranked AS (SELECT *, ROW_NUMBER() OVER (PARTITION BY unionid) AS rn \
             FROM wx_users WHERE unionid IS NOT NULL) SELECT * FROM ranked"
        );
    }

    #[test]
    fn test_empty_with_attached() {
        let err = With::new()
            .attach(RawQuery::new("SELECT 1"))
            .compile_sql(&generic())
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_windowed_helper() {
        let with = With::new().windowed(
            "ranked",
            Select::from_table("wx_users").column("ignored_col"),
            [row_number()
                .partition_by(["unionid"])
                .order_by_desc("created_at")
                .alias("rn")],
        );
        assert_eq!(with.names(), vec!["ranked"]);
        assert_eq!(with.len(), 1);
        let f = with
            .select_from("ranked")
            .filter(col("rn").eq(1))
            .compile_sql(&generic())
            .unwrap();
        assert_eq!(
            f.sql,
            "WITH ranked AS (SELECT *, ROW_NUMBER() OVER (PARTITION BY unionid \
             ORDER BY created_at DESC) AS rn FROM wx_users) SELECT * FROM ranked WHERE rn = ?"
        );
    }
}
