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

// Expression tree and its single recursive renderer.
//
// Column references always render as identifiers; only `Expr::Value` nodes
// produce placeholders. Window expressions are nodes of the same tree, so a
// window call nests anywhere an expression may appear.

use crate::dialect::Dialect;
use crate::error::{ComposeError, Result};
use crate::sql::window::{compile_window, WindowExpr};
use crate::sql::SqlFragment;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Column references
// ---------------------------------------------------------------------------

/// A possibly table-qualified column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        ColumnRef {
            table: None,
            name: name.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        ColumnRef {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub(crate) fn render(&self, dialect: &Dialect, out: &mut SqlFragment) -> Result<()> {
        if self.name.is_empty() {
            return Err(ComposeError::config("column name must not be empty"));
        }
        if let Some(table) = &self.table {
            render_path(table, "table qualifier", dialect, out)?;
            out.push_str(".");
        }
        if self.name == "*" {
            out.push_str("*");
        } else {
            out.push_str(&dialect.quote_ident(&self.name));
        }
        Ok(())
    }
}

/// The last dot separates the column from its qualifier, so `"sch.tbl.col"`
/// is column `col` of `sch.tbl`. Names without a dot are bare.
impl From<&str> for ColumnRef {
    fn from(s: &str) -> Self {
        match s.rsplit_once('.') {
            Some((table, name)) => ColumnRef::qualified(table, name),
            None => ColumnRef::new(s),
        }
    }
}

/// Render a dotted path such as `schema.table` one identifier at a time.
pub(crate) fn render_path(
    path: &str,
    what: &str,
    dialect: &Dialect,
    out: &mut SqlFragment,
) -> Result<()> {
    if path.split('.').any(str::is_empty) {
        return Err(ComposeError::config(format!(
            "{what} '{path}' has an empty name part"
        )));
    }
    for (i, part) in path.split('.').enumerate() {
        if i > 0 {
            out.push_str(".");
        }
        out.push_str(&dialect.quote_ident(part));
    }
    Ok(())
}

impl From<String> for ColumnRef {
    fn from(s: String) -> Self {
        ColumnRef::from(s.as_str())
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One `column ASC|DESC` entry. The direction is always emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: ColumnRef,
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(column: impl Into<ColumnRef>, direction: Direction) -> Self {
        OrderBy {
            column: column.into(),
            direction,
        }
    }

    pub fn asc(column: impl Into<ColumnRef>) -> Self {
        OrderBy::new(column, Direction::Asc)
    }

    pub fn desc(column: impl Into<ColumnRef>) -> Self {
        OrderBy::new(column, Direction::Desc)
    }

    pub(crate) fn render(&self, dialect: &Dialect, out: &mut SqlFragment) -> Result<()> {
        self.column.render(dialect, out)?;
        out.push_str(" ");
        out.push_str(self.direction.as_sql());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Like => "LIKE",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }
}

/// A SQL expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column identifier.
    Column(ColumnRef),
    /// Bound parameter, rendered as `?`.
    Value(Value),
    /// `*`
    Star,
    /// Pre-compiled SQL, embedded verbatim with its parameters.
    Raw(SqlFragment),
    /// `NAME(arg, ...)`
    Function { name: String, args: Vec<Expr> },
    /// `FUNC(args) OVER (...)`
    Window(Box<WindowExpr>),
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    /// Parenthesised sub-expression.
    Nested(Box<Expr>),
}

/// Column expression: `col("unionid")`, `col("u.unionid")`.
pub fn col(name: impl Into<ColumnRef>) -> Expr {
    Expr::Column(name.into())
}

/// Bound value expression.
pub fn val(value: impl Into<Value>) -> Expr {
    Expr::Value(value.into())
}

impl Expr {
    /// Embed already-compiled SQL.
    pub fn raw(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Expr::Raw(SqlFragment::new(sql, params))
    }

    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Function {
            name: name.into(),
            args,
        }
    }

    fn binary(self, op: BinaryOp, right: impl Into<Expr>) -> Self {
        Expr::BinaryOp {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    pub fn not_eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::NotEq, right)
    }

    pub fn lt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Lt, right)
    }

    pub fn lt_eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::LtEq, right)
    }

    pub fn gt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Gt, right)
    }

    pub fn gt_eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::GtEq, right)
    }

    pub fn like(self, pattern: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Like, pattern)
    }

    pub fn and(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::And, right)
    }

    /// `(self OR right)`; parenthesised so it composes safely under AND.
    pub fn or(self, right: impl Into<Expr>) -> Self {
        Expr::Nested(Box::new(self.binary(BinaryOp::Or, right)))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    pub fn is_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    pub fn is_not_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    /// `self IN (?, ?, ...)`, one bound parameter per value.
    pub fn in_list<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::InList {
            expr: Box::new(self),
            list: values.into_iter().map(val).collect(),
            negated: false,
        }
    }

    pub fn not_in_list<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::InList {
            expr: Box::new(self),
            list: values.into_iter().map(val).collect(),
            negated: true,
        }
    }

    /// Projection item `self AS alias`.
    pub fn alias(self, alias: impl Into<String>) -> SelectItem {
        SelectItem {
            expr: self,
            alias: Some(alias.into()),
        }
    }

    /// Recursively render this expression into `out`.
    pub fn render(&self, dialect: &Dialect, out: &mut SqlFragment) -> Result<()> {
        match self {
            Expr::Column(c) => c.render(dialect, out),

            Expr::Value(v) => {
                out.push_param(v.clone());
                Ok(())
            }

            Expr::Star => {
                out.push_str("*");
                Ok(())
            }

            Expr::Raw(fragment) => {
                if fragment.is_blank() {
                    return Err(ComposeError::config("raw SQL expression is empty"));
                }
                out.append(fragment.clone());
                Ok(())
            }

            Expr::Function { name, args } => {
                if name.is_empty() {
                    return Err(ComposeError::config("function name must not be empty"));
                }
                out.push_str(name);
                out.push_str("(");
                render_list(args, dialect, out)?;
                out.push_str(")");
                Ok(())
            }

            Expr::Window(w) => {
                out.append(compile_window(w, dialect)?);
                Ok(())
            }

            Expr::BinaryOp { left, op, right } => {
                left.render(dialect, out)?;
                out.push_str(" ");
                out.push_str(op.as_sql());
                out.push_str(" ");
                right.render(dialect, out)
            }

            Expr::Not(inner) => {
                out.push_str("NOT ");
                inner.render(dialect, out)
            }

            Expr::IsNull { expr, negated } => {
                expr.render(dialect, out)?;
                out.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
                Ok(())
            }

            // Empty IN list: constant predicate, nothing to bind
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                if list.is_empty() {
                    out.push_str(if *negated { "1 = 1" } else { "1 = 0" });
                    return Ok(());
                }
                expr.render(dialect, out)?;
                out.push_str(if *negated { " NOT IN (" } else { " IN (" });
                render_list(list, dialect, out)?;
                out.push_str(")");
                Ok(())
            }

            Expr::Nested(inner) => {
                out.push_str("(");
                inner.render(dialect, out)?;
                out.push_str(")");
                Ok(())
            }
        }
    }

    /// Render into a fresh fragment.
    pub fn compile(&self, dialect: &Dialect) -> Result<SqlFragment> {
        let mut out = SqlFragment::default();
        self.render(dialect, &mut out)?;
        Ok(out)
    }
}

/// Render `items` joined by `, `.
pub(crate) fn render_list(items: &[Expr], dialect: &Dialect, out: &mut SqlFragment) -> Result<()> {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.render(dialect, out)?;
    }
    Ok(())
}

impl From<ColumnRef> for Expr {
    fn from(c: ColumnRef) -> Self {
        Expr::Column(c)
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Value(v)
    }
}

impl From<WindowExpr> for Expr {
    fn from(w: WindowExpr) -> Self {
        Expr::Window(Box::new(w))
    }
}

// Plain Rust values on the right-hand side of a comparison are bound
// parameters; use `col()` to compare against another column.
macro_rules! impl_expr_from_value {
    ($($t:ty),*) => {
        $(impl From<$t> for Expr {
            fn from(v: $t) -> Self {
                Expr::Value(Value::from(v))
            }
        })*
    };
}

impl_expr_from_value!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, &str, String);

// ---------------------------------------------------------------------------
// Projection items
// ---------------------------------------------------------------------------

/// One entry of a SELECT list, optionally aliased.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectItem {
    pub(crate) fn render(&self, dialect: &Dialect, out: &mut SqlFragment) -> Result<()> {
        self.expr.render(dialect, out)?;
        if let Some(alias) = &self.alias {
            if alias.is_empty() {
                return Err(ComposeError::config("column alias must not be empty"));
            }
            out.push_str(" AS ");
            out.push_str(&dialect.quote_ident(alias));
        }
        Ok(())
    }
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        SelectItem { expr, alias: None }
    }
}

impl From<WindowExpr> for SelectItem {
    fn from(w: WindowExpr) -> Self {
        SelectItem::from(Expr::from(w))
    }
}

/// A bare string in a projection names a column.
impl From<&str> for SelectItem {
    fn from(name: &str) -> Self {
        SelectItem::from(col(name))
    }
}

impl From<ColumnRef> for SelectItem {
    fn from(c: ColumnRef) -> Self {
        SelectItem::from(Expr::Column(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(e: &Expr) -> SqlFragment {
        e.compile(&Dialect::generic()).unwrap()
    }

    #[test]
    fn test_column_rendering() {
        assert_eq!(render(&col("unionid")).sql, "unionid");
        assert_eq!(render(&col("wu.unionid")).sql, "wu.unionid");
        assert_eq!(render(&col("wu.*")).sql, "wu.*");
        assert_eq!(render(&col("UserId")).sql, "\"UserId\"");
        assert!(render(&col("unionid")).params.is_empty());
    }

    #[test]
    fn test_empty_column_is_configuration_error() {
        let err = col("").compile(&Dialect::generic()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_multi_part_column() {
        assert_eq!(
            ColumnRef::from("crm.wu.unionid"),
            ColumnRef::qualified("crm.wu", "unionid")
        );
        assert_eq!(render(&col("crm.wu.unionid")).sql, "crm.wu.unionid");
        assert_eq!(render(&col("crm.Wu.unionid")).sql, "crm.\"Wu\".unionid");
    }

    #[test]
    fn test_empty_name_parts_are_rejected() {
        for name in ["crm..unionid", ".unionid", "wu.", "crm.wu."] {
            let err = col(name).compile(&Dialect::generic()).unwrap_err();
            assert!(err.is_configuration(), "{name}");
        }
    }

    #[test]
    fn test_comparison_binds_values() {
        let f = render(&col("rn").eq(1));
        assert_eq!(f.sql, "rn = ?");
        assert_eq!(f.params, vec![Value::Int(1)]);

        let f = render(&col("lhs").eq(col("rhs")));
        assert_eq!(f.sql, "lhs = rhs");
        assert!(f.params.is_empty());
    }

    #[test]
    fn test_in_list() {
        let f = render(&col("unionid").in_list(["u1", "u2"]));
        assert_eq!(f.sql, "unionid IN (?, ?)");
        assert_eq!(f.params, vec![Value::from("u1"), Value::from("u2")]);

        let f = render(&col("id").not_in_list(Vec::<i64>::new()));
        assert_eq!(f.sql, "1 = 1");
        let f = render(&col("id").in_list(Vec::<i64>::new()));
        assert_eq!(f.sql, "1 = 0");
    }

    #[test]
    fn test_or_is_parenthesised_under_and() {
        let e = col("flag_a").eq(1).or(col("flag_b").eq(2)).and(col("flag_c").is_not_null());
        let f = render(&e);
        assert_eq!(f.sql, "(flag_a = ? OR flag_b = ?) AND flag_c IS NOT NULL");
        assert_eq!(f.params, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_raw_and_function() {
        let e = Expr::function(
            "COALESCE",
            vec![col("nick"), Expr::raw("LOWER(?)", vec![Value::from("X")])],
        );
        let f = render(&e);
        assert_eq!(f.sql, "COALESCE(nick, LOWER(?))");
        assert_eq!(f.params, vec![Value::from("X")]);
    }

    #[test]
    fn test_select_item_alias() {
        let mut out = SqlFragment::default();
        col("score")
            .alias("Total Score")
            .render(&Dialect::generic(), &mut out)
            .unwrap();
        assert_eq!(out.sql, "score AS \"Total Score\"");
    }
}
