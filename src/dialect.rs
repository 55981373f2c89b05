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

//! Target-dialect configuration: identifier quoting and placeholder syntax.
//!
//! Fragments are always assembled with `?` markers. A dialect converts them to
//! its own syntax exactly once, when a statement is finalised, so numbered
//! placeholders stay consistent no matter how many fragments were stitched
//! together.

use std::fmt::Write;

use log::trace;
use sqlparser::ast::Ident;
use sqlparser::keywords::ALL_KEYWORDS;

use crate::error::{ComposeError, Result};
use crate::sql::{SqlFragment, Statement};

/// Positional placeholder syntax of the finished statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholders {
    /// `?` (SQLite, MySQL, ODBC-style drivers).
    Question,
    /// `$1`, `$2`, ... (PostgreSQL).
    Numbered,
}

/// When identifiers are wrapped in quote characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    /// Quote every identifier.
    Always,
    /// Leave plain lowercase non-keyword identifiers bare, quote the rest.
    WhenNeeded,
}

/// Compilation settings for one target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    /// Identifier quote character: `"` or `` ` ``.
    pub quote: char,
    pub quoting: Quoting,
    pub placeholders: Placeholders,
}

impl Dialect {
    /// ANSI quoting with `?` placeholders.
    pub const fn generic() -> Self {
        Dialect {
            quote: '"',
            quoting: Quoting::WhenNeeded,
            placeholders: Placeholders::Question,
        }
    }

    pub const fn postgres() -> Self {
        Dialect {
            quote: '"',
            quoting: Quoting::WhenNeeded,
            placeholders: Placeholders::Numbered,
        }
    }

    pub const fn mysql() -> Self {
        Dialect {
            quote: '`',
            quoting: Quoting::WhenNeeded,
            placeholders: Placeholders::Question,
        }
    }

    pub const fn sqlite() -> Self {
        Dialect::generic()
    }

    pub const fn with_quoting(mut self, quoting: Quoting) -> Self {
        self.quoting = quoting;
        self
    }

    pub const fn with_placeholders(mut self, placeholders: Placeholders) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Render `name` as an identifier, doubling any embedded quote characters.
    pub fn quote_ident(&self, name: &str) -> String {
        if self.quoting == Quoting::WhenNeeded && is_bare_identifier(name) {
            return name.to_string();
        }
        Ident::with_quote(self.quote, name).to_string()
    }

    /// Convert a `?`-marked fragment into a finished statement.
    ///
    /// Fails with `ParameterMismatch` when the number of placeholders found
    /// outside quoted text and comments differs from the number of collected
    /// parameters.
    pub fn finalize(&self, fragment: SqlFragment) -> Result<Statement> {
        let SqlFragment { sql, params } = fragment;
        let (sql, placeholders) = rewrite_placeholders(&sql, self.placeholders)?;
        if placeholders != params.len() {
            return Err(ComposeError::ParameterMismatch {
                placeholders,
                params: params.len(),
            });
        }
        trace!("finalized statement ({} params): {sql}", params.len());
        Ok(Statement { sql, params })
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::generic()
    }
}

/// True when `name` can be emitted without quotes in every supported dialect.
fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return false;
    }
    // ALL_KEYWORDS is sorted and uppercase
    ALL_KEYWORDS
        .binary_search(&name.to_ascii_uppercase().as_str())
        .is_err()
}

/// Fail with `ParameterMismatch` unless `fragment` carries exactly one
/// parameter per `?` marker outside quoted text and comments.
pub(crate) fn check_alignment(fragment: &SqlFragment) -> Result<()> {
    let (_, placeholders) = rewrite_placeholders(&fragment.sql, Placeholders::Question)?;
    if placeholders != fragment.params.len() {
        return Err(ComposeError::ParameterMismatch {
            placeholders,
            params: fragment.params.len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Count `?` markers outside quoted text and comments and rewrite them in
/// `style`.
fn rewrite_placeholders(sql: &str, style: Placeholders) -> Result<(String, usize)> {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut count = 0usize;
    let mut state = Scan::Code;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        out.push(c);
        match state {
            // A doubled quote closes and immediately reopens, which keeps
            // escaped quotes inside the literal.
            Scan::Quoted(q) => {
                if c == q {
                    state = Scan::Code;
                }
            }
            Scan::LineComment => {
                if c == '\n' {
                    state = Scan::Code;
                }
            }
            Scan::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push('/');
                    state = Scan::Code;
                }
            }
            Scan::Code => match c {
                '\'' | '"' | '`' => state = Scan::Quoted(c),
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    out.push('-');
                    state = Scan::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push('*');
                    state = Scan::BlockComment;
                }
                '?' => {
                    count += 1;
                    if style == Placeholders::Numbered {
                        out.pop();
                        let _ = write!(out, "${count}");
                    }
                }
                _ => {}
            },
        }
    }

    match state {
        Scan::Quoted(q) => Err(ComposeError::Compilation(format!(
            "unterminated {q} quote in generated SQL"
        ))),
        Scan::BlockComment => Err(ComposeError::Compilation(
            "unterminated block comment in generated SQL".into(),
        )),
        Scan::Code | Scan::LineComment => Ok((out, count)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_quote_when_needed() {
        let d = Dialect::generic();
        assert_eq!(d.quote_ident("created_at"), "created_at");
        assert_eq!(d.quote_ident("_tmp1"), "_tmp1");
        assert_eq!(d.quote_ident("CreatedAt"), "\"CreatedAt\"");
        assert_eq!(d.quote_ident("order"), "\"order\"");
        assert_eq!(d.quote_ident("select"), "\"select\"");
        assert_eq!(d.quote_ident("1st"), "\"1st\"");
        assert_eq!(d.quote_ident("has space"), "\"has space\"");
    }

    #[test]
    fn test_quote_escapes_embedded_quotes() {
        let d = Dialect::generic();
        assert_eq!(d.quote_ident("we\"ird"), "\"we\"\"ird\"");
        let d = Dialect::mysql();
        assert_eq!(d.quote_ident("a`b"), "`a``b`");
    }

    #[test]
    fn test_quote_always() {
        let d = Dialect::generic().with_quoting(Quoting::Always);
        assert_eq!(d.quote_ident("created_at"), "\"created_at\"");
        let d = Dialect::mysql().with_quoting(Quoting::Always);
        assert_eq!(d.quote_ident("rn"), "`rn`");
    }

    #[test]
    fn test_numbered_placeholders() {
        let frag = SqlFragment::new(
            "SELECT * FROM t WHERE a = ? AND b IN (?, ?)",
            vec![Value::Int(1), Value::Int(2), Value::Int(3)],
        );
        let stmt = Dialect::postgres().finalize(frag).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE a = $1 AND b IN ($2, $3)");
        assert_eq!(stmt.params.len(), 3);
    }

    #[test]
    fn test_placeholders_inside_quotes_are_ignored() {
        let frag = SqlFragment::new(
            "SELECT 'what?', \"col?\" FROM t WHERE x = ? AND y = 'it''s?'",
            vec![Value::Int(1)],
        );
        let stmt = Dialect::postgres().finalize(frag).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT 'what?', \"col?\" FROM t WHERE x = $1 AND y = 'it''s?'"
        );
    }

    #[test]
    fn test_parameter_mismatch() {
        let frag = SqlFragment::new("SELECT ? + ?", vec![Value::Int(1)]);
        let err = Dialect::generic().finalize(frag).unwrap_err();
        assert_eq!(
            err,
            ComposeError::ParameterMismatch {
                placeholders: 2,
                params: 1
            }
        );
    }

    #[test]
    fn test_line_comment_is_skipped() {
        let frag = SqlFragment::new(
            "SELECT * FROM t -- don't bind here?\nWHERE id = ? -- why?",
            vec![Value::Int(1)],
        );
        let stmt = Dialect::postgres().finalize(frag).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM t -- don't bind here?\nWHERE id = $1 -- why?"
        );
    }

    #[test]
    fn test_block_comment_is_skipped() {
        let frag = SqlFragment::new(
            "SELECT /* it's a ? */ a FROM t WHERE b = ? AND c = ?",
            vec![Value::Int(1), Value::Int(2)],
        );
        let stmt = Dialect::postgres().finalize(frag).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT /* it's a ? */ a FROM t WHERE b = $1 AND c = $2"
        );

        let frag = SqlFragment::new("SELECT 1 /* open", vec![]);
        assert!(Dialect::generic().finalize(frag).unwrap_err().is_compilation());
    }

    #[test]
    fn test_minus_and_divide_are_not_comments() {
        let frag = SqlFragment::new("SELECT a - ?, b / ? FROM t", vec![Value::Int(1), Value::Int(2)]);
        let stmt = Dialect::postgres().finalize(frag).unwrap();
        assert_eq!(stmt.sql, "SELECT a - $1, b / $2 FROM t");
    }

    #[test]
    fn test_check_alignment() {
        assert!(check_alignment(&SqlFragment::new("SELECT ?", vec![Value::Int(1)])).is_ok());
        assert!(check_alignment(&SqlFragment::raw("SELECT '?' -- ?")).is_ok());
        assert_eq!(
            check_alignment(&SqlFragment::raw("SELECT ?")).unwrap_err(),
            ComposeError::ParameterMismatch {
                placeholders: 1,
                params: 0
            }
        );
    }

    #[test]
    fn test_unterminated_quote() {
        let frag = SqlFragment::new("SELECT 'oops", vec![]);
        let err = Dialect::generic().finalize(frag).unwrap_err();
        assert!(err.is_compilation());
    }
}
