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

//! SQL composition for common table expressions and window functions.
//!
//! Builds `WITH name AS (...)` prefixes and `FUNC(...) OVER (...)` projection
//! items on top of a small SELECT builder. Everything compiles to SQL text
//! plus an ordered parameter list; nothing here talks to a database.
//!
//! ```
//! use sqlcompose::{col, functions::row_number, CompileSql, Dialect, Select, With};
//!
//! let with = With::new().windowed(
//!     "ranked",
//!     Select::from_table("wx_users").filter(col("unionid").in_list(["u1", "u2"])),
//!     [row_number()
//!         .partition_by(["unionid"])
//!         .order_by_desc("created_at")
//!         .alias("rn")],
//! );
//! let stmt = with
//!     .select_from("ranked")
//!     .filter(col("rn").eq(1))
//!     .to_statement(&Dialect::postgres())
//!     .unwrap();
//! assert!(stmt.sql.ends_with("SELECT * FROM ranked WHERE rn = $3"));
//! assert_eq!(stmt.params.len(), 3);
//! ```

pub mod dialect;
pub mod error;
pub mod sql;
pub mod value;

pub use dialect::{Dialect, Placeholders, Quoting};
pub use error::{ComposeError, Result};
pub use sql::cte::{compile_with, ComposedQuery, NamedSubquery, With};
pub use sql::expr::{col, val, BinaryOp, ColumnRef, Direction, Expr, OrderBy, SelectItem};
pub use sql::frame::{render_frame, BoundKind, FrameBound, FrameSpec, FrameUnit};
pub use sql::functions;
pub use sql::query::{RawQuery, Relation, Select};
pub use sql::window::{compile_window, WindowExpr, WindowFunc, WindowSpec};
pub use sql::{CompileSql, SqlFragment, Statement};
pub use value::Value;
