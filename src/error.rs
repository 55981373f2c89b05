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

//! Error types for SQL composition.
//!
//! Every failure is detected while the SQL string is being assembled; nothing
//! is deferred to execution time.

use thiserror::Error;

/// Result type alias for composition operations.
pub type Result<T> = std::result::Result<T, ComposeError>;

/// Errors produced while composing CTEs and window expressions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    // =========================================================================
    // Caller errors
    // =========================================================================
    /// Invalid or incomplete specification supplied before compilation
    /// (empty CTE list, duplicate CTE names, bad frame offsets, empty base query).
    #[error("configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Internal inconsistencies
    // =========================================================================
    /// The finished statement carries a different number of placeholders than
    /// collected parameters. Executing it would bind values to the wrong slots.
    #[error("compilation error: statement has {placeholders} placeholders but {params} parameters")]
    ParameterMismatch { placeholders: usize, params: usize },

    /// Any other inconsistency found while assembling SQL.
    #[error("compilation error: {0}")]
    Compilation(String),
}

impl ComposeError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ComposeError::Configuration(msg.into())
    }

    /// Returns true for caller-side specification errors.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ComposeError::Configuration(_))
    }

    /// Returns true for internal assembly errors.
    pub fn is_compilation(&self) -> bool {
        matches!(
            self,
            ComposeError::ParameterMismatch { .. } | ComposeError::Compilation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = ComposeError::config("duplicate CTE name 'x'");
        assert!(err.is_configuration());
        assert!(!err.is_compilation());
        assert_eq!(
            err.to_string(),
            "configuration error: duplicate CTE name 'x'"
        );

        let err = ComposeError::ParameterMismatch {
            placeholders: 3,
            params: 2,
        };
        assert!(err.is_compilation());
        assert_eq!(
            err.to_string(),
            "compilation error: statement has 3 placeholders but 2 parameters"
        );
    }
}
