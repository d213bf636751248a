// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors raised while preparing an import, before any row is parsed.
///
/// Problems inside a document are never reported here; they become
/// `ImportError`s of a rejected outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The format selector is not one of the supported formats.
    UnknownFormat(String),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFormat(format) => write!(f, "Unknown import format: {format}"),
        }
    }
}

impl std::error::Error for CoreError {}
