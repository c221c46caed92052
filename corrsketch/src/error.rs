// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Error types for corrsketch operations

use std::fmt;

/// ErrorKind is all kinds of Error of corrsketch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A capacity, threshold, level or aggregation spec is out of range or unknown.
    InvalidConfiguration,
    /// A set operation was requested on a synopsis that retains nothing.
    EmptySketch,
    /// An estimator received fewer than two pairs or vectors of unequal length.
    InsufficientData,
    /// An estimator received a vector with zero variance.
    DegenerateInput,
    /// The sketch index has been closed.
    IndexClosed,
    /// A byte payload is malformed.
    Serialization,
    /// The backing postings store failed.
    Store,
}

impl ErrorKind {
    /// Convert this error kind instance into static str.
    pub const fn into_static(self) -> &'static str {
        match self {
            ErrorKind::InvalidConfiguration => "InvalidConfiguration",
            ErrorKind::EmptySketch => "EmptySketch",
            ErrorKind::InsufficientData => "InsufficientData",
            ErrorKind::DegenerateInput => "DegenerateInput",
            ErrorKind::IndexClosed => "IndexClosed",
            ErrorKind::Serialization => "Serialization",
            ErrorKind::Store => "Store",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

/// Error is the error struct returned by all corrsketch functions.
///
/// # Examples
///
/// ```
/// # use corrsketch::error::Error;
/// # use corrsketch::error::ErrorKind;
/// let err = Error::new(ErrorKind::InvalidConfiguration, "k must be positive");
/// assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
/// assert_eq!(err.message(), "k must be positive");
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: Vec<(&'static str, String)>,
}

impl Error {
    /// Create a new Error with error kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: vec![],
        }
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Return error's kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return error's message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

// Convenient constructors used within corrsketch crate.
impl Error {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfiguration, msg)
    }

    pub(crate) fn empty_sketch(operation: &'static str) -> Self {
        Self::new(
            ErrorKind::EmptySketch,
            format!("{operation} requires non-empty sketches"),
        )
    }

    pub(crate) fn insufficient_data(x_len: usize, y_len: usize) -> Self {
        Self::new(
            ErrorKind::InsufficientData,
            "correlation requires two equal-length vectors with at least 2 values",
        )
        .with_context("x_len", x_len)
        .with_context("y_len", y_len)
    }

    pub(crate) fn degenerate_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::DegenerateInput, msg)
    }

    pub(crate) fn index_closed(operation: &'static str) -> Self {
        Self::new(ErrorKind::IndexClosed, "sketch index is closed")
            .with_context("operation", operation)
    }

    pub(crate) fn deserial(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, msg)
    }

    pub(crate) fn insufficient_bytes(tag: &'static str) -> Self {
        Self::deserial(format!("insufficient data: {tag}"))
    }

    pub(crate) fn invalid_family(expected: u8, actual: u8, name: &'static str) -> Self {
        Self::deserial(format!(
            "invalid family: expected {expected} ({name}), got {actual}"
        ))
    }

    pub(crate) fn unsupported_serial_version(expected: u8, actual: u8) -> Self {
        Self::deserial(format!(
            "unsupported serial version: expected {expected}, got {actual}"
        ))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // If alternate has been specified, we will print like Debug.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("context", &self.context);
            return de.finish();
        }

        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "   {k}: {v}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            for (i, (k, v)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", k, v)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn test_format_consistency() {
        let err = Error::new(ErrorKind::EmptySketch, "jaccard requires non-empty sketches");
        assert_snapshot!(err, @"EmptySketch => jaccard requires non-empty sketches");
    }

    #[test]
    fn test_format_with_multiple_contexts() {
        let err = Error::insufficient_data(1, 3);
        assert_snapshot!(
            err,
            @"InsufficientData, context: { x_len: 1, y_len: 3 } => correlation requires two equal-length vectors with at least 2 values"
        );
    }

    #[test]
    fn test_index_closed_carries_operation() {
        let err = Error::index_closed("search");
        assert_eq!(err.kind(), ErrorKind::IndexClosed);
        assert_snapshot!(err, @"IndexClosed, context: { operation: search } => sketch index is closed");
    }
}
