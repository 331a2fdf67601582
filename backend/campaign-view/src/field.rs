//! Tagged read states.
//!
//! Every value shown at the presentation boundary is either still pending,
//! resolved, or failed. Lists additionally distinguish an empty result from
//! one that has not loaded yet.

use serde::Serialize;

use crate::error::ReadFailure;

/// State of one independently read field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Field<T> {
    Pending,
    Ready(T),
    Failed(ReadFailure),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<T> Field<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Self::Pending => Field::Pending,
            Self::Ready(value) => Field::Ready(f(value)),
            Self::Failed(err) => Field::Failed(err),
        }
    }

    /// Combine two fields. A failure wins over pending, pending over ready.
    pub fn zip<U>(self, other: Field<U>) -> Field<(T, U)> {
        match (self, other) {
            (Self::Ready(a), Field::Ready(b)) => Field::Ready((a, b)),
            (Self::Failed(err), _) | (_, Field::Failed(err)) => Field::Failed(err),
            _ => Field::Pending,
        }
    }
}

impl<T, E: Into<ReadFailure>> From<Result<T, E>> for Field<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(err) => Self::Failed(err.into()),
        }
    }
}

/// State of a list read. `Empty` and `Pending` are never conflated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "items", rename_all = "snake_case")]
pub enum Listing<T> {
    Pending,
    Empty,
    Populated(Vec<T>),
    Failed(ReadFailure),
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<T> Listing<T> {
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Populated(items)
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Self::Populated(items) => items,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    /// True only for a loaded, empty list.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Empty | Self::Populated(_))
    }
}

impl<T, E: Into<ReadFailure>> From<Result<Vec<T>, E>> for Listing<T> {
    fn from(result: Result<Vec<T>, E>) -> Self {
        match result {
            Ok(items) => Self::from_items(items),
            Err(err) => Self::Failed(err.into()),
        }
    }
}
