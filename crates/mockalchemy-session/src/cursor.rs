//! Terminal semantics over resolved rows, and the `execute` result type.

use crate::session::UnifiedSession;
use mockalchemy_core::{Error, Result, Row, Scalar};

pub(crate) fn first(rows: Vec<Row>) -> Option<Row> {
    rows.into_iter().next()
}

#[allow(clippy::result_large_err)]
pub(crate) fn one(rows: Vec<Row>) -> Result<Row> {
    if rows.len() > 1 {
        return Err(Error::multiple_results("one", rows.len()));
    }
    rows.into_iter()
        .next()
        .ok_or_else(|| Error::no_result("one"))
}

#[allow(clippy::result_large_err)]
pub(crate) fn one_or_none(rows: Vec<Row>) -> Result<Option<Row>> {
    match rows.len() {
        0 | 1 => Ok(rows.into_iter().next()),
        n => Err(Error::multiple_results("one_or_none", n)),
    }
}

/// First column of the only distinct row.
#[allow(clippy::result_large_err)]
pub(crate) fn scalar(rows: Vec<Row>) -> Result<Option<Scalar>> {
    let mut distinct: Vec<Row> = Vec::with_capacity(rows.len());
    for row in rows {
        if !distinct.contains(&row) {
            distinct.push(row);
        }
    }
    match distinct.len() {
        0 => Ok(None),
        1 => Ok(distinct.pop().map(Scalar::from)),
        n => Err(Error::multiple_results("scalar", n)),
    }
}

enum Source<'s> {
    /// A select whose rows resolve when a terminal is called
    Pending(&'s mut UnifiedSession),
    /// Rows already produced by a write
    Rows(Vec<Row>),
}

/// Result of [`UnifiedSession::execute`].
///
/// For a select, terminals resolve through the session, so they record
/// their boundary call exactly as the builder terminals do.
pub struct CursorResult<'s> {
    source: Source<'s>,
    rowcount: usize,
}

impl<'s> CursorResult<'s> {
    pub(crate) fn pending(session: &'s mut UnifiedSession, rowcount: usize) -> Self {
        Self {
            source: Source::Pending(session),
            rowcount,
        }
    }

    pub(crate) fn rows(rows: Vec<Row>, rowcount: usize) -> Self {
        Self {
            source: Source::Rows(rows),
            rowcount,
        }
    }

    /// Rows matched, inserted, updated or deleted by the statement.
    pub fn rowcount(&self) -> usize {
        self.rowcount
    }

    pub fn all(self) -> Vec<Row> {
        match self.source {
            Source::Pending(session) => session.all(),
            Source::Rows(rows) => rows,
        }
    }

    pub fn count(self) -> usize {
        match self.source {
            Source::Pending(session) => session.count(),
            Source::Rows(rows) => rows.len(),
        }
    }

    pub fn first(self) -> Option<Row> {
        match self.source {
            Source::Pending(session) => session.first(),
            Source::Rows(rows) => first(rows),
        }
    }

    #[allow(clippy::result_large_err)]
    pub fn one(self) -> Result<Row> {
        match self.source {
            Source::Pending(session) => session.one(),
            Source::Rows(rows) => one(rows),
        }
    }

    #[allow(clippy::result_large_err)]
    pub fn one_or_none(self) -> Result<Option<Row>> {
        match self.source {
            Source::Pending(session) => session.one_or_none(),
            Source::Rows(rows) => one_or_none(rows),
        }
    }

    #[allow(clippy::result_large_err)]
    pub fn scalar(self) -> Result<Option<Scalar>> {
        match self.source {
            Source::Pending(session) => session.scalar(),
            Source::Rows(rows) => scalar(rows),
        }
    }
}

impl std::fmt::Debug for CursorResult<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            Source::Pending(_) => "pending",
            Source::Rows(_) => "rows",
        };
        f.debug_struct("CursorResult")
            .field("source", &source)
            .field("rowcount", &self.rowcount)
            .finish()
    }
}

impl IntoIterator for CursorResult<'_> {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        match self.source {
            Source::Pending(session) => session.iter(),
            Source::Rows(rows) => rows.into_iter(),
        }
    }
}
