//! The fixture store: signatures paired with the rows they return.

use crate::call::{Arg, Call};
use crate::chain::{contains_all, normalize_chain};
use crate::comparison::{NormalizedCall, normalize_call};
use crate::registry::comparator_for;
use mockalchemy_core::{Record, Result, Row, Value};

/// A registered dataset: the calls a chain must contain, and its rows.
#[derive(Debug, Clone)]
pub struct Fixture {
    signature: Vec<Call>,
    rows: Vec<Row>,
}

impl Fixture {
    pub fn new<R>(signature: Vec<Call>, rows: impl IntoIterator<Item = R>) -> Self
    where
        R: Into<Row>,
    {
        Self {
            signature,
            rows: rows.into_iter().map(Into::into).collect(),
        }
    }

    pub fn signature(&self) -> &[Call] {
        &self.signature
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

struct Ranked {
    index: usize,
    normalized: Vec<NormalizedCall>,
}

/// Ordered fixture entries plus the matching rules over them.
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    entries: Vec<Fixture>,
}

impl FixtureStore {
    pub fn new(entries: Vec<Fixture>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Fixture] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries longest-signature-first, ties in registration order.
    fn ranked(&self) -> Vec<Ranked> {
        let mut ranked: Vec<Ranked> = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, fixture)| Ranked {
                index,
                normalized: normalize_chain(&fixture.signature),
            })
            .collect();
        ranked.sort_by(|a, b| b.normalized.len().cmp(&a.normalized.len()));
        ranked
    }

    /// Index of the most specific entry contained in `chain`.
    fn position(&self, chain: &[Call]) -> Option<usize> {
        let chain = normalize_chain(chain);
        self.ranked()
            .into_iter()
            .find(|r| contains_all(&chain, &r.normalized))
            .map(|r| r.index)
    }

    /// Rows of the most specific entry whose signature `chain` contains.
    pub fn select(&self, chain: &[Call]) -> Option<&[Row]> {
        let index = self.position(chain)?;
        tracing::debug!(
            fixture = index,
            rows = self.entries[index].rows.len(),
            "Matched fixture"
        );
        Some(&self.entries[index].rows)
    }

    /// Union of the rows of every entry whose signature holds `query_call`,
    /// most specific first.
    pub fn rows_for_get(&self, query_call: &Call) -> Vec<Row> {
        let wanted = normalize_call(query_call, true, comparator_for(query_call.name()));
        self.ranked()
            .into_iter()
            .filter(|r| r.normalized.contains(&wanted))
            .flat_map(|r| self.entries[r.index].rows.iter().cloned())
            .collect()
    }

    /// Append `record` to the entry registered as exactly `query(table)`,
    /// creating that entry when absent.
    pub fn add(&mut self, record: Record) {
        let signature = vec![Call::new("query").with_arg(Arg::Entity(record.table().clone()))];
        let normalized = normalize_chain(&signature);
        let existing = self
            .entries
            .iter()
            .position(|f| normalize_chain(&f.signature) == normalized);

        let mut next = self.entries.clone();
        match existing {
            Some(i) => next[i].rows.push(Row::Entity(record)),
            None => {
                tracing::debug!(table = record.table_name(), "New fixture entry");
                next.push(Fixture::new(signature, [record]));
            }
        }
        self.entries = next;
    }

    /// Empty the entry matched by `chain`, returning how many rows it held.
    pub fn delete(&mut self, chain: &[Call]) -> usize {
        let Some(index) = self.position(chain) else {
            return 0;
        };
        let removed = self.entries[index].rows.len();
        let mut next = self.entries.clone();
        next[index].rows.clear();
        self.entries = next;
        tracing::debug!(fixture = index, removed, "Deleted fixture rows");
        removed
    }

    /// Set `assignments` on every entity row of the entry matched by
    /// `chain`. Column projections are left alone.
    ///
    /// The edit is all-or-nothing: on an unknown column no row changes.
    #[allow(clippy::result_large_err)]
    pub fn update(&mut self, chain: &[Call], assignments: &[(String, Value)]) -> Result<usize> {
        let Some(index) = self.position(chain) else {
            return Ok(0);
        };
        let mut rows = self.entries[index].rows.clone();
        let mut updated = 0;
        for record in rows.iter_mut().filter_map(Row::as_record_mut) {
            for (column, value) in assignments {
                record.set(column, value.clone())?;
            }
            updated += 1;
        }
        self.entries[index].rows = rows;
        tracing::debug!(fixture = index, updated, "Updated fixture rows");
        Ok(updated)
    }
}
