//! The unifying mock session.
//!
//! Builder calls are recorded and folded into one canonical chain; terminal
//! calls resolve that chain against the fixture store; mutations edit the
//! store. Every view of the history (per-method lists, session-wide
//! `mock_calls`) derives from one [`CallLog`].

use crate::call::{Arg, Call};
use crate::chain::{active_chain, collapse_repeated, expand_call};
use crate::cursor::{self, CursorResult};
use crate::fixture::{Fixture, FixtureStore};
use crate::identity_map::{IdentityMap, Key, get_item_attr};
use crate::recorder::{CallLog, MethodCalls};
use crate::registry::{MethodKind, method_kind};
use mockalchemy_core::{Record, Result, Row, Scalar, Value};
use mockalchemy_query::{Insert, Statement};

/// Construction options for [`UnifiedSession`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Mock name used in assertion messages.
    pub name: String,
    /// Registered fixtures, in registration order.
    pub data: Vec<Fixture>,
    /// Rows returned when no fixture matches.
    pub default: Vec<Row>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "Session".to_string(),
            data: Vec::new(),
            default: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Create new default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Register rows returned by any chain containing every call of
    /// `signature`.
    #[must_use]
    pub fn fixture<R>(mut self, signature: Vec<Call>, rows: impl IntoIterator<Item = R>) -> Self
    where
        R: Into<Row>,
    {
        self.data.push(Fixture::new(signature, rows));
        self
    }

    /// Replace all registered fixtures.
    #[must_use]
    pub fn data(mut self, data: Vec<Fixture>) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn default_rows<R>(mut self, rows: impl IntoIterator<Item = R>) -> Self
    where
        R: Into<Row>,
    {
        self.default = rows.into_iter().map(Into::into).collect();
        self
    }
}

/// A mock ORM session that folds chained calls and serves fixture rows.
///
/// # Example
///
/// ```ignore
/// let mut session = UnifiedSession::with_config(
///     SessionConfig::new().fixture(
///         vec![call!(query, Model::table()), call!(filter, pk1.lt(1))],
///         [Row::from(&model)],
///     ),
/// );
/// assert_eq!(session.query(Model::table()).filter(pk1.lt(1)).count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct UnifiedSession {
    log: CallLog,
    store: FixtureStore,
    default: Vec<Row>,
}

fn limit_value(n: u64) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

impl UnifiedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SessionConfig) -> Self {
        tracing::debug!(
            name = %config.name,
            fixtures = config.data.len(),
            default_rows = config.default.len(),
            "Creating mock session"
        );
        Self {
            log: CallLog::new(config.name),
            store: FixtureStore::new(config.data),
            default: config.default,
        }
    }

    /// Current fixture entries.
    pub fn fixtures(&self) -> &[Fixture] {
        self.store.entries()
    }

    fn unify(&mut self, call: Call) -> &mut Self {
        self.log.record(call);
        if let Some(next) = collapse_repeated(self.log.calls()) {
            tracing::trace!(calls = next.len(), "Collapsed repeated call");
            self.log.replace(next);
        }
        self
    }

    /// Record an arbitrary call.
    ///
    /// Builder names fold into the chain. Any other name is recorded and
    /// has no further effect; terminals and mutations must go through their
    /// typed methods to resolve or change fixture data.
    pub fn invoke(&mut self, call: Call) -> &mut Self {
        match method_kind(call.name()) {
            MethodKind::Unify(_) => self.unify(call),
            MethodKind::Boundary | MethodKind::Mutation | MethodKind::Passthrough => {
                tracing::trace!(method = call.name(), "Recording call without effect");
                self.log.record(call);
                self
            }
        }
    }

    pub fn query(&mut self, entity: impl Into<Arg>) -> &mut Self {
        self.unify(Call::new("query").with_arg(entity))
    }

    pub fn add_columns(&mut self, column: impl Into<Arg>) -> &mut Self {
        self.unify(Call::new("add_columns").with_arg(column))
    }

    pub fn filter(&mut self, criterion: impl Into<Arg>) -> &mut Self {
        self.unify(Call::new("filter").with_arg(criterion))
    }

    /// Statement-style spelling of [`UnifiedSession::filter`], recorded as
    /// `where`.
    pub fn r#where(&mut self, criterion: impl Into<Arg>) -> &mut Self {
        self.unify(Call::new("where").with_arg(criterion))
    }

    pub fn filter_by(&mut self, column: impl Into<String>, value: impl Into<Arg>) -> &mut Self {
        self.unify(Call::new("filter_by").with_kwarg(column, value))
    }

    pub fn join(&mut self, target: impl Into<Arg>) -> &mut Self {
        self.unify(Call::new("join").with_arg(target))
    }

    pub fn options(&mut self, option: impl Into<Arg>) -> &mut Self {
        self.unify(Call::new("options").with_arg(option))
    }

    pub fn group_by(&mut self, expr: impl Into<Arg>) -> &mut Self {
        self.unify(Call::new("group_by").with_arg(expr))
    }

    pub fn order_by(&mut self, order: impl Into<Arg>) -> &mut Self {
        self.unify(Call::new("order_by").with_arg(order))
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.unify(Call::new("limit").with_arg(limit_value(n)))
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.unify(Call::new("distinct"))
    }

    /// Rows for the active chain, without recording anything.
    fn resolve(&self) -> Vec<Row> {
        let chain = active_chain(self.log.calls());
        if self.store.is_empty() {
            tracing::debug!("No fixtures registered, using default rows");
            return self.default.clone();
        }
        match self.store.select(chain) {
            Some(rows) => rows.to_vec(),
            None => {
                tracing::debug!(chain = chain.len(), "No fixture matched, using default rows");
                self.default.clone()
            }
        }
    }

    fn terminal(&mut self, name: &str) -> Vec<Row> {
        let rows = self.resolve();
        self.log.record(Call::new(name));
        rows
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn all(&mut self) -> Vec<Row> {
        self.terminal("all")
    }

    /// Iterate the resolved rows (`__iter__` in the call history).
    pub fn iter(&mut self) -> std::vec::IntoIter<Row> {
        self.terminal("__iter__").into_iter()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn count(&mut self) -> usize {
        self.terminal("count").len()
    }

    pub fn first(&mut self) -> Option<Row> {
        cursor::first(self.terminal("first"))
    }

    /// The only row.
    ///
    /// # Errors
    ///
    /// `NoResult` when nothing matched, `MultipleResults` when several rows
    /// did.
    #[allow(clippy::result_large_err)]
    pub fn one(&mut self) -> Result<Row> {
        cursor::one(self.terminal("one"))
    }

    #[allow(clippy::result_large_err)]
    pub fn one_or_none(&mut self) -> Result<Option<Row>> {
        cursor::one_or_none(self.terminal("one_or_none"))
    }

    /// The only distinct row; a one-column projection unwraps to its value.
    #[allow(clippy::result_large_err)]
    pub fn scalar(&mut self) -> Result<Option<Scalar>> {
        cursor::scalar(self.terminal("scalar"))
    }

    /// The chain's `query` call, looking through `execute(select(..))`.
    fn chain_query(&self) -> Option<Call> {
        active_chain(self.log.calls())
            .iter()
            .flat_map(expand_call)
            .find(|call| call.name() == "query")
    }

    /// Look up a row by primary key among every fixture of the queried
    /// entity.
    #[tracing::instrument(level = "debug", skip(self, key))]
    #[allow(clippy::result_large_err)]
    pub fn get(&mut self, key: impl Into<Key>) -> Result<Option<Row>> {
        let key = key.into();
        let rows = match self.chain_query() {
            Some(query) if !self.store.is_empty() => self.store.rows_for_get(&query),
            _ => self.resolve(),
        };
        self.log.record(Call::new("get").with_arg(Arg::from(&key)));

        let map = IdentityMap::build(&rows)?;
        let found = get_item_attr(&map, &key)?.cloned();
        tracing::debug!(found = found.is_some(), "Primary key lookup");
        Ok(found)
    }

    /// Store `record` under the plain `query(entity)` fixture.
    pub fn add(&mut self, record: impl Into<Record>) -> &mut Self {
        let record = record.into();
        self.log.record(Call::new("add").with_arg(record.clone()));
        self.store.add(record);
        self
    }

    pub fn add_all<I, R>(&mut self, records: I) -> &mut Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Record>,
    {
        let records: Vec<Record> = records.into_iter().map(Into::into).collect();
        self.log.record(
            Call::new("add_all").with_arg(records.iter().cloned().map(Arg::from).collect::<Vec<_>>()),
        );
        for record in records {
            self.store.add(record);
        }
        self
    }

    /// Empty the fixture matched by the active chain.
    ///
    /// Returns the number of rows removed; `0` when nothing matched.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn delete(&mut self) -> usize {
        let chain = active_chain(self.log.calls()).to_vec();
        let removed = self.store.delete(&chain);
        self.log.record(Call::new("delete"));
        removed
    }

    /// Set attributes on every row of the fixture matched by the active
    /// chain. Returns the number of rows updated.
    #[allow(clippy::result_large_err)]
    pub fn update<I, K, V>(&mut self, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let assignments: Vec<(String, Value)> = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let chain = active_chain(self.log.calls()).to_vec();
        self.log.record(Call::new("update").with_arg(Arg::map(
            assignments.iter().map(|(k, v)| (k.clone(), v.clone())),
        )));
        self.store.update(&chain, &assignments)
    }

    #[allow(clippy::result_large_err)]
    pub fn execute(&mut self, statement: impl Into<Statement>) -> Result<CursorResult<'_>> {
        self.execute_with(statement, serde_json::Value::Null)
    }

    /// Execute a statement with bound parameters.
    ///
    /// `params` is a JSON object or an array of objects. For inserts each
    /// object is one more row; for updates an object adds assignments.
    #[tracing::instrument(level = "debug", skip(self, statement, params))]
    #[allow(clippy::result_large_err)]
    pub fn execute_with(
        &mut self,
        statement: impl Into<Statement>,
        params: serde_json::Value,
    ) -> Result<CursorResult<'_>> {
        let statement = statement.into();
        tracing::debug!(kind = statement.kind(), "Executing statement");
        let call = Call::new("execute").with_arg(statement.clone());

        match statement {
            Statement::Select(_) => {
                self.unify(call);
                let rowcount = self.resolve().len();
                Ok(CursorResult::pending(self, rowcount))
            }
            Statement::Insert(insert) => {
                let records = insert_records(&insert, &params)?;
                self.log.record(call);
                let inserted = records.len();
                for record in records.iter().cloned() {
                    self.store.add(record);
                }
                let rows = if insert.is_returning() {
                    records.into_iter().map(Row::Entity).collect()
                } else {
                    Vec::new()
                };
                Ok(CursorResult::rows(rows, inserted))
            }
            Statement::Update(update) => {
                let mut assignments = update.assignments().to_vec();
                if let Some(object) = params.as_object() {
                    for (column, value) in object {
                        assignments.push((column.clone(), Value::from_json(value)));
                    }
                }
                let chain = self.write_chain(call);
                let updated = self.store.update(&chain, &assignments)?;
                Ok(CursorResult::rows(Vec::new(), updated))
            }
            Statement::Delete(_) => {
                let chain = self.write_chain(call);
                let removed = self.store.delete(&chain);
                Ok(CursorResult::rows(Vec::new(), removed))
            }
        }
    }

    /// Active chain extended by a write, which is then recorded.
    fn write_chain(&mut self, call: Call) -> Vec<Call> {
        let mut chain = active_chain(self.log.calls()).to_vec();
        chain.push(call.clone());
        self.log.record(call);
        chain
    }

    /// Recorded calls to `method`.
    pub fn method(&self, method: &str) -> MethodCalls<'_> {
        self.log.method(method)
    }

    /// Full named call history.
    pub fn mock_calls(&self) -> &[Call] {
        self.log.mock_calls()
    }

    /// See [`CallLog::assert_has_calls`].
    #[allow(clippy::result_large_err)]
    pub fn assert_has_calls(&self, expected: &[Call], any_order: bool) -> Result<()> {
        self.log.assert_has_calls(expected, any_order)
    }

    /// Forget the call history. Fixture data is kept.
    pub fn reset_mock(&mut self) {
        self.log.reset();
    }
}

#[allow(clippy::result_large_err)]
fn insert_records(insert: &Insert, params: &serde_json::Value) -> Result<Vec<Record>> {
    let extra: Vec<&serde_json::Value> = match params {
        serde_json::Value::Null => Vec::new(),
        serde_json::Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    insert
        .rows()
        .iter()
        .chain(extra)
        .map(|json| Record::from_json(insert.table().clone(), json))
        .collect()
}

impl<'s> IntoIterator for &'s mut UnifiedSession {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
