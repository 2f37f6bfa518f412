//! Statement builders: SELECT, INSERT, UPDATE and DELETE.
//!
//! Statements are only ever rendered, never executed. The session double
//! reads their parts back (target, criteria, ordering, values) to match and
//! mutate fixture data.

use crate::clause::{Join, OrderBy};
use crate::expr::{self, Dialect, Expr, canonical};
use mockalchemy_core::{Renderable, Table, Value};
use std::sync::Arc;

/// Something that can appear in a select list: a whole entity or an
/// expression such as a column or a text fragment.
#[derive(Debug, Clone)]
pub enum Selectable {
    Entity(Arc<Table>),
    Expr(Expr),
}

impl Selectable {
    /// Table this target selects from, if it names one.
    pub fn table_name(&self) -> Option<&str> {
        match self {
            Selectable::Entity(table) => Some(table.name()),
            Selectable::Expr(e) => e.table_name(),
        }
    }

    fn build_columns(&self, dialect: Dialect, params: &mut Vec<Value>, offset: usize) -> String {
        match self {
            Selectable::Entity(table) => {
                let qualifier = dialect.quote_identifier(table.name());
                if table.column_names().is_empty() {
                    return format!("{qualifier}.*");
                }
                table
                    .column_names()
                    .iter()
                    .map(|c| format!("{qualifier}.{}", dialect.quote_identifier(c)))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
            Selectable::Expr(e) => e.build_with_dialect(dialect, params, offset),
        }
    }

    pub(crate) fn from_clause(&self, dialect: Dialect) -> String {
        match self {
            Selectable::Expr(Expr::Text(sql)) => sql.clone(),
            other => match other.table_name() {
                Some(name) => dialect.quote_identifier(name),
                None => {
                    let mut scratch = Vec::new();
                    other.build_columns(dialect, &mut scratch, 0)
                }
            },
        }
    }
}

impl Renderable for Selectable {
    fn canonical_form(&self) -> String {
        match self {
            Selectable::Entity(table) => table.canonical_form(),
            Selectable::Expr(e) => e.canonical_form(),
        }
    }
}

impl From<Arc<Table>> for Selectable {
    fn from(table: Arc<Table>) -> Self {
        Selectable::Entity(table)
    }
}

impl From<&Arc<Table>> for Selectable {
    fn from(table: &Arc<Table>) -> Self {
        Selectable::Entity(Arc::clone(table))
    }
}

impl From<Table> for Selectable {
    fn from(table: Table) -> Self {
        Selectable::Entity(Arc::new(table))
    }
}

impl From<Expr> for Selectable {
    fn from(e: Expr) -> Self {
        Selectable::Expr(e)
    }
}

fn where_clause(
    wheres: &[Expr],
    dialect: Dialect,
    params: &mut Vec<Value>,
    offset: usize,
) -> Option<String> {
    expr::and(wheres.iter().cloned())
        .map(|criteria| format!(" WHERE {}", criteria.build_with_dialect(dialect, params, offset)))
}

fn render(kind: &str, (sql, params): (String, Vec<Value>)) -> String {
    canonical(kind, &sql, &params)
}

// ==================== SELECT ====================

/// A SELECT statement.
///
/// `select(a).filter(x).filter(y)` and `select(a).filter(x.and(y))` render
/// identically.
#[derive(Debug, Clone, Default)]
pub struct Select {
    targets: Vec<Selectable>,
    joins: Vec<Join>,
    wheres: Vec<Expr>,
    group_by: Vec<Expr>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    distinct: bool,
}

/// Create a SELECT over one target.
pub fn select(target: impl Into<Selectable>) -> Select {
    Select::new().column(target)
}

impl Select {
    /// A SELECT with no targets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target to the select list.
    #[must_use]
    pub fn column(mut self, target: impl Into<Selectable>) -> Self {
        self.targets.push(target.into());
        self
    }

    /// Add a WHERE criterion, ANDed with the existing ones.
    #[must_use]
    pub fn filter(mut self, criterion: Expr) -> Self {
        self.wheres.push(criterion);
        self
    }

    /// Add an inner join.
    #[must_use]
    pub fn join(mut self, target: impl Into<Selectable>) -> Self {
        self.joins.push(Join::inner(target));
        self
    }

    /// Add an inner join with an ON condition.
    #[must_use]
    pub fn join_on(mut self, target: impl Into<Selectable>, on: Expr) -> Self {
        self.joins.push(Join::inner(target).on(on));
        self
    }

    #[must_use]
    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    #[must_use]
    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.order_by.push(order.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    #[must_use]
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn targets(&self) -> &[Selectable] {
        &self.targets
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn wheres(&self) -> &[Expr] {
        &self.wheres
    }

    pub fn group_bys(&self) -> &[Expr] {
        &self.group_by
    }

    pub fn order_bys(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Build SQL and parameters (default PostgreSQL dialect).
    pub fn build(&self) -> (String, Vec<Value>) {
        self.build_with_dialect(Dialect::Postgres)
    }

    pub fn build_with_dialect(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let mut sql = String::from("SELECT");

        if self.distinct {
            sql.push_str(" DISTINCT");
        }

        if !self.targets.is_empty() {
            let cols: Vec<_> = self
                .targets
                .iter()
                .map(|t| t.build_columns(dialect, &mut params, 0))
                .collect();
            sql.push(' ');
            sql.push_str(&cols.join(", "));
        }

        let joined: Vec<Option<&str>> = self.joins.iter().map(|j| j.target.table_name()).collect();
        let mut froms: Vec<String> = Vec::new();
        for target in &self.targets {
            let Some(name) = target.table_name() else {
                continue;
            };
            if joined.contains(&Some(name)) {
                continue;
            }
            let quoted = dialect.quote_identifier(name);
            if !froms.contains(&quoted) {
                froms.push(quoted);
            }
        }
        if !froms.is_empty() {
            sql.push_str(" FROM ");
            sql.push_str(&froms.join(", "));
        }

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.build_with_dialect(dialect, &mut params, 0));
        }

        if let Some(where_sql) = where_clause(&self.wheres, dialect, &mut params, 0) {
            sql.push_str(&where_sql);
        }

        if !self.group_by.is_empty() {
            let groups: Vec<_> = self
                .group_by
                .iter()
                .map(|g| g.build_with_dialect(dialect, &mut params, 0))
                .collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&groups.join(", "));
        }

        if !self.order_by.is_empty() {
            let orders: Vec<_> = self
                .order_by
                .iter()
                .map(|o| o.build_with_dialect(dialect, &mut params, 0))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        (sql, params)
    }
}

impl Renderable for Select {
    fn canonical_form(&self) -> String {
        render("Select", self.build())
    }
}

// ==================== INSERT ====================

/// An INSERT statement.
///
/// Values are JSON objects keyed by column name, one per inserted row.
#[derive(Debug, Clone)]
pub struct Insert {
    table: Arc<Table>,
    rows: Vec<serde_json::Value>,
    returning: bool,
}

/// Create an INSERT into a table.
pub fn insert(table: impl Into<Arc<Table>>) -> Insert {
    Insert {
        table: table.into(),
        rows: Vec::new(),
        returning: false,
    }
}

impl Insert {
    /// Add rows: a JSON object adds one row, a JSON array adds one per element.
    #[must_use]
    pub fn values(mut self, values: serde_json::Value) -> Self {
        match values {
            serde_json::Value::Array(rows) => self.rows.extend(rows),
            row => self.rows.push(row),
        }
        self
    }

    /// Return the inserted rows from execution.
    #[must_use]
    pub fn returning(mut self) -> Self {
        self.returning = true;
        self
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn rows(&self) -> &[serde_json::Value] {
        &self.rows
    }

    pub fn is_returning(&self) -> bool {
        self.returning
    }

    pub fn build(&self) -> (String, Vec<Value>) {
        self.build_with_dialect(Dialect::Postgres)
    }

    pub fn build_with_dialect(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let mut sql = format!("INSERT INTO {}", dialect.quote_identifier(self.table.name()));

        let columns: Vec<&String> = self
            .rows
            .first()
            .and_then(serde_json::Value::as_object)
            .map(|row| row.keys().collect())
            .unwrap_or_default();

        if columns.is_empty() {
            sql.push_str(" DEFAULT VALUES");
        } else {
            let names: Vec<_> = columns
                .iter()
                .map(|c| dialect.quote_identifier(c))
                .collect();
            sql.push_str(&format!(" ({}) VALUES ", names.join(", ")));

            let mut tuples = Vec::with_capacity(self.rows.len());
            for row in &self.rows {
                let placeholders: Vec<_> = columns
                    .iter()
                    .map(|c| {
                        let value = row.get(c.as_str()).map_or(Value::Null, Value::from_json);
                        params.push(value);
                        dialect.placeholder(params.len())
                    })
                    .collect();
                tuples.push(format!("({})", placeholders.join(", ")));
            }
            sql.push_str(&tuples.join(", "));
        }

        if self.returning {
            sql.push_str(" RETURNING *");
        }
        (sql, params)
    }
}

impl Renderable for Insert {
    fn canonical_form(&self) -> String {
        render("Insert", self.build())
    }
}

// ==================== UPDATE ====================

/// An UPDATE statement.
#[derive(Debug, Clone)]
pub struct Update {
    table: Arc<Table>,
    wheres: Vec<Expr>,
    assignments: Vec<(String, Value)>,
}

/// Create an UPDATE of a table.
pub fn update(table: impl Into<Arc<Table>>) -> Update {
    Update {
        table: table.into(),
        wheres: Vec::new(),
        assignments: Vec::new(),
    }
}

impl Update {
    #[must_use]
    pub fn filter(mut self, criterion: Expr) -> Self {
        self.wheres.push(criterion);
        self
    }

    /// Set one column. A later assignment to the same column wins.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.assignments.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.assignments.push((column, value)),
        }
        self
    }

    /// Set every key of a JSON object.
    #[must_use]
    pub fn values(mut self, values: &serde_json::Value) -> Self {
        if let Some(object) = values.as_object() {
            for (column, value) in object {
                self = self.set(column.as_str(), Value::from_json(value));
            }
        }
        self
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn wheres(&self) -> &[Expr] {
        &self.wheres
    }

    pub fn assignments(&self) -> &[(String, Value)] {
        &self.assignments
    }

    pub fn build(&self) -> (String, Vec<Value>) {
        self.build_with_dialect(Dialect::Postgres)
    }

    pub fn build_with_dialect(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let mut sql = format!("UPDATE {}", dialect.quote_identifier(self.table.name()));

        if !self.assignments.is_empty() {
            let sets: Vec<_> = self
                .assignments
                .iter()
                .map(|(column, value)| {
                    params.push(value.clone());
                    format!(
                        "{} = {}",
                        dialect.quote_identifier(column),
                        dialect.placeholder(params.len())
                    )
                })
                .collect();
            sql.push_str(" SET ");
            sql.push_str(&sets.join(", "));
        }

        if let Some(where_sql) = where_clause(&self.wheres, dialect, &mut params, 0) {
            sql.push_str(&where_sql);
        }
        (sql, params)
    }
}

impl Renderable for Update {
    fn canonical_form(&self) -> String {
        render("Update", self.build())
    }
}

// ==================== DELETE ====================

/// A DELETE statement.
#[derive(Debug, Clone)]
pub struct Delete {
    table: Arc<Table>,
    wheres: Vec<Expr>,
}

/// Create a DELETE from a table.
pub fn delete(table: impl Into<Arc<Table>>) -> Delete {
    Delete {
        table: table.into(),
        wheres: Vec::new(),
    }
}

impl Delete {
    #[must_use]
    pub fn filter(mut self, criterion: Expr) -> Self {
        self.wheres.push(criterion);
        self
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn wheres(&self) -> &[Expr] {
        &self.wheres
    }

    pub fn build(&self) -> (String, Vec<Value>) {
        self.build_with_dialect(Dialect::Postgres)
    }

    pub fn build_with_dialect(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM {}", dialect.quote_identifier(self.table.name()));
        if let Some(where_sql) = where_clause(&self.wheres, dialect, &mut params, 0) {
            sql.push_str(&where_sql);
        }
        (sql, params)
    }
}

impl Renderable for Delete {
    fn canonical_form(&self) -> String {
        render("Delete", self.build())
    }
}

// ==================== Statement ====================

/// Any statement accepted by `execute`.
#[derive(Debug, Clone)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl Statement {
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Select(_) => "Select",
            Statement::Insert(_) => "Insert",
            Statement::Update(_) => "Update",
            Statement::Delete(_) => "Delete",
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, Statement::Select(_))
    }

    pub fn build(&self) -> (String, Vec<Value>) {
        match self {
            Statement::Select(s) => s.build(),
            Statement::Insert(s) => s.build(),
            Statement::Update(s) => s.build(),
            Statement::Delete(s) => s.build(),
        }
    }
}

impl Renderable for Statement {
    fn canonical_form(&self) -> String {
        render(self.kind(), self.build())
    }
}

impl From<Select> for Statement {
    fn from(s: Select) -> Self {
        Statement::Select(s)
    }
}

impl From<Insert> for Statement {
    fn from(s: Insert) -> Self {
        Statement::Insert(s)
    }
}

impl From<Update> for Statement {
    fn from(s: Update) -> Self {
        Statement::Update(s)
    }
}

impl From<Delete> for Statement {
    fn from(s: Delete) -> Self {
        Statement::Delete(s)
    }
}
