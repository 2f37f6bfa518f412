//! Recorded calls and their arguments.

use mockalchemy_core::{Record, Renderable, Row, Table, Value};
use mockalchemy_query::{Delete, Expr, Insert, OrderBy, Select, Selectable, Statement, Update};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One argument of a recorded call.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Matches any other argument
    Any,
    /// Plain literal
    Value(Value),
    /// Any expression compared by canonical rendering
    Expr(Arc<dyn Renderable>),
    /// A mapped entity, as in `query(Model)`
    Entity(Arc<Table>),
    /// A statement passed to `execute`
    Statement(Statement),
    /// A stored row, as in `add(obj)`
    Row(Row),
    List(Vec<Arg>),
    Map(BTreeMap<String, Arg>),
}

impl Arg {
    /// Wrap any renderable value.
    pub fn expr(expr: impl Renderable + 'static) -> Self {
        Arg::Expr(Arc::new(expr))
    }

    /// Build a mapping argument.
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Arg>,
    {
        Arg::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Arg::Any)
    }

    pub fn as_statement(&self) -> Option<&Statement> {
        match self {
            Arg::Statement(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Arg::Row(r) => Some(r),
            _ => None,
        }
    }
}

impl Renderable for Arg {
    fn canonical_form(&self) -> String {
        match self {
            Arg::Any => "<ANY>".to_string(),
            Arg::Value(v) => v.to_string(),
            Arg::Expr(e) => e.canonical_form(),
            Arg::Entity(t) => t.canonical_form(),
            Arg::Statement(s) => s.canonical_form(),
            Arg::Row(r) => r.to_string(),
            Arg::List(items) => {
                let parts: Vec<_> = items.iter().map(Arg::canonical_form).collect();
                format!("[{}]", parts.join(", "))
            }
            Arg::Map(entries) => {
                let parts: Vec<_> = entries
                    .iter()
                    .map(|(k, v)| format!("'{k}': {}", v.canonical_form()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_form())
    }
}

macro_rules! arg_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(v: $ty) -> Self {
                    Arg::Value(Value::from(v))
                }
            }
        )*
    };
}

arg_from_value!(bool, i32, i64, u32, f64, &str, String, Value);

impl From<Expr> for Arg {
    fn from(e: Expr) -> Self {
        Arg::expr(e)
    }
}

impl From<OrderBy> for Arg {
    fn from(o: OrderBy) -> Self {
        Arg::expr(o)
    }
}

impl From<Selectable> for Arg {
    fn from(s: Selectable) -> Self {
        match s {
            Selectable::Entity(t) => Arg::Entity(t),
            Selectable::Expr(e) => Arg::expr(e),
        }
    }
}

impl From<Arc<Table>> for Arg {
    fn from(t: Arc<Table>) -> Self {
        Arg::Entity(t)
    }
}

impl From<&Arc<Table>> for Arg {
    fn from(t: &Arc<Table>) -> Self {
        Arg::Entity(Arc::clone(t))
    }
}

impl From<Table> for Arg {
    fn from(t: Table) -> Self {
        Arg::Entity(Arc::new(t))
    }
}

impl From<Statement> for Arg {
    fn from(s: Statement) -> Self {
        Arg::Statement(s)
    }
}

macro_rules! arg_from_statement {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg {
                fn from(s: $ty) -> Self {
                    Arg::Statement(Statement::from(s))
                }
            }
        )*
    };
}

arg_from_statement!(Select, Insert, Update, Delete);

impl From<Row> for Arg {
    fn from(r: Row) -> Self {
        Arg::Row(r)
    }
}

impl From<Record> for Arg {
    fn from(r: Record) -> Self {
        Arg::Row(Row::Entity(r))
    }
}

impl From<Vec<Arg>> for Arg {
    fn from(items: Vec<Arg>) -> Self {
        Arg::List(items)
    }
}

/// A recorded invocation: `(name, args, kwargs)`.
///
/// Keyword arguments live in a `BTreeMap`, so comparison and rendering are
/// independent of the order they were passed in. An empty name marks an
/// anonymous call, as used for per-method assertions.
#[derive(Debug, Clone, Default)]
pub struct Call {
    name: String,
    args: Vec<Arg>,
    kwargs: BTreeMap<String, Arg>,
}

impl Call {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    /// A call with no method name.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several positional arguments.
    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a keyword argument.
    #[must_use]
    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn kwargs(&self) -> &BTreeMap<String, Arg> {
        &self.kwargs
    }

    /// Statement arguments, in order. A collapsed `execute` carries several.
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.args.iter().filter_map(Arg::as_statement)
    }

    /// Combine with a later call to the same method: positional arguments
    /// are concatenated and `later`'s keyword arguments override.
    #[must_use]
    pub fn merge(&self, later: &Call) -> Call {
        let mut merged = self.clone();
        merged.args.extend(later.args.iter().cloned());
        for (k, v) in &later.kwargs {
            merged.kwargs.insert(k.clone(), v.clone());
        }
        merged
    }

    /// The same arguments under another name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Call {
        Call {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// Render `(args, key=value)` in canonical form.
pub(crate) fn render_arguments<'a>(
    args: impl IntoIterator<Item = String>,
    kwargs: impl IntoIterator<Item = (&'a String, String)>,
) -> String {
    let mut parts: Vec<String> = args.into_iter().collect();
    parts.extend(kwargs.into_iter().map(|(k, v)| format!("{k}={v}")));
    format!("({})", parts.join(", "))
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = render_arguments(
            self.args.iter().map(Arg::canonical_form),
            self.kwargs.iter().map(|(k, v)| (k, v.canonical_form())),
        );
        if self.is_anonymous() {
            write!(f, "call{rendered}")
        } else {
            write!(f, "call.{}{rendered}", self.name)
        }
    }
}

/// Build a [`Call`].
///
/// ```ignore
/// call!(filter, Expr::col("a").eq(1), Expr::col("b").eq(2));
/// call!(filter_by; name = "x");
/// call!(_, 5); // anonymous
/// ```
#[macro_export]
macro_rules! call {
    (_ $(, $arg:expr)* $(; $($key:ident = $val:expr),+)?) => {{
        #[allow(unused_mut)]
        let mut call = $crate::Call::anonymous();
        $( call = call.with_arg($arg); )*
        $( $( call = call.with_kwarg(stringify!($key), $val); )+ )?
        call
    }};
    ($name:ident $(, $arg:expr)* $(; $($key:ident = $val:expr),+)?) => {{
        #[allow(unused_mut)]
        let mut call = $crate::Call::new(stringify!($name));
        $( call = call.with_arg($arg); )*
        $( $( call = call.with_kwarg(stringify!($key), $val); )+ )?
        call
    }};
}
