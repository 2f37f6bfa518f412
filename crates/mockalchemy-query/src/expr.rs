//! SQL expressions with a canonical rendering.
//!
//! Expressions are plain trees with no structural equality. Two expressions
//! are considered the same when they compile to the same SQL text with the
//! same bound parameters, which is what [`Renderable::canonical_form`]
//! reports.

use crate::clause::{OrderBy, OrderDirection};
use mockalchemy_core::{Renderable, Value};

/// Placeholder and quoting conventions used when compiling expressions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// `$n` placeholders, double-quoted identifiers. Used for canonical forms.
    #[default]
    Postgres,
    /// `?n` placeholders, double-quoted identifiers.
    Sqlite,
    /// Bare `?` placeholders, backtick-quoted identifiers.
    Mysql,
}

impl Dialect {
    /// Placeholder for the 1-based parameter position `n`.
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Self::Postgres => format!("${n}"),
            Self::Sqlite => format!("?{n}"),
            Self::Mysql => String::from("?"),
        }
    }

    /// Quote `ident`, escaping the quote character by doubling it.
    pub fn quote_identifier(self, ident: &str) -> String {
        let quote = match self {
            Self::Postgres | Self::Sqlite => '"',
            Self::Mysql => '`',
        };
        let mut out = String::with_capacity(ident.len() + 2);
        out.push(quote);
        for ch in ident.chars() {
            if ch == quote {
                out.push(quote);
            }
            out.push(ch);
        }
        out.push(quote);
        out
    }
}

/// A SQL expression usable in WHERE, ORDER BY, GROUP BY and select lists.
#[derive(Debug, Clone)]
pub enum Expr {
    /// `[table.]name`
    Column { table: Option<String>, name: String },
    /// A value; always compiled to a placeholder.
    Literal(Value),
    /// `left op right`
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// `NOT (expr)`
    Not(Box<Expr>),
    /// `name(args..)`
    Function { name: String, args: Vec<Expr> },
    /// `expr [NOT] IN (values..)`
    In {
        expr: Box<Expr>,
        values: Vec<Expr>,
        negated: bool,
    },
    /// `expr [NOT] BETWEEN low AND high`
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    /// `expr IS [NOT] NULL`
    IsNull { expr: Box<Expr>, negated: bool },
    /// `expr [NOT] LIKE pattern`, with the pattern bound.
    Like {
        expr: Box<Expr>,
        pattern: String,
        negated: bool,
    },
    /// `expr AS name`
    Label { expr: Box<Expr>, name: String },
    /// Raw SQL, emitted as-is.
    Text(String),
    /// `(expr)`
    Paren(Box<Expr>),
    /// `count(*)`
    CountStar,
}

/// Comparison and boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Operator token as written in SQL.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Binding strength; an operand with a lower value than its parent is
    /// wrapped in parentheses.
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            _ => 3,
        }
    }

    const fn is_boolean(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

impl Expr {
    pub fn col(name: impl Into<String>) -> Self {
        Self::Column {
            table: None,
            name: name.into(),
        }
    }

    /// `table.column`
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Column {
            table: Some(table.into()),
            name: column.into(),
        }
    }

    pub fn lit(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn null() -> Self {
        Self::lit(Value::Null)
    }

    /// Raw SQL such as `text("foo")`; it binds no parameters.
    pub fn text(sql: impl Into<String>) -> Self {
        Self::Text(sql.into())
    }

    fn op(self, op: BinaryOp, rhs: impl Into<Expr>) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(rhs.into()),
        }
    }

    pub fn eq(self, rhs: impl Into<Expr>) -> Self {
        self.op(BinaryOp::Eq, rhs)
    }

    pub fn ne(self, rhs: impl Into<Expr>) -> Self {
        self.op(BinaryOp::Ne, rhs)
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Self {
        self.op(BinaryOp::Lt, rhs)
    }

    pub fn le(self, rhs: impl Into<Expr>) -> Self {
        self.op(BinaryOp::Le, rhs)
    }

    pub fn gt(self, rhs: impl Into<Expr>) -> Self {
        self.op(BinaryOp::Gt, rhs)
    }

    pub fn ge(self, rhs: impl Into<Expr>) -> Self {
        self.op(BinaryOp::Ge, rhs)
    }

    pub fn and(self, rhs: impl Into<Expr>) -> Self {
        self.op(BinaryOp::And, rhs)
    }

    pub fn or(self, rhs: impl Into<Expr>) -> Self {
        self.op(BinaryOp::Or, rhs)
    }

    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    pub fn is_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    pub fn is_not_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    pub fn like(self, pattern: impl Into<String>) -> Self {
        self.pattern(pattern.into(), false)
    }

    pub fn not_like(self, pattern: impl Into<String>) -> Self {
        self.pattern(pattern.into(), true)
    }

    fn pattern(self, pattern: String, negated: bool) -> Self {
        Self::Like {
            expr: Box::new(self),
            pattern,
            negated,
        }
    }

    pub fn in_list<E: Into<Expr>>(self, values: impl IntoIterator<Item = E>) -> Self {
        self.membership(values, false)
    }

    pub fn not_in_list<E: Into<Expr>>(self, values: impl IntoIterator<Item = E>) -> Self {
        self.membership(values, true)
    }

    fn membership<E: Into<Expr>>(self, values: impl IntoIterator<Item = E>, negated: bool) -> Self {
        Self::In {
            expr: Box::new(self),
            values: values.into_iter().map(Into::into).collect(),
            negated,
        }
    }

    /// Inclusive range check.
    pub fn between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Self {
        Self::Between {
            expr: Box::new(self),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: false,
        }
    }

    /// `name(args..)`, for SQL functions without a dedicated helper.
    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Function {
            name: name.into(),
            args,
        }
    }

    pub fn count_star() -> Self {
        Self::CountStar
    }

    /// `count(self)`
    pub fn count(self) -> Self {
        Self::function("count", vec![self])
    }

    pub fn label(self, name: impl Into<String>) -> Self {
        Self::Label {
            expr: Box::new(self),
            name: name.into(),
        }
    }

    pub fn asc(self) -> OrderBy {
        OrderBy::new(self).direction(OrderDirection::Asc)
    }

    pub fn desc(self) -> OrderBy {
        OrderBy::new(self).direction(OrderDirection::Desc)
    }

    pub fn paren(self) -> Self {
        Self::Paren(Box::new(self))
    }

    /// Table qualifier of a column reference, looking through labels.
    pub fn table_name(&self) -> Option<&str> {
        match self {
            Self::Column { table, .. } => table.as_deref(),
            Self::Label { expr, .. } => expr.table_name(),
            _ => None,
        }
    }

    /// Name of the construct, used as the prefix of the canonical form.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Column { .. } => "Column",
            Self::Literal(_) => "BindParameter",
            Self::Binary { op, .. } if op.is_boolean() => "BooleanClauseList",
            Self::Binary { .. }
            | Self::In { .. }
            | Self::Between { .. }
            | Self::IsNull { .. }
            | Self::Like { .. } => "BinaryExpression",
            Self::Not(_) => "UnaryExpression",
            Self::Function { .. } | Self::CountStar => "Function",
            Self::Label { .. } => "Label",
            Self::Text(_) => "TextClause",
            Self::Paren(_) => "Grouping",
        }
    }

    /// Compile with [`Dialect::Postgres`].
    pub fn build(&self, params: &mut Vec<Value>, offset: usize) -> String {
        self.build_with_dialect(Dialect::Postgres, params, offset)
    }

    /// Compile to SQL, appending bound values to `params`.
    ///
    /// Placeholders are numbered from `offset + params.len() + 1`, so a
    /// statement can compile its clauses one after another into one list.
    pub fn build_with_dialect(
        &self,
        dialect: Dialect,
        params: &mut Vec<Value>,
        offset: usize,
    ) -> String {
        let mut out = Compiler {
            dialect,
            params,
            offset,
        };
        out.expr(self)
    }
}

struct Compiler<'p> {
    dialect: Dialect,
    params: &'p mut Vec<Value>,
    offset: usize,
}

impl Compiler<'_> {
    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        self.dialect.placeholder(self.offset + self.params.len())
    }

    fn list(&mut self, exprs: &[Expr]) -> String {
        exprs
            .iter()
            .map(|e| self.expr(e))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn operand(&mut self, parent: BinaryOp, expr: &Expr) -> String {
        let sql = self.expr(expr);
        match expr {
            Expr::Binary { op, .. } if op.precedence() < parent.precedence() => format!("({sql})"),
            _ => sql,
        }
    }

    fn expr(&mut self, expr: &Expr) -> String {
        let dialect = self.dialect;
        let q = |ident: &str| dialect.quote_identifier(ident);
        match expr {
            Expr::Column { table: None, name } => q(name),
            Expr::Column {
                table: Some(table),
                name,
            } => format!("{}.{}", q(table), q(name)),
            Expr::Literal(value) => self.bind(value.clone()),
            Expr::Binary { left, op, right } => {
                let lhs = self.operand(*op, left);
                let rhs = self.operand(*op, right);
                format!("{lhs} {} {rhs}", op.as_str())
            }
            Expr::Not(inner) => format!("NOT ({})", self.expr(inner)),
            Expr::Function { name, args } => format!("{name}({})", self.list(args)),
            Expr::In {
                expr,
                values,
                negated,
            } => {
                let target = self.expr(expr);
                format!("{target} {}IN ({})", not_prefix(*negated), self.list(values))
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let target = self.expr(expr);
                let low = self.expr(low);
                let high = self.expr(high);
                format!("{target} {}BETWEEN {low} AND {high}", not_prefix(*negated))
            }
            Expr::IsNull { expr, negated } => {
                let target = self.expr(expr);
                format!("{target} IS {}NULL", not_prefix(*negated))
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                let target = self.expr(expr);
                let slot = self.bind(Value::Text(pattern.clone()));
                format!("{target} {}LIKE {slot}", not_prefix(*negated))
            }
            Expr::Label { expr, name } => {
                let inner = self.expr(expr);
                format!("{inner} AS {}", q(name))
            }
            Expr::Text(sql) => sql.clone(),
            Expr::Paren(inner) => format!("({})", self.expr(inner)),
            Expr::CountStar => String::from("count(*)"),
        }
    }
}

fn not_prefix(negated: bool) -> &'static str {
    if negated { "NOT " } else { "" }
}

/// Join criteria with AND. A single criterion is returned unchanged.
///
/// Returns `None` for an empty input.
pub fn and<I>(exprs: I) -> Option<Expr>
where
    I: IntoIterator<Item = Expr>,
{
    exprs.into_iter().reduce(|lhs, rhs| lhs.and(rhs))
}

/// Join criteria with OR; see [`and`].
pub fn or<I>(exprs: I) -> Option<Expr>
where
    I: IntoIterator<Item = Expr>,
{
    exprs.into_iter().reduce(|lhs, rhs| lhs.or(rhs))
}

/// `Kind(sql='..', params=[..])`
pub(crate) fn canonical(kind: &str, sql: &str, params: &[Value]) -> String {
    let params: Vec<String> = params.iter().map(ToString::to_string).collect();
    format!("{kind}(sql='{sql}', params=[{}])", params.join(", "))
}

impl Renderable for Expr {
    fn canonical_form(&self) -> String {
        let mut params = Vec::new();
        let sql = self.build(&mut params, 0);
        canonical(self.kind(), &sql, &params)
    }
}

macro_rules! literal_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Expr::Literal(Value::from(value))
                }
            }
        )*
    };
}

literal_from!(Value, &str, String, i32, i64, bool, f64);
