//! ORDER BY and JOIN clause types.

use crate::expr::{Dialect, Expr, canonical};
use crate::statement::Selectable;
use mockalchemy_core::{Renderable, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Placement of NULLs within an ordered column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

impl NullsOrder {
    const fn keyword(self) -> &'static str {
        match self {
            Self::First => "NULLS FIRST",
            Self::Last => "NULLS LAST",
        }
    }
}

/// One ORDER BY term.
///
/// A term without an explicit direction renders as the bare expression.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub expr: Expr,
    pub direction: Option<OrderDirection>,
    pub nulls: Option<NullsOrder>,
}

impl OrderBy {
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            direction: None,
            nulls: None,
        }
    }

    #[must_use]
    pub fn direction(mut self, direction: OrderDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    #[must_use]
    pub fn nulls_first(self) -> Self {
        self.nulls(NullsOrder::First)
    }

    #[must_use]
    pub fn nulls_last(self) -> Self {
        self.nulls(NullsOrder::Last)
    }

    #[must_use]
    pub fn nulls(mut self, placement: NullsOrder) -> Self {
        self.nulls = Some(placement);
        self
    }

    pub fn build_with_dialect(
        &self,
        dialect: Dialect,
        params: &mut Vec<Value>,
        offset: usize,
    ) -> String {
        let keywords = self
            .direction
            .map(OrderDirection::keyword)
            .into_iter()
            .chain(self.nulls.map(NullsOrder::keyword));
        keywords.fold(
            self.expr.build_with_dialect(dialect, params, offset),
            |sql, word| format!("{sql} {word}"),
        )
    }

    fn is_bare(&self) -> bool {
        self.direction.is_none() && self.nulls.is_none()
    }
}

impl From<Expr> for OrderBy {
    fn from(expr: Expr) -> Self {
        OrderBy::new(expr)
    }
}

impl Renderable for OrderBy {
    fn canonical_form(&self) -> String {
        if self.is_bare() {
            return self.expr.canonical_form();
        }
        let mut params = Vec::new();
        let sql = self.build_with_dialect(Dialect::Postgres, &mut params, 0);
        canonical("UnaryExpression", &sql, &params)
    }
}

/// Types of SQL joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

impl JoinType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::Left => "LEFT OUTER JOIN",
        }
    }
}

/// A JOIN clause of a select statement.
#[derive(Debug, Clone)]
pub struct Join {
    pub join_type: JoinType,
    pub target: Selectable,
    pub on: Option<Expr>,
}

impl Join {
    pub fn new(join_type: JoinType, target: impl Into<Selectable>) -> Self {
        Self {
            join_type,
            target: target.into(),
            on: None,
        }
    }

    pub fn inner(target: impl Into<Selectable>) -> Self {
        Self::new(JoinType::Inner, target)
    }

    pub fn left(target: impl Into<Selectable>) -> Self {
        Self::new(JoinType::Left, target)
    }

    /// Set the ON condition.
    #[must_use]
    pub fn on(mut self, condition: Expr) -> Self {
        self.on = Some(condition);
        self
    }

    pub fn build_with_dialect(
        &self,
        dialect: Dialect,
        params: &mut Vec<Value>,
        offset: usize,
    ) -> String {
        let head = format!("{} {}", self.join_type.as_str(), self.target.from_clause(dialect));
        match &self.on {
            Some(on) => format!("{head} ON {}", on.build_with_dialect(dialect, params, offset)),
            None => head,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_order_renders_as_expression() {
        let bare = OrderBy::from(Expr::col("column"));
        assert_eq!(bare.canonical_form(), Expr::col("column").canonical_form());
    }

    #[test]
    fn test_directed_order() {
        let desc = Expr::col("name").desc().nulls_last();
        assert_eq!(
            desc.canonical_form(),
            "UnaryExpression(sql='\"name\" DESC NULLS LAST', params=[])"
        );
        assert_ne!(
            Expr::col("name").asc().canonical_form(),
            Expr::col("name").desc().canonical_form()
        );
    }

    #[test]
    fn test_join_sql() {
        let join = Join::left(Expr::text("other"))
            .on(Expr::qualified("other", "id").eq(Expr::qualified("t", "other_id")));
        let mut params = Vec::new();
        assert_eq!(
            join.build_with_dialect(Dialect::Postgres, &mut params, 0),
            "LEFT OUTER JOIN other ON \"other\".\"id\" = \"t\".\"other_id\""
        );
    }
}
