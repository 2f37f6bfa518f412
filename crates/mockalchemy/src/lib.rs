//! mockalchemy - deterministic session doubles for testing query construction.
//!
//! mockalchemy stands in for a database session in unit tests:
//!
//! - Query expressions compare equal when they render to the same SQL and
//!   parameters, regardless of how they were built
//! - Chained builder calls fold into one canonical query signature
//! - Signatures are matched against registered fixture rows
//! - Inserts, updates and deletes edit the in-memory fixtures
//! - Mock-style call assertions understand query expressions
//!
//! # Quick Start
//!
//! ```ignore
//! use mockalchemy::prelude::*;
//!
//! let c = || Expr::col("column");
//! let mut session = UnifiedSession::with_config(
//!     SessionConfig::new()
//!         .fixture(
//!             vec![call!(query, "foo"), call!(filter, c().eq("one"), c().eq("two"))],
//!             [Row::tuple([1]), Row::tuple([2])],
//!         )
//!         .fixture(
//!             vec![call!(query, "foo"), call!(filter, c().eq("three"))],
//!             [Row::tuple([3])],
//!         ),
//! );
//!
//! // Filter order does not matter.
//! let rows = session.query("foo").filter(c().eq("two")).filter(c().eq("one")).all();
//! assert_eq!(rows, vec![Row::tuple([1]), Row::tuple([2])]);
//!
//! // Deleting empties the matched fixture.
//! assert_eq!(session.query("foo").filter(c().eq("three")).delete(), 1);
//! assert_eq!(session.query("foo").filter(c().eq("three")).delete(), 0);
//!
//! session.method("filter").assert_any_call(&call!(_, c().eq("three")))?;
//! ```

pub use mockalchemy_core::{
    AssertionError, Error, KeyError, KeyErrorKind, Model, Record, Renderable, Result, Row,
    Scalar, Table, TypeError, Value,
};
pub use mockalchemy_query::{
    Delete, Dialect, Expr, Insert, Join, JoinType, OrderBy, OrderDirection, Select, Selectable,
    Statement, Update, and, delete, insert, or, select, update,
};
pub use mockalchemy_session::{
    AlchemyMock, Arg, Call, CallLog, Comparator, CursorResult, ExpressionMatcher, Fixture, Key,
    MethodCalls, PrettyExpression, SessionConfig, UnifiedSession, UnorderedTuple, call,
    get_item_attr, normalize_call,
};

/// Assert that two expressions render identically.
///
/// On failure both sides are shown in canonical form.
///
/// ```ignore
/// assert_expr_eq!(Expr::col("a").eq(1), Expr::col("a").eq(1));
/// ```
#[macro_export]
macro_rules! assert_expr_eq {
    ($left:expr, $right:expr $(,)?) => {{
        let left = $crate::ExpressionMatcher::new($left);
        let right = $crate::ExpressionMatcher::new($right);
        if left != right {
            panic!(
                "assertion `left == right` failed (expressions)\n  left: {}\n right: {}",
                left, right
            );
        }
    }};
}

/// Assert that two expressions render differently.
#[macro_export]
macro_rules! assert_expr_ne {
    ($left:expr, $right:expr $(,)?) => {{
        let left = $crate::ExpressionMatcher::new($left);
        let right = $crate::ExpressionMatcher::new($right);
        if left == right {
            panic!(
                "assertion `left != right` failed (expressions)\n  left: {}\n right: {}",
                left, right
            );
        }
    }};
}

/// Commonly used items.
///
/// ```ignore
/// use mockalchemy::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AlchemyMock, Arg, Call, Error, Expr, ExpressionMatcher, Fixture, Key, Model, OrderBy,
        PrettyExpression, Record, Result, Row, Scalar, SessionConfig, Table, UnifiedSession,
        UnorderedTuple, Value, and, delete, insert, or, select, update,
    };
    pub use crate::{assert_expr_eq, assert_expr_ne, call};
}
