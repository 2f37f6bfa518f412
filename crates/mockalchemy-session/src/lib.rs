//! Call-unifying session double for mockalchemy.
//!
//! `mockalchemy-session` is the **engine** of the workspace. It records calls
//! made on a session, folds repeated builder calls into one canonical chain,
//! and answers terminal calls from registered fixture data.
//!
//! # Core Concepts
//!
//! - **Call**: a recorded `(name, args, kwargs)` triple.
//! - **ExpressionMatcher**: equality of arguments by canonical rendering.
//! - **Chain**: calls since the last terminal or mutation.
//! - **Fixture**: a call signature and the rows a containing chain returns.
//! - **UnifiedSession**: the session double itself.
//! - **AlchemyMock**: a plain recorder with the same assertions.
//!
//! # Example
//!
//! ```ignore
//! let mut session = UnifiedSession::with_config(
//!     SessionConfig::new().fixture(
//!         vec![call!(query, "foo"), call!(filter, c.eq("one"), c.eq("two"))],
//!         [Row::tuple([1]), Row::tuple([2])],
//!     ),
//! );
//! let rows = session.query("foo").filter(c.eq("two")).filter(c.eq("one")).all();
//! assert_eq!(rows.len(), 2);
//! ```

pub mod call;
pub mod chain;
pub mod comparison;
pub mod cursor;
pub mod fixture;
pub mod identity_map;
pub mod mock;
pub mod recorder;
pub mod registry;
pub mod session;

pub use call::{Arg, Call};
pub use chain::{active_chain, expand_call, expand_statement, normalize_chain};
pub use comparison::{
    Comparator, ExpressionMatcher, NormalizedCall, PrettyExpression, UnorderedTuple,
    normalize_call,
};
pub use cursor::CursorResult;
pub use fixture::{Fixture, FixtureStore};
pub use identity_map::{IdentityMap, Key, get_item_attr};
pub use mock::AlchemyMock;
pub use recorder::{CallLog, MethodCalls};
pub use registry::{MethodKind, method_kind};
pub use session::{SessionConfig, UnifiedSession};
