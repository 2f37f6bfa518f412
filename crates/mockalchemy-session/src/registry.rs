//! The closed table of session method kinds.

use crate::call::Call;
use crate::comparison::Comparator;

/// Terminal that resolves the active chain against the fixture store.
pub const BOUNDARY_METHODS: &[&str] = &[
    "all",
    "__iter__",
    "count",
    "first",
    "one",
    "one_or_none",
    "get",
    "scalar",
];

/// Builder methods whose repeated calls fold into one.
pub const UNIFY_METHODS: &[&str] = &[
    "query",
    "add_columns",
    "join",
    "options",
    "group_by",
    "filter",
    "filter_by",
    "where",
    "order_by",
    "limit",
    "distinct",
    "execute",
];

/// Operations that change the fixture store.
pub const MUTATION_METHODS: &[&str] = &["add", "add_all", "delete", "update"];

/// What a session does with a call of a given name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Recorded and folded with earlier calls of the same name
    Unify(Comparator),
    /// Resolves fixture data and ends the chain
    Boundary,
    /// Mutates fixture data and ends the chain
    Mutation,
    /// Recorded only
    Passthrough,
}

pub fn method_kind(name: &str) -> MethodKind {
    if BOUNDARY_METHODS.contains(&name) {
        MethodKind::Boundary
    } else if MUTATION_METHODS.contains(&name) {
        MethodKind::Mutation
    } else if UNIFY_METHODS.contains(&name) {
        MethodKind::Unify(comparator_for(name))
    } else {
        MethodKind::Passthrough
    }
}

/// Positional-argument comparator used for calls named `name`.
pub fn comparator_for(name: &str) -> Comparator {
    match name {
        "filter" | "filter_by" | "where" => Comparator::Unordered,
        _ => Comparator::Ordered,
    }
}

pub fn is_unifiable(name: &str) -> bool {
    matches!(method_kind(name), MethodKind::Unify(_))
}

/// Whether `call` closes the chain of calls before it.
///
/// `execute` carrying an insert, update or delete statement is a mutation;
/// `execute` of selects only is an ordinary builder call.
pub fn ends_chain(call: &Call) -> bool {
    match method_kind(call.name()) {
        MethodKind::Boundary | MethodKind::Mutation => true,
        MethodKind::Unify(_) if call.name() == "execute" => {
            call.statements().any(|s| !s.is_select())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockalchemy_core::Table;
    use mockalchemy_query::{delete, select};

    #[test]
    fn test_method_kinds() {
        assert_eq!(method_kind("all"), MethodKind::Boundary);
        assert_eq!(method_kind("scalar"), MethodKind::Boundary);
        assert_eq!(method_kind("add_all"), MethodKind::Mutation);
        assert_eq!(
            method_kind("filter"),
            MethodKind::Unify(Comparator::Unordered)
        );
        assert_eq!(method_kind("where"), MethodKind::Unify(Comparator::Unordered));
        assert_eq!(method_kind("order_by"), MethodKind::Unify(Comparator::Ordered));
        assert_eq!(method_kind("with_for_update"), MethodKind::Passthrough);
    }

    #[test]
    fn test_execute_ends_chain_only_for_writes() {
        let table = Table::new("t").primary_key("id").shared();
        let read = Call::new("execute").with_arg(select(table.clone()));
        let write = Call::new("execute").with_arg(delete(table));

        assert!(!ends_chain(&read));
        assert!(ends_chain(&write));
        assert!(ends_chain(&Call::new("first")));
        assert!(!ends_chain(&Call::new("filter")));
    }

    #[test]
    fn test_merged_execute_ends_chain_when_any_statement_writes() {
        let table = Table::new("t").primary_key("id").shared();
        let reads = Call::new("execute")
            .with_arg(select(table.clone()))
            .with_arg(select(table.clone()));
        let mixed = Call::new("execute")
            .with_arg(select(table.clone()))
            .with_arg(delete(table));

        assert!(!ends_chain(&reads));
        assert!(ends_chain(&mixed));
    }
}
