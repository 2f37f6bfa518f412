//! Call chains: slicing, collapsing and canonical expansion.

use crate::call::{Arg, Call};
use crate::comparison::{NormalizedCall, normalize_call};
use crate::registry::{comparator_for, ends_chain};
use mockalchemy_core::Value;
use mockalchemy_query::{Select, Statement};

/// Calls since the last chain-ending call, oldest first.
pub fn active_chain(calls: &[Call]) -> &[Call] {
    let start = calls
        .iter()
        .rposition(ends_chain)
        .map_or(0, |boundary| boundary + 1);
    &calls[start..]
}

/// Fold the last call of `calls` into the previous call of the same name
/// within the active chain.
///
/// Returns the next call list with both invocations removed and their merge
/// appended, or `None` when there is no earlier call to fold into.
///
/// # Panics
///
/// Panics if `calls` is empty.
pub fn collapse_repeated(calls: &[Call]) -> Option<Vec<Call>> {
    let (current, earlier) = calls
        .split_last()
        .unwrap_or_else(|| unreachable!("collapse requires the call just recorded"));
    let chain_start = earlier.len() - active_chain(earlier).len();
    let previous = earlier[chain_start..]
        .iter()
        .rposition(|c| c.name() == current.name())
        .map(|offset| chain_start + offset)?;

    let merged = earlier[previous].merge(current);
    let mut next = Vec::with_capacity(calls.len() - 1);
    next.extend(earlier[..previous].iter().cloned());
    next.extend(earlier[previous + 1..].iter().cloned());
    next.push(merged);
    Some(next)
}

fn count_value(n: u64) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

fn expand_select(select: &Select) -> Vec<Call> {
    let mut calls =
        vec![Call::new("query").with_args(select.targets().iter().cloned().map(Arg::from))];

    if !select.joins().is_empty() {
        let mut join = Call::new("join");
        for j in select.joins() {
            join = join.with_arg(j.target.clone());
            if let Some(on) = &j.on {
                join = join.with_arg(on.clone());
            }
        }
        calls.push(join);
    }
    if !select.wheres().is_empty() {
        calls.push(Call::new("filter").with_args(select.wheres().iter().cloned()));
    }
    if !select.group_bys().is_empty() {
        calls.push(Call::new("group_by").with_args(select.group_bys().iter().cloned()));
    }
    if !select.order_bys().is_empty() {
        calls.push(Call::new("order_by").with_args(select.order_bys().iter().cloned()));
    }
    if let Some(n) = select.limit_value() {
        calls.push(Call::new("limit").with_arg(count_value(n)));
    }
    if let Some(n) = select.offset_value() {
        calls.push(Call::new("offset").with_arg(count_value(n)));
    }
    if select.is_distinct() {
        calls.push(Call::new("distinct"));
    }
    calls
}

/// The builder calls equivalent to a statement, for matching.
///
/// All WHERE criteria fold into one `filter` call.
pub fn expand_statement(statement: &Statement) -> Vec<Call> {
    match statement {
        Statement::Select(select) => expand_select(select),
        Statement::Insert(insert) => vec![Call::new("query").with_arg(insert.table())],
        Statement::Update(update) => {
            let mut calls = vec![Call::new("query").with_arg(update.table())];
            if !update.wheres().is_empty() {
                calls.push(Call::new("filter").with_args(update.wheres().iter().cloned()));
            }
            calls
        }
        Statement::Delete(delete) => {
            let mut calls = vec![Call::new("query").with_arg(delete.table())];
            if !delete.wheres().is_empty() {
                calls.push(Call::new("filter").with_args(delete.wheres().iter().cloned()));
            }
            calls
        }
    }
}

/// The builder calls equivalent to one recorded call.
///
/// `execute` is replaced by the expansion of every statement it carries.
/// Expanded calls sharing a name are merged the way repeated builder calls
/// collapse, so `execute(select(a), select(b))` becomes `query(a, b)` and
/// no longer matches a signature built from `select(a)` alone. Any other
/// call expands to itself.
pub fn expand_call(call: &Call) -> Vec<Call> {
    if call.name() != "execute" || call.statements().next().is_none() {
        return vec![call.clone()];
    }
    let mut expanded: Vec<Call> = Vec::new();
    for part in call.statements().flat_map(expand_statement) {
        match expanded.iter_mut().find(|c| c.name() == part.name()) {
            Some(existing) => *existing = existing.merge(&part),
            None => expanded.push(part),
        }
    }
    expanded
}

/// Canonicalize a chain or a fixture signature.
///
/// Each call is normalized with its method's comparator after
/// [`expand_call`].
pub fn normalize_chain(calls: &[Call]) -> Vec<NormalizedCall> {
    calls
        .iter()
        .flat_map(expand_call)
        .map(|c| normalize_call(&c, true, comparator_for(c.name())))
        .collect()
}

/// Whether every call of `signature` appears in `chain`.
pub fn contains_all(chain: &[NormalizedCall], signature: &[NormalizedCall]) -> bool {
    signature.iter().all(|call| chain.contains(call))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockalchemy_core::Table;
    use mockalchemy_query::{Expr, delete, select};

    fn c() -> Expr {
        Expr::col("column")
    }

    #[test]
    fn test_active_chain_stops_at_boundary() {
        let calls = vec![
            Call::new("query").with_arg("a"),
            Call::new("all"),
            Call::new("query").with_arg("b"),
            Call::new("filter").with_arg(1),
        ];
        let chain = active_chain(&calls);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].name(), "query");
    }

    #[test]
    fn test_collapse_merges_and_moves_to_end() {
        let calls = vec![
            Call::new("query").with_arg("foo"),
            Call::new("filter").with_arg(c().eq("one")),
            Call::new("order_by").with_arg(c()),
            Call::new("filter").with_arg(c().eq("two")),
        ];
        let next = collapse_repeated(&calls).unwrap();
        let names: Vec<_> = next.iter().map(Call::name).collect();
        assert_eq!(names, ["query", "order_by", "filter"]);
        assert_eq!(next[2].args().len(), 2);
    }

    #[test]
    fn test_collapse_ignores_calls_before_boundary() {
        let calls = vec![
            Call::new("filter").with_arg(1),
            Call::new("all"),
            Call::new("filter").with_arg(2),
        ];
        assert!(collapse_repeated(&calls).is_none());
    }

    #[test]
    fn test_select_expansion_matches_builder_chain() {
        let stmt = select(Expr::text("foo"))
            .filter(c().eq("two"))
            .filter(c().eq("one"))
            .order_by(c());
        let executed = normalize_chain(&[Call::new("execute").with_arg(stmt)]);
        let built = normalize_chain(&[
            Call::new("query").with_arg(Expr::text("foo")),
            Call::new("filter")
                .with_arg(c().eq("one"))
                .with_arg(c().eq("two")),
            Call::new("order_by").with_arg(c()),
        ]);
        assert_eq!(executed, built);
    }

    #[test]
    fn test_delete_expansion_targets_select_signature() {
        let table = Table::new("model_table").primary_key("pk1").shared();
        let criterion = || Expr::qualified("model_table", "pk1").lt(1);
        let fixture = normalize_chain(&[
            Call::new("execute").with_arg(select(table.clone()).filter(criterion()))
        ]);
        let chain =
            normalize_chain(&[Call::new("execute").with_arg(delete(table).filter(criterion()))]);
        assert!(contains_all(&chain, &fixture));
    }

    #[test]
    fn test_collapsed_execute_expands_every_statement() {
        let a = || select(Expr::text("a_table"));
        let b = || select(Expr::text("b_table")).filter(c().eq(1));
        let merged = Call::new("execute").with_arg(a()).with_arg(b());

        let expanded = expand_call(&merged);
        let names: Vec<_> = expanded.iter().map(Call::name).collect();
        assert_eq!(names, ["query", "filter"]);
        assert_eq!(expanded[0].args().len(), 2);

        let chain = normalize_chain(&[merged]);
        let only_a = normalize_chain(&[Call::new("execute").with_arg(a())]);
        assert!(!contains_all(&chain, &only_a));
        let both = normalize_chain(&[Call::new("execute").with_arg(a()).with_arg(b())]);
        assert!(contains_all(&chain, &both));
    }

    #[test]
    fn test_non_execute_calls_expand_to_themselves() {
        let call = Call::new("filter").with_arg(c().eq(1));
        let expanded = expand_call(&call);
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].to_string(), call.to_string());
    }

    #[test]
    fn test_contains_all_is_subset() {
        let chain = normalize_chain(&[
            Call::new("query").with_arg("foo"),
            Call::new("filter").with_arg(c().eq("three")),
        ]);
        let signature = normalize_chain(&[Call::new("filter").with_arg(c().eq("three"))]);
        assert!(contains_all(&chain, &signature));
        assert!(!contains_all(&signature, &chain));
    }
}
