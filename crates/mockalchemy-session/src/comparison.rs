//! Expression-aware equality for call arguments.
//!
//! Query expressions have no meaningful structural equality, so recorded
//! arguments are compared through their canonical rendering instead.

use crate::call::{Arg, Call, render_arguments};
use mockalchemy_core::Renderable;
use std::collections::BTreeMap;
use std::fmt;

fn args_match(left: &Arg, right: &Arg) -> bool {
    match (left, right) {
        (Arg::Any, _) | (_, Arg::Any) => true,
        (Arg::List(a), Arg::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| args_match(x, y))
        }
        (Arg::Map(a), Arg::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, x)| b.get(k).is_some_and(|y| args_match(x, y)))
        }
        _ => left.canonical_form() == right.canonical_form(),
    }
}

/// Wraps an argument so that `==` compares canonical renderings.
///
/// [`Arg::Any`] on either side matches anything; lists and mappings compare
/// element-wise.
#[derive(Debug, Clone)]
pub struct ExpressionMatcher(Arg);

impl ExpressionMatcher {
    pub fn new(arg: impl Into<Arg>) -> Self {
        Self(arg.into())
    }

    pub fn inner(&self) -> &Arg {
        &self.0
    }
}

impl PartialEq for ExpressionMatcher {
    fn eq(&self, other: &Self) -> bool {
        args_match(&self.0, &other.0)
    }
}

impl PartialEq<Arg> for ExpressionMatcher {
    fn eq(&self, other: &Arg) -> bool {
        args_match(&self.0, other)
    }
}

impl fmt::Display for ExpressionMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", PrettyExpression(self.0.clone()))
    }
}

/// Human-readable canonical rendering of an argument.
#[derive(Clone)]
pub struct PrettyExpression(Arg);

impl PrettyExpression {
    pub fn new(arg: impl Into<Arg>) -> Self {
        Self(arg.into())
    }
}

impl From<PrettyExpression> for Arg {
    fn from(pretty: PrettyExpression) -> Self {
        pretty.0
    }
}

impl fmt::Display for PrettyExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.canonical_form())
    }
}

impl fmt::Debug for PrettyExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Multiset equality: same length, and every element of one side is
/// consumed by exactly one equal element of the other.
fn multiset_eq<A, B>(left: &[A], right: &[B]) -> bool
where
    A: PartialEq<B>,
{
    if left.len() != right.len() {
        return false;
    }
    let mut used = vec![false; right.len()];
    left.iter().all(|l| {
        let hit = right
            .iter()
            .enumerate()
            .find(|(i, r)| !used[*i] && l == *r)
            .map(|(i, _)| i);
        match hit {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

/// A sequence whose equality ignores element order.
///
/// `UnorderedTuple(vec![1, 2, 2]) != vec![1, 1, 2]`: duplicates count.
#[derive(Debug, Clone)]
pub struct UnorderedTuple<T>(pub Vec<T>);

impl<T> UnorderedTuple<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self(items.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: PartialEq> PartialEq for UnorderedTuple<T> {
    fn eq(&self, other: &Self) -> bool {
        multiset_eq(self.0.as_slice(), other.0.as_slice())
    }
}

impl<T: PartialEq> PartialEq<[T]> for UnorderedTuple<T> {
    fn eq(&self, other: &[T]) -> bool {
        multiset_eq(self.0.as_slice(), other)
    }
}

impl<T: PartialEq> PartialEq<Vec<T>> for UnorderedTuple<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        multiset_eq(self.0.as_slice(), other.as_slice())
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for UnorderedTuple<T> {
    fn eq(&self, other: &[T; N]) -> bool {
        multiset_eq(self.0.as_slice(), other.as_slice())
    }
}

/// How positional arguments of a normalized call are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Comparator {
    #[default]
    Ordered,
    Unordered,
}

/// A call with every argument wrapped in [`ExpressionMatcher`].
///
/// Positional arguments compare as a multiset when either side is
/// [`Comparator::Unordered`].
#[derive(Debug, Clone)]
pub struct NormalizedCall {
    name: Option<String>,
    args: Vec<ExpressionMatcher>,
    kwargs: BTreeMap<String, ExpressionMatcher>,
    comparator: Comparator,
}

impl NormalizedCall {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }
}

impl PartialEq for NormalizedCall {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name {
            return false;
        }
        if self.kwargs.len() != other.kwargs.len()
            || !self
                .kwargs
                .iter()
                .all(|(k, v)| other.kwargs.get(k).is_some_and(|o| v == o))
        {
            return false;
        }
        let unordered = self.comparator == Comparator::Unordered
            || other.comparator == Comparator::Unordered;
        if unordered {
            multiset_eq(self.args.as_slice(), other.args.as_slice())
        } else {
            self.args == other.args
        }
    }
}

impl fmt::Display for NormalizedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = render_arguments(
            self.args.iter().map(ToString::to_string),
            self.kwargs.iter().map(|(k, v)| (k, v.to_string())),
        );
        match &self.name {
            Some(name) => write!(f, "{name}{rendered}"),
            None => write!(f, "call{rendered}"),
        }
    }
}

/// Canonicalize a recorded call.
///
/// With `with_name` false the method name is dropped, so an anonymous
/// expected call can be compared against a named recorded one.
pub fn normalize_call(call: &Call, with_name: bool, comparator: Comparator) -> NormalizedCall {
    NormalizedCall {
        name: (with_name && !call.is_anonymous()).then(|| call.name().to_string()),
        args: call.args().iter().cloned().map(ExpressionMatcher).collect(),
        kwargs: call
            .kwargs()
            .iter()
            .map(|(k, v)| (k.clone(), ExpressionMatcher(v.clone())))
            .collect(),
        comparator,
    }
}
