//! Call history with mock-style, expression-aware assertions.
//!
//! Assertions canonicalize both sides through [`normalize_call`] and never
//! touch the recorded history.

use crate::call::Call;
use crate::comparison::{NormalizedCall, normalize_call};
use crate::registry::comparator_for;
use mockalchemy_core::{AssertionError, Error, Result};

fn mismatch(error: AssertionError) -> Error {
    Error::AssertionMismatch(error)
}

fn render_list<'a>(calls: impl IntoIterator<Item = &'a Call>) -> String {
    let parts: Vec<String> = calls.into_iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

/// Consume one equal element of `haystack` per element of `needles`.
fn contains_each(haystack: &[NormalizedCall], needles: &[NormalizedCall]) -> bool {
    let mut used = vec![false; haystack.len()];
    needles.iter().all(|needle| {
        let hit = haystack
            .iter()
            .enumerate()
            .position(|(i, h)| !used[i] && h == needle);
        match hit {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

fn contains_run(haystack: &[NormalizedCall], needles: &[NormalizedCall]) -> bool {
    needles.is_empty()
        || haystack
            .windows(needles.len())
            .any(|window| window == needles)
}

/// The ordered history of one mock.
#[derive(Debug, Clone)]
pub struct CallLog {
    name: String,
    calls: Vec<Call>,
}

impl Default for CallLog {
    fn default() -> Self {
        Self::new("Session")
    }
}

impl CallLog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Vec::new(),
        }
    }

    /// Mock name used in assertion messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record(&mut self, call: Call) {
        tracing::trace!(mock = %self.name, call = %call, "Recorded call");
        self.calls.push(call);
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Every recorded call, named, oldest first.
    pub fn mock_calls(&self) -> &[Call] {
        &self.calls
    }

    /// Swap in a rewritten history.
    pub fn replace(&mut self, calls: Vec<Call>) {
        self.calls = calls;
    }

    pub fn reset(&mut self) {
        self.calls.clear();
    }

    /// Calls made to `method`, for per-method assertions.
    pub fn method(&self, method: &str) -> MethodCalls<'_> {
        MethodCalls {
            mock: &self.name,
            method: method.to_string(),
            calls: self.calls.iter().filter(|c| c.name() == method).collect(),
        }
    }

    /// Assert that `expected` occurs in the history.
    ///
    /// In order, the calls must appear as one contiguous run; with
    /// `any_order` each must appear somewhere, duplicates counted.
    #[allow(clippy::result_large_err)]
    pub fn assert_has_calls(&self, expected: &[Call], any_order: bool) -> Result<()> {
        let normalize = |c: &Call| normalize_call(c, true, comparator_for(c.name()));
        let actual: Vec<_> = self.calls.iter().map(normalize).collect();
        let wanted: Vec<_> = expected.iter().map(normalize).collect();

        let found = if any_order {
            contains_each(&actual, &wanted)
        } else {
            contains_run(&actual, &wanted)
        };
        if found {
            return Ok(());
        }
        let message = if any_order {
            format!("{} does not contain all of the calls.", self.name)
        } else {
            "Calls not found.".to_string()
        };
        Err(mismatch(
            AssertionError::new(message)
                .expected(render_list(expected))
                .actual(render_list(&self.calls)),
        ))
    }
}

/// Recorded calls to one method, with assertion helpers.
///
/// Arguments are compared without the method name, so expected calls are
/// usually anonymous (`call!(_, ..)`).
#[derive(Debug, Clone)]
pub struct MethodCalls<'a> {
    mock: &'a str,
    method: String,
    calls: Vec<&'a Call>,
}

impl<'a> MethodCalls<'a> {
    fn normalize(&self, call: &Call) -> NormalizedCall {
        normalize_call(call, false, comparator_for(&self.method))
    }

    fn qualified(&self) -> String {
        format!("{}.{}", self.mock, self.method)
    }

    fn render(&self, call: &Call) -> String {
        call.renamed(self.qualified()).to_string()
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    pub fn called(&self) -> bool {
        !self.calls.is_empty()
    }

    /// The most recent call.
    pub fn call_args(&self) -> Option<&'a Call> {
        self.calls.last().copied()
    }

    pub fn call_args_list(&self) -> &[&'a Call] {
        &self.calls
    }

    #[allow(clippy::result_large_err)]
    pub fn assert_called(&self) -> Result<()> {
        if self.called() {
            return Ok(());
        }
        Err(mismatch(AssertionError::new(format!(
            "Expected '{}' to have been called.",
            self.qualified()
        ))))
    }

    #[allow(clippy::result_large_err)]
    pub fn assert_not_called(&self) -> Result<()> {
        if !self.called() {
            return Ok(());
        }
        Err(mismatch(
            AssertionError::new(format!(
                "Expected '{}' to not have been called. Called {} times.",
                self.qualified(),
                self.call_count()
            ))
            .actual(render_list(self.calls.iter().copied())),
        ))
    }

    /// Assert that the most recent call matches `expected`.
    #[allow(clippy::result_large_err)]
    pub fn assert_called_with(&self, expected: &Call) -> Result<()> {
        let Some(last) = self.call_args() else {
            return Err(mismatch(
                AssertionError::new("expected call not found.")
                    .expected(self.render(expected))
                    .actual("not called."),
            ));
        };
        if self.normalize(last) == self.normalize(expected) {
            return Ok(());
        }
        Err(mismatch(
            AssertionError::new("expected call not found.")
                .expected(self.render(expected))
                .actual(self.render(last)),
        ))
    }

    #[allow(clippy::result_large_err)]
    pub fn assert_called_once_with(&self, expected: &Call) -> Result<()> {
        if self.call_count() != 1 {
            return Err(mismatch(
                AssertionError::new(format!(
                    "Expected '{}' to be called once. Called {} times.",
                    self.method,
                    self.call_count()
                ))
                .expected(self.render(expected))
                .actual(render_list(self.calls.iter().copied())),
            ));
        }
        self.assert_called_with(expected)
    }

    /// Assert that some call, not necessarily the last, matches `expected`.
    #[allow(clippy::result_large_err)]
    pub fn assert_any_call(&self, expected: &Call) -> Result<()> {
        let wanted = self.normalize(expected);
        if self.calls.iter().any(|c| self.normalize(c) == wanted) {
            return Ok(());
        }
        Err(mismatch(
            AssertionError::new(format!("{} call not found", self.render(expected)))
                .actual(render_list(self.calls.iter().copied())),
        ))
    }

    /// Per-method form of [`CallLog::assert_has_calls`].
    #[allow(clippy::result_large_err)]
    pub fn assert_has_calls(&self, expected: &[Call], any_order: bool) -> Result<()> {
        let actual: Vec<_> = self.calls.iter().map(|c| self.normalize(c)).collect();
        let wanted: Vec<_> = expected.iter().map(|c| self.normalize(c)).collect();
        let found = if any_order {
            contains_each(&actual, &wanted)
        } else {
            contains_run(&actual, &wanted)
        };
        if found {
            return Ok(());
        }
        Err(mismatch(
            AssertionError::new("Calls not found.")
                .expected(render_list(expected))
                .actual(render_list(self.calls.iter().copied())),
        ))
    }
}
