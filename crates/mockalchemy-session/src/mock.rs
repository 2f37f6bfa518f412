//! A recording mock with expression-aware assertions and no fixture logic.

use crate::call::Call;
use crate::recorder::{CallLog, MethodCalls};
use mockalchemy_core::Result;

/// Records every call verbatim and returns itself, so any chain can be
/// built and then asserted on.
///
/// ```ignore
/// let mut mock = AlchemyMock::new();
/// mock.invoke(call!(filter, or([c.eq(5), c.eq(10)]).unwrap()));
/// mock.method("filter")
///     .assert_called_once_with(&call!(_, or([c.eq(5), c.eq(10)]).unwrap()))?;
/// ```
#[derive(Debug, Clone)]
pub struct AlchemyMock {
    log: CallLog,
}

impl Default for AlchemyMock {
    fn default() -> Self {
        Self::new()
    }
}

impl AlchemyMock {
    pub fn new() -> Self {
        Self::named("mock")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            log: CallLog::new(name),
        }
    }

    pub fn invoke(&mut self, call: Call) -> &mut Self {
        self.log.record(call);
        self
    }

    pub fn method(&self, method: &str) -> MethodCalls<'_> {
        self.log.method(method)
    }

    pub fn mock_calls(&self) -> &[Call] {
        self.log.mock_calls()
    }

    #[allow(clippy::result_large_err)]
    pub fn assert_has_calls(&self, expected: &[Call], any_order: bool) -> Result<()> {
        self.log.assert_has_calls(expected, any_order)
    }

    pub fn reset_mock(&mut self) {
        self.log.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call;
    use mockalchemy_query::{Expr, or};

    fn c() -> Expr {
        Expr::col("column")
    }

    #[test]
    fn test_default_is_named_mock() {
        let err = AlchemyMock::default()
            .method("filter")
            .assert_called()
            .unwrap_err();
        assert_eq!(err.to_string(), "Expected 'mock.filter' to have been called.");
    }

    #[test]
    fn test_no_collapsing() {
        let mut mock = AlchemyMock::new();
        mock.invoke(call!(filter, 1)).invoke(call!(filter, 2));
        assert_eq!(mock.method("filter").call_count(), 2);
    }

    #[test]
    fn test_or_criteria_assertions() {
        let either = || or([c().eq(5), c().eq(10)]).unwrap();
        let mut mock = AlchemyMock::new();
        mock.invoke(call!(filter, either()));

        let filter = mock.method("filter");
        filter.assert_called_once_with(&call!(_, either())).unwrap();
        filter.assert_any_call(&call!(_, either())).unwrap();
        filter.assert_has_calls(&[call!(_, either())], false).unwrap();
        mock.assert_has_calls(&[call!(filter, either())], false)
            .unwrap();

        mock.reset_mock();
        mock.invoke(call!(filter, c().eq(5)));
        assert!(
            mock.method("filter")
                .assert_called_once_with(&call!(_, c().eq(10)))
                .unwrap_err()
                .is_assertion()
        );
    }
}
