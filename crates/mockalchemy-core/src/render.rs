//! The canonical-rendering capability.

use std::fmt;

/// Anything with a deterministic textual form that defines its equality.
///
/// Query expressions rebuild their internal trees on every call, so two
/// expressions built from the same source never compare equal structurally.
/// Their canonical form (SQL text plus bound parameters) does.
pub trait Renderable: fmt::Debug + Send + Sync {
    fn canonical_form(&self) -> String;
}

impl<T: Renderable + ?Sized> Renderable for &T {
    fn canonical_form(&self) -> String {
        (**self).canonical_form()
    }
}

impl<T: Renderable + ?Sized> Renderable for Box<T> {
    fn canonical_form(&self) -> String {
        (**self).canonical_form()
    }
}

impl<T: Renderable + ?Sized> Renderable for std::sync::Arc<T> {
    fn canonical_form(&self) -> String {
        (**self).canonical_form()
    }
}
