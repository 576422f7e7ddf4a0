//! Model trait and the collection shapes accepted by the binder.
//!
//! [`Engine::init_handles`](crate::Engine::init_handles) accepts anything
//! implementing [`ModelSet`]:
//!
//! | Shape                         | Example                      |
//! |-------------------------------|------------------------------|
//! | single reference              | `&author` (`Arc<Author>`)    |
//! | nullable reference            | `&Some(author)`, `&None`     |
//! | reference to reference        | `&&author`, `&&authors`      |
//! | sequence of references        | `&authors` (`Vec`, slice, array) |
//! | sequence with absent entries  | `&vec![Some(a), None]`       |
//!
//! Type aliases such as `type Authors = Vec<Arc<Author>>` are the same type
//! as their target, so they need no extra support. A sequence of plain
//! values goes through [`Engine::bind_values`](crate::Engine::bind_values),
//! which moves the values into shared storage first.

use std::sync::Arc;

use crate::handle::Handle;

/// An entity that can join a batch.
///
/// Implementors embed a [`Handle`] and expose it:
///
/// ```rust,ignore
/// #[derive(Debug, Default)]
/// struct Author {
///     id: i64,
///     name: String,
///     handle: Handle,
/// }
///
/// impl Model for Author {
///     fn handle(&self) -> &Handle {
///         &self.handle
///     }
/// }
/// ```
pub trait Model: Send + Sync + 'static {
    /// The handle embedded in this model.
    fn handle(&self) -> &Handle;
}

/// A collection of model references, normalized by the binder into an
/// ordered sequence.
pub trait ModelSet {
    /// The model type held by the collection.
    type Model: Model;

    /// Appends every present model reference, in order.
    fn extend_refs(&self, out: &mut Vec<Arc<Self::Model>>);

    /// Collects every present model reference, in order.
    fn model_refs(&self) -> Vec<Arc<Self::Model>> {
        let mut out = Vec::new();
        self.extend_refs(&mut out);
        out
    }
}

impl<M: Model> ModelSet for Arc<M> {
    type Model = M;

    fn extend_refs(&self, out: &mut Vec<Arc<M>>) {
        out.push(Arc::clone(self));
    }
}

impl<S: ModelSet> ModelSet for Option<S> {
    type Model = S::Model;

    fn extend_refs(&self, out: &mut Vec<Arc<S::Model>>) {
        if let Some(inner) = self {
            inner.extend_refs(out);
        }
    }
}

impl<S: ModelSet + ?Sized> ModelSet for &S {
    type Model = S::Model;

    fn extend_refs(&self, out: &mut Vec<Arc<S::Model>>) {
        (**self).extend_refs(out);
    }
}

impl<S: ModelSet> ModelSet for [S] {
    type Model = S::Model;

    fn extend_refs(&self, out: &mut Vec<Arc<S::Model>>) {
        for item in self {
            item.extend_refs(out);
        }
    }
}

impl<S: ModelSet, const N: usize> ModelSet for [S; N] {
    type Model = S::Model;

    fn extend_refs(&self, out: &mut Vec<Arc<S::Model>>) {
        self.as_slice().extend_refs(out);
    }
}

impl<S: ModelSet> ModelSet for Vec<S> {
    type Model = S::Model;

    fn extend_refs(&self, out: &mut Vec<Arc<S::Model>>) {
        self.as_slice().extend_refs(out);
    }
}
