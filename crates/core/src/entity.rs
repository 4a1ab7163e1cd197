//! Keyed documents.

/// A stored document with a stable, strongly-typed id (user, class,
/// selection, enrollment, instructor profile).
pub trait Entity {
    type Id: Copy + Ord + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
