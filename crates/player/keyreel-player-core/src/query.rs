//! Read-only object lookup by `customId` and by `customClasses`.
//!
//! Every query is empty-safe: an empty id or class name matches nothing.

use crate::scene::SceneObject;

/// Query facade over a snapshot of the surface's objects.
#[derive(Clone, Copy, Debug)]
pub struct ObjectQuery<'a> {
    objects: &'a [SceneObject],
}

impl<'a> ObjectQuery<'a> {
    pub fn new(objects: &'a [SceneObject]) -> Self {
        Self { objects }
    }

    /// First object whose `customId` equals `id`.
    pub fn by_id(&self, id: &str) -> Option<&'a SceneObject> {
        if id.is_empty() {
            return None;
        }
        self.objects
            .iter()
            .find(|o| o.custom_id.as_deref() == Some(id))
    }

    /// `by_id` over each id, misses dropped, input order kept.
    pub fn by_ids<I, S>(&self, ids: I) -> Vec<&'a SceneObject>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .filter_map(|id| self.by_id(id.as_ref()))
            .collect()
    }

    /// All objects tagged with `name`.
    pub fn by_class(&self, name: &str) -> Vec<&'a SceneObject> {
        if name.is_empty() {
            return Vec::new();
        }
        self.objects.iter().filter(|o| o.has_class(name)).collect()
    }

    /// Objects tagged with at least one of `names`.
    pub fn by_any_class<S: AsRef<str>>(&self, names: &[S]) -> Vec<&'a SceneObject> {
        self.objects
            .iter()
            .filter(|o| names.iter().any(|n| o.has_class(n.as_ref())))
            .collect()
    }

    /// Objects tagged with every one of `names`. An empty list matches nothing.
    pub fn by_all_classes<S: AsRef<str>>(&self, names: &[S]) -> Vec<&'a SceneObject> {
        if names.is_empty() {
            return Vec::new();
        }
        self.objects
            .iter()
            .filter(|o| names.iter().all(|n| o.has_class(n.as_ref())))
            .collect()
    }
}
