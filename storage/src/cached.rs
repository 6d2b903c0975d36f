//! A collection together with its last JSON encoding.

/// Value plus cached JSON. No cached JSON means dirty.
///
/// Mutations go through [`Cached::replace`] or [`Cached::modify`], which invalidate. Reading the
/// JSON through [`Cached::encode_with`] never fills the cache back in: only a decoded snapshot
/// carries a cached encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    value: Option<T>,
    json: Option<String>,
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Cached<T> {
    /// Nothing stored, nothing cached.
    pub fn empty() -> Self {
        Self {
            value: None,
            json: None,
        }
    }

    /// Value decoded from `json`; `json` becomes the cached encoding.
    pub fn decoded(value: Option<T>, json: impl Into<String>) -> Self {
        Self {
            value,
            json: Some(json.into()),
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Materializes a default value when nothing is stored. Does not touch the cache.
    pub fn get_or_insert_default(&mut self) -> &mut T
    where
        T: Default,
    {
        self.value.get_or_insert_with(T::default)
    }

    /// Stores `value` and invalidates.
    pub fn replace(&mut self, value: T) {
        self.value = Some(value);
        self.invalidate();
    }

    /// Applies `f` to the (materialized) value and invalidates.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R
    where
        T: Default,
    {
        let result = f(self.get_or_insert_default());
        self.invalidate();
        result
    }

    pub fn invalidate(&mut self) {
        self.json = None;
    }

    pub fn is_dirty(&self) -> bool {
        self.json.is_none()
    }

    pub fn cached_json(&self) -> Option<&str> {
        self.json.as_deref()
    }

    /// The cached JSON, or a fresh encoding of the current value that is not stored.
    pub fn encode_with<E>(
        &self,
        encode: impl FnOnce(Option<&T>) -> Result<String, E>,
    ) -> Result<String, E> {
        match &self.json {
            Some(json) => Ok(json.clone()),
            None => encode(self.value.as_ref()),
        }
    }
}
