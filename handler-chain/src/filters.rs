//! Filter protocol: predicates over an update with a three-way result, and combinators over them.
//!
//! A filter either rejects, accepts, or accepts with extra data that gets merged into the
//! [`CallbackContext`](dbot_core::CallbackContext). Handlers AND their baseline filter with the
//! user's filter via [`FilterExt::and`].

use std::fmt;
use std::sync::Arc;

use dbot_core::{DataPayload, Update, UpdateKind};
use regex::Regex;
use serde_json::Value;

/// Result of evaluating a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterResult {
    Reject,
    Accept,
    /// Accept and inject these entries into the context.
    Data(DataPayload),
}

impl FilterResult {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, FilterResult::Reject)
    }

    /// The payload of a data result.
    pub fn into_data(self) -> Option<DataPayload> {
        match self {
            FilterResult::Data(data) => Some(data),
            _ => None,
        }
    }
}

impl From<bool> for FilterResult {
    fn from(accepted: bool) -> Self {
        if accepted {
            FilterResult::Accept
        } else {
            FilterResult::Reject
        }
    }
}

/// A predicate over an update.
pub trait Filter: Send + Sync {
    fn check(&self, update: &Update) -> FilterResult;

    /// Name used in logs.
    fn name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

pub type BoxedFilter = Arc<dyn Filter>;

impl<F: Filter + ?Sized> Filter for Arc<F> {
    fn check(&self, update: &Update) -> FilterResult {
        (**self).check(update)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// Combinators available on every sized filter.
pub trait FilterExt: Filter + Sized {
    fn and<F: Filter>(self, other: F) -> AndFilter<Self, F> {
        AndFilter {
            left: self,
            right: other,
        }
    }

    fn or<F: Filter>(self, other: F) -> OrFilter<Self, F> {
        OrFilter {
            left: self,
            right: other,
        }
    }

    fn not(self) -> NotFilter<Self> {
        NotFilter { inner: self }
    }

    fn boxed(self) -> BoxedFilter
    where
        Self: 'static,
    {
        Arc::new(self)
    }
}

impl<T: Filter + Sized> FilterExt for T {}

/// Both sides must accept; data from both sides is merged.
pub struct AndFilter<A, B> {
    left: A,
    right: B,
}

impl<A: Filter, B: Filter> Filter for AndFilter<A, B> {
    fn check(&self, update: &Update) -> FilterResult {
        let left = self.left.check(update);
        if !left.is_accepted() {
            return FilterResult::Reject;
        }
        let right = self.right.check(update);
        match (left, right) {
            (_, FilterResult::Reject) => FilterResult::Reject,
            (FilterResult::Data(mut base), FilterResult::Data(other)) => {
                merge_data(&mut base, other);
                FilterResult::Data(base)
            }
            (FilterResult::Data(data), _) | (_, FilterResult::Data(data)) => {
                FilterResult::Data(data)
            }
            _ => FilterResult::Accept,
        }
    }

    fn name(&self) -> String {
        format!("<{} and {}>", self.left.name(), self.right.name())
    }
}

/// The first accepting side wins; the right side is only evaluated when the left rejects.
pub struct OrFilter<A, B> {
    left: A,
    right: B,
}

impl<A: Filter, B: Filter> Filter for OrFilter<A, B> {
    fn check(&self, update: &Update) -> FilterResult {
        match self.left.check(update) {
            FilterResult::Reject => self.right.check(update),
            accepted => accepted,
        }
    }

    fn name(&self) -> String {
        format!("<{} or {}>", self.left.name(), self.right.name())
    }
}

/// Inverts acceptance. Data is dropped.
pub struct NotFilter<A> {
    inner: A,
}

impl<A: Filter> Filter for NotFilter<A> {
    fn check(&self, update: &Update) -> FilterResult {
        (!self.inner.check(update).is_accepted()).into()
    }

    fn name(&self) -> String {
        format!("<not {}>", self.inner.name())
    }
}

/// Arrays under the same key concatenate; anything else is replaced.
fn merge_data(base: &mut DataPayload, other: DataPayload) {
    for (key, value) in other {
        let replacement = match (base.get_mut(&key), value) {
            (Some(Value::Array(existing)), Value::Array(more)) => {
                existing.extend(more);
                None
            }
            (_, value) => Some(value),
        };
        if let Some(value) = replacement {
            base.insert(key, value);
        }
    }
}

/// Filters on the kind of update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateFilter {
    /// Messages and edited messages; never channel posts.
    Messages,
    Message,
    EditedMessage,
    /// Channel posts and edited channel posts.
    ChannelPosts,
}

impl Filter for UpdateFilter {
    fn check(&self, update: &Update) -> FilterResult {
        let accepted = match (self, &update.kind) {
            (UpdateFilter::Messages, UpdateKind::Message(_) | UpdateKind::EditedMessage(_)) => true,
            (UpdateFilter::Message, UpdateKind::Message(_)) => true,
            (UpdateFilter::EditedMessage, UpdateKind::EditedMessage(_)) => true,
            (
                UpdateFilter::ChannelPosts,
                UpdateKind::ChannelPost(_) | UpdateKind::EditedChannelPost(_),
            ) => true,
            _ => false,
        };
        accepted.into()
    }

    fn name(&self) -> String {
        format!("UpdateFilter::{:?}", self)
    }
}

/// Searches the message text; on success yields `{"matches": [<first full match>]}`.
///
/// Only the first hit is kept. Combining regex filters with `and` collects one match per filter.
#[derive(Clone)]
pub struct RegexFilter {
    pattern: Regex,
}

impl RegexFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn from_regex(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl fmt::Debug for RegexFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegexFilter({})", self.pattern.as_str())
    }
}

impl Filter for RegexFilter {
    fn check(&self, update: &Update) -> FilterResult {
        let Some(text) = update.effective_message().and_then(|m| m.text()) else {
            return FilterResult::Reject;
        };
        let Some(found) = self.pattern.find(text) else {
            return FilterResult::Reject;
        };
        let mut data = DataPayload::new();
        data.insert(
            "matches".to_string(),
            Value::Array(vec![Value::String(found.as_str().to_string())]),
        );
        FilterResult::Data(data)
    }

    fn name(&self) -> String {
        format!("{:?}", self)
    }
}

/// Filter from a closure.
pub struct FnFilter<F> {
    name: String,
    f: F,
}

impl<F> FnFilter<F>
where
    F: Fn(&Update) -> FilterResult + Send + Sync,
{
    pub fn new(name: &str, f: F) -> Self {
        Self {
            name: name.to_string(),
            f,
        }
    }
}

impl<F> Filter for FnFilter<F>
where
    F: Fn(&Update) -> FilterResult + Send + Sync,
{
    fn check(&self, update: &Update) -> FilterResult {
        (self.f)(update)
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
