//! Typed metadata passed between decision steps and handlers.
//!
//! Any step or handler may declare a new [`Key`]; the key carries the value
//! type so reads never need a downcast at the call site.

use chrono::{DateTime, FixedOffset};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use crate::negotiate::MediaType;

/// A named slot holding values of type `T`.
pub struct Key<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.name).finish()
    }
}

/// Media type chosen from `Accept`.
pub const MEDIA_TYPE: Key<MediaType> = Key::new("media_type");
/// Charset chosen from `Accept-Charset`.
pub const CHARSET: Key<String> = Key::new("charset");
/// Content coding chosen from `Accept-Encoding`.
pub const ENCODING: Key<String> = Key::new("encoding");
/// Entity tag produced by the resource.
pub const ETAG: Key<String> = Key::new("etag");
/// Last modification date produced by the resource.
pub const LAST_MODIFIED: Key<DateTime<FixedOffset>> = Key::new("last_modified");
/// Longest request target the transport accepts; read by the default
/// `uri_too_long` handler.
pub const MAX_URI_LENGTH: Key<usize> = Key::new("max_uri_length");

type Value = Box<dyn Any + Send + Sync>;

struct Slot {
    value: Value,
    render: fn(&Value) -> String,
}

fn render<T: Any + fmt::Debug>(value: &Value) -> String {
    value
        .downcast_ref::<T>()
        .map(|value| format!("{:?}", value))
        .unwrap_or_default()
}

/// Open key/value bag.
///
/// Values must be `Debug` so trace snapshots can show what each step saw.
#[derive(Default)]
pub struct Metadata {
    entries: HashMap<&'static str, Slot>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, returning the previous one if it had the same type.
    pub fn insert<T>(&mut self, key: &Key<T>, value: T) -> Option<T>
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        let slot = Slot {
            value: Box::new(value),
            render: render::<T>,
        };
        self.entries
            .insert(key.name, slot)
            .and_then(|old| old.value.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: Any + Send + Sync>(&self, key: &Key<T>) -> Option<&T> {
        self.entries.get(key.name)?.value.downcast_ref::<T>()
    }

    pub fn remove<T: Any + Send + Sync>(&mut self, key: &Key<T>) -> Option<T> {
        self.entries
            .remove(key.name)?
            .value
            .downcast::<T>()
            .ok()
            .map(|value| *value)
    }

    pub fn contains<T>(&self, key: &Key<T>) -> bool {
        self.entries.contains_key(key.name)
    }

    /// Key names currently set, sorted.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.entries.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// `(key, Debug rendering)` for every entry, sorted by key.
    pub fn rendered(&self) -> Vec<(&'static str, String)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(key, slot)| (*key, (slot.render)(&slot.value)))
            .collect();
        entries.sort_unstable_by_key(|(key, _)| *key);
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.rendered()).finish()
    }
}
