//! Case-insensitive, order-preserving header storage.
//!
//! # Design
//! Header names are case-insensitive on the wire but the casing a server
//! sent is worth keeping for display. `HeaderBag` stores entries under their
//! canonical (as-supplied) name and keeps a private side table mapping the
//! lowercased name to that canonical name. Every lookup goes through the side
//! table, so `content-type`, `Content-Type` and `CONTENT-TYPE` all address the
//! same entry. The side table belongs to one bag; nothing is shared between
//! responses.

use std::collections::HashMap;

use indexmap::IndexMap;

/// A header's stored value: one string, or an ordered list of them.
///
/// Raw headers with exactly one value collapse to `Single`; everything else
/// (including the result of an append) is `Multi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(String),
    Multi(Vec<String>),
}

impl HeaderValue {
    /// Collapse a raw value list, keeping a lone value as `Single`.
    pub fn from_values(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            HeaderValue::Single(values.remove(0))
        } else {
            HeaderValue::Multi(values)
        }
    }

    /// View either shape as a slice of values.
    pub fn values(&self) -> &[String] {
        match self {
            HeaderValue::Single(value) => std::slice::from_ref(value),
            HeaderValue::Multi(values) => values,
        }
    }

    pub fn into_values(self) -> Vec<String> {
        match self {
            HeaderValue::Single(value) => vec![value],
            HeaderValue::Multi(values) => values,
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, HeaderValue::Multi(_))
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Single(value)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Single(value.to_string())
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        HeaderValue::Multi(values)
    }
}

impl From<Vec<&str>> for HeaderValue {
    fn from(values: Vec<&str>) -> Self {
        HeaderValue::Multi(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for HeaderValue {
    fn from(values: [&str; N]) -> Self {
        HeaderValue::Multi(values.iter().map(|v| v.to_string()).collect())
    }
}

impl PartialEq<str> for HeaderValue {
    fn eq(&self, other: &str) -> bool {
        matches!(self, HeaderValue::Single(value) if value == other)
    }
}

impl PartialEq<&str> for HeaderValue {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// Multi-value header map with case-insensitive names.
#[derive(Debug, Clone, Default)]
pub struct HeaderBag {
    entries: IndexMap<String, HeaderValue>,
    names: HashMap<String, String>,
}

impl HeaderBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name`, replacing any header whose name matches
    /// case-insensitively. The replaced entry keeps its position but takes
    /// the new casing.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        let previous = self.names.insert(name.to_ascii_lowercase(), name.clone());

        match previous {
            Some(previous) if previous != name => {
                match self.entries.shift_remove_full(&previous) {
                    Some((index, _, _)) => {
                        self.entries.shift_insert(index, name, value);
                    }
                    None => {
                        self.entries.insert(name, value);
                    }
                }
            }
            _ => {
                self.entries.insert(name, value);
            }
        }
        self
    }

    /// Merge `value` onto an existing header in order, without dedup.
    /// Behaves exactly like [`HeaderBag::set`] when the header is absent.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> &mut Self {
        let name = name.into();
        if !self.contains(&name) {
            return self.set(name, value);
        }

        let canonical = self.canonical(&name).unwrap_or(&name).to_string();
        if let Some(existing) = self.entries.get_mut(&canonical) {
            let mut values = std::mem::replace(existing, HeaderValue::Multi(Vec::new())).into_values();
            values.extend(value.into().into_values());
            *existing = HeaderValue::Multi(values);
        }
        self
    }

    /// Delete the header addressed case-insensitively by `name`. No-op when
    /// absent.
    pub fn remove(&mut self, name: &str) -> &mut Self {
        let canonical = self
            .names
            .remove(&name.to_ascii_lowercase())
            .unwrap_or_else(|| name.to_string());
        self.entries.shift_remove(&canonical);
        self
    }

    /// The stored value in its original shape.
    pub fn value(&self, name: &str) -> Option<&HeaderValue> {
        let canonical = self.canonical(name)?;
        self.entries.get(canonical)
    }

    /// All values for `name`, or an empty slice.
    pub fn get(&self, name: &str) -> &[String] {
        self.value(name).map(HeaderValue::values).unwrap_or(&[])
    }

    /// Values joined with `", "`; empty when the header is absent.
    pub fn line(&self, name: &str) -> String {
        self.get(name).join(", ")
    }

    /// True iff the header carries at least one value.
    pub fn contains(&self, name: &str) -> bool {
        !self.get(name).is_empty()
    }

    /// The casing `name` was stored under.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.names.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for HeaderBag {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for HeaderBag {}

/// Builds a bag from raw engine headers; repeated names are appended.
impl<N: Into<String>> FromIterator<(N, Vec<String>)> for HeaderBag {
    fn from_iter<I: IntoIterator<Item = (N, Vec<String>)>>(iter: I) -> Self {
        let mut bag = HeaderBag::new();
        for (name, values) in iter {
            bag.append(name, HeaderValue::from_values(values));
        }
        bag
    }
}
