use std::collections::BTreeMap;
use std::collections::btree_map;

const ARCHIVE: &str = "archive";
const ENTRY_LENGTH: &str = "entryLength";
const IS_ENTRY_COMPRESSED: &str = "isEntryCompressed";
const LAYOUT: &str = "layout";
const ENCRYPTED: &str = "encrypted";
const ORIGINAL_LENGTH: &str = "originalLength";

/// Open, string-keyed metadata attached to a [`Resource`](super::Resource)
/// or to a reading order [`Link`](crate::positions::Link).
///
/// Properties are layered rather than replaced: decorators call [`Properties::add`]
/// to contribute their own keys on top of the ones of the resource they wrap.
///
/// # Examples
/// - Layering properties:
/// ```
/// # use lectern::resource::{Properties, PropertyValue};
/// let mut properties = Properties::new().with("layout", "fixed");
/// properties.add(Properties::new().with("page", 12));
///
/// assert_eq!(Some("fixed"), properties.get_str("layout"));
/// assert_eq!(Some(&PropertyValue::Integer(12)), properties.get("page"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties(BTreeMap<String, PropertyValue>);

/// A value held by [`Properties`].
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// A boolean flag.
    Bool(bool),
    /// An integer, such as a byte length.
    Integer(i64),
    /// A floating point number.
    Number(f64),
    /// A string.
    Text(String),
    /// A nested map, such as the `encrypted` metadata of a link.
    Map(Properties),
}

impl Properties {
    /// Creates empty properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Properties::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets a single key, returning the previous value if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Layers the keys of `other` on top of these properties.
    ///
    /// Keys absent from `other` are kept, keys present in both take the value of `other`.
    pub fn add(&mut self, other: Properties) {
        self.0.extend(other.0);
    }

    /// Returns the value associated with the given key.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    /// Returns the string value associated with the given key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            PropertyValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the non-negative integer value associated with the given key.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            PropertyValue::Integer(integer) => u64::try_from(*integer).ok(),
            _ => None,
        }
    }

    /// Returns the nested map associated with the given key.
    pub fn get_map(&self, key: &str) -> Option<&Properties> {
        match self.get(key)? {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns `true` if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of top-level keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the top-level entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, PropertyValue> {
        self.0.iter()
    }

    /// How the resource is stored within an archive, when read from one.
    pub fn archive(&self) -> Option<ArchiveProperties> {
        let archive = self.get_map(ARCHIVE)?;
        let entry_length = archive.get_u64(ENTRY_LENGTH)?;
        let is_entry_compressed = match archive.get(IS_ENTRY_COMPRESSED)? {
            PropertyValue::Bool(flag) => *flag,
            _ => return None,
        };

        Some(ArchiveProperties {
            entry_length,
            is_entry_compressed,
        })
    }

    /// Sets the [`ArchiveProperties`].
    pub fn set_archive(&mut self, archive: ArchiveProperties) {
        let map = Properties::new()
            .with(ENTRY_LENGTH, archive.entry_length)
            .with(IS_ENTRY_COMPRESSED, archive.is_entry_compressed);
        self.insert(ARCHIVE, map);
    }

    /// The raw `layout` value declared for a reading order item (`fixed`, `reflowable`).
    pub fn layout(&self) -> Option<&str> {
        self.get_str(LAYOUT)
    }

    /// The plaintext length of an encrypted or obfuscated resource,
    /// from `encrypted` → `originalLength`.
    pub fn original_length(&self) -> Option<u64> {
        self.get_map(ENCRYPTED)?.get_u64(ORIGINAL_LENGTH)
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = btree_map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for Properties {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u64> for PropertyValue {
    fn from(value: u64) -> Self {
        // Lengths beyond `i64::MAX` are not representable by any supported source
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Properties> for PropertyValue {
    fn from(value: Properties) -> Self {
        Self::Map(value)
    }
}

/// Holds information about how a resource is stored in an archive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArchiveProperties {
    /// The length of the entry stored in the archive.
    /// This is the compressed length if the entry is compressed.
    pub entry_length: u64,
    /// Indicates whether the entry was compressed before being stored in the archive.
    pub is_entry_compressed: bool,
}
