use alloc::string::String;
use alloc::vec::Vec;

/// The `description` field of a raw catalog record.
///
/// The catalog emits either a typed-text object (`{"type": "/type/text", "value": "..."}`) or,
/// for older records, a bare string.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RawDescription {
    Text { value: String },
    Plain(String),
}

impl RawDescription {
    pub fn value(&self) -> &str {
        match self {
            Self::Text { value } | Self::Plain(value) => value,
        }
    }

    pub fn into_value(self) -> String {
        match self {
            Self::Text { value } | Self::Plain(value) => value,
        }
    }
}

/// A record as returned by the catalog's query endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawBook {
    /// Empty when the catalog omitted the key; such records are skipped, not fatal.
    #[cfg_attr(feature = "serde", serde(default, deserialize_with = "null_as_empty"))]
    pub key: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub subtitle: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<RawDescription>,
}

#[cfg(feature = "serde")]
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Why a raw record could not become a [`BookRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRecord {
    #[error("record has an empty key")]
    EmptyKey,
    #[error("record has no title")]
    MissingTitle,
}

/// A displayable book.
///
/// Immutable once built: the fields are only reachable through accessors.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BookRecord {
    key: String,
    title: String,
    description: Option<String>,
}

impl BookRecord {
    /// Builds a record directly. `key` and `title` must be non-empty.
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, InvalidRecord> {
        let key = key.into();
        let title = title.into();
        if key.is_empty() {
            return Err(InvalidRecord::EmptyKey);
        }
        if title.trim().is_empty() {
            return Err(InvalidRecord::MissingTitle);
        }
        Ok(Self {
            key,
            title,
            description,
        })
    }

    /// Converts a raw catalog record.
    ///
    /// The title is the raw title followed by the subtitle (space-separated) when a non-empty
    /// subtitle is present. The description is the inner text value, if any.
    pub fn from_raw(raw: RawBook) -> Result<Self, InvalidRecord> {
        let RawBook {
            key,
            title,
            subtitle,
            description,
        } = raw;
        let mut title = title.ok_or(InvalidRecord::MissingTitle)?;
        if let Some(subtitle) = subtitle.filter(|s| !s.is_empty()) {
            title.push(' ');
            title.push_str(&subtitle);
        }
        Self::new(key, title, description.map(RawDescription::into_value))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// One resolved page of results.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Page {
    pub books: Vec<BookRecord>,
    /// Number of raw records the catalog returned, including rejected ones.
    ///
    /// The pager advances its offset by this count, not by `books.len()`.
    pub received: usize,
}

impl Page {
    pub fn new(books: Vec<BookRecord>) -> Self {
        let received = books.len();
        Self { books, received }
    }

    /// Converts a raw page, skipping records that fail validation.
    pub fn from_raw(raw: Vec<RawBook>) -> Self {
        let received = raw.len();
        let mut books = Vec::with_capacity(received);
        for record in raw {
            match BookRecord::from_raw(record) {
                Ok(book) => books.push(book),
                Err(_err) => {
                    bwarn!(error = %_err, "skipping invalid catalog record");
                }
            }
        }
        Self { books, received }
    }

    pub fn is_empty(&self) -> bool {
        self.received == 0
    }
}

/// A one-dimensional extent in the scroll axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: u64,
    pub size: u32,
}

impl Span {
    pub fn new(start: u64, size: u32) -> Self {
        Self { start, size }
    }

    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size as u64)
    }

    /// Returns `true` when `self` overlaps `viewport`.
    ///
    /// A zero-sized span intersects when its start lies inside the viewport.
    pub fn intersects(&self, viewport: &Span) -> bool {
        if viewport.size == 0 {
            return false;
        }
        if self.size == 0 {
            return viewport.start <= self.start && self.start < viewport.end();
        }
        self.start < viewport.end() && viewport.start < self.end()
    }
}
