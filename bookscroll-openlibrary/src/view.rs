use std::fmt;

use bookscroll::{Pager, Span};

pub const LOADING_TEXT: &str = "Loading...";

/// One rendered list item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowView {
    pub key: String,
    pub title: String,
    pub description: Option<String>,
}

impl RowView {
    /// Height in terminal lines: the title plus one line per description line.
    pub fn height(&self) -> u32 {
        let description = self
            .description
            .as_deref()
            .map_or(0, |d| d.lines().count());
        1 + u32::try_from(description).unwrap_or(u32::MAX - 1)
    }
}

/// A frame of the book list: rows in list order, then the loading indicator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListView {
    pub rows: Vec<RowView>,
    pub loading: bool,
    pub error: Option<String>,
    pub exhausted: bool,
}

impl ListView {
    pub fn from_pager(pager: &Pager) -> Self {
        let rows = pager
            .items()
            .iter()
            .map(|book| RowView {
                key: book.key().to_owned(),
                title: book.title().to_owned(),
                description: book
                    .description()
                    .filter(|d| !d.trim().is_empty())
                    .map(str::to_owned),
            })
            .collect();
        Self {
            rows,
            loading: pager.is_loading(),
            error: pager.error().map(ToString::to_string),
            exhausted: pager.is_exhausted(),
        }
    }

    pub fn last_key(&self) -> Option<&str> {
        self.rows.last().map(|r| r.key.as_str())
    }

    /// Total height of the rows, excluding the indicator area.
    pub fn content_height(&self) -> u64 {
        self.rows.iter().map(|r| r.height() as u64).sum()
    }

    /// Position of the row with `key` in the scroll axis.
    pub fn row_span(&self, key: &str) -> Option<Span> {
        let mut start = 0u64;
        for row in &self.rows {
            if row.key == key {
                return Some(Span::new(start, row.height()));
            }
            start = start.saturating_add(row.height() as u64);
        }
        None
    }

    /// Writes rows starting at `from`, without the indicator.
    pub fn write_rows(&self, f: &mut impl fmt::Write, from: usize) -> fmt::Result {
        for row in self.rows.iter().skip(from) {
            writeln!(f, "{}", row.title)?;
            if let Some(description) = &row.description {
                for line in description.lines() {
                    writeln!(f, "    {line}")?;
                }
            }
        }
        Ok(())
    }

    /// Writes the indicator area below the list.
    pub fn write_status(&self, f: &mut impl fmt::Write) -> fmt::Result {
        if self.loading {
            writeln!(f, "{LOADING_TEXT}")?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "Error: {error} (retry)")?;
        }
        Ok(())
    }
}

impl fmt::Display for ListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_rows(f, 0)?;
        self.write_status(f)
    }
}
