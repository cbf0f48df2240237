//! Search query and facet builders.
//!
//! Search endpoints take free text plus `name:value` filters in a single
//! `query` parameter, and facets as a comma separated `name[:size]` list.

use std::fmt;

use url::form_urlencoded;

/// Joins list-valued parameters and path segments.
pub(crate) fn comma_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: ToString,
{
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Percent-encodes a value for use as one path segment.
pub(crate) fn path_segment(segment: &str) -> String {
    // form encoding writes spaces as '+' and a literal '+' as %2B
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// A comma separated path segment, each entry encoded on its own.
pub(crate) fn path_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: ToString,
{
    comma_list(items.into_iter().map(|item| path_segment(&item.to_string())))
}

/// A search query: free text followed by `name:value` filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    text: String,
    filters: Vec<(String, String)>,
}

impl Query {
    pub fn new<S: Into<String>>(text: S) -> Query {
        Query {
            text: text.into(),
            filters: Vec::new(),
        }
    }

    pub fn filter<N: Into<String>, V: ToString>(mut self, name: N, value: V) -> Query {
        self.filters.push((name.into(), value.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.filters.is_empty()
    }
}

impl From<&str> for Query {
    fn from(value: &str) -> Self {
        Query::new(value)
    }
}

impl From<String> for Query {
    fn from(value: String) -> Self {
        Query::new(value)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";

        let text = self.text.trim();
        if !text.is_empty() {
            f.write_str(text)?;
            sep = " ";
        }

        for (name, value) in &self.filters {
            if value.contains(char::is_whitespace) {
                write!(f, "{}{}:\"{}\"", sep, name, value)?;
            } else {
                write!(f, "{}{}:{}", sep, name, value)?;
            }

            sep = " ";
        }

        Ok(())
    }
}

/// Facets to summarize search results by, each with an optional size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    facets: Vec<(String, Option<u32>)>,
}

impl Facets {
    pub fn new() -> Facets {
        Facets::default()
    }

    pub fn facet<N: Into<String>>(mut self, name: N) -> Facets {
        self.facets.push((name.into(), None));
        self
    }

    pub fn facet_with_size<N: Into<String>>(mut self, name: N, size: u32) -> Facets {
        self.facets.push((name.into(), Some(size)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Facets {
    /// Accepts `name` or `name:size` entries.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut facets = Facets::new();

        for entry in iter {
            let entry = entry.as_ref().trim();

            facets = match entry.rsplit_once(':') {
                Some((name, size)) => match size.parse::<u32>() {
                    Ok(size) => facets.facet_with_size(name, size),
                    Err(_) => facets.facet(entry),
                },
                None => facets.facet(entry),
            };
        }

        facets
    }
}

impl fmt::Display for Facets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, size)) in self.facets.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }

            match size {
                Some(size) => write!(f, "{}:{}", name, size)?,
                None => f.write_str(name)?,
            }
        }

        Ok(())
    }
}
