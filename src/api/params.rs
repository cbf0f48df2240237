//! Ordered request parameters.

use std::fmt;

use url::form_urlencoded;

/// A single parameter value. Only an empty [`ParamValue::Str`] is considered
/// empty; it is dropped from outgoing requests.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, ParamValue::Str(s) if s.is_empty())
    }

    /// Interprets the value as an integer, accepting numeric strings.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            ParamValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_owned())
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Str(value.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParamValue {
                fn from(value: $t) -> Self {
                    ParamValue::Int(value as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

/// An ordered set of request parameters.
///
/// Keys are canonicalized to `String` on insertion. Inserting a key which is
/// already present replaces its value but keeps its original position, so a
/// key is never sent twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Params {
        Params::default()
    }

    /// Inserts a parameter, returning the value it replaced.
    pub fn insert<K: ToString, V: Into<ParamValue>>(&mut self, key: K, value: V) -> Option<ParamValue> {
        let key = key.to_string();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder form of [`Params::insert`].
    pub fn with<K: ToString, V: Into<ParamValue>>(mut self, key: K, value: V) -> Params {
        self.insert(key, value);
        self
    }

    /// Inserts the parameter only when a value is present.
    pub fn with_opt<K: ToString, V: Into<ParamValue>>(self, key: K, value: Option<V>) -> Params {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;

        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parameters which will actually be transmitted, in insertion order.
    pub(crate) fn transmitted(&self) -> impl Iterator<Item = (&str, String)> {
        self.entries
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.to_string()))
    }

    /// `&name=value` for every transmitted parameter, with each value
    /// URL-encoded.
    pub(crate) fn append_to_query(&self, query: &mut String) {
        for (name, value) in self.transmitted() {
            query.push('&');
            query.push_str(name);
            query.push('=');
            query.extend(form_urlencoded::byte_serialize(value.as_bytes()));
        }
    }

    /// `application/x-www-form-urlencoded` serialization of the transmitted
    /// parameters.
    pub(crate) fn form_encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.transmitted())
            .finish()
    }
}

impl<K: ToString, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        params.extend(iter);
        params
    }
}

impl<K: ToString, V: Into<ParamValue>> Extend<(K, V)> for Params {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: ToString, V: Into<ParamValue>, const N: usize> From<[(K, V); N]> for Params {
    fn from(value: [(K, V); N]) -> Self {
        value.into_iter().collect()
    }
}

/// Builds [`Params`] inline:
///
/// ```
/// let params = shodanx::params! { "query" => "apache", "page" => 2 };
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => ($crate::api::Params::new());
    ($($key:expr => $value:expr),+ $(,)?) => ({
        let mut params = $crate::api::Params::new();
        $(
            params.insert($key, $value);
        )+
        params
    });
}
