//! HTTP headers abstraction for [`RequestHead`](crate::http::request::RequestHead) and
//! [`HttpResponse`](crate::http::response::HttpResponse)
//!
//! Headers are stored in an ordered map to preserve insertion order.
//! Lookups are case-insensitive: the map is keyed by the lowercased name
//! while the name as first received is kept for serialization.
//!
//! A repeated header is folded into one comma separated value, which is
//! how HTTP/1.1 defines the combined field value for list-based headers.
//!
//! This abstraction does not enforce any HTTP semantics or constraints.

use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub struct HttpHeaders {
    headers: IndexMap<String, (String, String)>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        Self {
            headers: IndexMap::new(),
        }
    }

    /// Sets `name` to `value`, replacing any previous value.
    pub fn set_raw(&mut self, name: &str, value: &str) {
        self.headers.insert(
            name.to_ascii_lowercase(),
            (name.to_string(), value.to_string()),
        );
    }

    /// Adds `value` to `name`, folding it into an existing value if present.
    pub fn append(&mut self, name: &str, value: &str) {
        match self.headers.get_mut(&name.to_ascii_lowercase()) {
            Some((_, existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => self.set_raw(name, value),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    /// Whether the comma separated value of `name` lists `token`
    /// (compared case-insensitively).
    pub fn has_token(&self, name: &str, token: &str) -> bool {
        self.get(name).is_some_and(|value| {
            value
                .split(',')
                .any(|item| item.trim().eq_ignore_ascii_case(token))
        })
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn stringify(&self) -> String {
        let mut result = String::new();
        for (name, value) in self.iter() {
            result.push_str(&format!("{}: {}\r\n", name, value));
        }
        result
    }
}
