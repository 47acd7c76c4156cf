//! Request parameter collection and merging.
//!
//! Parameters are first gathered multi-valued from the query string and,
//! for form posts, from the body. Before dispatch they are collapsed to a
//! single value per key: the first one collected wins, so a query string
//! value shadows a body value of the same name.

use indexmap::IndexMap;
use url::form_urlencoded;

/// Raw parameters, every value kept in the order it was seen.
pub type MultiParams = IndexMap<String, Vec<String>>;

/// Parameters as handed to the API handler.
pub type Params = IndexMap<String, String>;

/// Splits a request target at the first `?` into path and query.
pub fn split_target(uri: &str) -> (&str, Option<&str>) {
    match uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (uri, None),
    }
}

/// Decodes `application/x-www-form-urlencoded` pairs. A key without `=`
/// maps to an empty string.
pub fn decode(input: &[u8]) -> MultiParams {
    let mut params = MultiParams::new();
    for (key, value) in form_urlencoded::parse(input) {
        params
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    params
}

/// Parameters carried by the query component of `uri`, if any.
pub fn from_uri(uri: &str) -> MultiParams {
    match split_target(uri).1 {
        Some(query) => decode(query.as_bytes()),
        None => MultiParams::new(),
    }
}

/// Appends the values of `more` after the values already held per key.
pub fn extend(params: &mut MultiParams, more: MultiParams) {
    for (key, values) in more {
        params.entry(key).or_default().extend(values);
    }
}

/// Keeps the first value of every key. Keys without any value are dropped.
pub fn collapse(params: MultiParams) -> Params {
    params
        .into_iter()
        .filter_map(|(key, values)| values.into_iter().next().map(|first| (key, first)))
        .collect()
}
