//! Submitted form data.
//!
//! [`FormData`] holds `application/x-www-form-urlencoded` payloads as a
//! multi-value map; [`Files`] holds uploaded files keyed by field name.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// A multi-value dictionary of submitted form fields.
///
/// # Examples
///
/// ```
/// use crispy_ext_forms::data::FormData;
///
/// let data = FormData::parse("name=Ada+Lovelace&phones-0-number=555%201234&tag=a&tag=b");
/// assert_eq!(data.get("name"), Some("Ada Lovelace"));
/// assert_eq!(data.get("phones-0-number"), Some("555 1234"));
/// assert_eq!(data.get("tag"), Some("b"));
/// assert_eq!(data.get_list("tag"), &["a".to_string(), "b".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    values: HashMap<String, Vec<String>>,
    order: Vec<String>,
}

impl FormData {
    /// Creates an empty `FormData`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a URL-encoded payload. `+` decodes to a space.
    pub fn parse(payload: &str) -> Self {
        let mut data = Self::new();
        for pair in payload.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            data.append(decode(key), decode(value));
        }
        data
    }

    /// Builds `FormData` from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut data = Self::new();
        for (key, value) in pairs {
            data.append(key, value);
        }
        data
    }

    /// Appends a value for a key, keeping earlier values.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if !self.values.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.values.entry(key).or_default().push(value.into());
    }

    /// Replaces all values for a key with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if !self.values.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.values.insert(key, vec![value.into()]);
    }

    /// Returns the last value submitted for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|v| v.last())
            .map(String::as_str)
    }

    /// Returns every value submitted for a key.
    pub fn get_list(&self, key: &str) -> &[String] {
        self.values.get(key).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if the key was submitted.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterates keys in submission order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing was submitted.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The client-supplied file name.
    pub name: String,
    /// The declared content type.
    pub content_type: String,
    /// The file contents.
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Creates an uploaded file.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    /// Returns the size in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// Uploaded files keyed by the (prefixed) field name.
pub type Files = HashMap<String, UploadedFile>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        assert!(FormData::parse("").is_empty());
        assert!(FormData::parse("&&").is_empty());
    }

    #[test]
    fn test_parse_key_without_value() {
        let data = FormData::parse("phones-0-DELETE&name=x");
        assert_eq!(data.get("phones-0-DELETE"), Some(""));
        assert_eq!(data.get("name"), Some("x"));
    }

    #[test]
    fn test_keys_keep_submission_order() {
        let data = FormData::parse("b=1&a=2&b=3");
        let keys: Vec<&str> = data.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_set_replaces() {
        let mut data = FormData::from_pairs([("a", "1"), ("a", "2")]);
        data.set("a", "3");
        assert_eq!(data.get_list("a"), &["3".to_string()]);
    }

    #[test]
    fn test_get_list_missing() {
        let data = FormData::new();
        assert!(data.get_list("missing").is_empty());
        assert!(!data.contains_key("missing"));
    }

    #[test]
    fn test_uploaded_file_size() {
        let file = UploadedFile::new("photo.png", "image/png", vec![0u8; 12]);
        assert_eq!(file.size(), 12);
    }
}
