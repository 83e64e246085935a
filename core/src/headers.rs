//! Request header mapping.
//!
//! Header names are case-insensitive on the wire, so names are lowercased
//! when stored unless the caller asks to keep them verbatim. Identity is the
//! exact stored key: a preserved `X-Foo` and a folded `x-foo` are two entries.

/// Per-insertion header options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderOptions {
    /// Store the name exactly as given instead of lowercasing it.
    pub preserve_case: bool,
}

impl HeaderOptions {
    pub fn preserve_case() -> Self {
        Self {
            preserve_case: true,
        }
    }
}

/// Ordered header mapping with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a header. An existing entry keeps its position.
    pub fn insert(&mut self, name: &str, value: impl Into<String>, options: HeaderOptions) {
        let key = if options.preserve_case {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Exact-key lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First entry whose key matches `name` ignoring ASCII case.
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten to `name: value` lines in insertion order.
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name.as_ref(), value, HeaderOptions::default());
        }
        headers
    }
}
