//! JSON encode/decode with option flags.
//!
//! Flags are plain `u32` bits so callers can OR them together the way they
//! would with any bitmask API. The set is deduplicated on construction and
//! collapsed with `bits()` right before use.

use std::collections::BTreeSet;

use serde_json::{Map, Number, Value};

/// Set of JSON option flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonOptions {
    flags: BTreeSet<u32>,
}

impl JsonOptions {
    /// Indent encoded output.
    pub const PRETTY_PRINT: u32 = 1 << 0;
    /// Encode sequences as objects keyed by index.
    pub const FORCE_OBJECT: u32 = 1 << 1;
    /// Encode numeric-looking strings as numbers.
    pub const NUMERIC_CHECK: u32 = 1 << 2;
    /// Replace invalid UTF-8 with U+FFFD when decoding instead of failing.
    pub const INVALID_UTF8_SUBSTITUTE: u32 = 1 << 3;

    pub fn new(flags: impl IntoIterator<Item = u32>) -> Self {
        Self {
            flags: flags.into_iter().collect(),
        }
    }

    pub fn flags(&self) -> impl Iterator<Item = u32> + '_ {
        self.flags.iter().copied()
    }

    /// All flags OR-ed together.
    pub fn bits(&self) -> u32 {
        self.flags.iter().fold(0, |acc, flag| acc | flag)
    }

    pub fn contains(&self, flag: u32) -> bool {
        self.bits() & flag == flag
    }
}

/// Serialize `value` honoring the encode-side flags.
pub fn encode(value: &Value, options: &JsonOptions) -> Result<Vec<u8>, serde_json::Error> {
    let bits = options.bits();
    let transformed;
    let value = if bits & (JsonOptions::FORCE_OBJECT | JsonOptions::NUMERIC_CHECK) != 0 {
        transformed = transform(value.clone(), bits);
        &transformed
    } else {
        value
    };

    if bits & JsonOptions::PRETTY_PRINT != 0 {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    }
}

/// Parse `bytes` honoring the decode-side flags.
pub fn decode(bytes: &[u8], options: &JsonOptions) -> Result<Value, serde_json::Error> {
    if options.contains(JsonOptions::INVALID_UTF8_SUBSTITUTE) {
        serde_json::from_str(&String::from_utf8_lossy(bytes))
    } else {
        serde_json::from_slice(bytes)
    }
}

fn transform(value: Value, bits: u32) -> Value {
    match value {
        Value::Array(items) if bits & JsonOptions::FORCE_OBJECT != 0 => Value::Object(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), transform(item, bits)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|item| transform(item, bits)).collect())
        }
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k, transform(v, bits)))
                .collect::<Map<String, Value>>(),
        ),
        Value::String(s) if bits & JsonOptions::NUMERIC_CHECK != 0 => match numeric(&s) {
            Some(n) => Value::Number(n),
            None => Value::String(s),
        },
        other => other,
    }
}

fn numeric(s: &str) -> Option<Number> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(n.into());
    }
    if let Ok(n) = s.parse::<u64>() {
        return Some(n.into());
    }
    // Rust's float parser accepts "inf" and "NaN"; from_f64 rejects them.
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_flags_collapse() {
        let options = JsonOptions::new([
            JsonOptions::PRETTY_PRINT,
            JsonOptions::PRETTY_PRINT,
            JsonOptions::FORCE_OBJECT,
        ]);
        assert_eq!(options.flags().count(), 2);
        assert_eq!(
            options.bits(),
            JsonOptions::PRETTY_PRINT | JsonOptions::FORCE_OBJECT
        );
        assert!(options.contains(JsonOptions::FORCE_OBJECT));
        assert!(!options.contains(JsonOptions::NUMERIC_CHECK));
    }

    #[test]
    fn default_encoding_is_compact() {
        let bytes = encode(&json!({"a": [1, 2]}), &JsonOptions::default()).unwrap();
        assert_eq!(bytes, br#"{"a":[1,2]}"#);
    }

    #[test]
    fn pretty_print_indents() {
        let options = JsonOptions::new([JsonOptions::PRETTY_PRINT]);
        let text = String::from_utf8(encode(&json!({"a": 1}), &options).unwrap()).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn force_object_rewrites_sequences() {
        let options = JsonOptions::new([JsonOptions::FORCE_OBJECT]);
        let bytes = encode(&json!({"tags": ["x", "y"]}), &options).unwrap();
        let back: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, json!({"tags": {"0": "x", "1": "y"}}));
    }

    #[test]
    fn numeric_check_converts_number_strings() {
        let options = JsonOptions::new([JsonOptions::NUMERIC_CHECK]);
        let bytes = encode(&json!({"n": "42", "f": "1.5", "s": "abc", "i": "inf"}), &options).unwrap();
        let back: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, json!({"n": 42, "f": 1.5, "s": "abc", "i": "inf"}));
    }

    #[test]
    fn invalid_utf8_fails_unless_substituted() {
        let bytes = b"{\"a\":\"\xff\"}";
        assert!(decode(bytes, &JsonOptions::default()).is_err());

        let options = JsonOptions::new([JsonOptions::INVALID_UTF8_SUBSTITUTE]);
        let value = decode(bytes, &options).unwrap();
        assert_eq!(value, json!({"a": "\u{fffd}"}));
    }
}
