//! Small helpers shared by the part parsers and writers.

use quick_xml::events::BytesStart;
use quick_xml::Reader;
use std::io::BufRead;

/// Create a reader configured the way every part parser expects.
///
/// Text is not trimmed: cell values and shared strings keep their whitespace.
pub(crate) fn reader<R: BufRead>(source: R) -> Reader<R> {
    let mut reader = Reader::from_reader(source);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.expand_empty_elements = false;
    reader
}

/// Get a string attribute by local name (`r:id` matches `id`).
pub(crate) fn attr_str(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key || attr.key.local_name().as_ref() == key {
            return match attr.unescape_value() {
                Ok(v) => Some(v.into_owned()),
                Err(_) => Some(String::from_utf8_lossy(&attr.value).into_owned()),
            };
        }
    }
    None
}

/// Get an attribute by its exact, namespace-qualified key.
pub(crate) fn attr_exact(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

pub(crate) fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_str(e, key).and_then(|s| s.trim().parse().ok())
}

pub(crate) fn attr_i32(e: &BytesStart, key: &[u8]) -> Option<i32> {
    attr_str(e, key).and_then(|s| s.trim().parse().ok())
}

pub(crate) fn attr_i64(e: &BytesStart, key: &[u8]) -> Option<i64> {
    attr_str(e, key).and_then(|s| s.trim().parse().ok())
}

pub(crate) fn attr_f64(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr_str(e, key).and_then(|s| s.trim().parse().ok())
}

/// Boolean-ish attribute. Unparsable values fall back to `default`.
pub(crate) fn attr_bool(e: &BytesStart, key: &[u8], default: bool) -> bool {
    match attr_str(e, key).as_deref() {
        Some("1") | Some("true") | Some("on") => true,
        Some("0") | Some("false") | Some("off") => false,
        Some(other) => {
            log::warn!(
                "ignoring unparsable boolean '{}' for attribute '{}'",
                other,
                String::from_utf8_lossy(key)
            );
            default
        }
        None => default,
    }
}

/// Escape text for use in element content or attribute values.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// `xml:space="preserve"` is needed whenever leading or trailing whitespace matters.
pub(crate) fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace)
}

/// Format a float the way cell values and attributes are written.
///
/// Integral values skip the fractional part.
pub(crate) fn format_f64(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        buf.format(value as i64).to_string()
    } else {
        let mut buf = ryu::Buffer::new();
        buf.format(value).to_string()
    }
}

pub(crate) fn format_u32(value: u32) -> String {
    let mut buf = itoa::Buffer::new();
    buf.format(value).to_string()
}

pub(crate) const XML_DECLARATION: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_format_f64() {
        assert_eq!(format_f64(42.0), "42");
        assert_eq!(format_f64(-5.0), "-5");
        assert_eq!(format_f64(0.5), "0.5");
        assert_eq!(format_f64(123.45), "123.45");
    }

    #[test]
    fn test_attr_bool_defaults_on_garbage() {
        let e = BytesStart::from_content("x flag=\"maybe\" on=\"1\"", 1);
        assert!(attr_bool(&e, b"flag", true));
        assert!(!attr_bool(&e, b"flag", false));
        assert!(attr_bool(&e, b"on", false));
        assert!(!attr_bool(&e, b"missing", false));
    }
}
