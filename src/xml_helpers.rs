//! Shared XML helpers for reading and re-writing SpreadsheetML parts.

use quick_xml::events::BytesStart;

/// Extract a string attribute value by key.
///
/// Returns `None` if the attribute is missing or not valid UTF-8.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return std::str::from_utf8(&attr.value).ok().map(|s| s.to_string());
        }
    }
    None
}

/// Extract a string attribute by local name (ignoring namespace prefix).
pub fn attr_string_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            return std::str::from_utf8(&attr.value).ok().map(|s| s.to_string());
        }
    }
    None
}

/// Extract a `u32` attribute value by key.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Namespace prefix of an element name including the colon (`"x:"`), or
/// an empty string for unprefixed names.
pub fn name_prefix(e: &BytesStart) -> String {
    let name = e.name();
    let raw = name.as_ref();
    match raw.iter().position(|&b| b == b':') {
        Some(pos) => String::from_utf8_lossy(raw.get(..=pos).unwrap_or_default()).into_owned(),
        None => String::new(),
    }
}

/// Minimal XML escaping for attribute/text content.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    fn make_start(xml: &str) -> BytesStart<'_> {
        // Strip < and > / /> to get just the tag content
        let content = xml
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string() {
        let e = make_start(r#"<c r="E2" s="3" />"#);
        assert_eq!(attr_string(&e, b"r"), Some("E2".to_string()));
        assert_eq!(attr_string(&e, b"t"), None);
    }

    #[test]
    fn test_attr_u32() {
        let e = make_start(r#"<workbookView activeTab="2" />"#);
        assert_eq!(attr_u32(&e, b"activeTab"), Some(2));
        assert_eq!(attr_u32(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_string_local_ignores_prefix() {
        let e = make_start(r#"<sheet name="Orders" r:id="rId1" />"#);
        assert_eq!(attr_string_local(&e, b"id"), Some("rId1".to_string()));
    }

    #[test]
    fn test_name_prefix() {
        assert_eq!(name_prefix(&make_start("<x:row r=\"1\">")), "x:");
        assert_eq!(name_prefix(&make_start("<row r=\"1\">")), "");
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape(r#"a<b & "c"'"#), "a&lt;b &amp; &quot;c&quot;&apos;");
        assert_eq!(xml_escape("→ plain"), "→ plain");
    }
}
