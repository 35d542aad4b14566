//! Minimal XML helpers for AWS REST responses
//!
//! Route 53 and S3 answer with small, flat documents. Elements are located
//! by tag name; attributes on the located elements are not supported, which
//! holds for every element read here.

/// Inner text of every `<tag>…</tag>` element, in document order
pub fn elements<'a>(doc: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let mut found = Vec::new();
    let mut rest = doc;
    while let Some(start) = rest.find(&open) {
        let body = &rest[start + open.len()..];
        let Some(end) = body.find(&close) else {
            break;
        };
        found.push(&body[..end]);
        rest = &body[end + close.len()..];
    }
    found
}

/// Inner text of the first `<tag>` element
pub fn element<'a>(doc: &'a str, tag: &str) -> Option<&'a str> {
    elements(doc, tag).into_iter().next()
}

/// Unescaped text of the first `<tag>` element
pub fn text(doc: &str, tag: &str) -> Option<String> {
    element(doc, tag).map(unescape)
}

/// Escape text for use in element content
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Undo the five predefined entity escapes
pub fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
