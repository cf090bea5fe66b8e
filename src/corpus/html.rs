//! Status HTML to plain text

/// Strip markup from status content. Paragraph ends and line breaks
/// become newlines; named and numeric character references are decoded.
pub fn to_plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        out.push_str(&html_escape::decode_html_entities(&rest[..start]));
        let Some(end) = rest[start..].find('>') else {
            // Unterminated tag, keep the remainder as text
            rest = &rest[start..];
            break;
        };

        let tag = rest[start + 1..start + end].trim().to_ascii_lowercase();
        if tag == "/p" || tag.starts_with("br") {
            out.push('\n');
        }
        rest = &rest[start + end + 1..];
    }
    out.push_str(&html_escape::decode_html_entities(rest));

    out.trim().to_string()
}
