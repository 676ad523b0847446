//! HTML escaping for `{{name}}` interpolation.

/// Escape `& < > " ' /` for safe inclusion in HTML text and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    push_escaped(&mut out, input);
    out
}

pub(crate) fn push_escaped(out: &mut String, input: &str) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_six_characters() {
        assert_eq!(
            escape_html(r#"<a href="/x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;&#x2F;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;&#x2F;a&gt;"
        );
    }

    #[test]
    fn leaves_other_text_alone() {
        assert_eq!(escape_html("plain text, ünïcode"), "plain text, ünïcode");
    }
}
