//! Free-text cleanup before persistence
//!
//! Notes, history details and essay bodies are stored as plain text. Markup
//! is removed; `<script>` and `<style>` blocks go with their contents.

const DROPPED_BLOCKS: &[&str] = &["script", "style"];

/// Remove HTML markup from user-supplied text.
///
/// A `<` that does not open a tag (`a < b`) is kept.
pub fn strip_html(input: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `input`
    let lower = input.to_ascii_lowercase();
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        if bytes[i] == b'<' && opens_tag(bytes.get(i + 1).copied()) {
            let rest = &lower[i + 1..];

            if let Some(block) = DROPPED_BLOCKS.iter().find(|b| starts_with_tag(rest, b)) {
                let close = format!("</{block}");
                i = match lower[i..].find(&close) {
                    Some(pos) => {
                        let close_at = i + pos;
                        lower[close_at..]
                            .find('>')
                            .map_or(input.len(), |end| close_at + end + 1)
                    }
                    None => input.len(),
                };
                continue;
            }

            i = lower[i..].find('>').map_or(input.len(), |end| i + end + 1);
            continue;
        }

        match input[i..].chars().next() {
            Some(ch) => {
                out.push(ch);
                i += ch.len_utf8();
            }
            None => break,
        }
    }

    out
}

/// Trim, strip markup and map blank values to `None`
pub fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(strip_html)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn opens_tag(next: Option<u8>) -> bool {
    matches!(next, Some(b) if b.is_ascii_alphabetic() || b == b'/' || b == b'!' || b == b'?')
}

fn starts_with_tag(rest: &str, name: &str) -> bool {
    rest.starts_with(name)
        && rest[name.len()..]
            .chars()
            .next()
            .map_or(true, |c| c == '>' || c == '/' || c.is_whitespace())
}
