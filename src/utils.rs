use std::borrow::Cow;

pub fn truncate_str(s: &str, len: usize) -> Cow<'_, str> {
    if s.chars().count() > len {
        let owned = s
            .chars()
            .take(len.saturating_sub(3))
            .chain("...".chars())
            .collect();
        Cow::Owned(owned)
    } else {
        Cow::Borrowed(s)
    }
}

/// Replaces `{name}` tokens in `template` with their value from `values`
///
/// Tokens that aren't in `values` (and any stray braces) are kept verbatim. Substituted text is
/// not scanned again
pub fn safe_format(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 1..];

        let ident_len = after_open
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after_open.len());
        let ident = &after_open[..ident_len];
        let closed = after_open[ident_len..].starts_with('}');

        match values.iter().find(|(key, _)| *key == ident) {
            Some((_, value)) if closed && !ident.is_empty() => {
                out.push_str(value);
                rest = &after_open[ident_len + 1..];
            }
            _ => {
                out.push('{');
                rest = after_open;
            }
        }
    }
    out.push_str(rest);

    out
}
