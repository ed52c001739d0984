use crate::llm::prompts::PLACEHOLDER;

/// Substitute `content` into `template`.
///
/// Rules:
///   - the first `%s` is replaced by `content`, verbatim;
///   - `%%` renders as a single `%`;
///   - any later `%s` is left as literal text;
///   - a template without a placeholder gets the content appended after a
///     blank line, so the content never goes missing.
pub fn format_prompt(template: &str, content: &str) -> String {
    let mut out = String::with_capacity(template.len() + content.len());
    let mut substituted = false;
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("%%") {
            out.push('%');
            rest = &tail[2..];
        } else if !substituted && tail.starts_with(PLACEHOLDER) {
            out.push_str(content);
            substituted = true;
            rest = &tail[PLACEHOLDER.len()..];
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);

    if !substituted {
        log::debug!("Template has no {PLACEHOLDER} placeholder; appending content");
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(content);
    }

    out
}
