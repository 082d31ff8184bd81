//! Plain-text sanitization for user-provided names.
//!
//! Deck names are persisted as plain text: markup is stripped entirely and
//! the remaining HTML-significant characters are entity-escaped, so stored
//! values render inert in any downstream consumer.

/// Strip HTML tags and escape the remaining special characters.
///
/// Tag contents are kept for ordinary formatting tags; `<script>` and
/// `<style>` elements are dropped together with their contents.
pub fn sanitize(input: &str) -> String {
    let stripped = strip_tags(input);
    escape(&stripped)
}

/// Remove `<...>` tag markup, dropping script/style bodies wholesale.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '<' {
            out.push(c);
            continue;
        }

        let rest = &input[i..];
        let lower = rest.to_lowercase();
        let skip_to = if lower.starts_with("<script") {
            close_of(&lower, "</script>")
        } else if lower.starts_with("<style") {
            close_of(&lower, "</style>")
        } else {
            rest.find('>').map(|p| p + 1)
        };

        match skip_to {
            Some(len) => {
                // Advance past the tag (or the whole element).
                while let Some(&(j, _)) = chars.peek() {
                    if j >= i + len {
                        break;
                    }
                    chars.next();
                }
            }
            // Unterminated tag: drop the remainder.
            None => break,
        }
    }

    out
}

fn close_of(lower: &str, closing: &str) -> Option<usize> {
    lower.find(closing).map(|p| p + closing.len())
}

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
