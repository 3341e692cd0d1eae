//! Decoding of Python string literals from syntax nodes.
//!
//! Only plain and raw text strings are decoded. Byte strings and f-strings
//! are not literal text and yield `None`.

use tree_sitter::Node;

/// Returns the text value of a `string` or `concatenated_string` node.
///
/// Returns `None` for any other node kind, for byte strings, and for
/// f-strings (including a concatenation containing one).
pub fn string_literal(node: Node<'_>, source: &[u8]) -> Option<String> {
    match node.kind() {
        "string" => single_string(node, source),
        "concatenated_string" => {
            let mut cursor = node.walk();
            let mut value = String::new();
            for part in node.named_children(&mut cursor) {
                value.push_str(&single_string(part, source)?);
            }
            Some(value)
        }
        _ => None,
    }
}

fn single_string(node: Node<'_>, source: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let count = node.child_count();
    let start = node.child(0).filter(|c| c.kind() == "string_start")?;
    let end = node
        .child(count.checked_sub(1)?)
        .filter(|c| c.kind() == "string_end")?;

    let opener = start.utf8_text(source).ok()?;
    let prefix = opener
        .trim_end_matches(['"', '\''])
        .to_ascii_lowercase();
    if prefix.contains('f') || prefix.contains('b') {
        return None;
    }

    let body = source.get(start.end_byte()..end.start_byte())?;
    let body = std::str::from_utf8(body).ok()?;

    if prefix.contains('r') {
        Some(body.to_owned())
    } else {
        Some(unescape(body))
    }
}

/// Resolves the backslash escapes of a non-raw string body.
///
/// Named escapes (`\N{...}`), unknown escapes, and escapes that do not
/// form a valid character are kept verbatim, backslash included.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\\' | '\'' | '"' => out.push(next),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'v' => out.push('\u{0B}'),
            // line continuation
            '\n' => {}
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.clone().take(width).collect();
                let decoded = (digits.len() == width
                    && digits.chars().all(|d| d.is_ascii_hexdigit()))
                .then(|| u32::from_str_radix(&digits, 16).ok())
                .flatten()
                .and_then(char::from_u32);
                match decoded {
                    Some(ch) => {
                        out.push(ch);
                        chars.nth(width - 1);
                    }
                    None => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            '0'..='7' => {
                let mut value = next.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(value));
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}
