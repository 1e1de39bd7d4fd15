//! Message-id list extraction for References and In-Reply-To headers.
//!
//! Parsing is forgiving: anything that is not a bracketed
//! `<msg-id>` (bare words, comments, stray commas) is skipped, and malformed
//! input yields whatever ids were recognised before it.

/// Extract message ids, brackets stripped, in header order.
///
/// Duplicates are preserved. `None` and empty input yield an empty list.
pub fn parse_references(header: Option<&str>) -> Vec<String> {
    let mut ids = Vec::new();
    if let Some(value) = header {
        append_references(&mut ids, value);
    }
    ids
}

/// Append the message ids found in `value` to `out`.
pub fn append_references(out: &mut Vec<String>, value: &str) {
    let bytes = value.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    while pos < len {
        skip_cfws(bytes, &mut pos);
        if pos >= len {
            break;
        }

        if bytes[pos] != b'<' {
            skip_word(bytes, &mut pos);
            continue;
        }

        pos += 1;
        let start = pos;
        while pos < len && bytes[pos] != b'>' {
            pos += 1;
        }
        if pos >= len {
            log::trace!("unterminated message id in `{}`", value);
            break;
        }

        // Folded ids may carry whitespace inside the brackets.
        let id: String = value[start..pos]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        pos += 1;

        if !id.is_empty() {
            out.push(id);
        }
    }
}

fn skip_cfws(bytes: &[u8], pos: &mut usize) {
    let len = bytes.len();
    while *pos < len {
        match bytes[*pos] {
            b' ' | b'\t' | b'\r' | b'\n' | b',' => *pos += 1,
            b'(' => {
                *pos += 1;
                let mut depth = 1;
                while *pos < len && depth > 0 {
                    match bytes[*pos] {
                        b'(' => depth += 1,
                        b')' => depth -= 1,
                        b'\\' if *pos + 1 < len => *pos += 1,
                        _ => {}
                    }
                    *pos += 1;
                }
            }
            _ => break,
        }
    }
}

fn skip_word(bytes: &[u8], pos: &mut usize) {
    let len = bytes.len();
    while *pos < len {
        match bytes[*pos] {
            b' ' | b'\t' | b'\r' | b'\n' | b',' | b'(' | b'<' => break,
            b'"' => {
                *pos += 1;
                while *pos < len && bytes[*pos] != b'"' {
                    if bytes[*pos] == b'\\' {
                        *pos += 1;
                    }
                    *pos += 1;
                }
                *pos = (*pos + 1).min(len);
            }
            _ => *pos += 1,
        }
    }
}
