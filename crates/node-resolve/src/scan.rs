//! Module-syntax detection.
//!
//! Decides whether a source file uses module-level import/export syntax
//! without full parsing: comments and string literals are skipped, then
//! `import`/`export` keywords are matched at identifier boundaries.

/// Whether `source` contains module-level import/export syntax.
#[must_use]
pub fn has_module_syntax(source: &str) -> bool {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            b'/' if i + 1 < len && bytes[i + 1] == b'/' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                i += 2;
                while i + 1 < len && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 2;
            }
            quote @ (b'"' | b'\'' | b'`') => {
                i += 1;
                while i < len && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            _ => {
                if matches_keyword(bytes, i, b"import") || matches_keyword(bytes, i, b"export") {
                    return true;
                }
                i += 1;
            }
        }
    }

    false
}

/// Match `keyword` at `pos` with identifier boundaries on both sides.
fn matches_keyword(bytes: &[u8], pos: usize, keyword: &[u8]) -> bool {
    if pos + keyword.len() > bytes.len() || &bytes[pos..pos + keyword.len()] != keyword {
        return false;
    }
    if pos > 0 {
        let prev = bytes[pos - 1];
        if is_ident_byte(prev) || prev == b'.' {
            return false;
        }
    }
    match bytes.get(pos + keyword.len()) {
        Some(&next) => !is_ident_byte(next),
        None => true,
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}
