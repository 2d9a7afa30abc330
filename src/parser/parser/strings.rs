//! Decoding of numeric and string literal tokens.

/// Parses an integer literal. Values that overflow `i64` come back as the
/// float PHP would produce.
pub(super) fn parse_int_literal(text: &[u8]) -> Result<i64, f64> {
    let digits: Vec<u8> = text.iter().copied().filter(|&c| c != b'_').collect();
    let (radix, body) = match digits.as_slice() {
        [b'0', b'x' | b'X', rest @ ..] => (16, rest),
        [b'0', b'b' | b'B', rest @ ..] => (2, rest),
        [b'0', b'o' | b'O', rest @ ..] => (8, rest),
        [b'0', rest @ ..] if !rest.is_empty() => (8, rest),
        rest => (10, rest),
    };

    let mut value: i64 = 0;
    let mut overflow: Option<f64> = None;
    for &c in body {
        let Some(digit) = (c as char).to_digit(radix) else {
            // Invalid octal digits stop the literal.
            break;
        };
        match overflow.as_mut() {
            Some(float) => *float = *float * radix as f64 + digit as f64,
            None => match value
                .checked_mul(radix as i64)
                .and_then(|v| v.checked_add(digit as i64))
            {
                Some(next) => value = next,
                None => overflow = Some(value as f64 * radix as f64 + digit as f64),
            },
        }
    }

    match overflow {
        Some(float) => Err(float),
        None => Ok(value),
    }
}

pub(super) fn parse_float_literal(text: &[u8]) -> f64 {
    let cleaned: String = text
        .iter()
        .filter(|&&c| c != b'_')
        .map(|&c| c as char)
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

/// Decodes a non-interpolated string token: single or double quoted,
/// heredoc or nowdoc.
pub(super) fn unquote_string(raw: &[u8]) -> String {
    let raw = match raw {
        [b'b' | b'B', rest @ ..] if matches!(rest.first(), Some(b'\'' | b'"' | b'<')) => rest,
        _ => raw,
    };

    let bytes = match raw.first() {
        Some(b'\'') => unescape_single(inner(raw)),
        Some(b'"') => unescape_double(inner(raw), true),
        Some(b'<') => decode_heredoc(raw),
        _ => raw.to_vec(),
    };
    String::from_utf8_lossy(&bytes).into_owned()
}

fn inner(raw: &[u8]) -> &[u8] {
    if raw.len() >= 2 {
        &raw[1..raw.len() - 1]
    } else {
        &[]
    }
}

fn unescape_single(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        if body[i] == b'\\' && matches!(body.get(i + 1), Some(b'\\' | b'\'')) {
            out.push(body[i + 1]);
            i += 2;
        } else {
            out.push(body[i]);
            i += 1;
        }
    }
    out
}

fn unescape_double(body: &[u8], quoted: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        let c = body[i];
        if c != b'\\' || i + 1 >= body.len() {
            out.push(c);
            i += 1;
            continue;
        }

        let next = body[i + 1];
        i += 2;
        match next {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'v' => out.push(0x0b),
            b'e' => out.push(0x1b),
            b'f' => out.push(0x0c),
            b'\\' => out.push(b'\\'),
            b'$' => out.push(b'$'),
            b'"' if quoted => out.push(b'"'),
            b'0'..=b'7' => {
                let mut value = (next - b'0') as u32;
                let mut taken = 1;
                while taken < 3 && matches!(body.get(i), Some(b'0'..=b'7')) {
                    value = value * 8 + (body[i] - b'0') as u32;
                    i += 1;
                    taken += 1;
                }
                out.push((value & 0xff) as u8);
            }
            b'x' if body.get(i).is_some_and(u8::is_ascii_hexdigit) => {
                let mut value = 0u32;
                let mut taken = 0;
                while taken < 2 && body.get(i).is_some_and(u8::is_ascii_hexdigit) {
                    value = value * 16 + (body[i] as char).to_digit(16).unwrap_or(0);
                    i += 1;
                    taken += 1;
                }
                out.push(value as u8);
            }
            b'u' if body.get(i) == Some(&b'{') => {
                let close = body[i..].iter().position(|&b| b == b'}');
                let decoded = close.and_then(|end| {
                    let hex = std::str::from_utf8(&body[i + 1..i + end]).ok()?;
                    let ch = char::from_u32(u32::from_str_radix(hex, 16).ok()?)?;
                    Some((ch, end))
                });
                match decoded {
                    Some((ch, end)) => {
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                        i += end + 1;
                    }
                    None => out.extend_from_slice(b"\\u"),
                }
            }
            other => {
                out.push(b'\\');
                out.push(other);
            }
        }
    }
    out
}

fn decode_heredoc(raw: &[u8]) -> Vec<u8> {
    let header_end = match raw.iter().position(|&b| b == b'\n') {
        Some(pos) => pos,
        None => return Vec::new(),
    };
    let header = &raw[..header_end];
    let is_nowdoc = header.contains(&b'\'');

    let last_newline = raw.iter().rposition(|&b| b == b'\n').unwrap_or(header_end);
    let closing = &raw[last_newline + 1..];
    let indent = closing
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count();

    if last_newline <= header_end {
        return Vec::new();
    }
    let mut body = &raw[header_end + 1..last_newline];
    if body.last() == Some(&b'\r') {
        body = &body[..body.len() - 1];
    }

    let mut dedented = Vec::with_capacity(body.len());
    for (index, line) in body.split(|&b| b == b'\n').enumerate() {
        if index > 0 {
            dedented.push(b'\n');
        }
        let strip = line
            .iter()
            .take(indent)
            .take_while(|&&b| b == b' ' || b == b'\t')
            .count();
        dedented.extend_from_slice(&line[strip..]);
    }

    if is_nowdoc {
        dedented
    } else {
        unescape_double(&dedented, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_literals() {
        assert_eq!(parse_int_literal(b"42"), Ok(42));
        assert_eq!(parse_int_literal(b"0x1F"), Ok(31));
        assert_eq!(parse_int_literal(b"0b101"), Ok(5));
        assert_eq!(parse_int_literal(b"0o17"), Ok(15));
        assert_eq!(parse_int_literal(b"017"), Ok(15));
        assert_eq!(parse_int_literal(b"1_000_000"), Ok(1_000_000));
        assert_eq!(parse_int_literal(b"0"), Ok(0));
        assert!(parse_int_literal(b"9223372036854775808").is_err());
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(unquote_string(br"'it\'s \n'"), "it's \\n");
        assert_eq!(unquote_string(br#""a\tb\x41\101\u{1F600}""#), "a\tbAA\u{1F600}");
        assert_eq!(unquote_string(br#""\q""#), "\\q");
    }

    #[test]
    fn test_heredoc_and_nowdoc() {
        assert_eq!(
            unquote_string(b"<<<EOT\n    one\\t\n      two\n    EOT"),
            "one\t\n  two"
        );
        assert_eq!(unquote_string(b"<<<'EOT'\nraw\\t\nEOT"), "raw\\t");
        assert_eq!(unquote_string(b"<<<EOT\nEOT"), "");
    }
}
