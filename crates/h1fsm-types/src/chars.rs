//! Byte classification predicates.
//!
//! Every predicate is a pure, total function over `u8`. The URL table is a
//! 256-bit bitmap built at compile time; bit `c & 7` of byte `c >> 3` is set
//! when `c` may appear inside a request-target component.

/// Bitmap of bytes allowed in a request-target path, query or fragment.
///
/// Printable ASCII (`0x21..=0x7E`) except `#` and `?`, which delimit the
/// fragment and query. Control bytes, space, DEL and all bytes `>= 0x80`
/// are excluded, so raw UTF-8 in a target is rejected.
pub static URL_CHARS: [u8; 32] = build_url_chars();

const fn build_url_chars() -> [u8; 32] {
    let mut table = [0u8; 32];
    let mut c: usize = 0x21;
    while c < 0x7f {
        if c != b'#' as usize && c != b'?' as usize {
            table[c >> 3] |= 1 << (c & 7);
        }
        c += 1;
    }
    table
}

/// Returns true for `0-9`.
#[inline]
#[must_use]
pub const fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

/// Returns true for `0-9`, `A-F` and `a-f`.
#[inline]
#[must_use]
pub const fn is_hex_digit(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

/// Returns true for `A-Z` and `a-z`.
#[inline]
#[must_use]
pub const fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

/// Returns true for letters and digits.
#[inline]
#[must_use]
pub const fn is_alnum(c: u8) -> bool {
    is_alpha(c) || is_digit(c)
}

/// Returns true for bytes allowed in a host name: alnum, `-` or `.`.
#[inline]
#[must_use]
pub const fn is_host_char(c: u8) -> bool {
    is_alnum(c) || c == b'-' || c == b'.'
}

/// Returns true when [`URL_CHARS`] marks `c`.
#[inline]
#[must_use]
pub const fn is_url_char(c: u8) -> bool {
    URL_CHARS[(c >> 3) as usize] & (1 << (c & 7)) != 0
}

/// Returns true for RFC 7230 `tchar`, the alphabet of header names.
#[inline]
#[must_use]
pub const fn is_token_char(c: u8) -> bool {
    matches!(
        c,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`'
            | b'|' | b'~' | b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z'
    )
}

/// Numeric value of a decimal digit.
#[inline]
#[must_use]
pub const fn dec_value(c: u8) -> Option<u8> {
    if is_digit(c) { Some(c - b'0') } else { None }
}

/// Numeric value of a hexadecimal digit.
#[inline]
#[must_use]
pub const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
