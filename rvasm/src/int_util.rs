/// Parses an integer literal with C-style base auto-detection: `0x`/`0X`
/// prefixes hexadecimal, a leading `0` octal, everything else decimal. A
/// sign may precede the prefix. Trailing garbage fails the parse rather
/// than truncating.
pub(crate) fn parse_int(text: &str) -> Option<i128> {
    let (negative, rest) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, digits) = if rest.starts_with("0x") || rest.starts_with("0X") {
        (16, &rest[2..])
    } else if rest.len() > 1 && rest.starts_with('0') {
        (8, &rest[1..])
    } else {
        (10, rest)
    };

    if digits.is_empty() {
        return None;
    }

    let value = i128::from_str_radix(digits, radix).ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod test {
    use super::parse_int;

    #[test]
    fn radix_autodetection() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("-42"), Some(-42));
        assert_eq!(parse_int("0x2A"), Some(42));
        assert_eq!(parse_int("-0x2A"), Some(-42));
        assert_eq!(parse_int("052"), Some(42));
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int("+7"), Some(7));
    }

    #[test]
    fn rejects_junk() {
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("x1"), None);
        assert_eq!(parse_int("12ab"), None);
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("-"), None);
        assert_eq!(parse_int("0b11"), None);
    }

    #[test]
    fn full_dword_range() {
        assert_eq!(
            parse_int("0xFFFFFFFFFFFFFFFF"),
            Some(0xFFFF_FFFF_FFFF_FFFF)
        );
        assert_eq!(parse_int("18446744073709551615"), Some(u64::MAX as i128));
    }
}
