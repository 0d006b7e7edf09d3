/// Percent-encode a string for use inside a mailto: URL.
/// Everything outside the unreserved set is escaped, byte by byte.
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{:02X}", byte));
            }
        }
    }
    out
}

/// Normalize an image URL from the upstream: trim surrounding whitespace,
/// drop it entirely when nothing is left.
pub fn clean_image_url(url: Option<String>) -> Option<String> {
    let url = url?;
    let trimmed = url.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == url.len() {
        Some(url)
    } else {
        Some(trimmed.to_string())
    }
}

/// Loose mail-address check: non-empty local part, a single '@', and a
/// domain with an interior dot. Deliverability is the mail client's problem.
pub fn looks_like_address(address: &str) -> bool {
    let address = address.trim();
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || address.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.split_once('.') {
        Some((head, tail)) => !head.is_empty() && !tail.is_empty() && !tail.ends_with('.'),
        None => false,
    }
}
