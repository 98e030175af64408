//! Cookie header parsing and rendering.
//!
//! The engine never sets cookie lifetimes; expiry stays with the browser.
//! The jar is parsed once from the `Cookie` header shape (`a=1; b=2`) and
//! written back the same way by the embedding shell.

/// Name-value cookie map preserving insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<(String, String)>,
}

impl CookieJar {
    /// Parse a cookie header. Pairs without a name or value are dropped;
    /// a later duplicate name overwrites the earlier one.
    pub fn parse(header: &str) -> Self {
        let mut jar = Self::default();
        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() || value.is_empty() {
                continue;
            }
            jar.set(name, percent_decode(value));
        }
        jar
    }

    /// Cookie value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(cookie, _)| cookie == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set a cookie, replacing any existing value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.cookies.iter_mut().find(|(cookie, _)| *cookie == name) {
            Some(slot) => slot.1 = value,
            None => self.cookies.push((name, value)),
        }
    }

    /// Render the jar back into header form, percent-encoding values.
    pub fn header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={}", percent_encode(value)))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Whether the jar holds no cookies.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// Decode `%XX` escapes; malformed escapes pass through untouched.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] == b'%'
            && pos + 3 <= bytes.len()
            && bytes[pos + 1].is_ascii_hexdigit()
            && bytes[pos + 2].is_ascii_hexdigit()
        {
            if let Ok(byte) = u8::from_str_radix(&input[pos + 1..pos + 3], 16) {
                out.push(byte);
                pos += 3;
                continue;
            }
        }
        out.push(bytes[pos]);
        pos += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Encode everything outside the unreserved set, like encodeURIComponent.
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        let keep = byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~' | b'!' | b'*' | b'\'' | b'(' | b')');
        if keep {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{CookieJar, percent_decode, percent_encode};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_header_and_decodes_values() {
        let jar = CookieJar::parse("meetway_email=a%40b.example; other=1;; broken");
        assert_eq!(jar.get("meetway_email"), Some("a@b.example"));
        assert_eq!(jar.get("other"), Some("1"));
        assert_eq!(jar.get("broken"), None);
    }

    #[test]
    fn later_duplicates_win() {
        let jar = CookieJar::parse("name=first; name=second");
        assert_eq!(jar.get("name"), Some("second"));
    }

    #[test]
    fn header_round_trips_special_characters() {
        let mut jar = CookieJar::default();
        jar.set("meetway_name", "Ana Söder & co");
        let reparsed = CookieJar::parse(&jar.header());
        assert_eq!(reparsed, jar);
    }

    #[test]
    fn malformed_escapes_pass_through() {
        assert_eq!(percent_decode("50%"), "50%");
        assert_eq!(percent_decode("a%2"), "a%2");
        assert_eq!(percent_decode("a%zzb"), "a%zzb");
    }

    #[test]
    fn encode_covers_utf8() {
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("é"), "%C3%A9");
    }
}
