//! HTTP Basic authentication gate.
//!
//! The gate only answers yes or no: a missing header, another scheme, bad
//! base64, a payload that is not UTF-8 or lacks a colon are all rejections.

use base64::{Engine as _, engine::general_purpose};

/// Expected credentials, read-only for the life of the process.
#[derive(Debug, Clone)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Parses an `Authorization` value into its `username:password` pair.
/// The split happens at the first colon, so passwords may contain colons.
pub fn parse_basic(header: &str) -> Option<(String, String)> {
    let (scheme, payload) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = general_purpose::STANDARD.decode(payload.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

pub fn check_basic_auth(header: Option<&str>, expected: &Credentials<'_>) -> bool {
    let Some((username, password)) = header.and_then(parse_basic) else {
        return false;
    };

    // both comparisons always run
    constant_time_eq(username.as_bytes(), expected.username.as_bytes())
        & constant_time_eq(password.as_bytes(), expected.password.as_bytes())
}

/// Byte comparison whose running time depends only on the lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EXPECTED: Credentials<'static> = Credentials {
        username: "admin",
        password: "s3cr:et",
    };

    fn basic(pair: &str) -> String {
        format!("Basic {}", general_purpose::STANDARD.encode(pair))
    }

    #[test]
    fn accepts_exact_credentials() {
        assert!(check_basic_auth(Some(&basic("admin:s3cr:et")), &EXPECTED));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let header = basic("admin:s3cr:et").replacen("Basic", "bAsIc", 1);
        assert!(check_basic_auth(Some(&header), &EXPECTED));
    }

    #[rstest]
    #[case::username_char("admim:s3cr:et")]
    #[case::password_char("admin:s3cr:eT")]
    #[case::password_truncated("admin:s3cr:e")]
    #[case::password_extended("admin:s3cr:et!")]
    #[case::no_colon("admins3cret")]
    #[case::empty("")]
    fn rejects_mismatched_credentials(#[case] pair: &str) {
        assert!(!check_basic_auth(Some(&basic(pair)), &EXPECTED));
    }

    #[rstest]
    #[case::absent(None)]
    #[case::bearer(Some("Bearer YWRtaW46czNjcjpldA=="))]
    #[case::no_payload(Some("Basic"))]
    #[case::bad_base64(Some("Basic !!!not-base64!!!"))]
    #[case::not_utf8(Some("Basic //79"))]
    fn rejects_unusable_headers(#[case] header: Option<&str>) {
        assert!(!check_basic_auth(header, &EXPECTED));
    }

    #[test]
    fn password_keeps_everything_after_first_colon() {
        assert_eq!(
            parse_basic(&basic("u:p:q")),
            Some(("u".to_string(), "p:q".to_string()))
        );
    }
}
