/// HTTP response status code.
///
/// A newtype rather than a closed enum: the business handler may signal any
/// status code, and the writer must pass it through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpStatus(u16);

impl HttpStatus {
    pub const CONTINUE: HttpStatus = HttpStatus(100);

    pub const OK: HttpStatus = HttpStatus(200);

    pub const BAD_REQUEST: HttpStatus = HttpStatus(400);
    pub const UNAUTHORIZED: HttpStatus = HttpStatus(401);
    pub const NOT_FOUND: HttpStatus = HttpStatus(404);
    pub const PAYLOAD_TOO_LARGE: HttpStatus = HttpStatus(413);

    pub const INTERNAL_SERVER_ERROR: HttpStatus = HttpStatus(500);

    /// Builds a status from a raw code; codes outside 100..=999 are not
    /// representable on a status line.
    pub fn from_u16(code: u16) -> Option<HttpStatus> {
        (100..1000).contains(&code).then_some(HttpStatus(code))
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn reason(&self) -> &'static str {
        match self.0 {
            100 => "Continue",
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            413 => "Payload Too Large",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            503 => "Service Unavailable",
            _ => "",
        }
    }
}

impl std::fmt::Display for HttpStatus {
    /// Formats as `<code> <reason>`, e.g. `400 Bad Request`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_reason() {
        assert_eq!(HttpStatus::BAD_REQUEST.to_string(), "400 Bad Request");
        assert_eq!(HttpStatus::from_u16(418).map(|s| s.as_u16()), Some(418));
    }

    #[test]
    fn rejects_codes_outside_status_line_range() {
        assert!(HttpStatus::from_u16(99).is_none());
        assert!(HttpStatus::from_u16(1000).is_none());
    }
}
