// Status codes shared by all outcomes

use serde::Serialize;

/// A logical status: a stable numeric code plus a short name and description.
///
/// Codes are grouped by range so adapters can map them without knowing every
/// individual code:
/// - 200xxx : successes ( immediate or deferred )
/// - 400xxx : invalid requests, denied access
/// - 500xxx : expected and unexpected errors
/// - 600xxx : interactive / metadata responses ( help, exit )
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Status {
    pub code: i32,
    pub name: &'static str,
    pub desc: &'static str,
}

impl Status {
    pub const fn new(name: &'static str, code: i32, desc: &'static str) -> Self {
        Self { code, name, desc }
    }

    pub fn is_success(&self) -> bool {
        self.code < 400_000
    }
}

pub const SUCCESS: Status = Status::new("SUCCESS", 200_001, "Success");
pub const PENDING: Status = Status::new("PENDING", 200_008, "Pending");

pub const IGNORED: Status = Status::new("IGNORED", 400_001, "Ignored");
pub const BAD_REQUEST: Status = Status::new("BAD_REQUEST", 400_002, "Bad Request");
pub const INVALID: Status = Status::new("INVALID", 400_003, "Invalid");
pub const NOT_FOUND: Status = Status::new("NOT_FOUND", 400_004, "Not found");
pub const DENIED: Status = Status::new("DENIED", 400_005, "Denied");
pub const UNAUTHENTICATED: Status = Status::new("UNAUTHENTICATED", 400_009, "Unauthenticated");
pub const UNAUTHORIZED: Status = Status::new("UNAUTHORIZED", 400_010, "Unauthorized");

pub const ERRORED: Status = Status::new("ERRORED", 500_007, "Errored");
pub const UNEXPECTED: Status = Status::new("UNEXPECTED", 500_008, "Unexpected");

pub const HELP: Status = Status::new("HELP", 600_003, "Help");
pub const EXIT: Status = Status::new("EXIT", 600_002, "Exiting");

/// Converts a status to a compatible HTTP status code for web adapters.
pub fn to_http(status: &Status) -> u16 {
    to_http_code(status.code)
}

/// Same mapping from the raw numeric code.
pub fn to_http_code(code: i32) -> u16 {
    match code {
        c if c == HELP.code || c == EXIT.code => 200,
        c if c == PENDING.code => 202,
        c if c == NOT_FOUND.code => 404,
        c if c == DENIED.code => 401,
        c if c == UNAUTHENTICATED.code => 401,
        c if c == UNAUTHORIZED.code => 401,
        c if c == IGNORED.code => 400,
        c if c == BAD_REQUEST.code => 400,
        c if c == INVALID.code => 400,
        c if c == ERRORED.code => 500,
        c if c == UNEXPECTED.code => 500,
        c if c < 400_000 => 200,
        c if c < 500_000 => 400,
        _ => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_grouping() {
        assert!(SUCCESS.is_success());
        assert!(PENDING.is_success());
        assert!(!INVALID.is_success());
        assert!(!UNEXPECTED.is_success());
    }

    #[test]
    fn test_http_mapping() {
        assert_eq!(to_http(&SUCCESS), 200);
        assert_eq!(to_http(&PENDING), 202);
        assert_eq!(to_http(&DENIED), 401);
        assert_eq!(to_http(&INVALID), 400);
        assert_eq!(to_http(&NOT_FOUND), 404);
        assert_eq!(to_http(&ERRORED), 500);
        assert_eq!(to_http(&HELP), 200);
    }
}
