// Tagged result type for every pipeline stage and for whole calls

use crate::error::Errors;
use crate::status::{self, Status};
use serde_json::Value;

/// Result type returned by targets and by the engine as a whole.
pub type ApiResult = Outcome<Value>;

/// The uniform, tagged result of a pipeline stage or a full call.
///
/// Exactly one variant is active. Success variants carry a value; failure
/// variants carry one or more errors with a non-empty description. Expected
/// failure categories ( denied / invalid / ignored / errored ) are values,
/// never panics; `Unexpected` is reserved for anything that escaped the
/// normal flow.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Succeeded(T),
    Pending(T),
    Denied(Errors),
    Invalid(Errors),
    Ignored(Errors),
    Errored(Errors),
    Unexpected(Errors),
}

impl<T> Outcome<T> {
    pub fn success(value: T) -> Self {
        Outcome::Succeeded(value)
    }

    pub fn pending(value: T) -> Self {
        Outcome::Pending(value)
    }

    pub fn denied(message: &str) -> Self {
        Outcome::Denied(Errors::of(message))
    }

    pub fn invalid(message: &str) -> Self {
        Outcome::Invalid(Errors::of(message))
    }

    pub fn ignored(message: &str) -> Self {
        Outcome::Ignored(Errors::of(message))
    }

    pub fn errored(message: &str) -> Self {
        Outcome::Errored(Errors::of(message))
    }

    pub fn unexpected(message: &str) -> Self {
        Outcome::Unexpected(Errors::of(message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded(_) | Outcome::Pending(_))
    }

    /// The status classification for this outcome.
    pub fn status(&self) -> Status {
        match self {
            Outcome::Succeeded(_) => status::SUCCESS,
            Outcome::Pending(_) => status::PENDING,
            Outcome::Denied(_) => status::DENIED,
            Outcome::Invalid(_) => status::INVALID,
            Outcome::Ignored(_) => status::IGNORED,
            Outcome::Errored(_) => status::ERRORED,
            Outcome::Unexpected(_) => status::UNEXPECTED,
        }
    }

    /// Human readable description: the error message on failures,
    /// the status description on successes.
    pub fn message(&self) -> String {
        match self.errors() {
            Some(errs) => errs.message.clone(),
            None => self.status().desc.to_string(),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Succeeded(v) | Outcome::Pending(v) => Some(v),
            _ => None,
        }
    }

    pub fn errors(&self) -> Option<&Errors> {
        match self {
            Outcome::Succeeded(_) | Outcome::Pending(_) => None,
            Outcome::Denied(e)
            | Outcome::Invalid(e)
            | Outcome::Ignored(e)
            | Outcome::Errored(e)
            | Outcome::Unexpected(e) => Some(e),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Succeeded(v) => Outcome::Succeeded(f(v)),
            Outcome::Pending(v) => Outcome::Pending(f(v)),
            Outcome::Denied(e) => Outcome::Denied(e),
            Outcome::Invalid(e) => Outcome::Invalid(e),
            Outcome::Ignored(e) => Outcome::Ignored(e),
            Outcome::Errored(e) => Outcome::Errored(e),
            Outcome::Unexpected(e) => Outcome::Unexpected(e),
        }
    }

    pub fn and_then<U, F: FnOnce(T) -> Outcome<U>>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Succeeded(v) | Outcome::Pending(v) => f(v),
            Outcome::Denied(e) => Outcome::Denied(e),
            Outcome::Invalid(e) => Outcome::Invalid(e),
            Outcome::Ignored(e) => Outcome::Ignored(e),
            Outcome::Errored(e) => Outcome::Errored(e),
            Outcome::Unexpected(e) => Outcome::Unexpected(e),
        }
    }

    /// Re-tags a failure onto another value type.
    /// Successes become `Unexpected` since there is no value to carry over.
    pub fn retag<U>(self) -> Outcome<U> {
        match self {
            Outcome::Succeeded(_) | Outcome::Pending(_) => {
                Outcome::Unexpected(Errors::of("retag applied to a success outcome"))
            }
            Outcome::Denied(e) => Outcome::Denied(e),
            Outcome::Invalid(e) => Outcome::Invalid(e),
            Outcome::Ignored(e) => Outcome::Ignored(e),
            Outcome::Errored(e) => Outcome::Errored(e),
            Outcome::Unexpected(e) => Outcome::Unexpected(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrItem;

    #[test]
    fn test_status_per_variant() {
        assert_eq!(Outcome::success(1).status().code, status::SUCCESS.code);
        assert_eq!(Outcome::<i32>::denied("no").status().code, status::DENIED.code);
        assert_eq!(Outcome::<i32>::invalid("bad").status().code, status::INVALID.code);
        assert_eq!(Outcome::<i32>::errored("err").status().code, status::ERRORED.code);
        assert_eq!(
            Outcome::<i32>::unexpected("boom").status().code,
            status::UNEXPECTED.code
        );
    }

    #[test]
    fn test_failure_carries_description() {
        let out: Outcome<i32> = Outcome::invalid("missing inputs");
        assert_eq!(out.message(), "missing inputs");
        assert!(!out.is_success());
    }

    #[test]
    fn test_map_preserves_failure() {
        let out: Outcome<i32> = Outcome::denied("nope");
        let mapped: Outcome<String> = out.map(|v| v.to_string());
        assert_eq!(mapped.status().code, status::DENIED.code);
    }

    #[test]
    fn test_and_then_chains_success() {
        let out = Outcome::success(2).and_then(|v| Outcome::success(v * 2));
        assert_eq!(out.value(), Some(&4));
    }

    #[test]
    fn test_errors_accessor() {
        let out: Outcome<i32> = Outcome::Invalid(Errors::list(
            vec![ErrItem::on("code", "", "Missing")],
            "Invalid request",
        ));
        assert_eq!(out.errors().unwrap().items.len(), 1);
    }
}
