// Error normalization
//
// Maps every failure shape of the request pipeline into one display
// contract: a headline message, remediation hints, and field errors.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Error;

pub const UNHANDLED_ERROR_MESSAGE: &str = "Something went wrong";
pub const UNHANDLED_ERROR_LISTS: [&str; 2] = [
    "Try refreshing the page.",
    "If it keeps happening, contact support for help.",
];
pub const NOT_FOUND_MESSAGE: &str = "Data Not Found";

/// Display-ready view of an [`Error`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lists: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ErrorReport {
    /// The generic report used for faults the user cannot act on.
    pub fn unhandled() -> Self {
        Self {
            message: Some(UNHANDLED_ERROR_MESSAGE.to_owned()),
            lists: UNHANDLED_ERROR_LISTS.iter().map(|s| (*s).to_owned()).collect(),
            errors: BTreeMap::new(),
        }
    }

    /// Errors for a single form field, empty if none.
    pub fn field(&self, name: &str) -> &[String] {
        self.errors.get(name).map_or(&[], Vec::as_slice)
    }
}

impl From<&Error> for ErrorReport {
    fn from(err: &Error) -> Self {
        match err {
            Error::Http { status: 404, .. } => Self {
                message: Some(NOT_FOUND_MESSAGE.to_owned()),
                ..Self::default()
            },
            Error::Http { status: 500, .. } => Self::unhandled(),
            Error::Http { body, .. } => Self {
                message: body.message.clone(),
                lists: Vec::new(),
                errors: body.errors.clone().unwrap_or_default(),
            },
            // Transport failures that still carry a status came from
            // `error_for_status`; everything else never got a response.
            Error::Transport(e) => match e.status().map(|s| s.as_u16()) {
                Some(404) => Self {
                    message: Some(NOT_FOUND_MESSAGE.to_owned()),
                    ..Self::default()
                },
                _ => Self::unhandled(),
            },
            Error::Unauthorized
            | Error::RefreshFailed { .. }
            | Error::InvalidUrl(_)
            | Error::Tls(_)
            | Error::Cancelled
            | Error::Deserialization { .. }
            | Error::Encoding(_) => Self::unhandled(),
        }
    }
}

impl From<Error> for ErrorReport {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ApiErrorBody;

    fn http(status: u16, message: &str, errors: &[(&str, &[&str])]) -> Error {
        Error::Http {
            status,
            body: ApiErrorBody {
                message: Some(message.to_owned()),
                errors: Some(
                    errors
                        .iter()
                        .map(|(k, v)| {
                            ((*k).to_owned(), v.iter().map(|s| (*s).to_owned()).collect())
                        })
                        .collect(),
                ),
            },
        }
    }

    #[test]
    fn not_found_drops_server_details() {
        let report = ErrorReport::from(&http(404, "bank 12 missing", &[("id", &["bad"])]));
        assert_eq!(report.message.as_deref(), Some("Data Not Found"));
        assert!(report.lists.is_empty());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn server_fault_is_generic() {
        let report = ErrorReport::from(&http(500, "stack trace here", &[]));
        assert_eq!(report.message.as_deref(), Some(UNHANDLED_ERROR_MESSAGE));
        assert_eq!(
            report.lists,
            vec![
                "Try refreshing the page.".to_owned(),
                "If it keeps happening, contact support for help.".to_owned(),
            ]
        );
    }

    #[test]
    fn only_500_is_generic() {
        let report = ErrorReport::from(&http(503, "Maintenance window", &[]));
        assert_eq!(report.message.as_deref(), Some("Maintenance window"));
        assert!(report.lists.is_empty());

        let report = ErrorReport::from(&http(401, "Account locked", &[("otp", &["expired"])]));
        assert_eq!(report.message.as_deref(), Some("Account locked"));
        assert_eq!(report.field("otp"), &["expired".to_owned()]);
    }

    #[test]
    fn validation_errors_pass_through() {
        let report = ErrorReport::from(&http(
            422,
            "Unprocessable Entity",
            &[("name", &["name is required", "name must be unique"])],
        ));
        assert_eq!(report.message.as_deref(), Some("Unprocessable Entity"));
        assert_eq!(
            report.field("name"),
            &["name is required".to_owned(), "name must be unique".to_owned()]
        );
        assert!(report.field("code").is_empty());
    }

    #[test]
    fn cancellation_and_decoding_are_generic() {
        for err in [
            Error::Cancelled,
            Error::Deserialization {
                message: "eof".into(),
                body: String::new(),
            },
        ] {
            assert_eq!(ErrorReport::from(&err), ErrorReport::unhandled());
        }
    }
}
