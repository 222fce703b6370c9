use {
    crate::constants::*,
    http::status::StatusCode,
    std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
    },
};

/// Error returned when an attempt at validating a NIP-98 authorization token fails.
///
/// Apart from [`InternalServiceError`][Self::InternalServiceError], every variant is an expected
/// rejection: the normal negative outcome of one of the validation rules, carrying a stable
/// message string and an HTTP status of 400 (the client sent something malformed) or 401 (the
/// credential does not authenticate this request). `InternalServiceError` is different in kind:
/// it wraps a fault raised by the caller-supplied identity resolver and maps to a 500-class
/// response.
#[derive(Debug)]
#[non_exhaustive]
pub enum AuthenticationError {
    /// Validation failed due to a fault in the identity resolver, not a bad credential.
    InternalServiceError(Box<dyn Error + Send + Sync>),

    /// The `Authorization` header does not start with the `Nostr ` scheme prefix. The scheme
    /// match is case-sensitive.
    InvalidAuthorizationScheme(/* message */ String),

    /// The decoded token could not be parsed as a Nostr event record.
    InvalidJsonFormat(/* message */ String),

    /// The event's signature did not verify against its own hash and declared public key.
    InvalidEventSignature(/* message */ String),

    /// The token was not decodable base64, or the decoded text was empty or did not start
    /// with `{`.
    MalformedToken(/* message */ String),

    /// The event's first `url` tag was absent or its value did not parse as an absolute URL.
    MalformedUrlTag(/* message */ String),

    /// The event's first `method` tag was absent or did not equal the request method
    /// (case-insensitive).
    MethodTagMismatch(/* message */ String),

    /// The request has no `Authorization` header.
    MissingAuthorizationHeader(/* message */ String),

    /// The event's `created_at` timestamp is outside the allowed window around the server
    /// timestamp.
    TimestampOutOfRange(/* message */ String),

    /// The path of the URL in the event's `url` tag does not exactly equal the request path.
    UrlTagMismatch(/* message */ String),

    /// The event's `kind` is not the HTTP-auth kind (27235).
    WrongEventKind(/* message */ String),
}

impl AuthenticationError {
    /// A stable machine-readable token identifying the failed validation rule.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InternalServiceError(_) => ERR_CODE_INTERNAL_FAILURE,
            Self::InvalidAuthorizationScheme(_) => ERR_CODE_INVALID_AUTHORIZATION_SCHEME,
            Self::InvalidEventSignature(_) => ERR_CODE_INVALID_EVENT_SIGNATURE,
            Self::InvalidJsonFormat(_) => ERR_CODE_INVALID_JSON_FORMAT,
            Self::MalformedToken(_) => ERR_CODE_MALFORMED_TOKEN,
            Self::MalformedUrlTag(_) => ERR_CODE_MALFORMED_URL_TAG,
            Self::MethodTagMismatch(_) => ERR_CODE_METHOD_TAG_MISMATCH,
            Self::MissingAuthorizationHeader(_) => ERR_CODE_MISSING_AUTHORIZATION_HEADER,
            Self::TimestampOutOfRange(_) => ERR_CODE_TIMESTAMP_OUT_OF_RANGE,
            Self::UrlTagMismatch(_) => ERR_CODE_URL_TAG_MISMATCH,
            Self::WrongEventKind(_) => ERR_CODE_WRONG_EVENT_KIND,
        }
    }

    /// The HTTP status code to respond with for this error.
    ///
    /// Format problems with the credential itself are 400s; a well-formed credential that fails
    /// to authenticate the request is a 401; resolver faults are 500s.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidAuthorizationScheme(_)
            | Self::InvalidJsonFormat(_)
            | Self::MalformedToken(_)
            | Self::MalformedUrlTag(_) => StatusCode::BAD_REQUEST,
            Self::InternalServiceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl Display for AuthenticationError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::InternalServiceError(ref e) => Display::fmt(e, f),
            Self::InvalidAuthorizationScheme(msg) => f.write_str(msg),
            Self::InvalidEventSignature(msg) => f.write_str(msg),
            Self::InvalidJsonFormat(msg) => f.write_str(msg),
            Self::MalformedToken(msg) => f.write_str(msg),
            Self::MalformedUrlTag(msg) => f.write_str(msg),
            Self::MethodTagMismatch(msg) => f.write_str(msg),
            Self::MissingAuthorizationHeader(msg) => f.write_str(msg),
            Self::TimestampOutOfRange(msg) => f.write_str(msg),
            Self::UrlTagMismatch(msg) => f.write_str(msg),
            Self::WrongEventKind(msg) => f.write_str(msg),
        }
    }
}

impl Error for AuthenticationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InternalServiceError(ref e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<Box<dyn Error + Send + Sync>> for AuthenticationError {
    fn from(e: Box<dyn Error + Send + Sync>) -> AuthenticationError {
        match e.downcast::<AuthenticationError>() {
            Ok(auth_err) => *auth_err,
            Err(e) => AuthenticationError::InternalServiceError(e),
        }
    }
}
