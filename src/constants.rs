//! Common constants used throughout the crate.
//!
//! This helps ensure the entire crate is on the same page about these constant values. If a value
//! is spelled incorrectly, at least it can be fixed in one spot.
//!
//! Tests that are testing the content of an error code or message should not use these constants;
//! they should use hard-coded strings so the tests are also testing for misspellings.
//!
//! Please keep this file organized alphabetically.

/// Default allowed distance between the event timestamp and the server timestamp, in
/// milliseconds (5 minutes).
pub(crate) const DEFAULT_TIME_TOLERANCE_MS: i64 = 300_000;

/// Error code: InternalFailure
pub(crate) const ERR_CODE_INTERNAL_FAILURE: &str = "InternalFailure";

/// Error code: InvalidAuthorizationScheme
pub(crate) const ERR_CODE_INVALID_AUTHORIZATION_SCHEME: &str = "InvalidAuthorizationScheme";

/// Error code: InvalidEventSignature
pub(crate) const ERR_CODE_INVALID_EVENT_SIGNATURE: &str = "InvalidEventSignature";

/// Error code: InvalidJsonFormat
pub(crate) const ERR_CODE_INVALID_JSON_FORMAT: &str = "InvalidJsonFormat";

/// Error code: MalformedToken
pub(crate) const ERR_CODE_MALFORMED_TOKEN: &str = "MalformedToken";

/// Error code: MalformedUrlTag
pub(crate) const ERR_CODE_MALFORMED_URL_TAG: &str = "MalformedUrlTag";

/// Error code: MethodTagMismatch
pub(crate) const ERR_CODE_METHOD_TAG_MISMATCH: &str = "MethodTagMismatch";

/// Error code: MissingAuthorizationHeader
pub(crate) const ERR_CODE_MISSING_AUTHORIZATION_HEADER: &str = "MissingAuthorizationHeader";

/// Error code: TimestampOutOfRange
pub(crate) const ERR_CODE_TIMESTAMP_OUT_OF_RANGE: &str = "TimestampOutOfRange";

/// Error code: UrlTagMismatch
pub(crate) const ERR_CODE_URL_TAG_MISMATCH: &str = "UrlTagMismatch";

/// Error code: WrongEventKind
pub(crate) const ERR_CODE_WRONG_EVENT_KIND: &str = "WrongEventKind";

/// Error message: `"Invalid authorization scheme"`
pub(crate) const MSG_INVALID_AUTHORIZATION_SCHEME: &str = "Invalid authorization scheme";

/// Error message: `"Invalid Nostr event signature"`
pub(crate) const MSG_INVALID_EVENT_SIGNATURE: &str = "Invalid Nostr event signature";

/// Error message: `"Invalid JSON format"`
pub(crate) const MSG_INVALID_JSON_FORMAT: &str = "Invalid JSON format";

/// Error message: `"Malformed token"`
pub(crate) const MSG_MALFORMED_TOKEN: &str = "Malformed token";

/// Error message: `"Malformed URL tag"`
pub(crate) const MSG_MALFORMED_URL_TAG: &str = "Malformed URL tag";

/// Error message: `"Method tag does not match request method"`
pub(crate) const MSG_METHOD_TAG_MISMATCH: &str = "Method tag does not match request method";

/// Error message: `"Missing Authorization header"`
pub(crate) const MSG_MISSING_AUTHORIZATION_HEADER: &str = "Missing Authorization header";

/// Error message: `"Invalid Nostr event, timestamp out of range"`
pub(crate) const MSG_TIMESTAMP_OUT_OF_RANGE: &str = "Invalid Nostr event, timestamp out of range";

/// Error message: `"URL tag does not match request path"`
pub(crate) const MSG_URL_TAG_MISMATCH: &str = "URL tag does not match request path";

/// Error message: `"Invalid Nostr event, wrong kind"`
pub(crate) const MSG_WRONG_EVENT_KIND: &str = "Invalid Nostr event, wrong kind";

/// The `Authorization` scheme name for this authentication method, followed by the single space
/// separating it from the token. The match is case-sensitive.
pub(crate) const SCHEME_PREFIX: &str = "Nostr ";

/// Name of the event tag carrying the HTTP method the event was signed for.
pub(crate) const TAG_METHOD: &str = "method";

/// Name of the event tag carrying the absolute URL the event was signed for.
pub(crate) const TAG_URL: &str = "url";
