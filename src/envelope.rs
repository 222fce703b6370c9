//! Authorization-envelope extraction.
//!
//! This turns the raw `Authorization` header of an HTTP request into the signed Nostr event it
//! carries: scheme check, base64 decode, a cheap shape pre-check on the decoded text, and the
//! structured event decode.
//!
//! **Stability of this module is not guaranteed except for items exposed at the crate root**.
//! The functions and types are subject to change in minor/patch versions. This is exposed for
//! testing purposes only.

use {
    crate::{constants::*, AuthenticationError},
    base64::{engine::general_purpose::STANDARD, Engine as _},
    http::{header::AUTHORIZATION, request::Parts},
    log::{debug, trace},
    nostr::Event,
    qualifier_attr::qualifiers,
};

/// Extract the authorization token from the request headers.
///
/// The `Authorization` header must be present and start with the exact `Nostr ` scheme prefix;
/// the token is the remainder of the header value, trimmed of surrounding whitespace. Header
/// bytes are interpreted leniently; bytes that are not valid UTF-8 cannot occur in a valid
/// token and fail the downstream base64 decode instead.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn authorization_token(parts: &Parts) -> Result<String, AuthenticationError> {
    let header = match parts.headers.get(AUTHORIZATION) {
        Some(header) => header,
        None => {
            trace!("authorization_token: no authorization header present");
            return Err(AuthenticationError::MissingAuthorizationHeader(
                MSG_MISSING_AUTHORIZATION_HEADER.to_string(),
            ));
        }
    };

    let value = String::from_utf8_lossy(header.as_bytes());
    match value.strip_prefix(SCHEME_PREFIX) {
        Some(token) => Ok(token.trim().to_string()),
        None => {
            trace!("authorization_token: authorization header does not use the Nostr scheme");
            Err(AuthenticationError::InvalidAuthorizationScheme(
                MSG_INVALID_AUTHORIZATION_SCHEME.to_string(),
            ))
        }
    }
}

/// Base64-decode the token into the JSON text of the event.
///
/// The decoded text must be non-empty and start with `{`. Base64 decode failures are folded into
/// the same rejection as a bad shape; there is deliberately no distinct "invalid base64" error.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn decode_envelope_text(token: &str) -> Result<String, AuthenticationError> {
    let decoded = match STANDARD.decode(token) {
        Ok(decoded) => decoded,
        Err(e) => {
            trace!("decode_envelope_text: token is not decodable base64: {}", e);
            return Err(AuthenticationError::MalformedToken(MSG_MALFORMED_TOKEN.to_string()));
        }
    };

    let text = String::from_utf8_lossy(&decoded).into_owned();
    if text.is_empty() || !text.starts_with('{') {
        trace!("decode_envelope_text: decoded text is empty or does not start with '{{'");
        return Err(AuthenticationError::MalformedToken(MSG_MALFORMED_TOKEN.to_string()));
    }

    Ok(text)
}

/// Parse the decoded envelope text as a signed Nostr event record.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn parse_event(text: &str) -> Result<Event, AuthenticationError> {
    serde_json::from_str(text).map_err(|e| {
        debug!("parse_event: decoded envelope did not parse as an event: {}", e);
        AuthenticationError::InvalidJsonFormat(MSG_INVALID_JSON_FORMAT.to_string())
    })
}

/// Extract and decode the signed event from the request's `Authorization` header.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn decode_envelope(parts: &Parts) -> Result<Event, AuthenticationError> {
    let token = authorization_token(parts)?;
    let text = decode_envelope_text(&token)?;
    parse_event(&text)
}
