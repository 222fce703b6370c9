//! Top-level request validation.

use {
    crate::{
        auth::{Nip98Authenticator, Nip98AuthenticatorResponse},
        constants::DEFAULT_TIME_TOLERANCE_MS,
        AuthenticationError, RequestContext, ResolveIdentityRequest, ResolveIdentityResponse,
    },
    chrono::{DateTime, Utc},
    http::request::{Parts, Request},
    log::trace,
    std::future::Future,
    tower::{BoxError, Service},
};

/// Options that can be used to configure the validation behavior.
#[derive(Clone, Copy, Debug)]
pub struct AuthenticatorOptions {
    /// Hand the resolver the full request context instead of the verified public key.
    pub pass_request_to_resolver: bool,

    /// Allowed distance between the event timestamp and the server timestamp, in milliseconds.
    pub time_tolerance_ms: i64,
}

impl AuthenticatorOptions {
    /// Create an `AuthenticatorOptions` for resolvers that want the full request context.
    ///
    /// This sets `pass_request_to_resolver` to `true` and keeps the default time tolerance of
    /// 5 minutes.
    pub const fn with_request_context() -> Self {
        Self {
            pass_request_to_resolver: true,
            time_tolerance_ms: DEFAULT_TIME_TOLERANCE_MS,
        }
    }
}

impl Default for AuthenticatorOptions {
    fn default() -> Self {
        Self {
            pass_request_to_resolver: false,
            time_tolerance_ms: DEFAULT_TIME_TOLERANCE_MS,
        }
    }
}

/// Validate a NIP-98-authorized HTTP request.
///
/// This takes in an HTTP [`Request`] along with the caller-supplied identity resolver. If the
/// validation is successful (i.e. the request carries a fresh, validly signed event bound to
/// this path and method), this returns:
/// * The request headers (as HTTP [`Parts`]).
/// * The request body, untouched; this scheme signs no payload, so the body is never read.
/// * The [response from the authenticator][Nip98AuthenticatorResponse], which contains the
///   verified public key and the resolver-supplied user record, if any.
///
/// # Parameters
/// * `request` - The HTTP [`Request`] to validate.
/// * `resolver` - A service that maps the verified identity (or the request context, depending
///   on `options`) to an application user record.
/// * `server_timestamp` - The timestamp of the server when the request was received. Usually
///   this is the current time, `Utc::now()`.
/// * `options` - [`AuthenticatorOptions`] that affect the behavior of the validation. For most
///   services, use `AuthenticatorOptions::default()`.
///
/// # Errors
/// This function returns an [`AuthenticationError`] if the authorization envelope is malformed
/// or the event does not authenticate the request. Validation rules run in a fixed order and
/// the first failing rule determines the error; use
/// [`http_status()`][AuthenticationError::http_status] to map it onto a response. Note that the
/// validation waits for exactly one resolver completion; wrapping a slow resolver in a timeout
/// is the caller's responsibility.
pub async fn nip98_validate_request<B, G, F>(
    request: Request<B>,
    resolver: &mut G,
    server_timestamp: DateTime<Utc>,
    options: AuthenticatorOptions,
) -> Result<(Parts, B, Nip98AuthenticatorResponse), AuthenticationError>
where
    G: Service<ResolveIdentityRequest, Response = ResolveIdentityResponse, Error = BoxError, Future = F> + Send,
    F: Future<Output = Result<ResolveIdentityResponse, BoxError>> + Send,
{
    let (parts, body) = request.into_parts();
    let authenticator = Nip98Authenticator::from_request_parts(&parts)?;
    trace!("Created authenticator: {:?}", authenticator);
    let context = RequestContext::from(&parts);
    let response = authenticator.validate(&context, resolver, server_timestamp, options).await?;

    Ok((parts, body, response))
}
