//! The identity-resolution seam.
//!
//! After an authorization event has passed every validation rule, the verified public key (or
//! the full request context) is handed to a caller-supplied resolver service that maps it to an
//! application-level user record. The resolver is the only extension point of the crate and the
//! only place application logic runs during validation.

use {
    derive_builder::Builder,
    http::{header::HeaderMap, method::Method, request::Parts},
    nostr::PublicKey,
    serde_json::Value,
    std::future::Future,
    tower::{service_fn, util::ServiceFn, BoxError},
};

/// An immutable snapshot of the parts of an HTTP request that identity resolvers may consult.
///
/// RequestContext structs are immutable. Use [`RequestContextBuilder`] to programmatically
/// construct a context.
#[derive(Builder, Clone, Debug)]
pub struct RequestContext {
    /// The HTTP method of the request.
    method: Method,

    /// The path component of the request URI.
    #[builder(setter(into))]
    path: String,

    /// The headers of the request.
    #[builder(setter(into), default)]
    headers: HeaderMap,
}

impl RequestContext {
    /// Create a [RequestContextBuilder] to construct a [RequestContext].
    #[inline]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Retrieve the HTTP method of the request.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Retrieve the path component of the request URI.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Retrieve the headers of the request.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl From<&Parts> for RequestContext {
    fn from(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            headers: parts.headers.clone(),
        }
    }
}

/// The input handed to the identity resolver.
///
/// Which variant the resolver receives is selected by configuration
/// ([`pass_request_to_resolver`][crate::AuthenticatorOptions::pass_request_to_resolver]) when
/// validation is invoked, not by inspecting the resolver at runtime. A resolver that only
/// supports one variant should return an error for the other.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum ResolveIdentityRequest {
    /// Resolve the application user from the verified public key asserted by the event.
    Identity(PublicKey),

    /// Resolve the application user from the full request context.
    Request(RequestContext),
}

impl ResolveIdentityRequest {
    /// Retrieve the verified public key, if this is an identity request.
    #[inline]
    pub fn pubkey(&self) -> Option<PublicKey> {
        match self {
            Self::Identity(pubkey) => Some(*pubkey),
            _ => None,
        }
    }

    /// Retrieve the request context, if this is a request-context request.
    #[inline]
    pub fn context(&self) -> Option<&RequestContext> {
        match self {
            Self::Request(context) => Some(context),
            _ => None,
        }
    }
}

/// A response from the identity resolver.
///
/// ResolveIdentityResponse structs are immutable. Use [ResolveIdentityResponseBuilder] to
/// programmatically construct a response. The default response carries no user record; the
/// verified public key alone then serves as the identity payload.
#[derive(Builder, Clone, Debug, Default)]
pub struct ResolveIdentityResponse {
    /// The application user record for the verified identity, if the application supplies one.
    #[builder(setter(into, strip_option), default)]
    user: Option<Value>,
}

impl ResolveIdentityResponse {
    /// Create a [ResolveIdentityResponseBuilder] to construct a [ResolveIdentityResponse].
    #[inline]
    pub fn builder() -> ResolveIdentityResponseBuilder {
        ResolveIdentityResponseBuilder::default()
    }

    /// Retrieve the application user record, if any.
    #[inline]
    pub fn user(&self) -> Option<&Value> {
        self.user.as_ref()
    }

    /// Consume the response, yielding the application user record, if any.
    #[inline]
    pub(crate) fn into_user(self) -> Option<Value> {
        self.user
    }
}

/// Create a Service that wraps a function that can resolve an identity.
pub fn service_for_resolver_fn<F, Fut>(f: F) -> ServiceFn<F>
where
    F: FnOnce(ResolveIdentityRequest) -> Fut + Send + 'static,
    Fut: Future<Output = Result<ResolveIdentityResponse, BoxError>> + Send + 'static,
{
    service_fn(f)
}
