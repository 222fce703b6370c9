//! NIP-98 HTTP authorization verification routines.
//!
//! This implements server-side validation of the Nostr
//! [NIP-98](https://github.com/nostr-protocol/nips/blob/master/98.md)-style HTTP authorization
//! scheme: a signed kind-27235 event, carried base64-encoded in the `Authorization` header,
//! binding the request's URL path and method.
//!
//! **Stability of this module is not guaranteed except for items exposed at the crate root**.
//! The functions and types are subject to change in minor/patch versions. This is exposed for
//! testing purposes only.

use {
    crate::{
        constants::*, envelope::decode_envelope, AuthenticationError, AuthenticatorOptions, RequestContext,
        ResolveIdentityRequest, ResolveIdentityResponse,
    },
    chrono::{DateTime, Duration, Utc},
    derive_builder::Builder,
    http::{method::Method, request::Parts},
    log::{debug, trace},
    nostr::{Event, Kind, PublicKey},
    qualifier_attr::qualifiers,
    serde_json::Value,
    std::future::Future,
    tower::{BoxError, Service, ServiceExt},
    url::Url,
};

/// Low-level structure for validating a NIP-98 authorization event after it has been decoded
/// from the request.
///
/// The wrapped event is immutable input to the validation rules; the authenticator holds no
/// other state.
#[derive(Clone, Debug)]
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
struct Nip98Authenticator {
    /// The signed event decoded from the `Authorization` header.
    event: Event,
}

impl Nip98Authenticator {
    /// Create an authenticator from the `Authorization` header of the given request parts.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn from_request_parts(parts: &Parts) -> Result<Self, AuthenticationError> {
        let event = decode_envelope(parts)?;
        Ok(Self {
            event,
        })
    }

    /// Retrieve the signed event being validated.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn event(&self) -> &Event {
        &self.event
    }

    /// Verify the event's signature against its own hash and declared public key.
    ///
    /// All cryptographic failures (bad signature, bad hash, malformed key material) are treated
    /// uniformly as a single rejection.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn verify_signature(&self) -> Result<(), AuthenticationError> {
        self.event.verify().map_err(|e| {
            debug!("verify_signature: event verification failed: {}", e);
            AuthenticationError::InvalidEventSignature(MSG_INVALID_EVENT_SIGNATURE.to_string())
        })
    }

    /// Verify the event's kind and timestamp make sense for this scheme and the specified server
    /// timestamp.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn prevalidate(
        &self,
        server_timestamp: DateTime<Utc>,
        allowed_mismatch: Duration,
    ) -> Result<(), AuthenticationError> {
        // 27235 is the reserved HTTP-auth kind.
        if self.event.kind != Kind::HttpAuth {
            trace!("prevalidate: event kind {} is not the HTTP-auth kind", self.event.kind.as_u16());
            return Err(AuthenticationError::WrongEventKind(MSG_WRONG_EVENT_KIND.to_string()));
        }

        let event_ts = match DateTime::<Utc>::from_timestamp(self.event.created_at.as_u64() as i64, 0) {
            Some(event_ts) => event_ts,
            None => {
                trace!("prevalidate: event timestamp {} is not representable", self.event.created_at);
                return Err(AuthenticationError::TimestampOutOfRange(MSG_TIMESTAMP_OUT_OF_RANGE.to_string()));
            }
        };
        let min_ts = server_timestamp.checked_sub_signed(allowed_mismatch).unwrap_or(server_timestamp);
        let max_ts = server_timestamp.checked_add_signed(allowed_mismatch).unwrap_or(server_timestamp);

        // Clock-behind and clock-ahead events are rejected symmetrically; the window is
        // inclusive on both edges.
        if event_ts < min_ts {
            trace!("prevalidate: event timestamp {} is before minimum timestamp {}", event_ts, min_ts);
            return Err(AuthenticationError::TimestampOutOfRange(MSG_TIMESTAMP_OUT_OF_RANGE.to_string()));
        }

        if event_ts > max_ts {
            trace!("prevalidate: event timestamp {} is after maximum timestamp {}", event_ts, max_ts);
            return Err(AuthenticationError::TimestampOutOfRange(MSG_TIMESTAMP_OUT_OF_RANGE.to_string()));
        }

        Ok(())
    }

    /// Retrieve the value of the first tag-row whose name equals `name`.
    ///
    /// Later tag-rows with the same name are ignored. A tag-row that has a name but no value
    /// yields an empty string, which is distinct from the tag being absent.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn first_tag_value(&self, name: &str) -> Option<&str> {
        self.event.tags.iter().find_map(|tag| {
            let fields = tag.as_slice();
            match fields.first() {
                Some(tag_name) if tag_name.as_str() == name => {
                    Some(fields.get(1).map(String::as_str).unwrap_or(""))
                }
                _ => None,
            }
        })
    }

    /// Verify the event's `url` and `method` tags bind it to the incoming request.
    ///
    /// The URL tag must parse as an absolute URL whose path equals the request path exactly; no
    /// trailing-slash or percent-encoding normalization is applied. The method tag is compared
    /// case-insensitively.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn validate_binding(&self, path: &str, method: &Method) -> Result<(), AuthenticationError> {
        let url = match self.first_tag_value(TAG_URL) {
            Some(value) => Url::parse(value).map_err(|e| {
                trace!("validate_binding: url tag {:?} did not parse: {}", value, e);
                AuthenticationError::MalformedUrlTag(MSG_MALFORMED_URL_TAG.to_string())
            })?,
            None => {
                trace!("validate_binding: no url tag present");
                return Err(AuthenticationError::MalformedUrlTag(MSG_MALFORMED_URL_TAG.to_string()));
            }
        };

        if url.path() != path {
            trace!("validate_binding: url tag path {:?} does not match request path {:?}", url.path(), path);
            return Err(AuthenticationError::UrlTagMismatch(MSG_URL_TAG_MISMATCH.to_string()));
        }

        match self.first_tag_value(TAG_METHOD) {
            Some(value) if value.eq_ignore_ascii_case(method.as_str()) => Ok(()),
            other => {
                trace!("validate_binding: method tag {:?} does not match request method {}", other, method);
                Err(AuthenticationError::MethodTagMismatch(MSG_METHOD_TAG_MISMATCH.to_string()))
            }
        }
    }

    /// Invoke the caller-supplied identity resolver for this event.
    ///
    /// The resolver receives the verified public key, or the request context when
    /// `pass_request_to_resolver` is set. A resolver error that downcasts to
    /// [`AuthenticationError`] is surfaced as-is; any other error is wrapped as an internal
    /// service error.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    async fn resolve_identity<S, F>(
        &self,
        context: &RequestContext,
        options: AuthenticatorOptions,
        resolver: &mut S,
    ) -> Result<ResolveIdentityResponse, AuthenticationError>
    where
        S: Service<ResolveIdentityRequest, Response = ResolveIdentityResponse, Error = BoxError, Future = F> + Send,
        F: Future<Output = Result<ResolveIdentityResponse, BoxError>> + Send,
    {
        let request = if options.pass_request_to_resolver {
            ResolveIdentityRequest::Request(context.clone())
        } else {
            ResolveIdentityRequest::Identity(self.event.pubkey)
        };

        match resolver.oneshot(request).await {
            Ok(response) => {
                trace!("resolve_identity: resolver accepted the identity");
                Ok(response)
            }
            Err(e) => {
                debug!("resolve_identity: resolver returned an error: {}", e);
                match e.downcast::<AuthenticationError>() {
                    Ok(auth_err) => Err(*auth_err),
                    Err(e) => Err(AuthenticationError::InternalServiceError(e)),
                }
            }
        }
    }

    /// Run the full validation sequence for this event against the given request context.
    ///
    /// The rules run in a fixed order (signature, kind, timestamp, URL binding, method
    /// binding, identity resolution) and the first failing rule determines the error.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    pub async fn validate<S, F>(
        &self,
        context: &RequestContext,
        resolver: &mut S,
        server_timestamp: DateTime<Utc>,
        options: AuthenticatorOptions,
    ) -> Result<Nip98AuthenticatorResponse, AuthenticationError>
    where
        S: Service<ResolveIdentityRequest, Response = ResolveIdentityResponse, Error = BoxError, Future = F> + Send,
        F: Future<Output = Result<ResolveIdentityResponse, BoxError>> + Send,
    {
        self.verify_signature()?;
        self.prevalidate(server_timestamp, Duration::milliseconds(options.time_tolerance_ms))?;
        self.validate_binding(context.path(), context.method())?;
        let response = self.resolve_identity(context, options, resolver).await?;

        Ok(Nip98AuthenticatorResponse {
            pubkey: self.event.pubkey,
            user: response.into_user(),
        })
    }
}

/// Upon successful validation, this is returned to convey the verified identity and, when the
/// resolver supplied one, the application user record.
///
/// Nip98AuthenticatorResponse structs are immutable. Use [Nip98AuthenticatorResponseBuilder] to
/// construct a new response.
#[derive(Builder, Clone, Debug)]
pub struct Nip98AuthenticatorResponse {
    /// The verified public key asserted by the event.
    pubkey: PublicKey,

    /// The application user record supplied by the identity resolver, if any.
    #[builder(setter(into, strip_option), default)]
    user: Option<Value>,
}

impl Nip98AuthenticatorResponse {
    /// Create a [Nip98AuthenticatorResponseBuilder] to construct a [Nip98AuthenticatorResponse].
    #[inline]
    pub fn builder() -> Nip98AuthenticatorResponseBuilder {
        Nip98AuthenticatorResponseBuilder::default()
    }

    /// Retrieve the verified public key asserted by the event.
    #[inline]
    pub fn pubkey(&self) -> PublicKey {
        self.pubkey
    }

    /// Retrieve the application user record supplied by the identity resolver, if any.
    #[inline]
    pub fn user(&self) -> Option<&Value> {
        self.user.as_ref()
    }
}
