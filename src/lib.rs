//! The `nostr_http_auth` crate provides server-side _verification_ of Nostr
//! [NIP-98](https://github.com/nostr-protocol/nips/blob/master/98.md)-style HTTP authorization
//! tokens. This *is not* the library you want if you just want to call services that use NIP-98
//! authorization; client-side header construction is a few lines with the
//! [`nostr`](https://docs.rs/nostr/) crate's `EventBuilder`.
//!
//! The token is a signed kind-27235 Nostr event, base64-encoded and carried in the
//! `Authorization` header under the `Nostr` scheme:
//!
//! ```text
//! Authorization: Nostr <base64(JSON-event)>
//! ```
//!
//! The event's `url` and `method` tags bind it to a single request, and its `created_at`
//! timestamp bounds how long the token stays usable. Verification runs a fixed sequence of
//! rules (envelope decoding, signature verification, kind, freshness, URL-path binding,
//! method binding) and stops at the first failure with a stable message string and an HTTP
//! status code of 400 or 401. Issuing tokens, key custody, and network calls are all out of
//! scope: this library only validates an already-received signed object against the request
//! and a clock.
//!
//! # Workflow
//! The typical workflow is:
//! 1. Receive an HTTP [`Request`][http::request::Request] from your server stack.
//! 2. Supply an identity resolver: a [`tower::Service`] that maps a verified public key (or
//!    the request context) to your application's user record. [`service_for_resolver_fn`]
//!    wraps a plain async function.
//! 3. Call [`nip98_validate_request`]. On success you get the request back along with the
//!    verified public key and the resolver's user record; on failure you get an
//!    [`AuthenticationError`] with the HTTP status to respond with.
//!
//! ## Example
//! ```rust
//! use base64::{engine::general_purpose::STANDARD, Engine as _};
//! use chrono::Utc;
//! use http::Request;
//! use nostr::{EventBuilder, Keys, Kind, Tag};
//! use nostr_http_auth::{
//!     nip98_validate_request, service_for_resolver_fn, AuthenticatorOptions,
//!     ResolveIdentityRequest, ResolveIdentityResponse,
//! };
//! use tower::BoxError;
//!
//! async fn resolve(request: ResolveIdentityRequest) -> Result<ResolveIdentityResponse, BoxError> {
//!     // Look the public key up in your user store here. Returning the default response makes
//!     // the verified public key itself the identity payload.
//!     Ok(ResolveIdentityResponse::default())
//! }
//!
//! # tokio_test::block_on(async {
//! // A client would construct this header; shown here to make the example self-contained.
//! let keys = Keys::generate();
//! let event = EventBuilder::new(Kind::HttpAuth, "")
//!     .tags([
//!         Tag::parse(["url", "https://api.example.com/v1/items"]).unwrap(),
//!         Tag::parse(["method", "GET"]).unwrap(),
//!     ])
//!     .sign_with_keys(&keys)
//!     .unwrap();
//! let token = STANDARD.encode(serde_json::to_string(&event).unwrap());
//!
//! let request = Request::builder()
//!     .method("GET")
//!     .uri("https://api.example.com/v1/items")
//!     .header("authorization", format!("Nostr {}", token))
//!     .body(())
//!     .unwrap();
//!
//! let mut resolver = service_for_resolver_fn(resolve);
//! let (_parts, _body, response) =
//!     nip98_validate_request(request, &mut resolver, Utc::now(), AuthenticatorOptions::default())
//!         .await
//!         .unwrap();
//! assert_eq!(response.pubkey(), keys.public_key());
//! # });
//! ```

pub mod auth;
mod constants;
pub mod envelope;
mod error;
mod nip98;
pub mod resolver;

pub use crate::{
    auth::{Nip98AuthenticatorResponse, Nip98AuthenticatorResponseBuilder},
    error::AuthenticationError,
    nip98::{nip98_validate_request, AuthenticatorOptions},
    resolver::{
        service_for_resolver_fn, RequestContext, RequestContextBuilder, ResolveIdentityRequest,
        ResolveIdentityResponse, ResolveIdentityResponseBuilder,
    },
};
