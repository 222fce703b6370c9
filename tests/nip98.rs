use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use http::{method::Method, Request};
use lazy_static::lazy_static;
use nostr::{Event, EventBuilder, Keys, Kind, Tag, Timestamp};
use nostr_http_auth::{
    nip98_validate_request, service_for_resolver_fn, AuthenticationError, AuthenticatorOptions,
    Nip98AuthenticatorResponse, ResolveIdentityRequest, ResolveIdentityResponse,
};
use serde_json::json;
use tower::BoxError;

const TEST_CREATED_AT: u64 = 1_700_000_000;
const TEST_URL: &str = "https://api.example.com/v1/items";
const TEST_PATH: &str = "/v1/items";

lazy_static! {
    static ref TEST_TIMESTAMP: DateTime<Utc> =
        DateTime::<Utc>::from_timestamp(TEST_CREATED_AT as i64, 0).unwrap();
}

macro_rules! expect_err {
    ($result:expr, $variant:ident, $message:expr, $status:expr) => {
        match $result {
            Ok(_) => panic!("Expected Err({}); got Ok", stringify!($variant)),
            Err(e) => match e {
                AuthenticationError::$variant(_) => {
                    assert_eq!(e.to_string(), $message);
                    assert_eq!(e.http_status(), $status);
                }
                _ => panic!("Expected {}; got {:?}: {}", stringify!($variant), e, e),
            },
        }
    };
}

fn nip98_tags(url: &str, method: &str) -> Vec<Tag> {
    vec![Tag::parse(["url", url]).unwrap(), Tag::parse(["method", method]).unwrap()]
}

fn sign_event(keys: &Keys, kind: Kind, tags: Vec<Tag>, created_at: u64) -> Event {
    EventBuilder::new(kind, "")
        .tags(tags)
        .custom_created_at(Timestamp::from(created_at))
        .sign_with_keys(keys)
        .expect("failed to sign test event")
}

fn auth_header(event: &Event) -> String {
    format!("Nostr {}", STANDARD.encode(serde_json::to_string(event).unwrap()))
}

fn request_for(path: &str, method: Method, header: Option<&str>) -> Request<()> {
    let mut builder = Request::builder().method(method).uri(format!("https://api.example.com{}", path));
    if let Some(header) = header {
        builder = builder.header("authorization", header);
    }
    builder.body(()).unwrap()
}

/// Resolver used by most tests: accepts the verified public key and supplies no user record.
async fn resolve_default(request: ResolveIdentityRequest) -> Result<ResolveIdentityResponse, BoxError> {
    match request {
        ResolveIdentityRequest::Identity(_) => Ok(ResolveIdentityResponse::default()),
        ResolveIdentityRequest::Request(_) => {
            Err("expected the verified public key, not the request context".into())
        }
        _ => unreachable!(),
    }
}

async fn run(request: Request<()>) -> Result<Nip98AuthenticatorResponse, AuthenticationError> {
    run_at(request, *TEST_TIMESTAMP).await
}

async fn run_at(
    request: Request<()>,
    server_timestamp: DateTime<Utc>,
) -> Result<Nip98AuthenticatorResponse, AuthenticationError> {
    let mut resolver = service_for_resolver_fn(resolve_default);
    nip98_validate_request(request, &mut resolver, server_timestamp, AuthenticatorOptions::default())
        .await
        .map(|(_, _, response)| response)
}

#[tokio::test]
async fn test_round_trip() {
    // A freshly signed event bound to the request, checked against the real clock with the
    // default tolerance.
    let keys = Keys::generate();
    let now = Utc::now();
    let event = sign_event(&keys, Kind::HttpAuth, nip98_tags(TEST_URL, "GET"), now.timestamp() as u64);
    let request = request_for(TEST_PATH, Method::GET, Some(&auth_header(&event)));

    let response = run_at(request, now).await.unwrap();
    assert_eq!(response.pubkey(), keys.public_key());
    assert!(response.user().is_none());
}

#[tokio::test]
async fn test_missing_authorization_header() {
    let request = request_for(TEST_PATH, Method::GET, None);
    expect_err!(run(request).await, MissingAuthorizationHeader, "Missing Authorization header", 401);
}

#[tokio::test]
async fn test_invalid_authorization_scheme() {
    for header in ["Bearer abcdef", "nostr abcdef", "Basic dXNlcjpwYXNz"] {
        let request = request_for(TEST_PATH, Method::GET, Some(header));
        expect_err!(run(request).await, InvalidAuthorizationScheme, "Invalid authorization scheme", 400);
    }
}

#[tokio::test]
async fn test_malformed_token() {
    let empty = "Nostr ".to_string();
    let not_base64 = "Nostr !!!not-base64!!!".to_string();
    let not_json_shaped = format!("Nostr {}", STANDARD.encode("hello world"));
    for header in [empty, not_base64, not_json_shaped] {
        let request = request_for(TEST_PATH, Method::GET, Some(&header));
        expect_err!(run(request).await, MalformedToken, "Malformed token", 400);
    }
}

#[tokio::test]
async fn test_invalid_json_format() {
    // JSON-shaped but unparsable, and valid JSON that is not an event record.
    for payload in ["{this is not json", r#"{"pubkey": 42}"#] {
        let header = format!("Nostr {}", STANDARD.encode(payload));
        let request = request_for(TEST_PATH, Method::GET, Some(&header));
        expect_err!(run(request).await, InvalidJsonFormat, "Invalid JSON format", 400);
    }
}

#[tokio::test]
async fn test_invalid_event_signature() {
    let keys = Keys::generate();
    let event = sign_event(&keys, Kind::HttpAuth, nip98_tags(TEST_URL, "GET"), TEST_CREATED_AT);

    // Re-tag the signed event without re-signing; the event hash no longer matches.
    let mut tampered = serde_json::to_value(&event).unwrap();
    tampered["tags"] = json!([["url", TEST_URL], ["method", "DELETE"]]);
    let header = format!("Nostr {}", STANDARD.encode(tampered.to_string()));

    let request = request_for(TEST_PATH, Method::GET, Some(&header));
    expect_err!(run(request).await, InvalidEventSignature, "Invalid Nostr event signature", 401);
}

#[tokio::test]
async fn test_wrong_event_kind() {
    let keys = Keys::generate();
    let event = sign_event(&keys, Kind::TextNote, nip98_tags(TEST_URL, "GET"), TEST_CREATED_AT);
    let request = request_for(TEST_PATH, Method::GET, Some(&auth_header(&event)));
    expect_err!(run(request).await, WrongEventKind, "Invalid Nostr event, wrong kind", 401);
}

#[tokio::test]
async fn test_timestamp_window() {
    let keys = Keys::generate();
    let event = sign_event(&keys, Kind::HttpAuth, nip98_tags(TEST_URL, "GET"), TEST_CREATED_AT);
    let header = auth_header(&event);
    let tolerance = Duration::milliseconds(300_000);

    // Exactly on the boundary, in both directions, is accepted.
    run_at(request_for(TEST_PATH, Method::GET, Some(&header)), *TEST_TIMESTAMP + tolerance).await.unwrap();
    run_at(request_for(TEST_PATH, Method::GET, Some(&header)), *TEST_TIMESTAMP - tolerance).await.unwrap();

    // One millisecond past the boundary is rejected, in both directions.
    let result = run_at(
        request_for(TEST_PATH, Method::GET, Some(&header)),
        *TEST_TIMESTAMP + tolerance + Duration::milliseconds(1),
    )
    .await;
    expect_err!(result, TimestampOutOfRange, "Invalid Nostr event, timestamp out of range", 401);

    let result = run_at(
        request_for(TEST_PATH, Method::GET, Some(&header)),
        *TEST_TIMESTAMP - tolerance - Duration::milliseconds(1),
    )
    .await;
    expect_err!(result, TimestampOutOfRange, "Invalid Nostr event, timestamp out of range", 401);
}

#[tokio::test]
async fn test_url_path_binding_is_exact() {
    let keys = Keys::generate();
    let event = sign_event(&keys, Kind::HttpAuth, nip98_tags(TEST_URL, "GET"), TEST_CREATED_AT);
    let header = auth_header(&event);

    // No trailing-slash normalization in either direction.
    let request = request_for("/v1/items/", Method::GET, Some(&header));
    expect_err!(run(request).await, UrlTagMismatch, "URL tag does not match request path", 401);

    let event = sign_event(
        &keys,
        Kind::HttpAuth,
        nip98_tags("https://api.example.com/v1/items/", "GET"),
        TEST_CREATED_AT,
    );
    let request = request_for(TEST_PATH, Method::GET, Some(&auth_header(&event)));
    expect_err!(run(request).await, UrlTagMismatch, "URL tag does not match request path", 401);
}

#[tokio::test]
async fn test_malformed_url_tag() {
    let keys = Keys::generate();

    // A relative URL is not accepted.
    let event = sign_event(&keys, Kind::HttpAuth, nip98_tags("/v1/items", "GET"), TEST_CREATED_AT);
    let request = request_for(TEST_PATH, Method::GET, Some(&auth_header(&event)));
    expect_err!(run(request).await, MalformedUrlTag, "Malformed URL tag", 400);

    // Absence of the url tag fails the same rule.
    let event = sign_event(
        &keys,
        Kind::HttpAuth,
        vec![Tag::parse(["method", "GET"]).unwrap()],
        TEST_CREATED_AT,
    );
    let request = request_for(TEST_PATH, Method::GET, Some(&auth_header(&event)));
    expect_err!(run(request).await, MalformedUrlTag, "Malformed URL tag", 400);
}

#[tokio::test]
async fn test_method_binding() {
    let keys = Keys::generate();

    // The comparison is case-insensitive.
    let event = sign_event(&keys, Kind::HttpAuth, nip98_tags(TEST_URL, "post"), TEST_CREATED_AT);
    let request = request_for(TEST_PATH, Method::POST, Some(&auth_header(&event)));
    run(request).await.unwrap();

    let event = sign_event(&keys, Kind::HttpAuth, nip98_tags(TEST_URL, "POST"), TEST_CREATED_AT);
    let request = request_for(TEST_PATH, Method::GET, Some(&auth_header(&event)));
    expect_err!(run(request).await, MethodTagMismatch, "Method tag does not match request method", 401);

    // Absence of the method tag fails the same rule.
    let event = sign_event(
        &keys,
        Kind::HttpAuth,
        vec![Tag::parse(["url", TEST_URL]).unwrap()],
        TEST_CREATED_AT,
    );
    let request = request_for(TEST_PATH, Method::GET, Some(&auth_header(&event)));
    expect_err!(run(request).await, MethodTagMismatch, "Method tag does not match request method", 401);
}

#[tokio::test]
async fn test_resolver_receives_pubkey() {
    async fn resolve(request: ResolveIdentityRequest) -> Result<ResolveIdentityResponse, BoxError> {
        let pubkey = request.pubkey().ok_or("expected the verified public key")?;
        Ok(ResolveIdentityResponse::builder().user(json!({ "pubkey": pubkey.to_string() })).build()?)
    }

    let keys = Keys::generate();
    let event = sign_event(&keys, Kind::HttpAuth, nip98_tags(TEST_URL, "GET"), TEST_CREATED_AT);
    let request = request_for(TEST_PATH, Method::GET, Some(&auth_header(&event)));

    let mut resolver = service_for_resolver_fn(resolve);
    let (_, _, response) =
        nip98_validate_request(request, &mut resolver, *TEST_TIMESTAMP, AuthenticatorOptions::default())
            .await
            .unwrap();
    assert_eq!(response.pubkey(), keys.public_key());
    assert_eq!(response.user().unwrap()["pubkey"], keys.public_key().to_string());
}

#[tokio::test]
async fn test_resolver_receives_request_context() {
    async fn resolve(request: ResolveIdentityRequest) -> Result<ResolveIdentityResponse, BoxError> {
        let context = request.context().ok_or("expected the request context")?;
        Ok(ResolveIdentityResponse::builder()
            .user(json!({ "path": context.path(), "method": context.method().as_str() }))
            .build()?)
    }

    let keys = Keys::generate();
    let event = sign_event(&keys, Kind::HttpAuth, nip98_tags(TEST_URL, "GET"), TEST_CREATED_AT);
    let request = request_for(TEST_PATH, Method::GET, Some(&auth_header(&event)));

    let mut resolver = service_for_resolver_fn(resolve);
    let (_, _, response) = nip98_validate_request(
        request,
        &mut resolver,
        *TEST_TIMESTAMP,
        AuthenticatorOptions::with_request_context(),
    )
    .await
    .unwrap();
    assert_eq!(response.user().unwrap()["path"], "/v1/items");
    assert_eq!(response.user().unwrap()["method"], "GET");
}

#[tokio::test]
async fn test_resolver_fault() {
    async fn resolve(_: ResolveIdentityRequest) -> Result<ResolveIdentityResponse, BoxError> {
        Err("user store unavailable".into())
    }

    let keys = Keys::generate();
    let event = sign_event(&keys, Kind::HttpAuth, nip98_tags(TEST_URL, "GET"), TEST_CREATED_AT);
    let request = request_for(TEST_PATH, Method::GET, Some(&auth_header(&event)));

    let mut resolver = service_for_resolver_fn(resolve);
    let e = nip98_validate_request(request, &mut resolver, *TEST_TIMESTAMP, AuthenticatorOptions::default())
        .await
        .unwrap_err();

    // A resolver fault is not a rejection; it surfaces as a 500-class internal error.
    match e {
        AuthenticationError::InternalServiceError(ref cause) => {
            assert_eq!(format!("{}", cause), "user store unavailable");
            assert_eq!(e.error_code(), "InternalFailure");
            assert_eq!(e.http_status(), 500);
        }
        other => panic!("Unexpected error: {:?}", other),
    }
}
