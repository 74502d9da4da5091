#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vaultdesk_api::{
    ApiClient, Error, ErrorReport, Identity, ListQuery, Page, Resource, SearchSlot,
    SessionCoordinator, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ApiClient::new(base_url, &TransportConfig::default()).unwrap();
    (server, client)
}

fn identity_json(username: &str) -> Value {
    json!({
        "_id": "u1",
        "username": username,
        "name": "Analyst",
        "role": { "_id": "r1", "name": "admin", "permissions": ["banks:read", "banks:module"] }
    })
}

fn signed_in(client: ApiClient) -> ApiClient {
    let identity: Identity = serde_json::from_value(identity_json("analyst")).unwrap();
    client.with_session(Arc::new(SessionCoordinator::with_identity(identity)))
}

fn page_json() -> Value {
    json!({
        "data": [{ "_id": "b1", "name": "Central" }],
        "pagination": { "page": 1, "page_count": 1, "page_size": 10, "total_document": 1 }
    })
}

/// Refresh endpoint that rotates the session cookie after `delay`.
async fn mount_refresh(server: &MockServer, delay: Duration, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=fresh; Path=/")
                .set_body_json(identity_json("analyst"))
                .set_delay(delay),
        )
        .expect(expected)
        .mount(server)
        .await;
}

/// Banks endpoint that only accepts the rotated cookie, expecting
/// `expired` rejected attempts and `replays` accepted ones.
async fn mount_banks_requiring_fresh_cookie(server: &MockServer, expired: u64, replays: u64) {
    Mock::given(method("GET"))
        .and(path("/v1/master/banks"))
        .and(header("cookie", "session=fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json()))
        .with_priority(1)
        .expect(replays)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/master/banks"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "expired" })))
        .expect(expired)
        .mount(server)
        .await;
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn signin_caches_identity_and_sends_context() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/signin"))
        .and(header_exists("client-user-agent"))
        .and(body_json(json!({
            "username": "analyst",
            "password": "hunter22",
            "remember_me": true
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=initial; Path=/")
                .set_body_json(identity_json("analyst")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let password: secrecy::SecretString = "hunter22".to_string().into();
    let identity = client.signin("analyst", &password, true).await.unwrap();

    assert_eq!(identity.username.as_deref(), Some("analyst"));
    assert!(client.session().is_authenticated());
    assert!(client.session().has_permissions(&["banks:read", "banks:module"]));
    assert_eq!(client.cookie_header().as_deref(), Some("session=initial"));
}

#[tokio::test]
async fn failed_signin_leaves_session_anonymous() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/signin"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Invalid credentials",
            "errors": { "password": ["Wrong password"] }
        })))
        .mount(&server)
        .await;

    let password: secrecy::SecretString = "nope".to_string().into();
    let err = client.signin("analyst", &password, false).await.unwrap_err();

    assert!(!client.session().is_authenticated());
    let report = ErrorReport::from(&err);
    assert_eq!(report.message.as_deref(), Some("Invalid credentials"));
    assert_eq!(report.field("password"), ["Wrong password".to_owned()]);
}

#[tokio::test]
async fn signout_clears_identity() {
    let (server, client) = setup().await;
    let client = signed_in(client);

    Mock::given(method("POST"))
        .and(path("/v1/auth/signout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.signout().await.unwrap();
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn reauthenticate_reads_me() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_json("returning")))
        .mount(&server)
        .await;

    let identity = client.reauthenticate().await.unwrap();
    assert_eq!(identity.username.as_deref(), Some("returning"));
    assert!(client.session().has_role("admin"));
}

// ── Session recovery ────────────────────────────────────────────────

#[tokio::test]
async fn expired_session_refreshes_once_and_replays() {
    let (server, client) = setup().await;
    let client = signed_in(client);
    mount_refresh(&server, Duration::ZERO, 1).await;
    mount_banks_requiring_fresh_cookie(&server, 1, 1).await;

    let page: Page<Value> = client.list(Resource::Banks, &ListQuery::new()).await.unwrap();

    assert_eq!(page.data.len(), 1);
    assert_eq!(client.session().refresh_cycles(), 1);
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn concurrent_401s_share_a_single_refresh() {
    let (server, client) = setup().await;
    let client = signed_in(client);
    mount_refresh(&server, Duration::from_millis(300), 1).await;
    mount_banks_requiring_fresh_cookie(&server, 5, 5).await;

    let query = ListQuery::new();
    let results: Vec<Result<Page<Value>, Error>> =
        join_all((0..5).map(|_| client.list(Resource::Banks, &query))).await;

    for result in &results {
        assert!(result.is_ok(), "expected replay to succeed, got {result:?}");
    }
    assert_eq!(client.session().refresh_cycles(), 1);
    assert!(!client.session().is_refreshing());
}

#[tokio::test]
async fn rejected_refresh_fails_every_waiter_and_signs_out() {
    let (server, client) = setup().await;
    let client = signed_in(client);

    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    mount_banks_requiring_fresh_cookie(&server, 3, 0).await;

    let query = ListQuery::new();
    let results: Vec<Result<Page<Value>, Error>> =
        join_all((0..3).map(|_| client.list(Resource::Banks, &query))).await;

    for result in &results {
        assert!(
            matches!(result, Err(Error::RefreshFailed { .. })),
            "expected RefreshFailed, got {result:?}"
        );
    }
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn refresh_server_error_also_signs_out() {
    let (server, client) = setup().await;
    let client = signed_in(client);

    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_banks_requiring_fresh_cookie(&server, 1, 0).await;

    let err = client
        .list::<Value>(Resource::Banks, &ListQuery::new())
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn replayed_401_is_not_retried_again() {
    let (server, client) = setup().await;
    let client = signed_in(client);
    mount_refresh(&server, Duration::ZERO, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/master/owners"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Account locked",
            "errors": { "username": ["Too many attempts"] }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let err = client
        .list::<Value>(Resource::Owners, &ListQuery::new())
        .await
        .unwrap_err();

    assert!(err.is_unauthorized(), "got {err:?}");
    assert_eq!(client.session().refresh_cycles(), 1);
    let report = ErrorReport::from(&err);
    assert_eq!(report.message.as_deref(), Some("Account locked"));
    assert_eq!(report.field("username"), ["Too many attempts".to_owned()]);
    assert!(report.lists.is_empty());
}

#[tokio::test]
async fn explicit_refresh_returns_identity() {
    let (server, client) = setup().await;
    mount_refresh(&server, Duration::ZERO, 1).await;

    let identity = client.refresh().await.unwrap();
    assert_eq!(identity.username.as_deref(), Some("analyst"));
    assert_eq!(client.cookie_header().as_deref(), Some("session=fresh"));
}

// ── Error normalization ─────────────────────────────────────────────

#[tokio::test]
async fn not_found_is_normalized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/master/banks/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "no bank" })))
        .mount(&server)
        .await;

    let err = client
        .find::<Value>(Resource::Banks, "missing")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    let report = ErrorReport::from(err);
    assert_eq!(report.message.as_deref(), Some("Data Not Found"));
    assert!(report.lists.is_empty());
}

#[tokio::test]
async fn server_error_is_generic() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/deposits"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>boom</html>"))
        .mount(&server)
        .await;

    let err = client
        .create(Resource::Deposits, &json!({ "amount": 1 }))
        .await
        .unwrap_err();
    let report = ErrorReport::from(err);
    assert_eq!(report.message.as_deref(), Some("Something went wrong"));
    assert_eq!(report.lists.len(), 2);
}

#[tokio::test]
async fn validation_errors_pass_through() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/v1/bonds/b1"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Invalid data",
            "errors": { "coupon_rate": ["Must be positive"] }
        })))
        .mount(&server)
        .await;

    let err = client
        .update(Resource::Bonds, "b1", &json!({ "coupon_rate": -1 }))
        .await
        .unwrap_err();
    let report = ErrorReport::from(err);
    assert_eq!(report.message.as_deref(), Some("Invalid data"));
    assert_eq!(report.field("coupon_rate"), ["Must be positive".to_owned()]);
}

// ── Resources ───────────────────────────────────────────────────────

#[tokio::test]
async fn list_encodes_query_in_dot_notation() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/master/banks"))
        .and(query_param("search.name", "central"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "10"))
        .and(query_param("sort", "-_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json()))
        .expect(1)
        .mount(&server)
        .await;

    let query = ListQuery::new().search("name", "central").page(2);
    let page: Page<Value> = client.list(Resource::Banks, &query).await.unwrap();
    assert_eq!(page.pagination.total_document, 1);
}

#[tokio::test]
async fn permissions_use_exhaustive_defaults() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/master/permissions"))
        .and(query_param("page_size", "100000"))
        .and(query_param("sort", "_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let page: Page<Value> = client
        .list(Resource::Permissions, &ListQuery::new())
        .await
        .unwrap();
    assert!(page.data.is_empty());
}

#[tokio::test]
async fn delete_sends_reason() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/stocks/s1"))
        .and(body_json(json!({ "delete_reason": "duplicate entry" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deleted_count": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client
        .delete_record(Resource::Stocks, "s1", Some("duplicate entry"))
        .await
        .unwrap();
    assert_eq!(result.deleted_count, 1);
}

#[tokio::test]
async fn instrument_action_posts_to_sub_path() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/deposits/d1/receive-interest"))
        .and(body_partial_json(json!({ "amount": 125 })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "matched_count": 1, "modified_count": 1 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result: vaultdesk_api::UpdateResult = client
        .action(Resource::Deposits, "d1", "receive-interest", &json!({ "amount": 125 }))
        .await
        .unwrap();
    assert_eq!(result.modified_count, 1);
}

#[tokio::test]
async fn nested_list_and_counter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/bonds/issuers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/counters/by-name"))
        .and(query_param("name", "deposit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "deposit", "template": "DEP-{seq}", "seq": 41, "seq_pad": 4, "value": "DEP-0041"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let issuers: Page<Value> = client
        .list_nested(Resource::Bonds, "issuers", &ListQuery::new())
        .await
        .unwrap();
    assert_eq!(issuers.data.len(), 1);

    let counter = client.counter("deposit").await.unwrap();
    assert_eq!(counter.value.as_deref(), Some("DEP-0041"));
}

#[tokio::test]
async fn field_histories_send_filter_as_search() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/audit-logs/u1/field-histories"))
        .and(query_param("search.field", "email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [
            { "_id": "h1", "field": "email", "before": "a@x.test", "after": "b@x.test" }
        ]})))
        .expect(1)
        .mount(&server)
        .await;

    let page = client
        .field_histories("u1", &ListQuery::new().filter("field", "email"))
        .await
        .unwrap();
    assert_eq!(page.data[0].field.as_deref(), Some("email"));
}

// ── Cancellation ────────────────────────────────────────────────────

#[tokio::test]
async fn superseded_search_resolves_cancelled() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/master/banks"))
        .and(query_param("search.name", "ce"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/master/banks"))
        .and(query_param("search.name", "central"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json()))
        .mount(&server)
        .await;

    let slot = SearchSlot::new();
    let stale_query = ListQuery::new().search("name", "ce");
    let fresh_query = ListQuery::new().search("name", "central");

    let stale = slot.run(client.list::<Value>(Resource::Banks, &stale_query));
    let fresh = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        slot.run(client.list::<Value>(Resource::Banks, &fresh_query))
            .await
    };

    let (stale, fresh) = tokio::join!(stale, fresh);
    assert!(matches!(stale, Err(Error::Cancelled)), "got {stale:?}");
    assert_eq!(fresh.unwrap().data.len(), 1);
}
