// ── Navigation guard ──
//
// Decides whether a navigation may proceed given the session: a silent
// re-authentication attempt for anonymous visitors, then the route's
// permission requirements, then its sign-in requirement.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;
use vaultdesk_api::ApiClient;

pub const SIGNIN_PATH: &str = "/signin";
pub const FORBIDDEN_PATH: &str = "/403";

/// Access requirements attached to a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    /// Every one of these must be granted.
    pub permissions: Vec<String>,
}

impl RouteMeta {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn authenticated() -> Self {
        Self {
            requires_auth: true,
            permissions: Vec::new(),
        }
    }

    /// Signed-in users holding all of `permissions`.
    pub fn permitted<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            requires_auth: true,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(String),
}

/// Resolve a navigation to `full_path` (path plus query).
///
/// An anonymous session first tries to pick up an existing session cookie
/// via `GET /v1/auth/me`; failure there is expected and only logged.
/// Missing permissions send the visitor to [`FORBIDDEN_PATH`] even when
/// anonymous.
pub async fn guard(client: &ApiClient, full_path: &str, meta: &RouteMeta) -> Navigation {
    let path = full_path.split(['?', '#']).next().unwrap_or(full_path);
    let session = client.session();

    if !session.is_authenticated() && path != SIGNIN_PATH {
        if let Err(e) = client.reauthenticate().await {
            debug!(error = %e, "re-authentication skipped");
        }
    }

    if !session.has_permissions(&meta.permissions) {
        debug!(path, required = ?meta.permissions, "permission denied");
        return Navigation::Redirect(FORBIDDEN_PATH.to_owned());
    }

    if meta.requires_auth && !session.is_authenticated() {
        return Navigation::Redirect(format!(
            "{SIGNIN_PATH}?redirect={}",
            encode_uri_component(full_path)
        ));
    }

    Navigation::Proceed
}

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

// ── Audit-log links ──────────────────────────────────────────────────

/// Detail page of an audited entity, for the entity types that have one.
pub fn entity_link(entity_type: Option<&str>, entity_id: Option<&str>) -> Option<String> {
    let base = match entity_type? {
        "users" => "/master/users",
        "roles" => "/master/roles",
        "examples" => "/master/examples",
        _ => return None,
    };
    Some(format!("{base}/{}", entity_id?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use url::Url;
    use vaultdesk_api::{Identity, Role, SessionCoordinator, TransportConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with(identity: Option<Identity>, base: &str) -> ApiClient {
        let session = identity.map_or_else(SessionCoordinator::new, SessionCoordinator::with_identity);
        ApiClient::new(Url::parse(base).unwrap(), &TransportConfig::default())
            .unwrap()
            .with_session(Arc::new(session))
    }

    fn reader() -> Identity {
        Identity {
            role: Some(Role {
                permissions: ["bonds:read".to_owned()].into_iter().collect(),
                ..Role::default()
            }),
            ..Identity::default()
        }
    }

    #[test]
    fn encodes_like_encode_uri_component() {
        assert_eq!(
            encode_uri_component("/bonds?search.name=a b&page=2"),
            "%2Fbonds%3Fsearch.name%3Da%20b%26page%3D2"
        );
        assert_eq!(
            encode_uri_component("/owners?q=it's (ok)!~*"),
            "%2Fowners%3Fq%3Dit's%20(ok)!~*"
        );
        assert_eq!(
            encode_uri_component("/banks?search.name=café"),
            "%2Fbanks%3Fsearch.name%3Dcaf%C3%A9"
        );
    }

    #[test]
    fn entity_links() {
        assert_eq!(
            entity_link(Some("users"), Some("u1")).as_deref(),
            Some("/master/users/u1")
        );
        assert_eq!(entity_link(Some("deposits"), Some("d1")), None);
        assert_eq!(entity_link(Some("roles"), None), None);
    }

    #[tokio::test]
    async fn missing_permission_redirects_to_forbidden() {
        let client = client_with(Some(reader()), "http://127.0.0.1:9");
        let meta = RouteMeta::permitted(["bonds:module", "bonds:create"]);
        assert_eq!(
            guard(&client, "/bonds/create", &meta).await,
            Navigation::Redirect("/403".into())
        );
    }

    #[tokio::test]
    async fn granted_permission_proceeds() {
        let client = client_with(Some(reader()), "http://127.0.0.1:9");
        let meta = RouteMeta::permitted(["bonds:read"]);
        assert_eq!(guard(&client, "/bonds", &meta).await, Navigation::Proceed);
    }

    #[tokio::test]
    async fn anonymous_visitor_is_sent_to_signin_with_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/auth/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_with(None, &server.uri());
        let nav = guard(&client, "/deposits?page=2", &RouteMeta::authenticated()).await;
        assert_eq!(
            nav,
            Navigation::Redirect("/signin?redirect=%2Fdeposits%3Fpage%3D2".into())
        );
    }

    #[tokio::test]
    async fn existing_cookie_session_is_picked_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "_id": "u1",
                "role": { "permissions": ["deposits:read"] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(None, &server.uri());
        let meta = RouteMeta::permitted(["deposits:read"]);
        assert_eq!(guard(&client, "/deposits", &meta).await, Navigation::Proceed);
    }

    #[tokio::test]
    async fn signin_page_never_reauthenticates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/auth/me"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_with(None, &server.uri());
        assert_eq!(
            guard(&client, "/signin", &RouteMeta::public()).await,
            Navigation::Proceed
        );
    }
}
