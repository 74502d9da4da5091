// Back-office HTTP client
//
// Wraps `reqwest::Client` with base-URL construction, the client context
// header, and transparent session recovery: a 401 on any request other
// than the refresh call joins (or starts) a refresh cycle and replays the
// request once. Endpoint groups (auth, resources, audit) are inherent
// methods in sibling modules to keep this one focused on the pipeline.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, Request, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::context::ClientContext;
use crate::error::Error;
use crate::query;
use crate::session::{Identity, SessionCoordinator};
use crate::transport::TransportConfig;

/// Path of the refresh endpoint; a 401 from it is never recovered.
pub(crate) const REFRESH_PATH: &str = "/v1/auth/refresh";

const BODY_PREVIEW_CHARS: usize = 200;

/// Async client for the back-office REST API.
///
/// Cheap to share behind an `Arc`; all methods take `&self`. The session
/// credential travels in the cookie jar; the identity and refresh state
/// live in the shared [`SessionCoordinator`].
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    context: ClientContext,
    session: Arc<SessionCoordinator>,
    /// Cookie jar reference for inspecting the session cookie.
    cookie_jar: Option<Arc<Jar>>,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// automatically (the session lives in cookies). `base_url` is the API
    /// root, e.g. `https://backoffice.example.com/api`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config.cookie_jar.clone();
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            context: ClientContext::detect(),
            session: Arc::new(SessionCoordinator::new()),
            cookie_jar,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for enabling a cookie store on it.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            context: ClientContext::detect(),
            session: Arc::new(SessionCoordinator::new()),
            cookie_jar: None,
        }
    }

    /// Share an existing session coordinator instead of the private one.
    pub fn with_session(mut self, session: Arc<SessionCoordinator>) -> Self {
        self.session = session;
        self
    }

    /// Replace the client context sent with every request.
    pub fn with_context(mut self, context: ClientContext) -> Self {
        self.context = context;
        self
    }

    pub fn session(&self) -> &Arc<SessionCoordinator> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    /// The `Cookie` header value the jar would send to the API root.
    pub fn cookie_header(&self) -> Option<String> {
        let jar = self.cookie_jar.as_ref()?;
        let cookies = jar.cookies(&self.base_url)?;
        cookies.to_str().ok().map(String::from)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path such as `/v1/master/banks`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Build `{path}/{segment}/...`, percent-encoding each segment.
    pub(crate) fn entity_url(&self, path: &str, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.api_url(path)?;
        url.path_segments_mut()
            .map_err(|()| Error::Encoding(format!("cannot append segments to {path}")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET with pre-encoded query pairs.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        mut url: Url,
        params: &[(String, String)],
    ) -> Result<T, Error> {
        query::append_pairs(&mut url, params);
        let request = self.http.get(url).build()?;
        Self::parse(self.execute(request).await?).await
    }

    /// POST with a JSON body.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + ?Sized),
    ) -> Result<T, Error> {
        let request = self.http.post(url).json(body).build()?;
        Self::parse(self.execute(request).await?).await
    }

    /// POST without a body.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let request = self.http.post(url).build()?;
        Self::parse(self.execute(request).await?).await
    }

    /// PATCH with a JSON body.
    pub(crate) async fn patch<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + ?Sized),
    ) -> Result<T, Error> {
        let request = self.http.patch(url).json(body).build()?;
        Self::parse(self.execute(request).await?).await
    }

    /// DELETE with a JSON body (soft deletes carry a reason).
    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + ?Sized),
    ) -> Result<T, Error> {
        let request = self.http.request(Method::DELETE, url).json(body).build()?;
        Self::parse(self.execute(request).await?).await
    }

    // ── Pipeline ─────────────────────────────────────────────────────

    /// Send a request, recovering from an expired session once.
    ///
    /// On a 401 the request joins the current refresh cycle (or starts
    /// one) and, if the cycle succeeds, is replayed exactly once. The
    /// replay's response is returned as-is, so a second 401 surfaces as
    /// an [`Error::Http`] carrying the server's body rather than
    /// triggering another cycle.
    pub async fn execute(&self, request: Request) -> Result<Response, Error> {
        let replay = request.try_clone();
        let resp = self.send_once(request).await?;

        if resp.status() != StatusCode::UNAUTHORIZED || is_refresh_call(resp.url()) {
            return Ok(resp);
        }

        let Some(replay) = replay else {
            warn!(url = %resp.url(), "401 on a request that cannot be replayed");
            return Err(Error::Unauthorized);
        };

        debug!(url = %replay.url(), "session expired; recovering");
        self.session.recover(|| self.refresh_call()).await?;

        debug!(method = %replay.method(), url = %replay.url(), "replaying request after refresh");
        self.send_once(replay).await
    }

    /// One network round trip with the context header attached.
    ///
    /// A 401 from the refresh endpoint clears the identity here, before
    /// anyone else observes the response.
    async fn send_once(&self, mut request: Request) -> Result<Response, Error> {
        self.context.apply(request.headers_mut());
        let refresh_call = is_refresh_call(request.url());

        debug!(method = %request.method(), url = %request.url(), "sending request");
        let resp = self.http.execute(request).await?;
        trace!(status = %resp.status(), url = %resp.url(), "response received");

        if refresh_call && resp.status() == StatusCode::UNAUTHORIZED {
            warn!("refresh rejected by server; clearing session");
            self.session.clear();
            return Err(Error::Unauthorized);
        }
        Ok(resp)
    }

    /// The refresh call itself. Never recovers from its own 401.
    pub(crate) async fn refresh_call(&self) -> Result<Identity, Error> {
        let request = self.http.post(self.api_url(REFRESH_PATH)?).build()?;
        Self::parse(self.send_once(request).await?).await
    }

    /// Decode a JSON response, mapping non-success statuses to errors.
    ///
    /// An empty success body decodes as JSON `null`, so `()` and
    /// `Option<T>` targets accept `204 No Content`.
    pub(crate) async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            debug!(%status, "request failed");
            return Err(Error::from_status(status, &body));
        }

        let text = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(text).map_err(|e| {
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }
}

fn is_refresh_call(url: &Url) -> bool {
    url.path().ends_with(REFRESH_PATH)
}
