// Firenet session client
//
// Cookie-based login against the Firenet web front end. A successful
// login leaves a `connect.sid` cookie in a per-session jar; every
// authenticated request reuses that jar. The client never retries on its
// own -- expiry is reported as `Error::SessionExpired` and the caller
// decides whether to log in again.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Production endpoint of the Firenet cloud service.
pub const DEFAULT_BASE_URL: &str = "https://www.rika-firenet.com";

/// Form login endpoint.
pub const LOGIN_PATH: &str = "/web/login";

/// Logout endpoint. Its link is also the authenticated-page marker.
pub const LOGOUT_PATH: &str = "/web/logout";

/// Name of the cookie that carries the authenticated session.
pub const SESSION_COOKIE: &str = "connect.sid";

/// Substring every authenticated page contains (the logout link).
const LOGOUT_MARKER: &str = "/logout";

/// A live transport handle. Only ever published once all login signals
/// have been observed, so holders can rely on it being authenticated.
struct Session {
    http: reqwest::Client,
    jar: Arc<Jar>,
}

/// Authenticated HTTP session against the Firenet cloud service.
///
/// Either fully unauthenticated (no handle, no cookie) or fully
/// authenticated (handle with the session cookie in its jar); the handle
/// is swapped atomically so no partially logged-in state is observable.
pub struct SessionClient {
    base_url: Url,
    username: String,
    password: SecretString,
    transport: TransportConfig,
    session: ArcSwapOption<Session>,
    /// Bumped on every successful login.
    generation: AtomicU64,
    /// Serializes logins so concurrent expiry handling performs one login.
    connect_lock: Mutex<()>,
}

impl SessionClient {
    /// Create an unauthenticated client. Nothing touches the network until
    /// [`connect()`](Self::connect) is called.
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        transport: TransportConfig,
    ) -> Self {
        Self {
            base_url,
            username: username.into(),
            password,
            transport,
            session: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
            connect_lock: Mutex::new(()),
        }
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The account name used to log in.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Request timeout applied to every call.
    pub fn timeout(&self) -> Duration {
        self.transport.timeout
    }

    /// Number of successful logins so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Log in with the stored credentials.
    ///
    /// Posts the credentials form-encoded to `POST /web/login`. A fresh
    /// cookie jar is used for every attempt; any previous session is
    /// dropped first, so a failed attempt leaves the client unauthenticated.
    pub async fn connect(&self) -> Result<(), Error> {
        let _guard = self.connect_lock.lock().await;
        self.login().await
    }

    /// Log in again unless another caller already did since
    /// `seen_generation` was read.
    pub async fn reconnect_if_stale(&self, seen_generation: u64) -> Result<(), Error> {
        let _guard = self.connect_lock.lock().await;
        if self.generation() != seen_generation && self.is_authenticated() {
            debug!("session already renewed by a concurrent caller");
            return Ok(());
        }
        self.login().await
    }

    async fn login(&self) -> Result<(), Error> {
        self.session.store(None);

        let jar = Arc::new(Jar::default());
        let http = self.transport.build_client(&jar)?;
        let url = self.url(LOGIN_PATH)?;

        debug!("logging in at {}", url);

        let form = [
            ("email", self.username.as_str()),
            ("password", self.password.expose_secret()),
        ];
        let resp = http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        let has_cookie = session_cookie_present(&jar, &self.base_url);

        if !is_authenticated_response(status, &body, has_cookie) {
            return Err(Error::Authentication {
                message: login_failure_reason(status, &body, has_cookie),
            });
        }

        self.session.store(Some(Arc::new(Session { http, jar })));
        self.generation.fetch_add(1, Ordering::AcqRel);
        debug!("login successful");
        Ok(())
    }

    /// End the current session. Best effort: the local session is dropped
    /// even when the logout call fails.
    pub async fn logout(&self) -> Result<(), Error> {
        let Some(session) = self.session.swap(None) else {
            return Ok(());
        };
        let url = self.url(LOGOUT_PATH)?;
        debug!("logging out at {}", url);
        session
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        debug!("logout complete");
        Ok(())
    }

    /// Drop the transport handle and its cookie without a network call.
    pub fn invalidate(&self) {
        if self.session.swap(None).is_some() {
            debug!("session invalidated");
        }
    }

    /// `true` iff the session cookie is present on the current handle.
    pub fn is_authenticated(&self) -> bool {
        self.session
            .load()
            .as_ref()
            .is_some_and(|s| session_cookie_present(&s.jar, &self.base_url))
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Issue an authenticated request.
    ///
    /// Returns `Error::SessionExpired` when there is no session, when the
    /// cookie has vanished, on 401/403, or when the service redirected the
    /// request to the login page. Other non-success statuses map to
    /// `Error::Api`.
    pub async fn request<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error> {
        let current = self.session.load_full();
        let Some(session) = current.as_ref() else {
            return Err(Error::SessionExpired);
        };
        if !session_cookie_present(&session.jar, &self.base_url) {
            return Err(self.expire(&current));
        }

        let url = self.url(path)?;
        debug!("{method} {url}");

        let mut builder = session.http.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder.send().await.map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            trace!(%status, "session rejected");
            return Err(self.expire(&current));
        }
        if resp.url().path() == LOGIN_PATH {
            trace!("redirected to login page");
            return Err(self.expire(&current));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        Ok(resp)
    }

    /// GET a page and return its body as text.
    pub async fn get_text(&self, path: &str) -> Result<String, Error> {
        let resp = self.request::<()>(Method::GET, path, None).await?;
        resp.text().await.map_err(|e| self.transport_error(e))
    }

    /// GET a JSON document and decode it.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let body = self.get_text(path).await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }

    /// POST a JSON body, discarding the response body.
    pub async fn post_json<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let resp = self.request(Method::POST, path, Some(body)).await?;
        trace!(status = %resp.status(), "POST accepted");
        Ok(())
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        Error::from_transport(err, self.transport.timeout)
    }

    /// Tear down the session the failing request used, unless a concurrent
    /// login has already replaced it.
    fn expire(&self, seen: &Option<Arc<Session>>) -> Error {
        let _ = self.session.compare_and_swap(seen, None);
        Error::SessionExpired
    }
}

/// The login heuristic: all three independent signals must hold.
///
/// The service has no documented error contract, so a 2xx alone is not
/// trusted; the page must also offer a logout link and the session cookie
/// must have been set.
pub fn is_authenticated_response(status: StatusCode, body: &str, has_cookie: bool) -> bool {
    status.is_success() && body.contains(LOGOUT_MARKER) && has_cookie
}

fn login_failure_reason(status: StatusCode, body: &str, has_cookie: bool) -> String {
    if !status.is_success() {
        format!("login rejected (HTTP {status}): {}", preview(body))
    } else if !body.contains(LOGOUT_MARKER) {
        "login page did not show an authenticated session".into()
    } else if !has_cookie {
        format!("no {SESSION_COOKIE} cookie was set")
    } else {
        "unknown login failure".into()
    }
}

fn session_cookie_present(jar: &Jar, url: &Url) -> bool {
    let Some(header) = jar.cookies(url) else {
        return false;
    };
    header.to_str().is_ok_and(|cookies| {
        cookies.split(';').any(|pair| {
            pair.trim()
                .split_once('=')
                .is_some_and(|(name, value)| name == SESSION_COOKIE && !value.is_empty())
        })
    })
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
