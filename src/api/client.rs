//! HTTP client for the PortfolioX API.
//!
//! One method per endpoint. All authenticated requests carry the session's
//! bearer token; a 401 or 403 clears the session before the error is returned.

use crate::api::ApiError;
use crate::models::{
    LoginRequest, LoginResponse, ManagedRole, Portfolio, TemporaryPassword, User, UserId,
};
use crate::session::{Session, TeardownReason};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection settings for the client.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Client for the PortfolioX backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    settings: ApiSettings,
    http_client: reqwest::Client,
    session: Session,
}

impl ApiClient {
    /// Create a client bound to a session.
    pub fn new(settings: ApiSettings, session: Session) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(ApiError::Transport)?;

        let settings = ApiSettings {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            ..settings
        };

        debug!("API client targeting {}", settings.base_url);

        Ok(Self {
            settings,
            http_client,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    /// Resolve a profile picture or certificate path to a full URL.
    ///
    /// Absolute URLs pass through; `uploads/...`, `/uploads/...` and
    /// Windows-style `uploads\...` paths are joined to the API origin.
    pub fn asset_url(&self, path: &str) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }

        let relative = path.replace('\\', "/");
        let relative = relative.trim_start_matches('/');
        Some(format!("{}/{}", self.settings.base_url, relative))
    }

    /// Sign in and return the token payload. Does not require a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let path = "/api/auth/login";
        let request = self
            .http_client
            .post(self.url(path))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            });

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("Login refused for {} (HTTP {})", username, status.as_u16());
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
            });
        }
        let response = Self::ensure_success(response).await?;

        info!("Login succeeded for {}", username);
        Self::decode(path, response).await
    }

    /// `GET /api/auth/user/{id}`
    pub async fn user(&self, id: UserId) -> Result<User, ApiError> {
        self.get_json(&format!("/api/auth/user/{}", id)).await
    }

    /// `GET /api/users/students`
    pub async fn students(&self) -> Result<Vec<User>, ApiError> {
        self.get_json("/api/users/students").await
    }

    /// `GET /api/users/faculty`
    pub async fn faculty(&self) -> Result<Vec<User>, ApiError> {
        self.get_json("/api/users/faculty").await
    }

    /// `GET /api/users/faculty/pending`
    pub async fn pending_faculty(&self) -> Result<Vec<User>, ApiError> {
        self.get_json("/api/users/faculty/pending").await
    }

    /// `PATCH /api/auth/approve/{id}?approve={bool}`. Returns the server's message.
    pub async fn approve_faculty(&self, id: UserId, approve: bool) -> Result<String, ApiError> {
        let path = format!("/api/auth/approve/{}?approve={}", id, approve);
        let response = self.execute(Method::PATCH, &path).await?;
        let message = response.text().await.map_err(ApiError::Transport)?;
        info!(
            "Faculty {} {}",
            id,
            if approve { "approved" } else { "rejected" }
        );
        Ok(message)
    }

    /// Issue a one-time temporary password.
    pub async fn reset_password(
        &self,
        role: ManagedRole,
        id: UserId,
    ) -> Result<TemporaryPassword, ApiError> {
        let path = format!("/api/users/{}/{}/reset-password", role.path_segment(), id);
        let response = self.execute(Method::PATCH, &path).await?;
        info!("Password reset issued for {} {}", role, id);
        Self::decode(&path, response).await
    }

    /// Hard-delete an account and its data.
    pub async fn delete_user(&self, role: ManagedRole, id: UserId) -> Result<(), ApiError> {
        let path = format!("/api/users/{}/{}", role.path_segment(), id);
        self.execute(Method::DELETE, &path).await?;
        info!("Deleted {} {}", role, id);
        Ok(())
    }

    /// `GET /api/portfolios`
    pub async fn portfolios(&self) -> Result<Vec<Portfolio>, ApiError> {
        self.get_json("/api/portfolios").await
    }

    /// `GET /api/portfolios/student/{id}`
    pub async fn student_portfolios(&self, id: UserId) -> Result<Vec<Portfolio>, ApiError> {
        self.get_json(&format!("/api/portfolios/student/{}", id))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path).await?;
        Self::decode(path, response).await
    }

    /// Send an authenticated request and apply the shared status rules.
    async fn execute(&self, method: Method, path: &str) -> Result<Response, ApiError> {
        let token = self.session.token().ok_or(ApiError::NoSession)?;

        debug!("{} {}", method, path);
        let request: RequestBuilder = self
            .http_client
            .request(method, self.url(path))
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json");

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("{} returned HTTP {}; clearing session", path, status.as_u16());
            self.session
                .clear(TeardownReason::Rejected(status.as_u16()));
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
            });
        }

        Self::ensure_success(response).await
    }

    async fn ensure_success(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ApiError> {
        let body = response.text().await.map_err(ApiError::Transport)?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.settings.timeout_seconds)
        } else if e.is_connect() {
            ApiError::Connect(self.settings.base_url.clone())
        } else {
            ApiError::Transport(e)
        }
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! Minimal loopback HTTP server for client tests.

    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// A canned response keyed by request path prefix.
    #[derive(Clone)]
    pub struct Route {
        pub path: &'static str,
        pub status: u16,
        pub body: String,
    }

    impl Route {
        pub fn new(path: &'static str, status: u16, body: impl Into<String>) -> Self {
            Self {
                path,
                status,
                body: body.into(),
            }
        }
    }

    pub struct StubServer {
        pub base_url: String,
        pub requests: Arc<Mutex<Vec<String>>>,
    }

    impl StubServer {
        /// Serve `routes` until the test ends. The longest matching prefix wins.
        pub async fn start(routes: Vec<Route>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            let requests = Arc::new(Mutex::new(Vec::new()));
            let seen = requests.clone();

            tokio::spawn(async move {
                loop {
                    let Ok((mut socket, _)) = listener.accept().await else {
                        return;
                    };
                    let request = read_request(&mut socket).await;
                    let target = request
                        .lines()
                        .next()
                        .and_then(|line| line.split_whitespace().nth(1))
                        .unwrap_or("")
                        .to_string();
                    seen.lock().unwrap().push(request);

                    let route = routes
                        .iter()
                        .filter(|r| target.starts_with(r.path))
                        .max_by_key(|r| r.path.len())
                        .cloned()
                        .unwrap_or_else(|| Route::new("", 404, "not found"));

                    let response = format!(
                        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        route.status,
                        route.body.len(),
                        route.body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });

            Self { base_url, requests }
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = find_header_end(&buf) {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                while buf.len() < end + 4 + length {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                break;
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn find_header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }
}
