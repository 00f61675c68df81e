// File: ./src/client/auth.rs
// HTTP authentication for the CalDAV client: Basic first, Digest on challenge.
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use digest_auth::{AuthContext, HttpMethod};
use http::{HeaderValue, Request, Response, StatusCode};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_service::Service;

#[derive(Clone, Debug)]
struct Credentials {
    user: String,
    pass: String,
}

impl Credentials {
    fn basic_header(&self) -> Option<HeaderValue> {
        let token = STANDARD.encode(format!("{}:{}", self.user, self.pass));
        HeaderValue::from_str(&format!("Basic {}", token)).ok()
    }

    /// Answers a `WWW-Authenticate: Digest ...` challenge for `req`.
    fn digest_header<B>(&self, challenge: &str, req: &Request<B>) -> Option<HeaderValue> {
        let uri = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());
        let method = HttpMethod::from(req.method().as_str());
        // auth-int is rare for CalDAV servers, so no body digest.
        let body: Option<&[u8]> = None;
        let context = AuthContext::new_with_method(&self.user, &self.pass, &uri, body, method);

        let mut prompt = digest_auth::parse(challenge).ok()?;
        let answer = prompt.respond(&context).ok()?;
        HeaderValue::from_str(&answer.to_string()).ok()
    }
}

#[derive(Clone, Debug)]
pub struct AuthLayer {
    credentials: Arc<Credentials>,
}

impl AuthLayer {
    pub fn new(user: &str, pass: &str) -> Self {
        Self {
            credentials: Arc::new(Credentials {
                user: user.to_string(),
                pass: pass.to_string(),
            }),
        }
    }
}

impl<S> tower_layer::Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            credentials: self.credentials.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthService<S> {
    inner: S,
    credentials: Arc<Credentials>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AuthService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::error::Error + Send + Sync + 'static,
    ReqBody: Clone + Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let credentials = self.credentials.clone();
        if credentials.user.is_empty() {
            return Box::pin(self.inner.call(req));
        }

        if let Some(val) = credentials.basic_header() {
            req.headers_mut().insert(http::header::AUTHORIZATION, val);
        }

        let retry = req.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            let Some(challenge) = response
                .headers()
                .get(http::header::WWW_AUTHENTICATE)
                .and_then(|h| h.to_str().ok())
            else {
                return Ok(response);
            };

            if !challenge.to_ascii_lowercase().starts_with("digest") {
                return Ok(response);
            }

            match credentials.digest_header(challenge, &retry) {
                Some(val) => {
                    let mut retry = retry;
                    retry
                        .headers_mut()
                        .insert(http::header::AUTHORIZATION, val);
                    log::debug!("Answering digest challenge for {}", retry.uri());
                    inner.call(retry).await
                }
                None => Ok(response),
            }
        })
    }
}
