// File: ./src/client/middleware.rs
//! Tower middleware that stamps every request with orgcal's User-Agent.
use http::{HeaderValue, Request};
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

pub fn default_user_agent() -> String {
    format!("orgcal/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Clone, Debug)]
pub struct UserAgentLayer {
    value: HeaderValue,
}

impl UserAgentLayer {
    /// Falls back to the crate's own agent string if `user_agent` is not a
    /// valid header value.
    pub fn new(user_agent: &str) -> Self {
        let value = HeaderValue::from_str(user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("orgcal"));
        Self { value }
    }
}

impl Default for UserAgentLayer {
    fn default() -> Self {
        Self::new(&default_user_agent())
    }
}

impl<S> Layer<S> for UserAgentLayer {
    type Service = UserAgentService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        UserAgentService {
            inner,
            value: self.value.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UserAgentService<S> {
    inner: S,
    value: HeaderValue,
}

impl<S, ReqBody> Service<Request<ReqBody>> for UserAgentService<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        req.headers_mut()
            .insert(http::header::USER_AGENT, self.value.clone());
        self.inner.call(req)
    }
}
