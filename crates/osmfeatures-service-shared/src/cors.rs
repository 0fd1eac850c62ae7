//! Fixed, permissive CORS handling for the feature endpoints.
//!
//! [`CorsLayer`] adds the same three headers to every response and answers
//! `OPTIONS` preflights itself with `204 No Content`, never calling the
//! wrapped service. Unlike `tower_http::cors`, the headers do not depend on an
//! `Origin` request header being present.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use pin_project_lite::pin_project;
use tower::{Layer, Service};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

/// Tower layer applying the fixed CORS policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorsLayer;

impl<S> Layer<S> for CorsLayer {
    type Service = CorsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorsMiddleware { inner }
    }
}

/// Middleware service produced by [`CorsLayer`].
#[derive(Debug, Clone)]
pub struct CorsMiddleware<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorsMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Default,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = CorsFuture<S::Future, ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if req.method() == Method::OPTIONS {
            let mut response = Response::new(ResBody::default());
            *response.status_mut() = StatusCode::NO_CONTENT;
            apply_cors_headers(response.headers_mut());
            return CorsFuture::Preflight {
                response: Some(response),
            };
        }

        CorsFuture::Inner {
            inner: self.inner.call(req),
        }
    }
}

pin_project! {
    #[project = CorsFutureProj]
    /// Future returned by [`CorsMiddleware`].
    pub enum CorsFuture<F, B> {
        Preflight {
            response: Option<Response<B>>,
        },
        Inner {
            #[pin]
            inner: F,
        },
    }
}

impl<F, B, E> Future for CorsFuture<F, B>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            CorsFutureProj::Preflight { response } => match response.take() {
                Some(response) => Poll::Ready(Ok(response)),
                None => panic!("CorsFuture polled after completion"),
            },
            CorsFutureProj::Inner { inner } => match inner.poll(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Ok(mut response)) => {
                    apply_cors_headers(response.headers_mut());
                    Poll::Ready(Ok(response))
                }
                Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            },
        }
    }
}
