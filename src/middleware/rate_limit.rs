use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Fixed-window request limiter: at most `limit` requests per `window`,
/// counted per limiter instance. The window resets wholesale when it
/// elapses; there is no sliding behavior.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<Window>>,
    limit: u32,
    window: Duration,
}

struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(6);

    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            })),
            limit,
            window,
        }
    }

    pub fn try_acquire(&self) -> bool {
        let mut window = self.inner.lock().expect("rate limiter lock poisoned");

        if window.started.elapsed() >= self.window {
            window.started = Instant::now();
            window.count = 0;
        }

        if window.count >= self.limit {
            return false;
        }

        window.count += 1;
        true
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, Self::DEFAULT_WINDOW)
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !limiter.try_acquire() {
        let body = json!({ "error": "Too many requests" });
        return (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    }

    next.run(request).await
}
