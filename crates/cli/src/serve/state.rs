//! Application state and rate limiting.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Instant;

use tokio::sync::Mutex;
use veriport_service::{ListingService, MutationService, UploadPipeline, VerificationService};

use super::RATE_LIMIT_WINDOW_SECS;

struct Window {
    count: u64,
    started: Instant,
}

/// In-memory per-IP rate limiter.
///
/// Besides plain abuse protection, this throttles token-enumeration
/// guessing against the public verify endpoint; the token space makes brute
/// force hopeless, so this is defense in depth rather than a correctness
/// requirement.
pub(crate) struct RateLimiter {
    windows: Mutex<HashMap<IpAddr, Window>>,
    /// Maximum requests per window.
    max_requests: u64,
}

impl RateLimiter {
    pub(crate) fn new(max_requests: u64) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
        }
    }

    /// Check if a request from the given IP is allowed.
    /// Returns Ok(()) if allowed, Err(retry_after_secs) if rate limited.
    pub(crate) async fn check(&self, ip: IpAddr) -> Result<(), u64> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        // Keep the map from accumulating one entry per client forever.
        if windows.len() > 10_000 {
            windows.retain(|_, w| {
                now.duration_since(w.started).as_secs() < RATE_LIMIT_WINDOW_SECS
            });
        }

        let window = windows.entry(ip).or_insert(Window {
            count: 0,
            started: now,
        });
        let elapsed = now.duration_since(window.started).as_secs();
        if elapsed >= RATE_LIMIT_WINDOW_SECS {
            window.count = 0;
            window.started = now;
        }

        window.count += 1;
        if window.count > self.max_requests {
            Err(RATE_LIMIT_WINDOW_SECS.saturating_sub(elapsed))
        } else {
            Ok(())
        }
    }
}

/// Application state shared across request handlers.
pub(crate) struct AppState {
    pub(crate) upload: UploadPipeline,
    pub(crate) verifier: VerificationService,
    pub(crate) mutator: MutationService,
    pub(crate) listing: ListingService,
    /// Per-IP rate limiter.
    pub(crate) rate_limiter: RateLimiter,
    /// Optional API key for the management endpoints. None = no auth.
    pub(crate) api_key: Option<String>,
}
