//! Master-key header auth (SPEC_FULL §6 `[AMBIENT]`): "a thin `axum`
//! middleware comparing a header against an `EngineConfig`-sourced secret
//! (constant-time comparison, no session/JWT layer)".

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use super::state::AppState;

const MASTER_KEY_HEADER: &str = "x-pageforge-master-key";

/// Reject the request unless its `x-pageforge-master-key` header matches
/// `EngineConfig::master_key`. A `None` configured key disables auth
/// entirely — only ever appropriate for local development (`EngineConfig`'s
/// own doc comment says as much).
pub async fn require_master_key(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, StatusCode> {
    let Some(expected) = state.config.master_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request.headers().get(MASTER_KEY_HEADER).and_then(|v| v.to_str().ok()).unwrap_or("");

    if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        Ok(next.run(request).await)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Byte-for-byte comparison that runs in time proportional to the longer
/// input regardless of where the two strings first differ, to avoid
/// leaking the master key's length-prefix through response timing.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = (a.len() != b.len()) as u8;
    let len = a.len().max(b.len());
    for i in 0..len {
        let byte_a = a.get(i).copied().unwrap_or(0);
        let byte_b = b.get(i).copied().unwrap_or(0);
        diff |= byte_a ^ byte_b;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_slices_compare_equal() {
        assert!(constant_time_eq(b"secret", b"secret"));
    }

    #[test]
    fn differing_slices_compare_unequal() {
        assert!(!constant_time_eq(b"secret", b"secre!"));
    }

    #[test]
    fn differing_lengths_compare_unequal() {
        assert!(!constant_time_eq(b"secret", b"secrets"));
    }
}
