use chrono::Utc;
use rand::Rng;

use crate::capture::model::{CapturedRequest, CapturedResponse};
use crate::store::BoundedStore;

const ID_SUFFIX_LEN: usize = 5;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Correlation id: base-36 epoch millis plus a short random suffix.
///
/// Unique enough for one process's in-memory stores, not for persisted or
/// distributed use.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{}_{}", to_base36(millis), suffix)
}

/// Attach a response to the request sharing its id.
///
/// Returns `false` when the request is gone (evicted or never stored) or
/// already settled; the response is dropped in both cases.
pub fn attach_response(
    store: &mut BoundedStore<CapturedRequest>,
    id: &str,
    response: CapturedResponse,
) -> bool {
    match store.find_by_id_mut(id) {
        Some(request) if !request.is_settled() => {
            request.response = Some(response);
            true
        }
        Some(_) => {
            tracing::debug!("Request {} already settled, ignoring response", id);
            false
        }
        None => {
            tracing::debug!("No stored request for {}, dropping response", id);
            false
        }
    }
}

/// Attach an error outcome. Same miss semantics as [`attach_response`].
pub fn attach_error(store: &mut BoundedStore<CapturedRequest>, id: &str, error: String) -> bool {
    match store.find_by_id_mut(id) {
        Some(request) if !request.is_settled() => {
            request.error = Some(error);
            true
        }
        Some(_) => {
            tracing::debug!("Request {} already settled, ignoring error", id);
            false
        }
        None => {
            tracing::debug!("No stored request for {}, dropping error", id);
            false
        }
    }
}
