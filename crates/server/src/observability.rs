use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static REGISTRATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "book_exchange_registrations_total",
        "Registration attempts by outcome",
        &["outcome"]
    )
    .expect("register registrations_total")
});

pub static LOGINS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("book_exchange_logins_total", "Login attempts by outcome", &["outcome"])
        .expect("register logins_total")
});

pub static TOKEN_REJECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "book_exchange_token_rejections_total",
        "Requests refused by the bearer token check",
        &["reason"]
    )
    .expect("register token_rejections_total")
});

/// Touch every metric so all series appear in the first scrape.
pub fn init_metrics() {
    Lazy::force(&REGISTRATIONS_TOTAL);
    Lazy::force(&LOGINS_TOTAL);
    Lazy::force(&TOKEN_REJECTIONS_TOTAL);
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}"));
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        REGISTRATIONS_TOTAL.with_label_values(&["created"]).inc();
        let (status, body) = encode_metrics();
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("book_exchange_registrations_total"));
    }
}
