// src/presentation/http/middleware/rate_limit.rs
use ::governor::middleware::NoOpMiddleware;
use axum::body::Body;
use std::sync::OnceLock;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

/// Per-IP limiter for the token endpoint: a sustained 5 requests per second with bursts
/// of 10. Shared by every router built in the process.
pub fn token_rate_limit_layer() -> Option<GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware, Body>> {
    static RATE_LIMITER: OnceLock<Option<GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware, Body>>> =
        OnceLock::new();

    RATE_LIMITER
        .get_or_init(|| {
            let mut builder = GovernorConfigBuilder::default();
            builder.per_second(5);
            builder.burst_size(10);
            let config = builder.key_extractor(SmartIpKeyExtractor).finish();
            if config.is_none() {
                tracing::warn!("invalid token rate limit configuration; limiter disabled");
            }
            config.map(GovernorLayer::new)
        })
        .clone()
}
