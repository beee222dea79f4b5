use sqlx::PgPool;

use crate::auth::TokenKeys;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Signs tokens at registration and verifies them in the auth extractors.
    pub tokens: TokenKeys,
    pub bcrypt_cost: u32,
}
