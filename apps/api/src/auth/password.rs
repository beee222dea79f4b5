use anyhow::anyhow;

use crate::errors::AppError;

/// Hashes a password with bcrypt off the async executor.
pub async fn hash(plain: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await
        .map_err(|e| AppError::Internal(anyhow!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(anyhow!("Password hashing failed: {e}")))
}
