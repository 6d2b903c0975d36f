use std::collections::HashSet;

use async_trait::async_trait;
use dbot_core::{CallbackContext, HandlerResponse, Middleware, Result, Update};
use tracing::{debug, error, info, instrument};

/// Logs each update in before() and the final response in after(); always continues.
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    #[instrument(skip(self, update, _context))]
    async fn before(&self, update: &Update, _context: &mut CallbackContext) -> Result<bool> {
        let user = update.effective_user();
        info!(
            update_id = update.id,
            user_id = ?user.map(|u| u.id),
            username = %user.and_then(|u| u.username.as_deref()).unwrap_or("unknown"),
            text = %update.effective_message().and_then(|m| m.text()).unwrap_or(""),
            "Received update"
        );
        Ok(true)
    }

    #[instrument(skip(self, update, _context, response))]
    async fn after(
        &self,
        update: &Update,
        _context: &CallbackContext,
        response: &HandlerResponse,
    ) -> Result<()> {
        debug!(update_id = update.id, response = ?response, "Processed update");
        Ok(())
    }
}

/// Fails the update with Unauthorized unless the sender is in the allowlist.
pub struct AuthMiddleware {
    allowed_users: HashSet<i64>,
}

impl AuthMiddleware {
    pub fn new(allowed_users: impl IntoIterator<Item = i64>) -> Self {
        Self {
            allowed_users: allowed_users.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Middleware for AuthMiddleware {
    #[instrument(skip(self, update, _context))]
    async fn before(&self, update: &Update, _context: &mut CallbackContext) -> Result<bool> {
        match update.effective_user().map(|u| u.id) {
            Some(user_id) if self.allowed_users.contains(&user_id) => {
                info!(user_id, "User authorized");
                Ok(true)
            }
            user_id => {
                error!(?user_id, "Unauthorized access attempt");
                Err(dbot_core::HandlerError::Unauthorized.into())
            }
        }
    }
}
