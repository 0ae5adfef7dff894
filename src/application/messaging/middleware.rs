//! Middleware system for message processing pipeline

use std::sync::Arc;
use crate::domain::entities::Message;
use crate::application::services::AccessControl;

/// Context passed through middleware chain
#[derive(Debug, Clone)]
pub struct Context {
    pub message: Message,
    pub chat_id: String,
    pub username: Option<String>,
}

impl Context {
    pub fn new(message: Message) -> Self {
        let chat_id = message.chat_id.clone();
        let username = message.username().map(|u| u.to_string());

        Self {
            message,
            chat_id,
            username,
        }
    }
}

/// Middleware trait - processors that can intercept and modify message handling
pub trait Middleware: Send + Sync {
    /// Process a message and optionally modify the context
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult;
}

/// Result of middleware processing
pub type MiddlewareResult = Result<Context, MiddlewareError>;

/// Middleware errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiddlewareError {
    /// Requester is not on the allow-list
    Unauthorized,
}

impl std::fmt::Display for MiddlewareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MiddlewareError::Unauthorized => write!(f, "Unauthorized"),
        }
    }
}

impl std::error::Error for MiddlewareError {}

/// Next middleware in chain
#[derive(Clone)]
pub struct Next {
    remaining: Arc<Vec<Arc<dyn Middleware>>>,
}

impl Next {
    pub fn new(middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            remaining: Arc::new(middlewares),
        }
    }

    /// Process remaining middleware
    pub fn run(self, ctx: Context) -> MiddlewareResult {
        if let Some(first) = self.remaining.first() {
            let remaining = self.remaining[1..].to_vec();
            let next = Next::new(remaining);
            first.process(ctx, next)
        } else {
            // No more middleware, processing complete
            Ok(ctx)
        }
    }
}

/// Middleware chain builder
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn add<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn build(self) -> Vec<Arc<dyn Middleware>> {
        self.middlewares
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Allow-list gate. Every message from a non-approved sender stops here.
pub struct AccessMiddleware {
    access: AccessControl,
}

impl AccessMiddleware {
    pub fn new(access: AccessControl) -> Self {
        Self { access }
    }
}

impl Middleware for AccessMiddleware {
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult {
        if !self.access.is_approved(ctx.username.as_deref()) {
            tracing::warn!(
                chat_id = %ctx.chat_id,
                user = ?ctx.username,
                "Unauthorized user attempted to use the bot"
            );
            return Err(MiddlewareError::Unauthorized);
        }
        next.run(ctx)
    }
}

/// Logging middleware for debugging
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult {
        let msg_preview = ctx.message.content.text()
            .map(|s| s.chars().take(50).collect::<String>())
            .unwrap_or_else(|| "[command]".to_string());
        
        let sender = ctx.message.sender.as_ref()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        tracing::debug!("[{}] {}: {} ({})", ctx.chat_id, sender, msg_preview, ctx.message.id);
        
        let result = next.run(ctx.clone());
        
        match &result {
            Ok(_) => {
                tracing::debug!("[{}] Passed middleware", ctx.chat_id);
            }
            Err(e) => {
                tracing::debug!("[{}] Stopped: {}", ctx.chat_id, e);
            }
        }
        
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::User;

    fn context(username: Option<&str>) -> Context {
        let mut user = User::new("7");
        if let Some(name) = username {
            user = user.with_username(name);
        }
        Context::new(Message::from_text("7", "042").with_sender(user))
    }

    #[test]
    fn test_access_middleware_gates_unknown_users() {
        let chain = MiddlewareChain::new()
            .add(LoggingMiddleware)
            .add(AccessMiddleware::new(AccessControl::new(["alice"])))
            .build();

        assert!(Next::new(chain.clone()).run(context(Some("alice"))).is_ok());
        assert_eq!(
            Next::new(chain.clone()).run(context(Some("eve"))).unwrap_err(),
            MiddlewareError::Unauthorized
        );
        assert_eq!(Next::new(chain).run(context(None)).unwrap_err(), MiddlewareError::Unauthorized);
    }

    #[test]
    fn test_context_takes_sender_username() {
        let ctx = context(Some("alice"));
        assert_eq!(ctx.username.as_deref(), Some("alice"));
        assert_eq!(ctx.chat_id, "7");
        assert_eq!(context(Some("")).username, None);
    }
}
