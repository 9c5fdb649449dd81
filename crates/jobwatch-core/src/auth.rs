//! Access credential lookup.
//!
//! Session storage belongs to the host application; the engine only needs a
//! synchronous "current token, if any" accessor.

/// Source of the current access token.
pub trait TokenProvider: Send + Sync {
    /// Current token, or `None` when the user has no session.
    fn current_token(&self) -> Option<String>;
}

/// Fixed token (or none), e.g. from a CLI flag.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|t| !t.trim().is_empty()))
    }
}

impl TokenProvider for StaticToken {
    fn current_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Token read from an environment variable on every lookup.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenProvider for EnvToken {
    fn current_token(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}
