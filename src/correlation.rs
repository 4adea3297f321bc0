//! Per-request correlation ids
//!
//! A [`CorrelationContext`] is created where a client request enters the tool
//! layer and is handed by value to every call made on behalf of that request.
//! It is never stored in global or thread-local state.

use std::fmt;

use uuid::Uuid;

/// Identifier threaded through one logical store or find operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationContext {
    id: Uuid,
}

impl CorrelationContext {
    /// Start a new correlation scope with a random id
    pub fn new() -> Self {
        CorrelationContext { id: Uuid::new_v4() }
    }

    /// Reuse an id supplied by the caller
    pub fn from_id(id: Uuid) -> Self {
        CorrelationContext { id }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Span that tags every event emitted inside it with this correlation id
    pub fn span(&self, operation: &str) -> tracing::Span {
        tracing::info_span!("request", operation, correlation_id = %self.id)
    }
}

impl Default for CorrelationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_distinct() {
        let a = CorrelationContext::new();
        let b = CorrelationContext::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_is_uuid() {
        let id = Uuid::new_v4();
        let ctx = CorrelationContext::from_id(id);
        assert_eq!(ctx.to_string(), id.to_string());
        assert_eq!(ctx.id(), id);
    }
}
