/// Identity of the visitor's conversation with the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationSession {
    conversation_id: Option<String>,
    auth_token: Option<String>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// First assignment wins. Returns `true` if the id was stored.
    pub fn set_conversation_id(&mut self, id: impl Into<String>) -> bool {
        if self.conversation_id.is_some() {
            return false;
        }
        let id = id.into();
        if id.is_empty() {
            return false;
        }
        self.conversation_id = Some(id);
        true
    }

    pub fn set_auth_token(&mut self, token: impl Into<String>) {
        self.auth_token = Some(token.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_id_first_assignment_wins() {
        let mut session = ConversationSession::new();
        assert!(session.set_conversation_id("X"));
        assert!(!session.set_conversation_id("Y"));
        assert_eq!(session.conversation_id(), Some("X"));
    }

    #[test]
    fn empty_id_does_not_claim_the_slot() {
        let mut session = ConversationSession::new();
        assert!(!session.set_conversation_id(""));
        assert!(session.set_conversation_id("c1"));
        assert_eq!(session.conversation_id(), Some("c1"));
    }
}
