use crate::models::{Citation, Message};
use crate::store::session::ConversationSession;

/// Append-only message history for one widget instance.
///
/// Messages are never reordered, edited or removed; `all()` is insertion
/// order, which is also display order.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    session: ConversationSession,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_user(&mut self, content: impl Into<String>) -> &Message {
        self.push(Message::user(content))
    }

    pub fn append_assistant(
        &mut self,
        content: impl Into<String>,
        citations: Vec<Citation>,
    ) -> &Message {
        self.push(Message::assistant(content, citations))
    }

    fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Seeds a previously stored conversation. Only an empty store accepts
    /// history; otherwise it would land behind messages sent in this session.
    pub fn restore(&mut self, history: Vec<Message>) -> bool {
        if !self.messages.is_empty() {
            tracing::warn!(
                "Dropping {} history messages: store already holds {}",
                history.len(),
                self.messages.len()
            );
            return false;
        }
        self.messages = history;
        true
    }

    /// No-op if an id is already set.
    pub fn set_conversation_id(&mut self, id: impl Into<String>) -> bool {
        self.session.set_conversation_id(id)
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.session.conversation_id()
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ConversationSession {
        &mut self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;

    #[test]
    fn all_returns_insertion_order() {
        let mut store = ConversationStore::new();
        store.append_user("a");
        store.append_assistant("b", vec![Citation::new("kb")]);
        store.append_user("c");

        let contents: Vec<&str> = store.all().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["a", "b", "c"]);
        assert_eq!(store.all()[1].role, MessageRole::Assistant);
        assert_eq!(store.all()[1].citations, vec![Citation::new("kb")]);
        assert!(store.all()[0].citations.is_empty());
    }

    #[test]
    fn set_conversation_id_is_first_assignment_wins() {
        let mut store = ConversationStore::new();
        store.set_conversation_id("X");
        store.set_conversation_id("Y");
        assert_eq!(store.conversation_id(), Some("X"));
    }

    #[test]
    fn restore_only_fills_an_empty_store() {
        let mut store = ConversationStore::new();
        assert!(store.restore(vec![Message::user("old")]));
        assert!(!store.restore(vec![Message::user("older")]));
        store.append_user("new");
        let contents: Vec<&str> = store.all().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["old", "new"]);
    }
}
