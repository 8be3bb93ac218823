pub mod conversation_store;
pub mod session;

pub use conversation_store::ConversationStore;
pub use session::ConversationSession;
