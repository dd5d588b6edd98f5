//! These models represent the state owned by the conversation store
//!
//! Messages are created once per turn from a [`message::MessageDraft`] and then
//! only mutated through the store, which is the single owner of every
//! conversation. Stream snapshots never live here; they are ephemeral and are
//! folded into the last message of the active conversation.
pub mod conversation;
pub mod message;
pub mod role;
