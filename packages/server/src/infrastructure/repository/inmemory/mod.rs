pub mod chat_store;
pub mod room;

pub use chat_store::InMemoryChatStore;
pub use room::InMemoryRoomRepository;
