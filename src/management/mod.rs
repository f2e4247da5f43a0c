mod analysis;
mod auth;
mod history;
mod mood;
mod session;
pub mod store;

pub use analysis::AnalysisCache;
pub use auth::TokenEndpoint;
pub use auth::TokenStore;
pub use history::PlayHistoryTracker;
pub use mood::MoodTargetStore;
pub use session::SessionLocks;
pub use session::SessionManager;
pub use store::FileStore;
pub use store::KeyValueStore;
pub use store::MemoryStore;
