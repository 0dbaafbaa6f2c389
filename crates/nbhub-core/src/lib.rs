pub mod actions;
pub mod config;
pub mod guard;
pub mod models;
pub mod persistence;
pub mod reducer;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;

pub use actions::*;
pub use reducer::*;
pub use state::*;

pub use config::AppConfig;
pub use config::ConfigError;
pub use guard::GuardDecision;
pub use guard::GuardInput;
pub use persistence::*;
pub use session::AuthScheme;
pub use session::SessionContext;
pub use store::Store;
pub use store::StoreHandle;
