pub mod client;
pub mod contracts;
pub mod creators;
pub mod endpoints;

pub use client::ClientBuildError;
pub use client::HttpClient;
pub use client::ReqwestClient;
pub use contracts::*;
pub use creators::AppContext;
pub use creators::Outcome;
pub use endpoints::Endpoints;
