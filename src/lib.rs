// src/lib.rs
pub use browser::{EntityIndex, GraphResolver};
pub use cache::{CacheKey, FileCache, MemoryCache, ResponseCache, cached_call};
pub use client::{Direction, Endpoints, HttpTransport, RemoteApiClient, Transport, unwrap_collection};
pub use config::BrowserConfig;
pub use error::BrowserError;
pub use traits::GraphEntity;
pub use types::{
    Connections, Directness, Entity, EntityKind, Group, Namespace, NamespaceAction, Relation,
    RelatedEntities, RelatedEntity, User,
};

pub mod browser;
pub mod cache;
pub mod client;
pub mod config;
mod error;
mod timers;
mod traits;
pub mod types;
pub mod views;
