//! Data model for the identity graph.
//!
//! Upstream record shapes:
//! - Namespace: `{namespaceId, name, actions: [{bit, name, displayName, namespaceId}]}`
//! - Group: `{descriptor, principalName, displayName, description}`
//! - User: `{descriptor, principalName, displayName, domain}`
//!
//! Unknown record fields are ignored.

mod entity;
mod entity_kind;
mod group;
mod namespace;
mod related;
mod user;

pub use entity::Entity;
pub use entity_kind::EntityKind;
pub use group::Group;
pub use namespace::{Namespace, NamespaceAction};
pub use related::{
    Connections, Directness, EntityLinks, Relation, RelatedEntities, RelatedEntity,
};
pub use user::User;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::BrowserError;

/// Decode one upstream record, reporting shape errors as upstream failures.
pub(crate) fn from_record<T: DeserializeOwned>(
    kind: EntityKind,
    record: Value,
) -> Result<T, BrowserError> {
    serde_json::from_value(record)
        .map_err(|e| BrowserError::Upstream(format!("malformed {kind} record: {e}")))
}
