//! Edges and closure results.

use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::traits::GraphEntity;

use super::entity::Entity;
use super::entity_kind::EntityKind;

/// Which way an edge is followed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Relation {
    /// Entities contained by the subject (direction `Down`)
    Members,
    /// Groups containing the subject (direction `Up`)
    Memberships,
    /// The subject itself, as placed at the head of a view
    Subject,
}

impl Relation {
    /// The relations a closure walk follows, in output order.
    pub const TRAVERSED: [Relation; 2] = [Relation::Members, Relation::Memberships];
}

/// How far an entity is from the subject.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Directness {
    Direct,
    Indirect,
    Subject,
}

/// The direct neighbours of one entity, each list sorted by name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Connections {
    pub members: Vec<Arc<Entity>>,
    pub memberships: Vec<Arc<Entity>>,
}

impl Connections {
    /// Neighbours along `relation`. The subject relation has none.
    pub fn get(&self, relation: Relation) -> &[Arc<Entity>] {
        match relation {
            Relation::Members => &self.members,
            Relation::Memberships => &self.memberships,
            Relation::Subject => &[],
        }
    }
}

/// Connections as remembered on an entity.
///
/// Weak so that two groups listing each other do not keep each other alive
/// once the resolver that owns them is gone.
#[derive(Debug, Clone, Default)]
pub struct EntityLinks {
    members: Vec<Weak<Entity>>,
    memberships: Vec<Weak<Entity>>,
}

impl EntityLinks {
    pub fn upgrade(&self) -> Connections {
        Connections {
            members: self.members.iter().filter_map(Weak::upgrade).collect(),
            memberships: self.memberships.iter().filter_map(Weak::upgrade).collect(),
        }
    }
}

impl From<&Connections> for EntityLinks {
    fn from(connections: &Connections) -> Self {
        EntityLinks {
            members: connections.members.iter().map(Arc::downgrade).collect(),
            memberships: connections.memberships.iter().map(Arc::downgrade).collect(),
        }
    }
}

/// One row of a closure: an entity, the relation it was reached by and its distance.
#[derive(Debug, Clone, Serialize)]
pub struct RelatedEntity {
    pub entity: Arc<Entity>,
    pub relation: Relation,
    pub directness: Directness,
}

impl RelatedEntity {
    pub fn new(entity: Arc<Entity>, relation: Relation, directness: Directness) -> Self {
        RelatedEntity {
            entity,
            relation,
            directness,
        }
    }

    /// The row placed at the head of a view for the entity being inspected.
    pub fn subject(entity: Arc<Entity>) -> Self {
        Self::new(entity, Relation::Subject, Directness::Subject)
    }
}

/// Closure output bucketed by entity kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RelatedEntities {
    pub users: Vec<RelatedEntity>,
    pub groups: Vec<RelatedEntity>,
}

impl RelatedEntities {
    /// Append `related` to the bucket for its kind. Namespaces are not part
    /// of the membership graph and are ignored.
    pub fn push(&mut self, related: RelatedEntity) {
        match related.entity.kind() {
            EntityKind::User => self.users.push(related),
            EntityKind::Group => self.groups.push(related),
            EntityKind::Namespace => {}
        }
    }

    /// Put the subject at the head of its bucket.
    pub fn prepend_subject(&mut self, subject: Arc<Entity>) {
        let row = RelatedEntity::subject(subject);
        match row.entity.kind() {
            EntityKind::User => self.users.insert(0, row),
            EntityKind::Group => self.groups.insert(0, row),
            EntityKind::Namespace => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty()
    }
}
