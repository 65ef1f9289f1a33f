//! The polymorphic graph node.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::browser::GraphResolver;
use crate::error::BrowserError;
use crate::traits::GraphEntity;

use super::entity_kind::EntityKind;
use super::group::Group;
use super::namespace::Namespace;
use super::related::{Connections, EntityLinks};
use super::user::User;

/// Any node of the identity graph.
///
/// Entities are ordered by case-sensitive name, which is the order every
/// sorted listing uses.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    Namespace(Namespace),
    Group(Group),
    User(User),
}

impl Entity {
    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Entity::Namespace(namespace) => Some(namespace),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Entity::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Entity::User(user) => Some(user),
            _ => None,
        }
    }

    /// Direct members and memberships, loaded through `resolver` on first
    /// use and remembered on this entity afterwards.
    pub fn connections(&self, resolver: &GraphResolver) -> Result<Connections, BrowserError> {
        let (descriptor, links) = self.link_slot()?;
        let links = links.get_or_try_init(|| {
            resolver
                .get_entity_connections(descriptor)
                .map(|connections| EntityLinks::from(&connections))
        })?;
        Ok(links.upgrade())
    }

    /// Entities that belong to this one, sorted by name.
    pub fn members(&self, resolver: &GraphResolver) -> Result<Vec<Arc<Entity>>, BrowserError> {
        Ok(self.connections(resolver)?.members)
    }

    /// Groups this entity belongs to, sorted by name.
    pub fn groups(&self, resolver: &GraphResolver) -> Result<Vec<Arc<Entity>>, BrowserError> {
        Ok(self.connections(resolver)?.memberships)
    }

    fn link_slot(&self) -> Result<(&str, &OnceCell<EntityLinks>), BrowserError> {
        match self {
            Entity::Group(group) => Ok((self.descriptor().unwrap_or_default(), group.links())),
            Entity::User(user) => Ok((self.descriptor().unwrap_or_default(), user.links())),
            Entity::Namespace(namespace) => Err(BrowserError::MissingDescriptor(format!(
                "cannot get connections for namespace '{}'",
                namespace.name()
            ))),
        }
    }
}

/// Dispatch the GraphEntity trait to the wrapped type.
impl GraphEntity for Entity {
    fn kind(&self) -> EntityKind {
        match self {
            Entity::Namespace(namespace) => namespace.kind(),
            Entity::Group(group) => group.kind(),
            Entity::User(user) => user.kind(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Entity::Namespace(namespace) => namespace.name(),
            Entity::Group(group) => group.name(),
            Entity::User(user) => user.name(),
        }
    }

    fn descriptor(&self) -> Option<&str> {
        match self {
            Entity::Namespace(namespace) => namespace.descriptor(),
            Entity::Group(group) => group.descriptor(),
            Entity::User(user) => user.descriptor(),
        }
    }

    fn display_name(&self) -> &str {
        match self {
            Entity::Namespace(namespace) => namespace.display_name(),
            Entity::Group(group) => group.display_name(),
            Entity::User(user) => user.display_name(),
        }
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Entity::Namespace(namespace) => write!(f, "{namespace}"),
            Entity::Group(group) => write!(f, "{group}"),
            Entity::User(user) => write!(f, "{user}"),
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entity {}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Name first; descriptor and kind only break ties so Ord stays consistent with Eq.
impl Ord for Entity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name()
            .cmp(other.name())
            .then_with(|| self.descriptor().cmp(&other.descriptor()))
            .then_with(|| self.kind().cmp(&other.kind()))
    }
}
