//! Read-only projections for inspecting the graph.

use std::sync::Arc;

use serde::Serialize;

use crate::browser::GraphResolver;
use crate::error::BrowserError;
use crate::types::{Directness, Entity, Relation, RelatedEntities, RelatedEntity};

/// An entity (if known) and the rows shown around it.
#[derive(Debug, Clone, Serialize)]
pub struct EntityView {
    pub subject: Option<Arc<Entity>>,
    pub users: Vec<RelatedEntity>,
    pub groups: Vec<RelatedEntity>,
}

impl EntityView {
    fn new(subject: Option<Arc<Entity>>, related: RelatedEntities) -> Self {
        EntityView {
            subject,
            users: related.users,
            groups: related.groups,
        }
    }
}

/// The landing listing: interactive users, groups and namespaces, each sorted by name.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub users: Vec<Arc<Entity>>,
    pub groups: Vec<Arc<Entity>>,
    pub namespaces: Vec<Arc<Entity>>,
}

pub fn overview(resolver: &GraphResolver) -> Result<Overview, BrowserError> {
    Ok(Overview {
        users: resolver.get_sorted_users()?,
        groups: resolver.get_sorted_groups()?,
        namespaces: resolver.get_sorted_namespaces()?,
    })
}

/// Full closure of `descriptor` with the subject at the head of its bucket.
///
/// A descriptor outside the loaded collections still gets its closure, with
/// no subject row.
pub fn entity_view(resolver: &GraphResolver, descriptor: &str) -> Result<EntityView, BrowserError> {
    let subject = resolver.lookup(descriptor)?;
    let mut related = resolver.get_related_entities(descriptor)?;
    if let Some(subject) = &subject {
        related.prepend_subject(subject.clone());
    }
    Ok(EntityView::new(subject, related))
}

/// A group with its direct memberships and direct members only.
///
/// The group and its memberships fill `groups`; every direct member fills
/// `users`, nested groups included.
pub fn group_view(resolver: &GraphResolver, descriptor: &str) -> Result<EntityView, BrowserError> {
    let group = resolver.get_group(descriptor)?;
    let connections = resolver.get_entity_connections(descriptor)?;

    let direct = |relation: Relation| {
        connections
            .get(relation)
            .iter()
            .map(move |entity| RelatedEntity::new(entity.clone(), relation, Directness::Direct))
    };
    let related = RelatedEntities {
        users: direct(Relation::Members).collect(),
        groups: std::iter::once(RelatedEntity::subject(group.clone()))
            .chain(direct(Relation::Memberships))
            .collect(),
    };
    Ok(EntityView::new(Some(group), related))
}

/// A user and every group it belongs to, directly or not.
pub fn user_view(resolver: &GraphResolver, descriptor: &str) -> Result<EntityView, BrowserError> {
    let user = resolver.get_user(descriptor)?;
    let closure = resolver.get_related_entities(descriptor)?;

    let mut related = RelatedEntities {
        users: vec![RelatedEntity::subject(user.clone())],
        groups: Vec::new(),
    };
    related.groups = closure
        .groups
        .into_iter()
        .filter(|row| row.relation == Relation::Memberships)
        .collect();
    Ok(EntityView::new(Some(user), related))
}
