//! Security namespaces and their permission actions.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::traits::GraphEntity;

use super::entity_kind::EntityKind;

/// One permission bit defined by a namespace (e.g. `GenericRead`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceAction {
    #[serde(default)]
    pub bit: u64,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub namespace_id: String,
}

/// A named category of permission actions. Keyed by name, not descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    namespace_id: String,
    name: String,
    #[serde(default)]
    actions: Vec<NamespaceAction>,
}

impl Namespace {
    pub fn new(
        namespace_id: impl Into<String>,
        name: impl Into<String>,
        actions: Vec<NamespaceAction>,
    ) -> Self {
        Namespace {
            namespace_id: namespace_id.into(),
            name: name.into(),
            actions,
        }
    }

    pub fn namespace_id(&self) -> &str {
        &self.namespace_id
    }

    pub fn actions(&self) -> &[NamespaceAction] {
        &self.actions
    }
}

impl GraphEntity for Namespace {
    fn kind(&self) -> EntityKind {
        EntityKind::Namespace
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Namespace::\"{}\"", self.name)
    }
}
