//! Groups of the identity graph.

use std::fmt::{Display, Formatter, Result as FmtResult};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::traits::GraphEntity;

use super::entity_kind::EntityKind;
use super::related::EntityLinks;

/// A group, identified by its descriptor (e.g. `vssgp.Uy0xLTkt...`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    descriptor: String,
    #[serde(rename = "principalName")]
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(skip)]
    links: OnceCell<EntityLinks>,
}

impl Group {
    pub fn new(
        descriptor: impl Into<String>,
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Group {
            descriptor: descriptor.into(),
            name: name.into(),
            display_name: display_name.into(),
            description,
            links: OnceCell::new(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn links(&self) -> &OnceCell<EntityLinks> {
        &self.links
    }
}

impl GraphEntity for Group {
    fn kind(&self) -> EntityKind {
        EntityKind::Group
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> Option<&str> {
        Some(&self.descriptor)
    }

    fn display_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor == other.descriptor && self.name == other.name
    }
}

impl Eq for Group {}

impl Display for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Group::\"{}\"", self.name)
    }
}
