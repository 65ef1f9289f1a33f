//! User accounts of the identity graph.

use std::fmt::{Display, Formatter, Result as FmtResult};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::traits::GraphEntity;

use super::entity_kind::EntityKind;
use super::related::EntityLinks;

/// A user account, identified by its descriptor (e.g. `msa.ZjYxZTU0...`).
///
/// `domain` tells interactive logins apart from service and build identities.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    descriptor: String,
    #[serde(rename = "principalName")]
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    domain: String,
    #[serde(skip)]
    links: OnceCell<EntityLinks>,
}

impl User {
    pub fn new(
        descriptor: impl Into<String>,
        name: impl Into<String>,
        display_name: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        User {
            descriptor: descriptor.into(),
            name: name.into(),
            display_name: display_name.into(),
            domain: domain.into(),
            links: OnceCell::new(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub(crate) fn links(&self) -> &OnceCell<EntityLinks> {
        &self.links
    }
}

impl GraphEntity for User {
    fn kind(&self) -> EntityKind {
        EntityKind::User
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

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor == other.descriptor && self.name == other.name
    }
}

impl Eq for User {}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "User::\"{}\"", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_from_record() {
        let record = json!({
            "subjectKind": "user",
            "domain": "Windows Live ID",
            "principalName": "alice@contoso.com",
            "mailAddress": "alice@contoso.com",
            "origin": "msa",
            "displayName": "Alice",
            "descriptor": "msa.YWxpY2U"
        });
        let user: User = serde_json::from_value(record).unwrap();
        assert_eq!(user.descriptor(), Some("msa.YWxpY2U"));
        assert_eq!(user.name(), "alice@contoso.com");
        assert_eq!(user.display_name(), "Alice");
        assert_eq!(user.domain(), "Windows Live ID");
        assert_eq!(user.kind(), EntityKind::User);
    }

    #[test]
    fn test_user_requires_principal_name() {
        let result = serde_json::from_value::<User>(json!({"descriptor": "msa.x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_user_display() {
        let user = User::new("msa.YWxpY2U", "alice@contoso.com", "Alice", "Windows Live ID");
        insta::assert_snapshot!(user.to_string(), @r#"User::"alice@contoso.com""#);
    }

    #[test]
    fn test_user_equality_by_identity() {
        let a = User::new("msa.a", "alice", "Alice", "Windows Live ID");
        let b = User::new("msa.a", "alice", "Alice Renamed", "Windows Live ID");
        let c = User::new("msa.c", "alice", "Alice", "Windows Live ID");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
