//! Entity kind names.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// The kinds of node in the identity graph.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    /// A security namespace (e.g. `Git Repositories`)
    Namespace,
    /// A group (e.g. `[contoso]\Project Collection Administrators`)
    Group,
    /// A user account
    User,
}
