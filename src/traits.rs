use crate::types::EntityKind;

/// The capability set shared by every node of the identity graph.
pub trait GraphEntity {
    /// Which kind of entity this is
    fn kind(&self) -> EntityKind;

    /// The principal name, used for display ordering
    fn name(&self) -> &str;

    /// The stable descriptor, if the kind has one (namespaces do not)
    fn descriptor(&self) -> Option<&str> {
        None
    }

    /// Human-facing label, the principal name unless the record carries a better one
    fn display_name(&self) -> &str {
        self.name()
    }
}
