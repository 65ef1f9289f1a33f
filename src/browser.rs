use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use itertools::Itertools;
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::FileCache;
use crate::client::{Direction, HttpTransport, RemoteApiClient};
use crate::config::BrowserConfig;
use crate::error::BrowserError;
use crate::traits::GraphEntity;
use crate::types::{
    Connections, Directness, Entity, EntityKind, Group, Namespace, Relation, RelatedEntities,
    RelatedEntity, User, from_record,
};

/// Entities keyed by name (namespaces) or descriptor (groups, users).
pub type EntityIndex = HashMap<String, Arc<Entity>>;

/// Number of indices that feed the lookup table (groups and users).
const LOOKUP_SOURCES: usize = 2;

/// Resolves descriptors to entities and walks the membership graph.
///
/// The namespace, group and user indices are built on first use and kept for
/// the resolver's lifetime. Group and user entries are merged into a single
/// lookup table as each index loads; a descriptor outside both collections
/// never triggers a fetch of its own.
pub struct GraphResolver {
    api: RemoteApiClient,
    interactive_domain: String,
    namespaces: OnceCell<EntityIndex>,
    groups: OnceCell<EntityIndex>,
    users: OnceCell<EntityIndex>,
    lookup_table: RwLock<EntityIndex>,
    tables_loaded: AtomicUsize,
}

impl GraphResolver {
    /// `interactive_domain` is the user domain of human logins (e.g. `Windows Live ID`).
    pub fn new(api: RemoteApiClient, interactive_domain: impl Into<String>) -> Self {
        GraphResolver {
            api,
            interactive_domain: interactive_domain.into(),
            namespaces: OnceCell::new(),
            groups: OnceCell::new(),
            users: OnceCell::new(),
            lookup_table: RwLock::new(HashMap::new()),
            tables_loaded: AtomicUsize::new(0),
        }
    }

    /// Wire a resolver to the live API with a file cache, as configured.
    pub fn from_config(config: &BrowserConfig) -> Result<Self, BrowserError> {
        let cache = FileCache::open(&config.cache_dir)?;
        let transport =
            HttpTransport::new(&config.token, config.timeout(), config.connect_timeout())?;
        let api = RemoteApiClient::new(&config.organization, Arc::new(transport), Arc::new(cache))
            .with_endpoints(config.endpoints.clone())
            .with_ttls(config.request_ttl(), config.collection_ttl());
        Ok(Self::new(api, &config.interactive_domain))
    }

    /// Resolve a group or user descriptor, loading both collections first if needed.
    pub fn lookup(&self, descriptor: &str) -> Result<Option<Arc<Entity>>, BrowserError> {
        if self.tables_loaded.load(Ordering::Acquire) < LOOKUP_SOURCES {
            self.get_groups()?;
            self.get_users()?;
        }
        Ok(self.lookup_table.read()?.get(descriptor).cloned())
    }

    /// Every group and user, keyed by descriptor.
    pub fn lookup_table(&self) -> Result<BTreeMap<String, Arc<Entity>>, BrowserError> {
        self.get_groups()?;
        self.get_users()?;
        let table = self.lookup_table.read()?;
        Ok(table
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    pub fn get_namespaces(&self) -> Result<&EntityIndex, BrowserError> {
        self.namespaces.get_or_try_init(|| -> Result<EntityIndex, BrowserError> {
            let index = self
                .api
                .get_namespaces()?
                .into_iter()
                .map(|record| -> Result<(String, Arc<Entity>), BrowserError> {
                    let namespace: Namespace = from_record(EntityKind::Namespace, record)?;
                    Ok((namespace.name().to_string(), Arc::new(Entity::Namespace(namespace))))
                })
                .collect::<Result<EntityIndex, BrowserError>>()?;
            info!(event = "Index", phase = "Namespaces", count = index.len());
            Ok(index)
        })
    }

    pub fn get_namespace(&self, name: &str) -> Result<Arc<Entity>, BrowserError> {
        self.get_namespaces()?
            .get(name)
            .cloned()
            .ok_or_else(|| BrowserError::NotFound(format!("namespace '{name}'")))
    }

    pub fn get_sorted_namespaces(&self) -> Result<Vec<Arc<Entity>>, BrowserError> {
        Ok(self.get_namespaces()?.values().cloned().sorted().collect())
    }

    pub fn get_groups(&self) -> Result<&EntityIndex, BrowserError> {
        self.groups.get_or_try_init(|| -> Result<EntityIndex, BrowserError> {
            let index = self.load_descriptor_index(self.api.get_groups()?, |record| {
                from_record::<Group>(EntityKind::Group, record).map(Entity::Group)
            })?;
            info!(event = "Index", phase = "Groups", count = index.len());
            Ok(index)
        })
    }

    pub fn get_group(&self, descriptor: &str) -> Result<Arc<Entity>, BrowserError> {
        self.get_groups()?
            .get(descriptor)
            .cloned()
            .ok_or_else(|| BrowserError::NotFound(format!("group '{descriptor}'")))
    }

    pub fn get_sorted_groups(&self) -> Result<Vec<Arc<Entity>>, BrowserError> {
        Ok(self.get_groups()?.values().cloned().sorted().collect())
    }

    pub fn get_users(&self) -> Result<&EntityIndex, BrowserError> {
        self.users.get_or_try_init(|| -> Result<EntityIndex, BrowserError> {
            let index = self.load_descriptor_index(self.api.get_users()?, |record| {
                from_record::<User>(EntityKind::User, record).map(Entity::User)
            })?;
            info!(event = "Index", phase = "Users", count = index.len());
            Ok(index)
        })
    }

    pub fn get_user(&self, descriptor: &str) -> Result<Arc<Entity>, BrowserError> {
        self.get_users()?
            .get(descriptor)
            .cloned()
            .ok_or_else(|| BrowserError::NotFound(format!("user '{descriptor}'")))
    }

    /// Users logging in through the interactive domain, sorted by name.
    pub fn get_sorted_users(&self) -> Result<Vec<Arc<Entity>>, BrowserError> {
        Ok(self
            .get_users()?
            .values()
            .filter(|entity| {
                entity
                    .as_user()
                    .is_some_and(|user| user.domain() == self.interactive_domain)
            })
            .cloned()
            .sorted()
            .collect())
    }

    /// Build a descriptor index and merge it into the lookup table.
    fn load_descriptor_index<F>(
        &self,
        records: Vec<Value>,
        build: F,
    ) -> Result<EntityIndex, BrowserError>
    where
        F: Fn(Value) -> Result<Entity, BrowserError>,
    {
        let mut index = EntityIndex::with_capacity(records.len());
        for record in records {
            let entity = build(record)?;
            let Some(descriptor) = entity.descriptor().map(str::to_string) else {
                continue;
            };
            index.insert(descriptor, Arc::new(entity));
        }

        self.lookup_table.write()?.extend(
            index
                .iter()
                .map(|(descriptor, entity)| (descriptor.clone(), entity.clone())),
        );
        self.tables_loaded.fetch_add(1, Ordering::AcqRel);
        Ok(index)
    }

    /// Direct members and memberships of `descriptor`, each sorted by name.
    ///
    /// Edges pointing at descriptors outside the group and user collections
    /// (service principals, for instance) are dropped.
    pub fn get_entity_connections(&self, descriptor: &str) -> Result<Connections, BrowserError> {
        let memberships = self.api.get_entity_memberships(descriptor)?;
        let members = self.api.get_entity_members(descriptor)?;

        let (down, up) = (Direction::Down.target_field(), Direction::Up.target_field());

        Ok(Connections {
            members: self.resolve_edges(descriptor, members, down)?,
            memberships: self.resolve_edges(descriptor, memberships, up)?,
        })
    }

    fn resolve_edges(
        &self,
        subject: &str,
        records: Vec<Value>,
        field: &str,
    ) -> Result<Vec<Arc<Entity>>, BrowserError> {
        let mut resolved = Vec::with_capacity(records.len());
        for record in records {
            let Some(target) = record.get(field).and_then(Value::as_str) else {
                return Err(BrowserError::Upstream(format!(
                    "membership record for '{subject}' has no '{field}'"
                )));
            };
            match self.lookup(target)? {
                Some(entity) => resolved.push(entity),
                None => debug!(
                    event = "Connections",
                    phase = "Unresolved",
                    subject,
                    field,
                    target
                ),
            }
        }
        resolved.sort();
        Ok(resolved)
    }

    /// Everything reachable from `descriptor` along members and along
    /// memberships, split into users and groups.
    ///
    /// The first hop is tagged direct, every later hop indirect. Each entity
    /// appears at most once per relation and the subject never appears, so a
    /// cycle in the upstream graph ends the walk instead of recursing forever.
    pub fn get_related_entities(&self, descriptor: &str) -> Result<RelatedEntities, BrowserError> {
        let connections = self.get_entity_connections(descriptor)?;
        let mut related = RelatedEntities::default();

        for relation in Relation::TRAVERSED {
            let direct = connections.get(relation);
            let mut visited: HashSet<String> = direct
                .iter()
                .filter_map(|entity| entity.descriptor())
                .chain([descriptor])
                .map(str::to_string)
                .collect();

            for entity in direct.iter().filter(|e| e.descriptor() != Some(descriptor)) {
                self.walk(entity, relation, Directness::Direct, &mut visited, &mut related)?;
            }
        }

        debug!(
            event = "Closure",
            phase = "Done",
            descriptor,
            users = related.users.len(),
            groups = related.groups.len()
        );
        Ok(related)
    }

    fn walk(
        &self,
        entity: &Arc<Entity>,
        relation: Relation,
        directness: Directness,
        visited: &mut HashSet<String>,
        related: &mut RelatedEntities,
    ) -> Result<(), BrowserError> {
        related.push(RelatedEntity::new(entity.clone(), relation, directness));

        let connections = entity.connections(self)?;
        for next in connections.get(relation) {
            let Some(next_descriptor) = next.descriptor() else {
                continue;
            };
            if !visited.insert(next_descriptor.to_string()) {
                debug!(
                    event = "Closure",
                    phase = "Revisit",
                    from = entity.descriptor(),
                    to = next_descriptor,
                    relation = relation.as_ref()
                );
                continue;
            }
            self.walk(next, relation, Directness::Indirect, visited, related)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
