use super::*;
use crate::tests::fixtures::{GraphFixture, StaticTransport};
use serde_json::json;
use yare::parameterized;


const WINDOWS_LIVE: &str = "Windows Live ID";

/// Users U and V, groups A, B, C; U ∈ A, A ∈ B, V ∈ B.
fn chain_fixture() -> GraphFixture {
    GraphFixture::new()
        .namespace("1", "Git Repositories")
        .namespace("2", "Analytics")
        .group("vssgp.A", "[contoso]\\A")
        .group("vssgp.B", "[contoso]\\B")
        .group("vssgp.C", "[contoso]\\C")
        .user("msa.U", "ursula@contoso.com", WINDOWS_LIVE)
        .user("msa.V", "victor@contoso.com", WINDOWS_LIVE)
        .member_of("msa.U", "vssgp.A")
        .member_of("vssgp.A", "vssgp.B")
        .member_of("msa.V", "vssgp.B")
}

fn names(entities: &[Arc<Entity>]) -> Vec<&str> {
    entities.iter().map(|e| e.name()).collect()
}

#[test]
fn test_get_namespace_by_name() {
    let transport = Arc::new(StaticTransport::new());
    transport.insert(
        "mem://contoso/namespaces",
        json!([{"namespaceId": "1", "name": "Git Repositories", "actions": []}]),
    );
    let api = RemoteApiClient::new("contoso", transport, Arc::new(crate::cache::MemoryCache::new()))
        .with_endpoints(StaticTransport::endpoints());
    let resolver = GraphResolver::new(api, WINDOWS_LIVE);

    let namespace = resolver.get_namespace("Git Repositories").unwrap();
    assert_eq!(namespace.as_namespace().unwrap().namespace_id(), "1");
    assert_eq!(namespace.kind(), EntityKind::Namespace);

    assert_eq!(
        resolver.get_namespace("Nonexistent").unwrap_err(),
        BrowserError::NotFound("namespace 'Nonexistent'".to_string())
    );
}

#[test]
fn test_sorted_namespaces() {
    let (resolver, _) = chain_fixture().resolver();
    let namespaces = resolver.get_sorted_namespaces().unwrap();
    assert_eq!(names(&namespaces), vec!["Analytics", "Git Repositories"]);
}

#[test]
fn test_index_loading_is_idempotent() {
    let (resolver, transport) = chain_fixture().resolver();

    let first = resolver.get_groups().unwrap() as *const EntityIndex;
    for _ in 0..5 {
        let again = resolver.get_groups().unwrap();
        assert!(std::ptr::eq(first, again));
        resolver.get_users().unwrap();
        resolver.get_namespaces().unwrap();
    }

    assert_eq!(transport.call_count("mem://contoso/groups"), 1);
    assert_eq!(transport.call_count("mem://contoso/users"), 1);
    assert_eq!(transport.call_count("mem://contoso/namespaces"), 1);
}

#[test]
fn test_lookup_loads_both_tables_once() {
    let (resolver, transport) = chain_fixture().resolver();
    assert!(transport.calls().is_empty());

    assert!(resolver.lookup("msa.U").unwrap().is_some());
    assert!(resolver.lookup("vssgp.C").unwrap().is_some());
    assert_eq!(transport.call_count("mem://contoso/groups"), 1);
    assert_eq!(transport.call_count("mem://contoso/users"), 1);
    assert_eq!(resolver.tables_loaded.load(Ordering::Acquire), 2);
}

#[parameterized(
    group_a = { "vssgp.A", Some(EntityKind::Group) },
    group_c = { "vssgp.C", Some(EntityKind::Group) },
    user_u = { "msa.U", Some(EntityKind::User) },
    user_v = { "msa.V", Some(EntityKind::User) },
    unknown = { "aadsp.service", None },
    namespace_name = { "Git Repositories", None },
)]
fn test_lookup_completeness(descriptor: &str, expected: Option<EntityKind>) {
    let (resolver, _) = chain_fixture().resolver();
    let found = resolver.lookup(descriptor).unwrap();
    assert_eq!(found.map(|e| e.kind()), expected);
}

#[test]
fn test_lookup_never_fetches_single_descriptors() {
    let (resolver, transport) = chain_fixture().resolver();
    assert!(resolver.lookup("aadsp.service").unwrap().is_none());
    assert!(resolver.lookup("aadsp.service").unwrap().is_none());
    assert_eq!(transport.calls().len(), 2);
}

#[test]
fn test_lookup_table_merges_groups_and_users() {
    let (resolver, _) = chain_fixture().resolver();
    let table = resolver.lookup_table().unwrap();
    assert_eq!(
        table.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["msa.U", "msa.V", "vssgp.A", "vssgp.B", "vssgp.C"]
    );
}

#[test]
fn test_get_group_and_user() {
    let (resolver, _) = chain_fixture().resolver();
    assert_eq!(resolver.get_group("vssgp.B").unwrap().name(), "[contoso]\\B");
    assert_eq!(resolver.get_user("msa.V").unwrap().name(), "victor@contoso.com");

    assert!(matches!(resolver.get_group("msa.V"), Err(BrowserError::NotFound(_))));
    assert!(matches!(resolver.get_user("vssgp.B"), Err(BrowserError::NotFound(_))));
}

#[test]
fn test_sorted_users_filters_domain() {
    let fixture = GraphFixture::new()
        .user("msa.c", "carol@contoso.com", WINDOWS_LIVE)
        .user("svc.build", "Project Collection Build Service", "Build")
        .user("msa.a", "alice@contoso.com", WINDOWS_LIVE)
        .user("aad.b", "bob@contoso.com", "AgentPool")
        .user("msa.B", "Bruno@contoso.com", WINDOWS_LIVE);
    let (resolver, _) = fixture.resolver();

    let users = resolver.get_sorted_users().unwrap();
    assert_eq!(
        names(&users),
        vec!["Bruno@contoso.com", "alice@contoso.com", "carol@contoso.com"]
    );
    assert_eq!(resolver.get_users().unwrap().len(), 5);
}

#[test]
fn test_sorted_groups() {
    let fixture = GraphFixture::new()
        .group("vssgp.3", "[contoso]\\Readers")
        .group("vssgp.1", "[contoso]\\Contributors")
        .group("vssgp.2", "[contoso]\\Project Administrators");
    let (resolver, _) = fixture.resolver();
    assert_eq!(
        names(&resolver.get_sorted_groups().unwrap()),
        vec![
            "[contoso]\\Contributors",
            "[contoso]\\Project Administrators",
            "[contoso]\\Readers"
        ]
    );
}

#[test]
fn test_malformed_record_is_upstream_error() {
    let transport = Arc::new(StaticTransport::new());
    transport.insert("mem://contoso/groups", json!([{"displayName": "no descriptor"}]));
    let api = RemoteApiClient::new("contoso", transport, Arc::new(crate::cache::MemoryCache::new()))
        .with_endpoints(StaticTransport::endpoints());
    let resolver = GraphResolver::new(api, WINDOWS_LIVE);

    let err = resolver.get_groups().unwrap_err();
    assert!(matches!(err, BrowserError::Upstream(msg) if msg.contains("malformed group record")));
}

#[test]
fn test_failed_load_is_retried() {
    let transport = Arc::new(StaticTransport::new());
    let api = RemoteApiClient::new("contoso", transport.clone(), Arc::new(crate::cache::MemoryCache::new()))
        .with_endpoints(StaticTransport::endpoints());
    let resolver = GraphResolver::new(api, WINDOWS_LIVE);

    assert!(resolver.get_users().is_err());
    transport.insert("mem://contoso/users", json!({"count": 0, "value": []}));
    assert!(resolver.get_users().unwrap().is_empty());
    assert_eq!(resolver.tables_loaded.load(Ordering::Acquire), 1);
}

#[test]
fn test_resolver_is_shareable_across_threads() {
    let (resolver, transport) = chain_fixture().resolver();
    let resolver = Arc::new(resolver);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            std::thread::spawn(move || resolver.lookup("msa.U").unwrap().is_some())
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(transport.call_count("mem://contoso/groups"), 1);
}
