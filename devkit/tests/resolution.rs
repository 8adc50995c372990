use vmowner_core::{
    resolve_host_users, resolve_inventory, Directory, GroupNaming, Inventory, UserSource,
};
use vmowner_devkit::fixtures::{self, user};
use vmowner_devkit::MockDirectory;

const MIXED: &str = r#"
all:
  hosts:
    web01:
    web02:
      override: true
      machine_users: [bob]
"#;

const GLOBAL: &str = r#"
all:
  hosts:
    web01:
    web02:
      override: true
      machine_users: [bob]
    web03:
      override: false
  vars:
    override: true
    machine_users: [carol]
"#;

fn directory() -> MockDirectory {
    MockDirectory::new()
        .with_users([user("alice"), user("bob"), user("carol")])
        .with_group("security_web01_Access", &["alice", "bob"])
        .with_group("security_web02_Access", &["alice"])
        .with_group("security_web03_Access", &["alice"])
}

#[tokio::test]
async fn group_members_used_without_overrides() {
    fixtures::init_tracing();
    let inv = Inventory::from_yaml_str("all:\n  hosts:\n    web01:\n    web03:\n").unwrap();
    let dir = directory();
    let naming = GroupNaming::default();

    for host in &inv.hosts {
        let resolution = resolve_host_users(&dir, &naming, &inv, host).await.unwrap();
        let group = dir.group_members(&naming.group_for(&host.id)).await.unwrap();
        assert_eq!(resolution.source, UserSource::Group);
        assert_eq!(resolution.users, group);
    }
}

#[tokio::test]
async fn host_override_bypasses_group_lookup() {
    let inv = Inventory::from_yaml_str(MIXED).unwrap();
    let dir = directory();
    let naming = GroupNaming::default();

    let web01 = resolve_host_users(&dir, &naming, &inv, inv.host("web01").unwrap()).await.unwrap();
    assert_eq!(web01.users, vec!["alice", "bob"]);

    let web02 = resolve_host_users(&dir, &naming, &inv, inv.host("web02").unwrap()).await.unwrap();
    assert_eq!(web02.source, UserSource::HostOverride);
    assert_eq!(web02.users, vec!["bob"]);

    assert_eq!(dir.group_lookups(), vec!["security_web01_Access"]);
}

#[tokio::test]
async fn global_override_dominates_every_host() {
    let inv = Inventory::from_yaml_str(GLOBAL).unwrap();
    let dir = directory();
    let naming = GroupNaming::default();

    for host in &inv.hosts {
        let resolution = resolve_host_users(&dir, &naming, &inv, host).await.unwrap();
        assert_eq!(resolution.source, UserSource::GlobalOverride, "{}", host.id);
        assert_eq!(resolution.users, vec!["carol"]);
    }
    assert!(dir.group_lookups().is_empty());
}

#[tokio::test]
async fn missing_group_contributes_nothing() {
    let inv = Inventory::from_yaml_str("all:\n  hosts:\n    orphan01:\n    web01:\n").unwrap();
    let dir = directory();

    let resolved = resolve_inventory(&dir, &GroupNaming::default(), &inv).await.unwrap();
    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved[0].host, "orphan01");
    assert!(resolved[0].users.is_empty());
    assert_eq!(resolved[1].users.len(), 2);
}

#[tokio::test]
async fn members_given_as_dns_are_looked_up_by_dn() {
    let alice = user("alice");
    let dir = MockDirectory::new()
        .with_user(alice.clone())
        .with_group_of("security_web01_Access", &[&alice]);
    let inv = Inventory::from_yaml_str("all:\n  hosts:\n    web01:\n").unwrap();

    let resolved = resolve_inventory(&dir, &GroupNaming::default(), &inv).await.unwrap();
    assert_eq!(resolved[0].users, vec![alice]);
}

#[tokio::test]
async fn unknown_user_aborts_resolution() {
    let inv = Inventory::from_yaml_str(
        r#"
all:
  vars:
    override: true
    machine_users: [ghost]
  hosts:
    web01:
"#,
    )
    .unwrap();
    let err = resolve_inventory(&directory(), &GroupNaming::default(), &inv)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ghost"));
}

#[tokio::test]
async fn custom_group_pattern() {
    let dir = MockDirectory::new()
        .with_user(user("erin"))
        .with_group("vm-db01-users", &["erin"]);
    let inv = Inventory::from_yaml_str("all:\n  hosts:\n    db01:\n").unwrap();

    let resolved = resolve_inventory(&dir, &GroupNaming::new("vm-{host}-users"), &inv)
        .await
        .unwrap();
    assert_eq!(resolved[0].users[0].account_name.as_deref(), Some("erin"));
}
