use yangson::context::{Context, EmbeddedModules};
use yangson::schema::{DefaultDeny, SchemaNodeKind};
use yangson::value::Value;
use yangson::Error;

mod common;
use common::create_context;

#[test]
fn schema_traverse() {
    let ctx = create_context();

    assert_eq!(
        ctx.traverse()
            .map(|snode| snode.path())
            .collect::<Vec<String>>(),
        vec![
            "/example-server:servers",
            "/example-server:servers/server",
            "/example-server:servers/server/name",
            "/example-server:servers/server/port",
            "/example-server:servers/server/proto",
            "/example-server:servers/server/ttl",
            "/example-server:servers/alias",
            "/example-server:servers/active",
            "/example-server:servers/example-extra:monitor",
            "/example-server:creds",
            "/example-server:creds/id",
            "/example-server:state-data",
            "/example-server:state-data/uptime",
            "/example-server:limits",
            "/example-server:limits/ttl",
            "/example-server:tuning",
            "/example-server:tuning/transport",
            "/example-server:tuning/transport/tcp-opts",
            "/example-server:tuning/transport/tcp-opts/mss",
            "/example-server:tuning/transport/udp-opts",
            "/example-server:tuning/transport/udp-opts/dscp",
            "/example-server:fallback",
            "/example-server:fallback/port",
            "/example-server:fallback/backup-port",
            "/example-server:tags",
        ]
    );
}

#[test]
fn schema_node_attributes() {
    let ctx = create_context();
    let root = ctx.schema();

    let servers = root
        .get_data_child("servers", Some("example-server"))
        .expect("Failed to lookup schema node");
    assert_eq!(servers.kind(), SchemaNodeKind::Container);
    assert_eq!(servers.namespace(), "example-server");
    assert!(servers.config());
    assert_eq!(servers.default_deny(), DefaultDeny::None);

    let server = servers
        .get_data_child("server", None)
        .expect("Failed to lookup schema node");
    assert_eq!(server.kind(), SchemaNodeKind::List);
    assert_eq!(server.keys().len(), 1);
    assert_eq!(server.keys()[0].0, "name");

    let ttl = server.get_data_child("ttl", None).unwrap();
    assert_eq!(ttl.default_value(), Some(&Value::Uint8(64)));
    assert_eq!(ttl.dtype().unwrap().name(), "uint8");

    // The identityref default carries the module-qualified form.
    let proto = server.get_data_child("proto", None).unwrap();
    assert_eq!(
        proto.default_value(),
        Some(&Value::IdentityRef("example-server:tcp".to_string()))
    );
}

#[test]
fn schema_config_inheritance() {
    let ctx = create_context();
    let root = ctx.schema();

    let state = root
        .get_data_child("state-data", Some("example-server"))
        .unwrap();
    assert!(!state.config());
    // Inherited downward.
    assert!(!state.get_data_child("uptime", None).unwrap().config());
}

#[test]
fn schema_choice_transparency() {
    let ctx = create_context();
    let tuning = ctx
        .schema()
        .get_data_child("tuning", Some("example-server"))
        .unwrap();

    // A data child is found through the transparent choice and case.
    let mss = tuning
        .get_data_child("mss", None)
        .expect("Failed to find data child through choice");
    assert_eq!(mss.kind(), SchemaNodeKind::Leaf);
    assert_eq!(mss.iname(), "mss");

    // The choice itself is only reachable as a direct child.
    let choice = tuning.get_child("transport", None).unwrap();
    assert_eq!(choice.kind(), SchemaNodeKind::Choice);
    assert!(!choice.is_data_node());
    let case = choice.default_case().unwrap();
    assert_eq!(case.name(), "tcp-opts");
}

#[test]
fn schema_augmented_names() {
    let ctx = create_context();
    let servers = ctx
        .schema()
        .get_data_child("servers", Some("example-server"))
        .unwrap();

    // The augmented leaf lives in the augmenting module's namespace, so
    // its instance name is qualified.
    let monitor = servers
        .get_data_child("monitor", Some("example-extra"))
        .unwrap();
    assert_eq!(monitor.namespace(), "example-extra");
    assert_eq!(monitor.iname(), "example-extra:monitor");
    assert_eq!(servers.get_data_child("monitor", None), None);

    let port = servers
        .get_data_child("server", None)
        .unwrap()
        .get_data_child("port", None)
        .unwrap();
    assert_eq!(port.iname(), "port");
}

#[test]
fn schema_refine_default() {
    let ctx = create_context();
    let port = ctx
        .schema()
        .get_data_child("fallback", Some("example-server"))
        .unwrap()
        .get_data_child("port", None)
        .unwrap();
    assert_eq!(port.default_value(), Some(&Value::Uint16(8080)));
}

#[test]
fn schema_feature_gating() {
    let ctx = create_context();

    // The "backups" feature is not enabled by the YANG library, so the
    // guarded subtree is dropped.
    assert_eq!(
        ctx.schema()
            .get_data_child("backup-store", Some("example-server")),
        None
    );
}

#[test]
fn schema_unknown_feature() {
    let mut modules = EmbeddedModules::new();
    modules.add(
        "example-server",
        None,
        r#"module example-server {
             namespace "urn:example:server";
             prefix srv;
             container c {
               if-feature no-such-feature;
               leaf l { type string; }
             }
           }"#,
    );
    let ylib = r#"
        {
            "ietf-yang-library:modules-state": {
                "module-set-id": "x",
                "module": [
                    {
                        "name": "example-server",
                        "revision": "",
                        "namespace": "urn:example:server",
                        "conformance-type": "implement"
                    }
                ]
            }
        }"#;
    assert!(matches!(
        Context::from_yang_library_str(ylib, &modules),
        Err(Error::FeaturePrerequisite { .. })
    ));
}

#[test]
fn schema_multiple_implemented_revisions() {
    let mut modules = EmbeddedModules::new();
    modules.add("example-server", None, common::SERVER_MODULE);
    let ylib = r#"
        {
            "ietf-yang-library:modules-state": {
                "module-set-id": "x",
                "module": [
                    {
                        "name": "example-server",
                        "revision": "2024-01-01",
                        "namespace": "urn:example:server",
                        "conformance-type": "implement"
                    },
                    {
                        "name": "example-server",
                        "revision": "2024-06-01",
                        "namespace": "urn:example:server",
                        "conformance-type": "implement"
                    }
                ]
            }
        }"#;
    assert!(matches!(
        Context::from_yang_library_str(ylib, &modules),
        Err(Error::MultipleImplementedRevisions(_))
    ));
}

#[test]
fn schema_module_not_found() {
    let modules = EmbeddedModules::new();
    assert!(matches!(
        Context::from_yang_library_str(common::YANG_LIBRARY, &modules),
        Err(Error::ModuleNotFound { .. })
    ));
}

#[test]
fn schema_bad_yang_library() {
    let modules = EmbeddedModules::new();
    assert!(matches!(
        Context::from_yang_library_str("{}", &modules),
        Err(Error::BadYangLibrary(_))
    ));
    assert!(matches!(
        Context::from_yang_library_str("not json", &modules),
        Err(Error::BadYangLibrary(_))
    ));
}

#[test]
fn schema_module_set_id() {
    let ctx = create_context();
    assert_eq!(ctx.module_set_id(), "20f4e818");

    let modules: Vec<_> =
        ctx.modules().map(|module| module.name().to_string()).collect();
    assert_eq!(modules, vec!["example-server", "example-extra"]);
    assert!(ctx.modules().all(|module| module.is_implemented()));
}

#[test]
fn schema_ascii_tree() {
    let ctx = create_context();
    let tree = ctx.ascii_tree();

    assert!(tree.contains("+--rw servers"));
    assert!(tree.contains("+--rw server* [name]"));
    assert!(tree.contains("+--ro state-data"));
    assert!(tree.contains("+--rw creds!"));
    assert!(tree.contains("(transport)"));
    assert!(tree.contains(":(tcp-opts)"));
}

#[test]
fn schema_digest() {
    let ctx = create_context();
    let digest: serde_json::Value =
        serde_json::from_str(&ctx.schema_digest())
            .expect("digest is not valid JSON");

    assert_eq!(digest["module-set-id"], "20f4e818");
    let servers = &digest["children"]["example-server:servers"];
    assert_eq!(servers["kind"], "container");
    assert_eq!(servers["children"]["server"]["kind"], "list");
    assert_eq!(
        servers["children"]["server"]["keys"],
        serde_json::json!(["name"])
    );
    assert_eq!(
        digest["children"]["example-server:state-data"]["config"],
        false
    );
}
