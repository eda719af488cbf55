use indexmap::IndexMap;
use serde_json::json;

use yangson::data::InstanceKey;
use yangson::path::{InstanceIdParser, InstanceSelector, ResourceIdParser};
use yangson::schema::{ContentType, ValidationScope};
use yangson::value::Value;
use yangson::Error;

mod common;
use common::create_context;

fn instance_doc() -> serde_json::Value {
    json!({
        "example-server:servers": {
            "server": [
                {"name": "a", "port": 80},
                {"name": "b", "port": 443}
            ],
            "alias": ["foo", "bar"],
            "active": "b",
            "example-extra:monitor": true
        }
    })
}

#[test]
fn data_navigation() {
    let ctx = create_context();
    let root = ctx.from_raw(&instance_doc()).unwrap();

    let servers = root.member("example-server:servers").unwrap();
    let server = servers.member("server").unwrap();
    assert_eq!(
        server.entry(0).unwrap().member("name").unwrap().value(),
        &Value::String("a".to_string())
    );

    // Negative indexes count from the tail.
    let last = server.entry(-1).unwrap();
    assert_eq!(last.index(), Some(1));
    assert_eq!(
        last.member("port").unwrap().value(),
        &Value::Uint16(443)
    );

    // Entry-to-entry moves.
    let first = last.previous().unwrap();
    assert_eq!(first.index(), Some(0));
    assert!(first.previous().is_err());
    assert_eq!(first.next().unwrap().index(), Some(1));

    assert_eq!(server.entries().count(), 2);
    assert_eq!(
        servers.member_names(),
        vec!["server", "alias", "active", "example-extra:monitor"]
    );

    // Indexing errors.
    assert!(matches!(
        server.entry(7),
        Err(Error::NonexistentInstance { .. })
    ));
    assert!(matches!(
        servers.member("nope"),
        Err(Error::NonexistentInstance { .. })
    ));
    let scalar = servers.member("active").unwrap();
    assert!(matches!(
        scalar.member("x"),
        Err(Error::InstanceValue { .. })
    ));
    assert!(matches!(
        root.up(),
        Err(Error::NonexistentInstance { .. })
    ));
}

#[test]
fn data_list_key_lookup() {
    let ctx = create_context();
    let root = ctx.from_raw(&instance_doc()).unwrap();
    let server = root
        .member("example-server:servers")
        .unwrap()
        .member("server")
        .unwrap();

    let mut keys = IndexMap::new();
    keys.insert("name".to_string(), Value::String("b".to_string()));
    let entry = server.look_up(&keys).unwrap();
    assert_eq!(
        entry.member("port").unwrap().value(),
        &Value::Uint16(443)
    );

    keys.insert("name".to_string(), Value::String("c".to_string()));
    assert!(matches!(
        server.look_up(&keys),
        Err(Error::NonexistentInstance { .. })
    ));
}

#[test]
fn data_zipper_roundtrip() {
    let ctx = create_context();
    let root = ctx.from_raw(&instance_doc()).unwrap();

    let port = root
        .member("example-server:servers")
        .unwrap()
        .member("server")
        .unwrap()
        .entry(1)
        .unwrap()
        .member("port")
        .unwrap();
    assert_eq!(port.json_pointer(), "/example-server:servers/server/1/port");

    // Going back up reconstitutes the document unchanged.
    assert_eq!(port.top(), root);
    assert_eq!(port.top().raw_value(), instance_doc());

    // Member order survives the round trip through a focused member.
    let alias = root
        .member("example-server:servers")
        .unwrap()
        .member("alias")
        .unwrap();
    let servers = alias.up().unwrap();
    assert_eq!(
        servers.member_names(),
        vec!["server", "alias", "active", "example-extra:monitor"]
    );
}

#[test]
fn data_persistence() {
    let ctx = create_context();
    let root = ctx.from_raw(&instance_doc()).unwrap();
    let before = root.raw_value();
    let ts = root.timestamp();

    let servers = root.member("example-server:servers").unwrap();
    let updated = servers
        .member("active")
        .unwrap()
        .update(Value::String("a".to_string()))
        .top();
    let deleted = servers
        .delete_item(&InstanceKey::from("active"))
        .unwrap()
        .top();

    // The input root is observably unchanged.
    assert_eq!(root.raw_value(), before);
    assert_eq!(root.timestamp(), ts);

    // The outputs are independent roots.
    assert_eq!(
        updated.peek(&ctx.parse_resource_id("/example-server:servers/active").unwrap()),
        Some(&Value::String("a".to_string()))
    );
    assert_eq!(
        deleted.peek(&ctx.parse_resource_id("/example-server:servers/active").unwrap()),
        None
    );
    // Timestamps never decrease along a mutation chain.
    assert!(updated.timestamp() >= ts);
}

#[test]
fn data_mutation() {
    let ctx = create_context();
    let root = ctx.from_raw(&instance_doc()).unwrap();
    let servers = root.member("example-server:servers").unwrap();

    // put_member replaces or creates members, rejecting unknown ones.
    let active = servers
        .put_member("active", Value::String("a".to_string()))
        .unwrap();
    assert_eq!(active.value(), &Value::String("a".to_string()));
    assert!(matches!(
        servers.put_member("bogus", Value::Empty),
        Err(Error::NonexistentSchemaNode { .. })
    ));

    // delete_item of a missing key.
    assert!(matches!(
        servers.delete_item(&InstanceKey::from("bogus")),
        Err(Error::NonexistentInstance { .. })
    ));

    // Raw updates run through the type system.
    let port = servers
        .member("server")
        .unwrap()
        .entry(0)
        .unwrap()
        .member("port")
        .unwrap();
    assert_eq!(
        port.update_raw(&json!(8080)).unwrap().value(),
        &Value::Uint16(8080)
    );
    assert!(matches!(
        port.update_raw(&json!(99999)),
        Err(Error::RawType { .. })
    ));
}

#[test]
fn data_entry_insertion() {
    let ctx = create_context();
    let root = ctx.from_raw(&instance_doc()).unwrap();
    let first = root
        .member("example-server:servers")
        .unwrap()
        .member("server")
        .unwrap()
        .entry(0)
        .unwrap();

    // An entry decodes through the per-entry decoder of the list schema.
    let inserted = first
        .insert_after_raw(&json!({"name": "ab", "port": 8080}))
        .unwrap();
    assert_eq!(inserted.index(), Some(1));
    let array = inserted.up().unwrap();
    assert_eq!(
        array
            .entries()
            .map(|e| e.member("name").unwrap().value().string_value())
            .collect::<Vec<_>>(),
        vec!["a", "ab", "b"]
    );

    let inserted = first
        .insert_before(first.value().clone())
        .unwrap();
    assert_eq!(inserted.index(), Some(0));
    assert_eq!(inserted.up().unwrap().entries().count(), 3);
}

#[test]
fn data_route_roundtrip() {
    let ctx = create_context();
    let root = ctx.from_raw(&instance_doc()).unwrap();

    let port = root
        .member("example-server:servers")
        .unwrap()
        .member("server")
        .unwrap()
        .entry(1)
        .unwrap()
        .member("port")
        .unwrap();

    let route = port.route();
    assert_eq!(root.goto(&route).unwrap(), port);
    assert_eq!(
        route.to_string(),
        "/example-server:servers/server[2]/port"
    );

    // The textual form parses back to an equal route.
    let reparsed =
        InstanceIdParser::parse(&ctx, &route.to_string()).unwrap();
    assert_eq!(reparsed, route);
}

#[test]
fn data_resource_id() {
    let ctx = create_context();
    let root = ctx.from_raw(&instance_doc()).unwrap();

    let route = ResourceIdParser::parse(
        &ctx,
        "/example-server:servers/server=b/port",
    )
    .unwrap();
    assert_eq!(
        root.goto(&route).unwrap().value(),
        &Value::Uint16(443)
    );

    // Percent-encoding is decoded before type parsing.
    let route = ResourceIdParser::parse(
        &ctx,
        "/example-server:servers/server=with%2Fslash",
    )
    .unwrap();
    let Some(InstanceSelector::EntryKeys(keys)) = route.iter().last()
    else {
        panic!("expected key selector");
    };
    assert_eq!(
        keys.get("name"),
        Some(&Value::String("with/slash".to_string()))
    );

    // Leaf-list selector.
    let route = ResourceIdParser::parse(
        &ctx,
        "/example-server:servers/alias=foo",
    )
    .unwrap();
    assert_eq!(
        root.goto(&route).unwrap().index(),
        Some(0)
    );

    // The number of keys must match the schema exactly.
    assert!(matches!(
        ResourceIdParser::parse(
            &ctx,
            "/example-server:servers/server=a,b"
        ),
        Err(Error::UnexpectedInput { .. })
    ));
    assert!(matches!(
        ResourceIdParser::parse(&ctx, "/example-server:servers/bogus"),
        Err(Error::NonexistentSchemaNode { .. })
    ));
}

#[test]
fn data_instance_id() {
    let ctx = create_context();
    let root = ctx.from_raw(&instance_doc()).unwrap();

    // Value selector for a leaf-list; goto yields the first entry.
    let route = InstanceIdParser::parse(
        &ctx,
        "/example-server:servers/alias[.='foo']",
    )
    .unwrap();
    assert_eq!(
        route.iter().last(),
        Some(&InstanceSelector::EntryValue(Value::String(
            "foo".to_string()
        )))
    );
    assert_eq!(root.goto(&route).unwrap().index(), Some(0));

    // Positional and key predicates, with ignorable whitespace.
    let route = InstanceIdParser::parse(
        &ctx,
        "/example-server:servers/server[2]/name",
    )
    .unwrap();
    assert_eq!(
        root.goto(&route).unwrap().value(),
        &Value::String("b".to_string())
    );
    let route = InstanceIdParser::parse(
        &ctx,
        "/example-server:servers/server[ name = \"b\" ]/port",
    )
    .unwrap();
    assert_eq!(root.goto(&route).unwrap().value(), &Value::Uint16(443));

    // Malformed input carries the offending offset.
    assert!(matches!(
        InstanceIdParser::parse(
            &ctx,
            "/example-server:servers/server[0]"
        ),
        Err(Error::UnexpectedInput { .. })
    ));
    assert!(matches!(
        InstanceIdParser::parse(&ctx, "nonsense"),
        Err(Error::UnexpectedInput { offset: 0, .. })
    ));
}

#[test]
fn data_add_defaults() {
    let ctx = create_context();

    // Defaults on an empty document.
    let root = ctx.from_raw(&json!({})).unwrap();
    let filled = root.add_defaults(ContentType::Config).unwrap();
    assert_eq!(
        filled.raw_value(),
        json!({
            "example-server:limits": {"ttl": 64},
            "example-server:tuning": {"mss": 1460},
            "example-server:fallback": {"port": 8080}
        })
    );

    // Defaults are idempotent.
    let again = filled.add_defaults(ContentType::Config).unwrap();
    assert_eq!(again.raw_value(), filled.raw_value());

    // List entries receive their defaults too.
    let root = ctx.from_raw(&instance_doc()).unwrap();
    let filled = root.add_defaults(ContentType::Config).unwrap();
    let entry = filled
        .member("example-server:servers")
        .unwrap()
        .member("server")
        .unwrap()
        .entry(0)
        .unwrap();
    assert_eq!(
        entry.member("ttl").unwrap().value(),
        &Value::Uint8(64)
    );
    assert_eq!(
        entry.member("proto").unwrap().value(),
        &Value::IdentityRef("example-server:tcp".to_string())
    );

    // The default case of a choice is not materialized when another
    // case is.
    let root = ctx
        .from_raw(&json!({"example-server:tuning": {"dscp": 10}}))
        .unwrap();
    let filled = root.add_defaults(ContentType::Config).unwrap();
    let tuning = filled
        .member("example-server:tuning")
        .unwrap();
    assert!(tuning.member("mss").is_err());
    assert_eq!(
        tuning.member("dscp").unwrap().value(),
        &Value::Uint8(10)
    );
}

#[test]
fn data_validation() {
    let ctx = create_context();

    // A well-formed document with defaults validates under both scopes.
    let root = ctx.from_raw(&instance_doc()).unwrap();
    let filled = root.add_defaults(ContentType::Config).unwrap();
    filled
        .validate(ValidationScope::ALL, ContentType::Config)
        .expect("Failed to validate instance data");

    // Missing mandatory leaf.
    let root = ctx
        .from_raw(&json!({"example-server:creds": {}}))
        .unwrap();
    assert!(matches!(
        root.validate(ValidationScope::ALL, ContentType::Config),
        Err(Error::Schema { .. })
    ));

    // Unsatisfied leafref fails only in the semantic scope.
    let bad_ref = ctx
        .from_raw(&json!({
            "example-server:servers": {
                "server": [
                    {"name": "a", "port": 80},
                    {"name": "b", "port": 443}
                ],
                "active": "c"
            }
        }))
        .unwrap();
    bad_ref
        .validate(ValidationScope::SYNTAX, ContentType::Config)
        .expect("Failed to validate in syntax scope");
    assert!(matches!(
        bad_ref.validate(ValidationScope::SEMANTICS, ContentType::Config),
        Err(Error::Semantic { .. })
    ));
}

#[test]
fn data_validation_lists() {
    let ctx = create_context();

    // Duplicate key values.
    let root = ctx
        .from_raw(&json!({
            "example-server:servers": {
                "server": [
                    {"name": "a", "port": 80},
                    {"name": "a", "port": 443}
                ]
            }
        }))
        .unwrap();
    assert!(matches!(
        root.validate(ValidationScope::SYNTAX, ContentType::Config),
        Err(Error::Schema { .. })
    ));

    // Missing key.
    let root = ctx
        .from_raw(&json!({
            "example-server:servers": {"server": [{"port": 80}]}
        }))
        .unwrap();
    assert!(matches!(
        root.validate(ValidationScope::SYNTAX, ContentType::Config),
        Err(Error::Schema { .. })
    ));

    // 'unique' violation.
    let root = ctx
        .from_raw(&json!({
            "example-server:servers": {
                "server": [
                    {"name": "a", "port": 80},
                    {"name": "b", "port": 80}
                ]
            }
        }))
        .unwrap();
    assert!(matches!(
        root.validate(ValidationScope::SYNTAX, ContentType::Config),
        Err(Error::Schema { .. })
    ));

    // Cardinality.
    let root = ctx
        .from_raw(&json!({"example-server:tags": ["a", "b", "c"]}))
        .unwrap();
    assert!(matches!(
        root.validate(ValidationScope::SYNTAX, ContentType::Config),
        Err(Error::Schema { .. })
    ));
}

#[test]
fn data_validation_semantics() {
    let ctx = create_context();

    // A violated 'must' surfaces its error message.
    let root = ctx
        .from_raw(&json!({"example-server:limits": {"ttl": 0}}))
        .unwrap();
    match root.validate(ValidationScope::SEMANTICS, ContentType::Config) {
        Err(Error::Semantic { detail, .. }) => {
            assert_eq!(detail, "ttl must not be zero")
        }
        other => panic!("expected semantic error, got {:?}", other),
    }

    // 'when' must hold for every present node carrying one.
    let root = ctx
        .from_raw(&json!({
            "example-server:fallback": {"port": 9090, "backup-port": 1}
        }))
        .unwrap();
    assert!(matches!(
        root.validate(ValidationScope::SEMANTICS, ContentType::Config),
        Err(Error::Semantic { .. })
    ));
    let root = ctx
        .from_raw(&json!({
            "example-server:fallback": {"port": 8080, "backup-port": 1}
        }))
        .unwrap();
    root.validate(ValidationScope::ALL, ContentType::Config)
        .expect("Failed to validate instance data");
}

#[test]
fn data_content_type() {
    let ctx = create_context();

    let state = ctx
        .from_raw(&json!({"example-server:state-data": {"uptime": 1}}))
        .unwrap();
    assert!(matches!(
        state.validate(ValidationScope::SYNTAX, ContentType::Config),
        Err(Error::Schema { .. })
    ));
    state
        .validate(ValidationScope::SYNTAX, ContentType::Nonconfig)
        .expect("Failed to validate state data");
    state
        .validate(ValidationScope::SYNTAX, ContentType::All)
        .expect("Failed to validate state data");
}

#[test]
fn data_namespace_crossing() {
    let ctx = create_context();
    let root = ctx.from_raw(&instance_doc()).unwrap();
    let servers = root.member("example-server:servers").unwrap();

    // The member from the foreign module is qualified...
    assert_eq!(
        servers
            .member("example-extra:monitor")
            .unwrap()
            .value(),
        &Value::Boolean(true)
    );
    // ...and not reachable under its bare name.
    assert!(matches!(
        servers.member("monitor"),
        Err(Error::NonexistentInstance { .. })
    ));

    // Unqualified members at the root are unknown.
    assert!(matches!(
        ctx.from_raw(&json!({"servers": {}})),
        Err(Error::RawMember { .. })
    ));
}

#[test]
fn data_raw_roundtrip() {
    let ctx = create_context();
    let doc = instance_doc();
    let root = ctx.from_raw(&doc).unwrap();
    assert_eq!(root.raw_value(), doc);

    // Unknown members and ill-typed values are rejected while cooking.
    assert!(matches!(
        ctx.from_raw(&json!({"example-server:bogus": 1})),
        Err(Error::RawMember { .. })
    ));
    assert!(matches!(
        ctx.from_raw(&json!({
            "example-server:servers": {"server": [{"name": "a", "port": "eighty"}]}
        })),
        Err(Error::RawType { .. })
    ));
}
