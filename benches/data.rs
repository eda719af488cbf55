use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use yangson::context::{Context, EmbeddedModules};
use yangson::schema::{ContentType, ValidationScope};

static YANG_LIBRARY: &str = r#"
    {
        "ietf-yang-library:modules-state": {
            "module-set-id": "bench",
            "module": [
                {
                    "name": "bench-server",
                    "revision": "",
                    "namespace": "urn:bench:server",
                    "conformance-type": "implement"
                }
            ]
        }
    }"#;

static MODULE: &str = r#"
    module bench-server {
      namespace "urn:bench:server";
      prefix bs;

      container servers {
        list server {
          key "name";
          leaf name { type string; }
          leaf port { type uint16; }
          leaf ttl { type uint8; default 64; }
        }
      }
    }"#;

fn create_context() -> Context {
    let mut modules = EmbeddedModules::new();
    modules.add("bench-server", None, MODULE);
    Context::from_yang_library_str(YANG_LIBRARY, &modules)
        .expect("Failed to create context")
}

fn document() -> serde_json::Value {
    let entries: Vec<serde_json::Value> = (0..100)
        .map(|i| json!({"name": format!("srv{}", i), "port": 8000 + i}))
        .collect();
    json!({"bench-server:servers": {"server": entries}})
}

fn data_pipeline(c: &mut Criterion) {
    let ctx = create_context();
    let doc = document();

    c.bench_function("from_raw", |b| {
        b.iter(|| ctx.from_raw(black_box(&doc)).unwrap())
    });

    let root = ctx.from_raw(&doc).unwrap();
    c.bench_function("add_defaults", |b| {
        b.iter(|| root.add_defaults(ContentType::Config).unwrap())
    });
    c.bench_function("validate", |b| {
        b.iter(|| {
            root.validate(ValidationScope::ALL, ContentType::Config)
                .unwrap()
        })
    });
}

criterion_group!(benches, data_pipeline);
criterion_main!(benches);
