use yangson::context::{Context, EmbeddedModules};

pub static YANG_LIBRARY: &str = r###"
    {
        "ietf-yang-library:modules-state": {
            "module-set-id": "20f4e818",
            "module": [
                {
                    "name": "example-server",
                    "revision": "",
                    "namespace": "urn:example:server",
                    "conformance-type": "implement"
                },
                {
                    "name": "example-extra",
                    "revision": "",
                    "namespace": "urn:example:extra",
                    "conformance-type": "implement"
                }
            ]
        }
    }"###;

pub static SERVER_MODULE: &str = r#"
    module example-server {
      namespace "urn:example:server";
      prefix srv;

      feature backups;

      identity protocol;
      identity tcp { base protocol; }
      identity udp { base protocol; }

      grouping endpoint {
        leaf name { type string; }
        leaf port { type uint16; }
      }

      container servers {
        list server {
          key "name";
          unique "port";
          uses endpoint;
          leaf proto {
            type identityref { base protocol; }
            default srv:tcp;
          }
          leaf ttl {
            type uint8 { range "1..255"; }
            default 64;
          }
        }
        leaf-list alias { type string; }
        leaf active {
          type leafref { path "../server/name"; }
        }
      }

      container creds {
        presence "credentials are configured";
        leaf id { type string; mandatory true; }
      }

      container state-data {
        config false;
        leaf uptime { type uint32; }
      }

      container limits {
        leaf ttl {
          type uint8;
          default 64;
          must "not(. = '0')" {
            error-message "ttl must not be zero";
          }
        }
      }

      container tuning {
        choice transport {
          default tcp-opts;
          case tcp-opts {
            leaf mss { type uint16; default 1460; }
          }
          case udp-opts {
            leaf dscp { type uint8; }
          }
        }
      }

      container fallback {
        uses endpoint {
          refine port { default 8080; }
        }
        leaf backup-port {
          type uint16;
          when "../port = '8080'";
        }
      }

      leaf-list tags {
        type string;
        max-elements 2;
      }

      container backup-store {
        if-feature backups;
        leaf dir { type string; }
      }
    }"#;

pub static EXTRA_MODULE: &str = r#"
    module example-extra {
      namespace "urn:example:extra";
      prefix ext;

      import example-server { prefix srv; }

      augment "/srv:servers" {
        leaf monitor { type boolean; }
      }
    }"#;

pub fn create_context() -> Context {
    let mut modules = EmbeddedModules::new();
    modules.add("example-server", None, SERVER_MODULE);
    modules.add("example-extra", None, EXTRA_MODULE);
    Context::from_yang_library_str(YANG_LIBRARY, &modules)
        .expect("Failed to create context")
}
