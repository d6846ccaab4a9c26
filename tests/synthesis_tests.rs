//! # Synthesis Integration Tests
//!
//! Renders the shipped templates for preprocessed desired states.
//!
//! These tests verify:
//! - Every component renders with all optional features turned on
//! - Synthesis is deterministic for the same inputs, deletes included
//! - Disabled components yield delete-only lists over the same objects
//! - Turning a component's enable flag off moves its objects to the delete list
//! - Conditionally provisioned objects move to the delete list
//! - Preprocessed values (ports, rules, auth, HTTP proxy) reach the manifests

mod common;

use chrono::Utc;
use common::*;
use kube::api::DynamicObject;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use wavefront_operator::cluster::ResourceKey;
use wavefront_operator::components::{build_components, disabled_components, validate_components};
use wavefront_operator::controller::synthesize;
use wavefront_operator::crd::{ResourceOverrideSet, Wavefront};
use wavefront_operator::preprocess::preprocess;
use wavefront_operator::synthesis::{ResourceBuilder, Synthesized};

fn builder() -> ResourceBuilder {
    ResourceBuilder::new(
        templates_dir(),
        ResourceBuilder::operator_owner("wavefront-controller-manager", OPERATOR_UID),
    )
}

fn full_spec() -> Value {
    json!({
        "clusterName": "prod-cluster",
        "wavefrontUrl": "https://example.wavefront.com",
        "imagePullSecret": "registry-creds",
        "dataExport": {"wavefrontProxy": {
            "deltaCounterPort": 50000,
            "args": "--customSourceTags mySource",
            "tracing": {
                "wavefront": {"port": 30000, "samplingRate": "0.1"},
                "zipkin": {"port": 9411, "applicationName": "zipkin"}
            },
            "histogram": {"port": 40000},
            "otlp": {"grpcPort": 4317, "httpPort": 4318},
            "httpProxy": {"secret": "http-proxy-secret"},
            "preprocessor": "user-rules"
        }},
        "dataCollection": {
            "metrics": {"filters": {"allowList": ["kubernetes.node.*"]}},
            "logging": {
                "enable": true,
                "tags": {"env": "prod"},
                "filters": {"tagDenyList": {"namespace": ["kube-system"]}}
            }
        },
        "experimental": {
            "autotracing": {"enable": true},
            "hub": {"pixie": {"enable": true}}
        }
    })
}

fn full_cluster() -> FakeClusterClient {
    let cluster = seeded_cluster();
    cluster.insert(token_secret(json!({"csp-api-token": "csp-token"})));
    cluster.insert(json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {"name": "http-proxy-secret", "namespace": NAMESPACE},
        "stringData": {
            "http-url": "https://squid.internal:3128",
            "basic-auth-username": "user",
            "basic-auth-password": "pass",
            "tls-root-ca-bundle": "-----BEGIN CERTIFICATE-----"
        }
    }));
    cluster.insert(configmap(
        "user-rules",
        json!({"rules.yaml": "2878:\n  - rule: tag-env\n    action: addTag\n    tag: env\n    value: prod\nglobal:\n  - rule: drop-debug\n    action: block\n    scope: pointLine\n    match: \".*debug.*\"\n"}),
    ));
    cluster
}

async fn preprocessed(cluster: &FakeClusterClient, spec: Value) -> Wavefront {
    let mut wavefront: Wavefront = serde_json::from_value(wavefront(spec, Utc::now())).unwrap();
    preprocess(cluster, &mut wavefront, &operator_config())
        .await
        .unwrap();
    wavefront
}

fn keys(objects: &[DynamicObject]) -> BTreeSet<ResourceKey> {
    objects.iter().map(|obj| ResourceKey::of(obj).unwrap()).collect()
}

fn find<'a>(objects: &'a [DynamicObject], kind: &str, name: &str) -> &'a DynamicObject {
    objects
        .iter()
        .find(|obj| {
            obj.types.as_ref().is_some_and(|t| t.kind == kind)
                && obj.metadata.name.as_deref() == Some(name)
        })
        .unwrap_or_else(|| panic!("{kind} {name} was not synthesized"))
}

fn full_bundle(wavefront: &Wavefront, overrides: Option<&ResourceOverrideSet>) -> Synthesized {
    let components = build_components(wavefront, overrides);
    assert!(validate_components(&components).is_valid());
    synthesize(&components, &builder()).unwrap()
}

#[tokio::test]
async fn test_every_component_renders() {
    let cluster = full_cluster();
    let wavefront = preprocessed(&cluster, full_spec()).await;
    let bundle = full_bundle(&wavefront, None);

    let names: BTreeSet<String> = bundle
        .to_apply
        .iter()
        .filter_map(|obj| obj.metadata.name.clone())
        .collect();
    for expected in [
        "wavefront-proxy",
        "wavefront-cluster-collector",
        "wavefront-node-collector",
        "wavefront-logging",
        "vizier-pem",
        "vizier-metadata",
        "kelvin",
        "vizier-query-broker",
        "wavefront-autotracing-http-spans",
    ] {
        assert!(names.contains(expected), "{expected} missing from {names:?}");
    }
    assert!(bundle.to_delete.is_empty());
    assert!(bundle
        .to_apply
        .iter()
        .all(|obj| obj.metadata.owner_references.as_ref().unwrap()[0].uid == OPERATOR_UID));
}

fn conditional_spec(cluster: &FakeClusterClient) -> Value {
    cluster.insert(configmap(
        "my-collector-config",
        json!({"config.yaml": "clusterName: prod-cluster\n"}),
    ));
    let mut spec = full_spec();
    spec["dataCollection"]["metrics"]["customConfig"] = json!("my-collector-config");
    spec["experimental"]["hub"]["pixie"]["enable"] = json!(false);
    spec
}

fn names(objects: &[DynamicObject]) -> BTreeSet<String> {
    objects
        .iter()
        .filter_map(|obj| obj.metadata.name.clone())
        .collect()
}

#[tokio::test]
async fn test_synthesis_is_deterministic() {
    let cluster = full_cluster();
    let spec = conditional_spec(&cluster);

    let first = full_bundle(&preprocessed(&cluster, spec.clone()).await, None);
    let second = full_bundle(&preprocessed(&cluster, spec).await, None);
    assert!(!first.to_delete.is_empty());
    assert_eq!(
        serde_json::to_value(&first.to_apply).unwrap(),
        serde_json::to_value(&second.to_apply).unwrap()
    );
    assert_eq!(
        serde_json::to_value(&first.to_delete).unwrap(),
        serde_json::to_value(&second.to_delete).unwrap()
    );
}

#[tokio::test]
async fn test_enable_flag_off_yields_delete_only_objects() {
    let cluster = full_cluster();
    let everything = full_bundle(&preprocessed(&cluster, full_spec()).await, None);

    let mut spec = full_spec();
    spec["dataCollection"]["logging"]["enable"] = json!(false);
    spec["experimental"]["hub"]["pixie"]["enable"] = json!(false);
    spec["experimental"]["autotracing"]["enable"] = json!(false);
    let bundle = full_bundle(&preprocessed(&cluster, spec).await, None);

    let applied = names(&bundle.to_apply);
    let deleted = names(&bundle.to_delete);
    for disabled in [
        "wavefront-logging",
        "vizier-pem",
        "vizier-metadata",
        "kelvin",
        "vizier-query-broker",
        "wavefront-autotracing-http-spans",
    ] {
        assert!(!applied.contains(disabled), "{disabled} should not be applied");
        assert!(deleted.contains(disabled), "{disabled} missing from {deleted:?}");
    }
    for enabled in ["wavefront-proxy", "wavefront-cluster-collector", "wavefront-node-collector"] {
        assert!(applied.contains(enabled), "{enabled} missing from {applied:?}");
    }
    assert!(keys(&bundle.to_delete).is_subset(&keys(&everything.to_apply)));
}

#[tokio::test]
async fn test_disabled_components_delete_the_same_objects() {
    let cluster = full_cluster();
    let wavefront = preprocessed(&cluster, full_spec()).await;
    let enabled = full_bundle(&wavefront, None);

    let disabled = synthesize(&disabled_components(&wavefront), &builder()).unwrap();
    assert!(disabled.to_apply.is_empty());
    assert_eq!(keys(&disabled.to_delete), keys(&enabled.to_apply));
}

#[tokio::test]
async fn test_conditionally_provisioned_objects_are_deleted() {
    let cluster = full_cluster();
    let spec = conditional_spec(&cluster);
    let wavefront = preprocessed(&cluster, spec).await;
    let bundle = full_bundle(&wavefront, None);

    assert_eq!(
        names(&bundle.to_delete),
        BTreeSet::from([
            "default-wavefront-collector-config".to_string(),
            "kelvin".to_string(),
            "vizier-query-broker".to_string(),
        ])
    );

    let collector = find(&bundle.to_apply, "DaemonSet", "wavefront-node-collector");
    let volumes = &collector.data["spec"]["template"]["spec"]["volumes"];
    assert_eq!(volumes[1]["configMap"]["name"], "my-collector-config");
    assert_eq!(
        collector.data["spec"]["template"]["metadata"]["annotations"]["wavefront.com/config-hash"]
            .as_str()
            .map(str::len),
        Some(64)
    );
}

#[tokio::test]
async fn test_proxy_manifests_carry_preprocessed_values() {
    let cluster = full_cluster();
    let wavefront = preprocessed(&cluster, full_spec()).await;
    let bundle = full_bundle(&wavefront, None);

    let service = find(&bundle.to_apply, "Service", "wavefront-proxy");
    let ports: Vec<u64> = service.data["spec"]["ports"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["port"].as_u64())
        .collect();
    assert_eq!(ports, [2878_u64, 50000, 30000, 9411, 40000, 4317, 4318]);

    let deployment = find(&bundle.to_apply, "Deployment", "wavefront-proxy");
    let pod_spec = &deployment.data["spec"]["template"]["spec"];
    assert_eq!(pod_spec["imagePullSecrets"][0]["name"], "registry-creds");
    let container = &pod_spec["containers"][0];
    let env = container["env"].as_array().unwrap();
    assert!(env.iter().any(|e| e["name"] == "CSP_API_TOKEN"));
    assert!(!env.iter().any(|e| e["name"] == "WAVEFRONT_TOKEN"));
    let args = env
        .iter()
        .find(|e| e["name"] == "WAVEFRONT_PROXY_ARGS")
        .and_then(|e| e["value"].as_str())
        .unwrap();
    for flag in [
        "--pushListenerPorts 2878",
        "--deltaCounterPorts 50000",
        "--traceListenerPorts 30000",
        "--traceSamplingRate 0.1",
        "--traceZipkinListenerPorts 9411",
        "--histogramDistListenerPorts 40000",
        "--otlpGrpcListenerPorts 4317",
        "--proxyHost squid.internal",
        "--proxyPort 3128",
        "--proxyUser user",
        "--customSourceTags mySource",
    ] {
        assert!(args.contains(flag), "{flag} missing from {args}");
    }
    assert_eq!(container["resources"]["limits"]["memory"], "4Gi");
    assert_eq!(pod_spec["volumes"][1]["secret"]["secretName"], "http-proxy-secret");

    let rules = find(
        &bundle.to_apply,
        "ConfigMap",
        "operator-proxy-preprocessor-rules-config",
    );
    let document: serde_yaml::Value =
        serde_yaml::from_str(rules.data["data"]["rules.yaml"].as_str().unwrap()).unwrap();
    let metric_port = document["2878"].as_sequence().unwrap();
    assert_eq!(metric_port.len(), 3);
    assert_eq!(metric_port[2]["rule"].as_str(), Some("tag-env"));
    assert_eq!(document["9411"].as_sequence().unwrap().len(), 2);
    assert_eq!(
        document["global"][0]["rule"].as_str(),
        Some("drop-debug")
    );
}

#[tokio::test]
async fn test_logging_ships_to_the_proxy_service() {
    let cluster = full_cluster();
    let wavefront = preprocessed(&cluster, full_spec()).await;
    let bundle = full_bundle(&wavefront, None);

    let config = find(&bundle.to_apply, "ConfigMap", "wavefront-logging-config");
    let conf = config.data["data"]["fluent-bit.conf"].as_str().unwrap();
    assert!(conf.contains("Host          wavefront-proxy\n"));
    assert!(conf.contains("Port          2878\n"));
    assert!(conf.contains(&format!("Record  cluster_uuid {CLUSTER_UUID}")));
    assert!(conf.contains("Record  env prod"));
    assert!(conf.contains("Exclude namespace ^kube-system$"));
}

#[tokio::test]
async fn test_override_set_memory_only_keeps_template_cpu() {
    let cluster = full_cluster();
    let wavefront = preprocessed(&cluster, full_spec()).await;
    let overrides: ResourceOverrideSet = serde_json::from_value(override_set(json!({
        "workloads": {
            "wavefront-node-collector": {
                "resources": {"requests": {"memory": "64Mi"}, "limits": {"memory": "1Gi"}}
            }
        }
    })))
    .unwrap();
    let bundle = full_bundle(&wavefront, Some(&overrides));

    let collector = find(&bundle.to_apply, "DaemonSet", "wavefront-node-collector");
    let resources = &collector.data["spec"]["template"]["spec"]["containers"][0]["resources"];
    assert_eq!(
        resources,
        &json!({
            "requests": {"cpu": "200m", "memory": "64Mi"},
            "limits": {"cpu": "200m", "memory": "1Gi"}
        })
    );
}

#[tokio::test]
async fn test_external_proxy_skips_proxy_and_points_collectors_at_it() {
    let cluster = seeded_cluster();
    let spec = json!({
        "clusterName": "prod-cluster",
        "dataExport": {"externalWavefrontProxy": {"url": "proxy.example.com:2878"}}
    });
    let wavefront = preprocessed(&cluster, spec).await;
    let components = build_components(&wavefront, None);
    assert!(validate_components(&components).is_valid());
    let bundle = synthesize(&components, &builder()).unwrap();

    assert!(bundle
        .to_delete
        .iter()
        .any(|obj| obj.metadata.name.as_deref() == Some("wavefront-proxy")));
    let config = find(
        &bundle.to_apply,
        "ConfigMap",
        "default-wavefront-collector-config",
    );
    assert!(config.data["data"]["config.yaml"]
        .as_str()
        .unwrap()
        .contains("proxyAddress: proxy.example.com:2878"));
}
