use crate::crd::WavefrontSpec;

/// Default every unset request to its limit across all resource blocks
pub fn normalize_resources(spec: &mut WavefrontSpec) {
    let blocks = [
        &mut spec.data_export.wavefront_proxy.resources,
        &mut spec.data_collection.metrics.cluster_collector.resources,
        &mut spec.data_collection.metrics.node_collector.resources,
        &mut spec.data_collection.logging.resources,
        &mut spec.experimental.hub.pixie.pem.resources,
    ];
    for resources in blocks {
        resources.default_requests_to_limits();
    }
    for resources in spec.workload_resources.values_mut() {
        resources.default_requests_to_limits();
    }
}
