use crate::crd::WavefrontProxy;

/// Every configured listener port, non-zero, de-duplicated in declaration order
pub fn listener_ports(proxy: &WavefrontProxy) -> Vec<u16> {
    let candidates = [
        proxy.metric_port,
        proxy.delta_counter_port,
        proxy.tracing.wavefront.port,
        proxy.tracing.jaeger.port,
        proxy.tracing.jaeger.grpc_port,
        proxy.tracing.jaeger.http_port,
        proxy.tracing.zipkin.port,
        proxy.histogram.port,
        proxy.histogram.minute_port,
        proxy.histogram.hour_port,
        proxy.histogram.day_port,
        proxy.otlp.grpc_port,
        proxy.otlp.http_port,
    ];
    let mut ports = Vec::with_capacity(candidates.len());
    for port in candidates {
        if port != 0 && !ports.contains(&port) {
            ports.push(port);
        }
    }
    ports
}

/// Comma separated form passed to the proxy's `--pushListenerPorts` family
pub fn enabled_ports(proxy: &WavefrontProxy) -> String {
    listener_ports(proxy)
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
