use opentelemetry_tracing_pipeline::{ComponentRegistry, PipelineAssembler};

/// Example of compiling an instance tracing configuration into a collector
/// configuration.
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let assembler = PipelineAssembler::new();
    let config_yaml = r#"
        receivers:
            jaeger:
                protocols:
                    grpc:
            otlp:
                protocols:
                    grpc:
        remote_write:
            - endpoint: tempo-us-central1.grafana.net:443
              basic_auth:
                  username: "12345"
                  password: secret
        batch:
            timeout: 5s
            send_batch_size: 1000
        spanmetrics:
            handler_endpoint: "0.0.0.0:8889"
        tail_sampling:
            policies:
                - latency:
                    threshold_ms: 500
                - status_code:
                    status_codes: [ERROR]
            load_balancing:
                exporter:
                    insecure: true
                resolver:
                    dns:
                        hostname: agent-headless
                        port: 4318
    "#;
    let result = assembler.assemble_from_yaml(config_yaml);
    if let Err(ref e) = result {
        panic!("Failed to assemble pipeline graph from YAML string: {}", e);
    }
    let graph = result?;
    ComponentRegistry::tracing().validate(&graph)?;

    println!("{}", graph.to_yaml()?);
    Ok(())
}
