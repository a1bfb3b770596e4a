use opentelemetry_tracing_pipeline::exporters::ExportTarget;
use opentelemetry_tracing_pipeline::processors::tail_sampling::PolicyKind;
use opentelemetry_tracing_pipeline::{ComponentId, InstanceConfig};

#[test]
fn test_instance_config_from_yaml_load_balancing() {
    let yaml_str = std::fs::read_to_string("tests/load_balancing.yaml").unwrap();
    let config = InstanceConfig::from_yaml(&yaml_str).unwrap();

    // Validate receivers
    assert_eq!(config.receivers.len(), 2);
    assert!(config.receivers.contains_key(&ComponentId::new("jaeger")));
    assert!(config.receivers[&ComponentId::new("zipkin")].is_null());

    // Validate export target
    if let Some(ExportTarget::RemoteWrite(targets)) = config.export_target() {
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].endpoint.as_deref(), Some("example.com:12345"));
        assert_eq!(targets[0].headers["x-some-header"], "Some value!");
    } else {
        panic!("Expected remote_write targets");
    }

    // Validate processors
    let batch = config.batch.as_ref().unwrap();
    assert_eq!(batch.timeout.as_deref(), Some("5s"));
    assert_eq!(batch.send_batch_size, Some(100));

    let spanmetrics = config.spanmetrics.as_ref().unwrap();
    assert_eq!(spanmetrics.prom_instance.as_deref(), Some("tempo"));
    assert_eq!(spanmetrics.dimensions.as_ref().unwrap().len(), 2);

    let tail_sampling = config.tail_sampling.as_ref().unwrap();
    let kinds: Vec<PolicyKind> = tail_sampling
        .policies()
        .unwrap()
        .iter()
        .map(|policy| policy.kind)
        .collect();
    assert_eq!(
        kinds,
        [PolicyKind::AlwaysSample, PolicyKind::StringAttribute]
    );

    let load_balancing = config.load_balancing().unwrap();
    assert_eq!(load_balancing.exporter.insecure, Some(true));
    assert_eq!(load_balancing.receiver_port().unwrap(), 4318);
}

#[test]
fn test_instance_config_from_yaml_file_basic() {
    let config = InstanceConfig::from_yaml_file("tests/basic.yaml").unwrap();
    if let Some(ExportTarget::Push(push)) = config.export_target() {
        assert_eq!(
            push.remote_write.endpoint.as_deref(),
            Some("example.com:12345")
        );
        assert!(push.batch.is_none());
    } else {
        panic!("Expected a push_config target");
    }
    assert!(config.load_balancing().is_none());
}

#[test]
fn test_instance_config_from_yaml_file_with_extra_field() {
    let result = InstanceConfig::from_yaml_file("tests/extra_field.yaml");
    assert!(result.is_err());
    if let Err(ref e) = result {
        assert!(e.to_string().contains("unknown field"));
    }
}
