use std::io::Write;

use pickup_apps::{BackendConfig, DummyBackendConfig, Error, PickupConfig};
use pickup_interface::Session;
use pickup_sequencer::{CompletionReporterConfig, SequencerState, TerminationPolicy};

#[test]
fn verify_sample_configs() {
    let files = [
        "config/sample_dummy_config.toml",
        "config/sample_web_config.toml",
    ];
    for f in files {
        let result = PickupConfig::try_new(f);
        assert!(result.is_ok(), "{f:?} {result:?}");
        let ser_result = toml::to_string(&result.unwrap());
        assert!(ser_result.is_ok(), "{f:?} {ser_result:?}");
    }
}

#[test]
fn ser_default_config() {
    toml::to_string(&PickupConfig::default()).unwrap();
}

#[test]
fn no_file() {
    assert!(matches!(
        PickupConfig::try_new("config/no_such_config.toml"),
        Err(Error::NoFile(..))
    ));
}

#[test]
fn from_temp_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[session]
name = "Doe, Jane"
id = "42"

[sequencer]
approach_clearance_m = 0.2
"#
    )
    .unwrap();
    let config = PickupConfig::try_new(file.path()).unwrap();
    assert_eq!(config.sequencer.approach_clearance_m, 0.2);
    assert_eq!(
        config.resolve_session(None, None).unwrap(),
        Session::new("Doe, Jane", "42")
    );
}

fn dummy_config(objects: Vec<[f64; 3]>, trace_collaborators: bool) -> PickupConfig {
    let mut config = PickupConfig {
        trace_collaborators,
        backend: BackendConfig::Dummy(DummyBackendConfig {
            objects,
            feed_rate_hz: 200.0,
            ..Default::default()
        }),
        ..Default::default()
    };
    config.sequencer.settle_interval_sec = 0.0;
    config.sequencer.reporter = CompletionReporterConfig::immediate();
    config.sequencer.termination_policy = TerminationPolicy::PollUntilEmpty { max_passes: 3 };
    config
}

#[tokio::test]
async fn dummy_session() {
    let config = dummy_config(vec![[0.5, 0.2, 0.1], [2.0, 0.0, 0.0]], false);
    let pickup = config.create_pickup().unwrap();

    let report = pickup
        .sequencer
        .run(&Session::new("Doe, Jane", "42"))
        .await
        .unwrap();

    assert_eq!(report.polls, 2);
    assert_eq!(report.objects.len(), 2);
    assert!(report.objects[0].is_disposed());
    // out of reach of the dummy solver
    assert!(!report.objects[1].is_disposed());
    assert_eq!(pickup.sequencer.state(), SequencerState::Finished);
}

#[tokio::test]
async fn dummy_session_with_tracing() {
    let config = dummy_config(vec![], true);
    let pickup = config.create_pickup().unwrap();

    let report = pickup
        .sequencer
        .run(&Session::new("Doe, Jane", "42"))
        .await
        .unwrap();

    assert_eq!(report.polls, 1);
    assert!(report.objects.is_empty());
}

#[tokio::test]
async fn invalid_feed_rate() {
    let mut config = dummy_config(vec![], false);
    if let BackendConfig::Dummy(dummy) = &mut config.backend {
        dummy.feed_rate_hz = 0.0;
    }
    assert!(matches!(
        config.create_pickup(),
        Err(Error::InvalidConfig(_))
    ));
}
