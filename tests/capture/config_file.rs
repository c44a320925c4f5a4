//! Sessions configured from TOML files and written to disk.

use crate::common::*;
use tracespy::{ConfigError, ObserverConfig};

#[test]
fn default_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(tracespy::CONFIG_FILE_NAME);

    CaptureConfig::write_default_if_missing(&path).unwrap();
    assert!(path.exists());
    assert_eq!(CaptureConfig::from_file(&path).unwrap(), CaptureConfig::default());

    // Leaves an existing file alone
    let custom = CaptureConfig::default().with_start_suspended(true);
    custom.write_to_file(&path).unwrap();
    CaptureConfig::write_default_if_missing(&path).unwrap();
    assert_eq!(CaptureConfig::from_file(&path).unwrap(), custom);
}

#[test]
fn file_settings_drive_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("capture.toml");
    std::fs::write(
        &config_path,
        r#"
watched_apis = [2]

[writer]
buffered = false

[observer]
merge_threshold = 8
"#,
    )
    .unwrap();

    let config = CaptureConfig::from_file(&config_path).unwrap();
    assert_eq!(config.observer, ObserverConfig::new().with_merge_threshold(8));
    assert!(!config.writer.buffered);

    let capture_path = dir.path().join("out.pack");
    {
        let session = CaptureSession::create_file(&capture_path, config).unwrap();
        let memory = app_memory(0, &[9; 64]);

        let mut ignored = session.begin_call(1, memory.clone());
        ignored.read(0, 64);
        ignored.exit();

        let mut call = session.begin_call(2, memory);
        call.enter(&Foo(5));
        call.read(0, 4);
        call.read(10, 4);
        call.exit();
        assert!(session.is_healthy());
    }

    let bytes = std::fs::read(&capture_path).unwrap();
    assert!(bytes.starts_with(HEADER_V2));
    let chunks = StreamReader::read_all(&bytes).unwrap();
    assert_eq!(
        object_names(&chunks),
        vec!["test.Foo", "tracespy.Resource", "tracespy.MemoryObservation"]
    );
}

#[test]
fn invalid_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");

    std::fs::write(&path, "[writer]\nbuffer_threshold = 0\n").unwrap();
    assert!(matches!(
        CaptureConfig::from_file(&path),
        Err(ConfigError::Writer(_))
    ));

    std::fs::write(&path, "start_suspended = \"yes\"\n").unwrap();
    assert!(matches!(
        CaptureConfig::from_file(&path),
        Err(ConfigError::Parse(_))
    ));

    assert!(matches!(
        CaptureConfig::from_file(&dir.path().join("missing.toml")),
        Err(ConfigError::Read { .. })
    ));
}

#[test]
fn session_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = CaptureConfig::default()
        .with_observer(ObserverConfig::new().with_merge_threshold(u64::MAX));
    let result = CaptureSession::create_file(&dir.path().join("x.pack"), config);
    assert!(result.is_err());
}
