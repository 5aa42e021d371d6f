use super::*;

fn temp_settings_path(tag: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("croco-settings-{}-{}", tag, std::process::id()))
        .join("settings.toml")
}

#[test]
fn test_missing_file_is_default() {
    let path = temp_settings_path("missing");
    assert_eq!(load_from(&path).unwrap(), Settings::default());
}

#[test]
fn test_save_and_load() {
    let path = temp_settings_path("roundtrip");
    let settings = Settings {
        device: DeviceSettings {
            port: Some(PathBuf::from("/dev/ttyACM0")),
            timeout_ms: Some(1500),
        },
        rtc: RtcSettings {
            utc_offset_minutes: Some(-300),
        },
    };

    save_to(&path, &settings).unwrap();
    assert!(!path.with_extension("toml.tmp").exists());
    assert_eq!(load_from(&path).unwrap(), settings);

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn test_partial_file() {
    let settings: Settings = toml::from_str("[device]\nport = \"/dev/ttyUSB1\"\n").unwrap();
    assert_eq!(settings.device.port, Some(PathBuf::from("/dev/ttyUSB1")));
    assert_eq!(settings.device.timeout(), None);
    assert_eq!(settings.rtc.fixed_offset(), None);
}

#[test]
fn test_empty_settings_serialize_without_values() {
    let text = toml::to_string_pretty(&Settings::default()).unwrap();
    assert!(!text.contains("port"));
}

#[test]
fn test_invalid_toml_is_an_error() {
    let path = temp_settings_path("invalid");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "device = [").unwrap();

    let err = load_from(&path).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn test_resolve_port_priority() {
    let mut settings = Settings::default();
    assert_eq!(resolve_port(None, &settings), None);

    settings.device.port = Some(PathBuf::from("/dev/saved"));
    assert_eq!(
        resolve_port(None, &settings),
        Some(PathBuf::from("/dev/saved"))
    );
    assert_eq!(
        resolve_port(Some(PathBuf::from("/dev/cli")), &settings),
        Some(PathBuf::from("/dev/cli"))
    );
}

#[test]
fn test_fixed_offset() {
    let rtc = RtcSettings {
        utc_offset_minutes: Some(90),
    };
    assert_eq!(rtc.fixed_offset(), FixedOffset::east_opt(5400));

    let bogus = RtcSettings {
        utc_offset_minutes: Some(24 * 60),
    };
    assert_eq!(bogus.fixed_offset(), None);
}
