use std::io::Write;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use pushup_counter::config::{AppConfig, BackendKind};
use pushup_counter::{EdgeSet, SideStrategy, Threshold, TupleLayout};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "PUSHUP_CONFIG",
        "PUSHUP_SOURCE",
        "PUSHUP_BACKEND",
        "PUSHUP_MODEL_PATH",
        "PUSHUP_THRESHOLD_PX",
        "PUSHUP_MIN_CONFIDENCE",
        "PUSHUP_SIDE_STRATEGY",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(suffix: &str, body: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp config");
    file.write_all(body.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_json_config_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        ".json",
        r#"{
            "source": { "uri": "stub://garage", "width": 1280, "height": 720, "target_fps": 30 },
            "model": { "output_layout": "xy_score", "synthetic": { "period_frames": 12 } },
            "counter": { "threshold_px": 40.0, "min_confidence": 0.45 },
            "display": { "width": 1080, "height": 1920, "edges": "limbs" }
        }"#,
    );

    std::env::set_var("PUSHUP_CONFIG", file.path());
    std::env::set_var("PUSHUP_THRESHOLD_PX", "65");
    std::env::set_var("PUSHUP_SIDE_STRATEGY", "most_confident");

    let cfg = AppConfig::load().expect("load config");

    assert_eq!(cfg.source.uri, "stub://garage");
    assert_eq!((cfg.source.width, cfg.source.height), (1280, 720));
    assert_eq!(cfg.source.target_fps, 30);
    assert_eq!(cfg.model.backend, BackendKind::Synthetic);
    assert_eq!(cfg.model.output_layout, TupleLayout::XyScore);
    assert_eq!(cfg.model.motion.period_frames, 12);
    assert_eq!(cfg.counter.threshold, Threshold::Pixels(65.0));
    assert_eq!(cfg.counter.min_confidence, 0.45);
    assert_eq!(cfg.counter.sides, SideStrategy::MostConfident);
    assert_eq!((cfg.overlay.display_width, cfg.overlay.display_height), (1080, 1920));
    assert_eq!(cfg.overlay.edges, EdgeSet::Limbs);

    clear_env();
}

#[test]
fn toml_extension_selects_toml_parser() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        ".toml",
        r#"
        [source]
        uri = "stub://toml"

        [counter]
        threshold_fraction = 0.25
        "#,
    );
    let cfg = AppConfig::load_with(Some(file.path())).expect("load config");
    assert_eq!(cfg.source.uri, "stub://toml");
    assert_eq!(cfg.counter.threshold, Threshold::FrameFraction(0.25));
    assert_eq!(cfg.counter.threshold.to_pixels(480.0), 120.0);

    clear_env();
}

#[test]
fn defaults_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = AppConfig::load().expect("load defaults");
    assert_eq!(cfg.source.uri, "stub://pushups");
    assert_eq!(cfg.counter.threshold, Threshold::Pixels(50.0));
    assert_eq!(cfg.counter.sides, SideStrategy::Averaged);
    assert!(cfg.model.path.is_none());
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PUSHUP_MIN_CONFIDENCE", "1.5");
    assert!(AppConfig::load().is_err());
    clear_env();

    std::env::set_var("PUSHUP_SIDE_STRATEGY", "left_only");
    assert!(AppConfig::load().is_err());
    clear_env();

    std::env::set_var("PUSHUP_THRESHOLD_PX", "-5");
    assert!(AppConfig::load().is_err());
    clear_env();

    std::env::set_var("PUSHUP_BACKEND", "tract");
    let err = AppConfig::load().unwrap_err();
    assert!(format!("{err:#}").contains("model.path"));
    clear_env();

    let file = write_config(".json", r#"{ "source": { "target_fps": 0 } }"#);
    assert!(AppConfig::load_with(Some(file.path())).is_err());

    let file = write_config(".json", r#"{ "rtsp": { "url": "rtsp://camera" } }"#);
    assert!(AppConfig::load_with(Some(file.path())).is_err());
}

#[test]
fn missing_config_file_is_reported() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let err = AppConfig::load_with(Some(std::path::Path::new("/nonexistent/pushup.toml")))
        .unwrap_err();
    assert!(format!("{err:#}").contains("failed to read config file"));
}

#[test]
fn misspelled_nested_keys_fail_to_load() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(".json", r#"{ "counter": { "treshold_px": 20.0 } }"#);
    let err = AppConfig::load_with(Some(file.path())).unwrap_err();
    assert!(format!("{err:#}").contains("treshold_px"));

    let file = write_config(".toml", "[source]\nurl = \"stub://typo\"\n");
    assert!(AppConfig::load_with(Some(file.path())).is_err());

    let file = write_config(".json", r#"{ "model": { "layout": "xy" } }"#);
    assert!(AppConfig::load_with(Some(file.path())).is_err());

    let file = write_config(".json", r#"{ "model": { "synthetic": { "period": 12 } } }"#);
    assert!(AppConfig::load_with(Some(file.path())).is_err());
}
