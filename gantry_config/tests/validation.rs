use gantry_config::{PlateSeq, load_toml};
use rstest::rstest;

#[test]
fn defaults_parse_and_validate() {
    let cfg = load_toml("").expect("empty config should parse");
    cfg.validate().expect("defaults must be valid");
    assert_eq!(cfg.filter.oversample, 8);
    assert_eq!(cfg.filter.deadzone, 600);
    assert_eq!(cfg.sequence.dwell_ms, 5000);
    assert_eq!(cfg.plates.targets, [5, 4, 3, 2]);
    assert!(cfg.pins.is_none());
}

#[test]
fn full_config_parses() {
    let toml = r#"
        [filter]
        oversample = 16
        ema_alpha = 0.25
        deadzone = 400
        full_scale = 4095

        [drive]
        max_drive = 200
        homing_drive = 80
        homing_settle_ms = 300
        homing_timeout_ms = 15000

        [sequence]
        dwell_ms = 4000
        tick_ms = 25

        [plates]
        targets = [2, 3, 4, 5]
        marker_ids = [7, 9]

        [logging]
        level = "debug"
    "#;
    let cfg = load_toml(toml).expect("parse");
    cfg.validate().expect("valid");
    assert_eq!(cfg.filter.oversample, 16);
    assert_eq!(cfg.drive.homing_timeout_ms, 15_000);
    assert_eq!(cfg.plates.marker_ids, [7, 9]);
    assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
}

#[rstest]
#[case("[filter]\noversample = 0", "oversample")]
#[case("[filter]\nema_alpha = 0.0", "ema_alpha")]
#[case("[filter]\nema_alpha = 1.5", "ema_alpha")]
#[case("[filter]\ndeadzone = 3000", "deadzone")]
#[case("[drive]\nmax_drive = 0", "max_drive")]
#[case("[drive]\nmax_drive = 300", "max_drive")]
#[case("[drive]\nhoming_drive = 0", "homing_drive")]
#[case("[sequence]\ndwell_ms = 0", "dwell_ms")]
#[case("[sequence]\ntick_ms = 0", "tick_ms")]
#[case("[sequence]\ntick_ms = 5000", "tick_ms")]
#[case("[plates]\ntargets = [0, 4, 3, 2]", "out of range")]
#[case("[plates]\ntargets = [6, 4, 3, 2]", "out of range")]
#[case("[plates]\nmarker_ids = [3, 3]", "distinct")]
fn invalid_configs_are_rejected(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("syntactically valid");
    let err = cfg.validate().expect_err("must be rejected");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "error {msg:?} should mention {needle:?}");
}

#[test]
fn plate_seq_parses_digit_string() {
    let seq = PlateSeq::parse("5432").expect("parse");
    assert_eq!(seq.first(), (4, 3));
    assert_eq!(seq.second(), (2, 1));
}

#[test]
fn plate_seq_parses_comma_list() {
    let seq = PlateSeq::parse(" 1, 2, 3, 4 ").expect("parse");
    assert_eq!(seq, PlateSeq([1, 2, 3, 4]));
    assert_eq!(seq.first(), (0, 1));
}

#[rstest]
#[case("543")]
#[case("54321")]
#[case("5,4,3")]
#[case("abcd")]
#[case("5,4,3,x")]
#[case("0432")]
#[case("9999")]
fn plate_seq_rejects_malformed(#[case] input: &str) {
    assert!(PlateSeq::parse(input).is_err(), "{input:?} should be rejected");
}

#[test]
fn config_type_mismatch_is_a_parse_error() {
    assert!(load_toml("[filter]\noversample = \"many\"").is_err());
}
