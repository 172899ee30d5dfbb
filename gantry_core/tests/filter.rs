use gantry_core::FilterCfg;
use gantry_core::filter::AxisFilter;
use gantry_core::mocks::SeqPot;

const MID: i32 = 2047;

fn fresh() -> AxisFilter {
    AxisFilter::new(&FilterCfg::default())
}

/// One-shot response of a fresh filter (EMA initializes to the input).
fn response(raw: i32) -> i16 {
    fresh().update(raw)
}

#[test]
fn everything_inside_the_deadzone_is_exactly_zero() {
    for d in 0..600 {
        assert_eq!(response(MID - d), 0, "mid-{d}");
        assert_eq!(response(MID + d), 0, "mid+{d}");
    }
}

#[test]
fn response_is_odd_symmetric_around_the_midpoint() {
    for d in (600..=2047).step_by(7) {
        let neg = response(MID - d);
        let pos = response(MID + d);
        assert_eq!(neg, -pos, "asymmetry at deflection {d}");
    }
}

#[test]
fn response_is_monotonic_over_the_full_range() {
    let mut last = i16::MIN;
    for raw in 0..=4095 {
        let out = response(raw);
        assert!(
            out >= last,
            "non-monotonic at raw {raw}: {out} < {last}"
        );
        last = out;
    }
}

#[test]
fn extremes_reach_full_drive() {
    assert_eq!(response(0), -255);
    assert_eq!(response(4095), 255);
}

#[test]
fn sampling_averages_the_oversampled_reads() {
    // Alternating reads whose average sits inside the deadzone
    let mut filter = fresh();
    let mut pot = SeqPot::new([2000, 2100, 2000, 2100, 2000, 2100, 2000, 2100]);
    assert_eq!(filter.sample(&mut pot).expect("sample"), 0);

    // A pot parked at full deflection
    let mut filter = fresh();
    let mut pot = SeqPot::new([4095]);
    assert_eq!(filter.sample(&mut pot).expect("sample"), 255);
}

#[test]
fn smoothing_carries_across_ticks() {
    let mut filter = fresh();
    let mut centered = SeqPot::new([2047]);
    assert_eq!(filter.sample(&mut centered).expect("sample"), 0);

    // One tick of full deflection moves only alpha of the way
    let mut full = SeqPot::new([4095]);
    let first = filter.sample(&mut full).expect("sample");
    assert!(first > 0 && first < 255, "one tick gave {first}");

    let mut last = first;
    for _ in 0..64 {
        last = filter.sample(&mut full).expect("sample");
    }
    assert_eq!(last, 255, "EMA must converge to the held input");
}

#[test]
fn pot_errors_propagate() {
    struct BadPot;
    impl gantry_traits::Pot for BadPot {
        fn read(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
            Err("adc gone".into())
        }
    }
    let err = fresh().sample(&mut BadPot).expect_err("must fail");
    assert!(format!("{err:#}").contains("pot read"));
}
