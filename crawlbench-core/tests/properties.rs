use crawlbench_core::baseline::{format_record, parse_record};
use crawlbench_core::report::{report, speedup_percent, Direction};
use proptest::prelude::*;

proptest! {
    #[test]
    fn appended_line_parses_back(values in prop::collection::vec(0.0f64..1.0e6, 1..8)) {
        let line = format_record(&values);
        let parsed = parse_record(line.trim_end()).unwrap();
        prop_assert_eq!(parsed, values);
    }

    #[test]
    fn verdict_word_follows_sign(baseline in 0.001f64..1.0e4, new in 0.0f64..1.0e4) {
        let labels = vec!["Single thread".to_string()];
        let v = &report(&labels, &[baseline], &[new]).unwrap()[0];
        if new < baseline {
            prop_assert!(v.percent < 0.0);
            prop_assert_eq!(v.direction, Direction::Faster);
            prop_assert!(v.to_string().ends_with("faster"));
        } else if new > baseline {
            prop_assert!(v.percent > 0.0);
            prop_assert_eq!(v.direction, Direction::Slower);
            prop_assert!(v.to_string().ends_with("slower"));
        } else {
            prop_assert_eq!(v.percent, 0.0);
            prop_assert_eq!(v.direction, Direction::Unchanged);
        }
    }
}

#[test]
fn equal_durations_give_exactly_zero() {
    for v in [0.1, 1.0, 3.3, 2.5e3] {
        assert_eq!(speedup_percent(v, v), 0.0);
    }
}
