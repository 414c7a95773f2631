use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use wms_core::import::parse_id;
use wms_core::model::Barcode;
use wms_core::rules::{missing_requirements, would_create_cycle, RequiredJob, SiteCalendar};

fn arb_required() -> impl Strategy<Value = Vec<RequiredJob>> {
    prop::collection::vec((1i64..50, "[0-9]\\.[A-Za-z]{1,8}"), 0..12).prop_map(|items| {
        items
            .into_iter()
            .map(|(job_id, job_name)| RequiredJob { job_id, job_name })
            .collect()
    })
}

proptest! {
    /// Property: barcode construction never panics and yields trimmed text
    #[test]
    fn prop_barcode_is_trimmed_and_bounded(raw in ".{0,120}") {
        if let Ok(barcode) = Barcode::new(&raw) {
            prop_assert_eq!(barcode.as_str(), raw.trim());
            prop_assert!(!barcode.as_str().is_empty());
            prop_assert!(barcode.as_str().chars().count() <= 100);
        }
    }

    /// Property: missing jobs are exactly the unscanned required ones, sorted by name
    #[test]
    fn prop_missing_is_required_minus_scanned(
        required in arb_required(),
        scanned in prop::collection::hash_set(1i64..50, 0..20),
    ) {
        let missing = missing_requirements(&required, &scanned);

        for job in &missing {
            prop_assert!(!scanned.contains(&job.job_id));
            prop_assert!(required.iter().any(|r| r.job_id == job.job_id));
        }
        for pair in missing.windows(2) {
            prop_assert!(pair[0].job_name <= pair[1].job_name);
        }

        let expected: HashSet<i64> = required
            .iter()
            .map(|r| r.job_id)
            .filter(|id| !scanned.contains(id))
            .collect();
        let got: HashSet<i64> = missing.iter().map(|r| r.job_id).collect();
        prop_assert_eq!(got, expected);
    }

    /// Property: edges that only point to lower ids never form a cycle
    #[test]
    fn prop_downward_edges_stay_acyclic(
        edges in prop::collection::vec((2i64..30, 1i64..30), 0..40),
        from in 2i64..30,
        to in 1i64..30,
    ) {
        let dag: Vec<(i64, i64)> = edges.into_iter().filter(|(a, b)| a > b).collect();
        prop_assume!(from > to);
        prop_assert!(!would_create_cycle(&dag, from, to));
    }

    /// Property: reversing any existing edge is a cycle
    #[test]
    fn prop_reverse_edge_is_cycle(
        edges in prop::collection::vec((2i64..30, 1i64..30), 1..40),
        pick in any::<prop::sample::Index>(),
    ) {
        let dag: Vec<(i64, i64)> = edges.into_iter().filter(|(a, b)| a > b).collect();
        prop_assume!(!dag.is_empty());
        let (a, b) = dag[pick.index(dag.len())];
        prop_assert!(would_create_cycle(&dag, b, a));
    }

    /// Property: whole numbers parse in both integer and float spelling
    #[test]
    fn prop_parse_id_float_spelling(n in -1_000_000i64..1_000_000) {
        prop_assert_eq!(parse_id(&n.to_string()), Some(n));
        prop_assert_eq!(parse_id(&format!("{}.0", n)), Some(n));
    }

    /// Property: a Bangkok day is 24 hours and starts on that local date
    #[test]
    fn prop_day_bounds_cover_one_local_day(offset in 0i64..40_000) {
        let cal = SiteCalendar::default();
        let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + Duration::days(offset);
        let (start, end) = cal.day_bounds(date);

        prop_assert_eq!(end - start, Duration::hours(24));
        prop_assert_eq!(cal.date_of(start), date);
        prop_assert_eq!(cal.date_of(end - Duration::seconds(1)), date);
    }
}
