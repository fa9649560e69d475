//! Rewrites date-range and day-interval literals into named placeholders.
//!
//! Textual, not a SQL parser: only the two literal forms below are touched.
//!
//! - `BETWEEN 'YYYY-MM-DD' AND 'YYYY-MM-DD'` -> `BETWEEN :start_date AND :end_date`
//! - `INTERVAL '<N>' DAY` -> `make_interval(days => :day_range)`

use std::sync::LazyLock;

use regex::Regex;

pub const DATE_RANGE_REPLACEMENT: &str = "BETWEEN :start_date AND :end_date";
pub const DAY_INTERVAL_REPLACEMENT: &str = "make_interval(days => :day_range)";

static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"BETWEEN\s+'\d{4}-\d{2}-\d{2}'\s+AND\s+'\d{4}-\d{2}-\d{2}'")
        .expect("date range pattern is valid")
});

static DAY_INTERVAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"INTERVAL\s+'\d+' DAY").expect("day interval pattern is valid"));

/// Replaces literal windows with bound placeholders. Text without either
/// literal form is returned unchanged.
pub fn parameterize_statement(sql: &str) -> String {
    let sql = DATE_RANGE.replace_all(sql, DATE_RANGE_REPLACEMENT);
    DAY_INTERVAL
        .replace_all(&sql, DAY_INTERVAL_REPLACEMENT)
        .into_owned()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    // lowercase filler cannot start or extend either literal form
    const FILLER: &str = "[a-z0-9 ,()=<>*_.\n]{0,40}";

    fn date_range() -> impl Strategy<Value = String> {
        (
            0u32..10_000,
            1u32..13,
            1u32..32,
            0u32..10_000,
            1u32..13,
            1u32..32,
            "[ \t\n]{1,3}",
            "[ \t\n]{1,3}",
            "[ \t\n]{1,3}",
        )
            .prop_map(|(y1, m1, d1, y2, m2, d2, s1, s2, s3)| {
                format!("BETWEEN{s1}'{y1:04}-{m1:02}-{d1:02}'{s2}AND{s3}'{y2:04}-{m2:02}-{d2:02}'")
            })
    }

    fn day_interval() -> impl Strategy<Value = String> {
        (0u64..1_000_000, "[ \t\n]{1,3}").prop_map(|(days, s)| format!("INTERVAL{s}'{days}' DAY"))
    }

    proptest! {
        #[test]
        fn date_range_rewrite_preserves_surrounding_text(
            prefix in FILLER,
            literal in date_range(),
            suffix in FILLER,
        ) {
            let sql = format!("{prefix}{literal}{suffix}");
            prop_assert_eq!(
                parameterize_statement(&sql),
                format!("{prefix}{DATE_RANGE_REPLACEMENT}{suffix}")
            );
        }

        #[test]
        fn day_interval_rewrite_preserves_surrounding_text(
            prefix in FILLER,
            literal in day_interval(),
            suffix in FILLER,
        ) {
            let sql = format!("{prefix}{literal}{suffix}");
            prop_assert_eq!(
                parameterize_statement(&sql),
                format!("{prefix}{DAY_INTERVAL_REPLACEMENT}{suffix}")
            );
        }

        #[test]
        fn text_without_literals_is_unchanged(sql in "[a-zA-Z0-9 ',:()=<>\n-]{0,120}") {
            prop_assume!(!DATE_RANGE.is_match(&sql) && !DAY_INTERVAL.is_match(&sql));
            prop_assert_eq!(parameterize_statement(&sql), sql);
        }

        #[test]
        fn rewriting_twice_equals_rewriting_once(
            tokens in prop::collection::vec(
                prop::sample::select(vec![
                    "BETWEEN ", "AND ", "INTERVAL ", "DAY ", "'2025-06-01' ", "'30' ",
                    "x ", "\n", ":start_date ",
                ]),
                0..24,
            ),
        ) {
            let sql: String = tokens.concat();
            let once = parameterize_statement(&sql);
            prop_assert_eq!(parameterize_statement(&once), once);
        }
    }
}
