//! Deterministic synthetic TX bars for development runs without data files.
//!
//! Produces a random walk around an index level of 17,000 with both an
//! after-hours and a regular session per weekday. The after-hours bar filed
//! under a date opens from the previous regular close and the regular bar
//! opens from the after-hours close. Clearly fake; callers tag it.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{PriceBar, Session};

const START_LEVEL: f64 = 17_000.0;

/// Generate weekday bars from `start` to `end` inclusive, seeded from `label`.
pub fn generate_synthetic_bars(label: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    let seed: [u8; 32] = *blake3::hash(label.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = START_LEVEL;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += Duration::days(1);
            continue;
        }

        let night_open = price * (1.0 + rng.gen_range(-0.002..0.002));
        let night_close = night_open * (1.0 + rng.gen_range(-0.008..0.008));
        bars.push(session_bar(
            &mut rng,
            current,
            Session::AfterHours,
            night_open,
            night_close,
            10_000..60_000,
        ));

        let day_open = night_close * (1.0 + rng.gen_range(-0.002..0.002));
        let day_close = day_open * (1.0 + rng.gen_range(-0.015..0.015));
        bars.push(session_bar(
            &mut rng,
            current,
            Session::Regular,
            day_open,
            day_close,
            50_000..150_000,
        ));

        price = day_close;
        current += Duration::days(1);
    }

    bars
}

fn session_bar(
    rng: &mut StdRng,
    date: NaiveDate,
    session: Session,
    open: f64,
    close: f64,
    volume: std::ops::Range<u64>,
) -> PriceBar {
    let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.004));
    let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.004));
    PriceBar {
        date,
        session,
        open: round_tick(open),
        high: round_tick(high).max(round_tick(open)).max(round_tick(close)),
        low: round_tick(low).min(round_tick(open)).min(round_tick(close)),
        close: round_tick(close),
        volume: rng.gen_range(volume),
    }
}

/// TX trades in whole index points.
fn round_tick(price: f64) -> f64 {
    price.round()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn deterministic_for_same_label() {
        let a = generate_synthetic_bars("TX", d(2024, 1, 1), d(2024, 3, 31));
        let b = generate_synthetic_bars("TX", d(2024, 1, 1), d(2024, 3, 31));
        assert_eq!(a, b);
        let c = generate_synthetic_bars("other", d(2024, 1, 1), d(2024, 3, 31));
        assert_ne!(a, c);
    }

    #[test]
    fn weekdays_only_with_both_sessions() {
        let bars = generate_synthetic_bars("TX", d(2024, 1, 1), d(2024, 1, 7));
        // Mon..Fri, two sessions each
        assert_eq!(bars.len(), 10);
        assert!(bars
            .iter()
            .all(|b| !matches!(b.date.weekday(), Weekday::Sat | Weekday::Sun)));
        assert!(bars.iter().all(|b| b.is_sane()));
    }
}
