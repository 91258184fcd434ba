use chrono::{Duration, NaiveDate};
use rand::Rng;

use crate::types::SessionRecord;

/// Default number of generated sessions
pub const DEFAULT_SYNTHETIC_SESSIONS: usize = 20;

const MIN_PLAYS: u32 = 30;
const MAX_PLAYS: u32 = 100;
/// A free-game session becomes a jackpot when a uniform draw exceeds this
const JACKPOT_DRAW_CUTOFF: f64 = 0.7;

/// Generate `n` sessions, one per day for the `n` days ending at `today`,
/// oldest first.
pub fn generate_sessions<R: Rng>(n: usize, today: NaiveDate, rng: &mut R) -> Vec<SessionRecord> {
    (0..n)
        .rev()
        .map(|days_back| {
            let date = today - Duration::days(days_back as i64);
            let plays = rng.gen_range(MIN_PLAYS..=MAX_PLAYS);
            let free_game = rng.gen_bool(0.5);
            let small_hit = rng.gen_bool(0.5);
            let jackpot = free_game && rng.gen::<f64>() > JACKPOT_DRAW_CUTOFF;
            SessionRecord::new(date.format("%Y-%m-%d").to_string(), plays, free_game, small_hit, jackpot)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::burst_index;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generates_ascending_dates_ending_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let records = generate_sessions(5, today, &mut rng);

        let dates: Vec<&str> = records.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-06", "2024-03-07", "2024-03-08", "2024-03-09", "2024-03-10"]);
    }

    #[test]
    fn test_generated_fields_respect_rules() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        for record in generate_sessions(200, today, &mut rng) {
            assert!((MIN_PLAYS..=MAX_PLAYS).contains(&record.play_count));
            // Jackpots only happen on free-game sessions
            assert!(!record.jackpot || record.free_game_triggered);
            assert_eq!(
                record.burst_index,
                burst_index(record.play_count, record.small_hit, record.free_game_triggered)
            );
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let a = generate_sessions(10, today, &mut StdRng::seed_from_u64(1));
        let b = generate_sessions(10, today, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_sessions() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert!(generate_sessions(0, today, &mut StdRng::seed_from_u64(1)).is_empty());
    }
}
