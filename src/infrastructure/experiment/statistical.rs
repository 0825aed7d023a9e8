//! Statistical significance for bandit experiments
//!
//! Uses Pearson's chi-squared test over the success/failure table of all
//! choices, compared against fixed 95% critical values.

use crate::domain::experiment::ChoiceCounts;

/// Chi-squared critical values at 95% confidence, indexed by `num_choices - 2`
/// (degrees of freedom = `num_choices - 1`)
pub const CHI_SQUARE_DISTRIBUTION: [f64; 20] = [
    3.84, 5.99, 7.81, 9.49, 11.07, 12.59, 14.07, 15.51, 16.92, 18.31, 19.68, 21.03, 22.36, 23.68,
    25.00, 26.30, 27.59, 28.87, 30.14, 31.41,
];

/// Largest choice count for which experiment results report confidence
pub const MAX_CONFIDENCE_CHOICES: usize = 11;

/// Chi-squared statistic across all supplied choices
///
/// Returns 0 when no choice has any plays.
pub fn chi_squared(choices: &[ChoiceCounts]) -> f64 {
    let total_plays: u64 = choices.iter().map(|c| c.plays).sum();
    let total_rewards: u64 = choices.iter().map(|c| c.rewards).sum();

    let mean_success_rate = total_rewards as f64 / total_plays.max(1) as f64;
    let mean_failure_rate = 1.0 - mean_success_rate;

    choices
        .iter()
        .map(|c| {
            let plays = c.plays as f64;
            let rewards = c.rewards as f64;

            term(mean_success_rate * plays, rewards) + term(mean_failure_rate * plays, plays - rewards)
        })
        .sum()
}

/// `(expected - observed)^2 / max(expected, 1)`
fn term(expected: f64, observed: f64) -> f64 {
    (expected - observed).powi(2) / expected.max(1.0)
}

/// Whether a chi-squared value is significant at 95% for `num_choices` choices
///
/// Returns `None` for fewer than 2 or more than `MAX_CONFIDENCE_CHOICES` choices.
pub fn is_confident(chi_squared: f64, num_choices: usize) -> Option<bool> {
    if num_choices > MAX_CONFIDENCE_CHOICES {
        return None;
    }

    let critical = CHI_SQUARE_DISTRIBUTION.get(num_choices.checked_sub(2)?)?;
    Some(chi_squared >= *critical)
}
