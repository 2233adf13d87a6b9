//! Correctness sweep: every strategy against [`Strategy::Naive`].
//!
//! For each size `N = 4, 8, ..., 256` two random `i32` matrices are
//! multiplied once by the baseline and once by the strategy under test, into
//! independent outputs. A trial passes when the outputs are equal.

use std::fmt;

use rayon::prelude::*;

use crate::element::Element;
use crate::error::{MatmulError, Result};
use crate::matrix::{SquareMatrix, Strategy};

/// Largest size in the sweep.
pub const MAX_SIZE: usize = 256;

/// Sizes in the sweep.
pub const SWEEP_LEN: usize = MAX_SIZE / 4;

/// Runs one trial at size `N`: `true` when `strategy` agrees with the
/// baseline on fresh random operands drawn from `[lower, upper]`.
pub fn check_size<T: Element, const N: usize>(
    strategy: Strategy,
    lower: T,
    upper: T,
) -> Result<bool> {
    let a = SquareMatrix::<T, N>::make_random(lower, upper)?;
    let b = SquareMatrix::<T, N>::make_random(lower, upper)?;

    let mut expected = SquareMatrix::<T, N>::new();
    let mut actual = SquareMatrix::<T, N>::new();
    a.multiply(&b, &mut expected, Strategy::Naive)?;
    a.multiply(&b, &mut actual, strategy)?;

    let matches = expected == actual;
    if !matches {
        log::error!("{strategy} disagrees with {} at N = {N}", Strategy::Naive);
    }
    Ok(matches)
}

macro_rules! sweep {
    ($strategy:expr, $lower:expr, $upper:expr, $max:expr; $($n:literal)+) => {{
        let mut outcomes = Vec::with_capacity(SWEEP_LEN);
        $(
            if $n <= $max {
                outcomes.push(check_size::<i32, $n>($strategy, $lower, $upper)?);
            }
        )+
        outcomes
    }};
}

fn sweep_once(strategy: Strategy, lower: i32, upper: i32, max_size: usize) -> Result<Vec<bool>> {
    Ok(sweep!(strategy, lower, upper, max_size;
        4 8 12 16 20 24 28 32 36 40 44 48 52 56 60 64
        68 72 76 80 84 88 92 96 100 104 108 112 116 120 124 128
        132 136 140 144 148 152 156 160 164 168 172 176 180 184 188 192
        196 200 204 208 212 216 220 224 228 232 236 240 244 248 252 256
    ))
}

/// Matches out of trials for one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationReport {
    pub strategy: Strategy,
    pub matches: usize,
    pub trials: usize,
}

impl ValidationReport {
    /// Share of matching trials in percent; zero when nothing ran.
    pub fn percentage(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.matches as f64 / self.trials as f64 * 100.0
    }

    pub fn is_exact(&self) -> bool {
        self.trials > 0 && self.matches == self.trials
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} : {}/{} [{:.2}%]",
            self.strategy,
            self.matches,
            self.trials,
            self.percentage()
        )
    }
}

/// Runs the full sweep `runs` times for `strategy`.
pub fn validate_strategy(
    strategy: Strategy,
    runs: usize,
    lower: i32,
    upper: i32,
) -> Result<ValidationReport> {
    validate_strategy_up_to(strategy, runs, lower, upper, MAX_SIZE)
}

/// [`validate_strategy`] restricted to sizes up to `max_size`.
///
/// Repetitions run in parallel on the rayon pool; each one is a sequential
/// sweep over its own matrices.
pub fn validate_strategy_up_to(
    strategy: Strategy,
    runs: usize,
    lower: i32,
    upper: i32,
    max_size: usize,
) -> Result<ValidationReport> {
    if lower > upper {
        return Err(MatmulError::InvalidBounds {
            lower: lower.to_string(),
            upper: upper.to_string(),
        });
    }

    log::debug!(
        "validating {strategy}: {runs} runs up to N = {max_size}, values in [{lower}, {upper}]"
    );

    let (matches, trials) = (0..runs)
        .into_par_iter()
        .map(|_| {
            let outcomes = sweep_once(strategy, lower, upper, max_size)?;
            let matches = outcomes.iter().filter(|&&ok| ok).count();
            Ok((matches, outcomes.len()))
        })
        .try_reduce(|| (0, 0), |lhs, rhs| Ok((lhs.0 + rhs.0, lhs.1 + rhs.1)))?;

    Ok(ValidationReport {
        strategy,
        matches,
        trials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let report = ValidationReport {
            strategy: Strategy::Tiled,
            matches: 63,
            trials: 64,
        };
        assert_eq!(report.to_string(), "TILED : 63/64 [98.44%]");
        assert!(!report.is_exact());
    }

    #[test]
    fn test_empty_report() {
        let report = ValidationReport {
            strategy: Strategy::Naive,
            matches: 0,
            trials: 0,
        };
        assert_eq!(report.percentage(), 0.0);
        assert!(!report.is_exact());
    }

    #[test]
    fn test_sweep_respects_limit() {
        let outcomes = sweep_once(Strategy::Transposed, 0, 9, 16).unwrap();
        assert_eq!(outcomes, vec![true; 4]);
    }
}
