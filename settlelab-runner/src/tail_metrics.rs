//! Tail risk of the per-trade pnl distribution: VaR and CVaR at 95%.
//!
//! Both use the nearest-rank 5th percentile of trade returns and are
//! expressed in pnl percent (negative for losses).

use std::cmp::Ordering;

use crate::metrics::mean_f64;

const TAIL: f64 = 0.05;

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

fn cutoff(n: usize) -> usize {
    ((n as f64 * TAIL).ceil() as usize).max(1)
}

/// 5th percentile trade return (nearest rank). `None` for no trades.
pub fn var_95(pnl: &[f64]) -> Option<f64> {
    if pnl.is_empty() {
        return None;
    }
    let sorted = sorted(pnl);
    Some(sorted[cutoff(sorted.len()) - 1])
}

/// Mean of the trade returns at or below the 95% VaR.
pub fn cvar_95(pnl: &[f64]) -> Option<f64> {
    let var = var_95(pnl)?;
    let tail: Vec<f64> = pnl.iter().copied().filter(|p| *p <= var).collect();
    Some(mean_f64(&tail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_returns_none() {
        assert!(var_95(&[]).is_none());
        assert!(cvar_95(&[]).is_none());
    }

    #[test]
    fn small_sample_uses_worst_trade() {
        let pnl = [0.5, -1.2, 0.3, -0.4];
        assert_eq!(var_95(&pnl), Some(-1.2));
        assert_eq!(cvar_95(&pnl), Some(-1.2));
    }

    #[test]
    fn hundred_trades_take_the_fifth_worst() {
        let pnl: Vec<f64> = (0..100).map(|i| i as f64 - 10.0).collect();
        // sorted: -10, -9, -8, -7, -6, ...
        assert_eq!(var_95(&pnl), Some(-6.0));
        assert_eq!(cvar_95(&pnl), Some(-8.0));
    }

    #[test]
    fn cvar_never_exceeds_var() {
        let pnl = [0.9, -0.1, 1.4, -2.2, 0.0, 0.6, -0.7];
        assert!(cvar_95(&pnl).unwrap() <= var_95(&pnl).unwrap());
    }
}
