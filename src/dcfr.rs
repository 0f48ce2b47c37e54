//! Per-node DCFR storage: cumulative regrets and strategies with quantised
//! `i16 + f32`-scale encoding, plus the per-iteration discount schedule.

use crate::sliceop::*;

/// Discount coefficients of one DCFR iteration, precomputed once per
/// iteration.
pub struct DiscountParams {
    /// Coefficient for accumulated positive regrets.
    pub alpha_t: f32,
    /// Coefficient for accumulated negative regrets.
    pub beta_t: f32,
    /// Coefficient for accumulated strategy contributions.
    pub gamma_t: f32,
}

impl DiscountParams {
    /// `alpha = t'^1.5 / (t'^1.5 + 1)` with `t' = max(t - 1, 0)`,
    /// `beta = 0.5`, `gamma = (t / (t + 1))^2`.
    pub fn new(current_iteration: u32) -> Self {
        let t_alpha = current_iteration.saturating_sub(1) as f64;
        let pow_alpha = t_alpha * t_alpha.sqrt();

        let t = current_iteration as f64;
        let ratio = t / (t + 1.0);

        Self {
            alpha_t: (pow_alpha / (pow_alpha + 1.0)) as f32,
            beta_t: 0.5,
            gamma_t: (ratio * ratio) as f32,
        }
    }
}

/// Quantises `src` into `dst` and returns the scale.
///
/// The largest magnitude maps to `i16::MAX`; decoding an entry is
/// `dst[i] as f32 * scale / 32767.0`, so the absolute error per entry is at
/// most `scale / 32767`.
pub(crate) fn encode_signed_slice(dst: &mut [i16], src: &[f32]) -> f32 {
    let max_abs = src.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
    let scale = if is_zero(max_abs) { 1.0 } else { max_abs };
    let encoder = i16::MAX as f32 / scale;

    dst.iter_mut().zip(src).for_each(|(d, s)| {
        *d = (s * encoder).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
    });

    scale
}

/// Cumulative-strategy storage; regrets are always quantised, the strategy
/// only when compression is enabled. Arrays are allocated by the trainer
/// after the memory check, not at tree-build time.
#[derive(Debug)]
enum StrategyStorage {
    Unallocated,
    Quantized { data: Vec<i16>, scale: f32 },
    Raw(Vec<f32>),
}

/// Cumulative regrets and strategies of one action node, laid out as
/// `num_actions` rows of `num_hands` entries.
#[derive(Debug)]
pub struct DcfrState {
    num_hands: usize,
    num_actions: usize,
    regrets: Vec<i16>,
    regret_scale: f32,
    strategy: StrategyStorage,
}

impl DcfrState {
    pub(crate) fn new(num_hands: usize, num_actions: usize) -> Self {
        Self {
            num_hands,
            num_actions,
            regrets: Vec::new(),
            regret_scale: 1.0,
            strategy: StrategyStorage::Unallocated,
        }
    }

    /// Allocates (or re-initialises) the storage arrays.
    pub(crate) fn allocate(&mut self, compression: bool) {
        let len = self.num_hands * self.num_actions;
        self.regrets = vec![0; len];
        self.regret_scale = 1.0;
        self.strategy = if compression {
            StrategyStorage::Quantized {
                data: vec![0; len],
                scale: 1.0,
            }
        } else {
            StrategyStorage::Raw(vec![0.0; len])
        };
    }

    #[inline]
    pub(crate) fn is_allocated(&self) -> bool {
        !matches!(self.strategy, StrategyStorage::Unallocated)
    }

    #[inline]
    pub fn num_hands(&self) -> usize {
        self.num_hands
    }

    #[inline]
    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Scale of the quantised regret array; the decoded error per entry is
    /// bounded by `regret_scale / 32767`.
    #[inline]
    pub fn regret_scale(&self) -> f32 {
        self.regret_scale
    }

    /// Current strategy by regret matching: per hand, positive regrets
    /// normalised to a distribution, uniform where no positive regret
    /// exists.
    pub fn current_strategy(&self) -> Vec<f32> {
        if !self.is_allocated() {
            return vec![1.0 / self.num_actions as f32; self.num_hands * self.num_actions];
        }

        let mut strategy: Vec<f32> = self
            .regrets
            .iter()
            .map(|&r| r.max(0) as f32)
            .collect();

        let mut denom = vec![0.0; self.num_hands];
        sum_slices(&mut denom, &strategy);

        let default = 1.0 / self.num_actions as f32;
        strategy
            .chunks_exact_mut(self.num_hands)
            .for_each(|row| div_slice(row, &denom, default));

        strategy
    }

    /// Average strategy: per hand, the decoded cumulative strategy
    /// normalised to a distribution, uniform where all entries are zero.
    pub fn average_strategy(&self) -> Vec<f32> {
        let mut average = match &self.strategy {
            StrategyStorage::Unallocated => {
                return vec![1.0 / self.num_actions as f32; self.num_hands * self.num_actions];
            }
            StrategyStorage::Quantized { data, scale } => {
                let decoder = scale / i16::MAX as f32;
                data.iter().map(|&v| v as f32 * decoder).collect::<Vec<_>>()
            }
            StrategyStorage::Raw(data) => data.clone(),
        };

        let mut denom = vec![0.0; self.num_hands];
        sum_slices(&mut denom, &average);

        let default = 1.0 / self.num_actions as f32;
        average
            .chunks_exact_mut(self.num_hands)
            .for_each(|row| div_slice(row, &denom, default));

        average
    }

    /// Applies the discounted regret update:
    /// `new[h,a] = discount(old) * decode(old[h,a]) + (u[h,a] - v[h])`,
    /// then re-quantises.
    pub(crate) fn update_regrets(
        &mut self,
        action_utils: &[f32],
        value: &[f32],
        params: &DiscountParams,
    ) {
        debug_assert_eq!(action_utils.len(), self.regrets.len());
        debug_assert_eq!(value.len(), self.num_hands);

        let alpha_decoder = params.alpha_t * self.regret_scale / i16::MAX as f32;
        let beta_decoder = params.beta_t * self.regret_scale / i16::MAX as f32;

        let mut new_regrets = vec![0.0f32; self.regrets.len()];
        for action in 0..self.num_actions {
            let utils = row(action_utils, action, self.num_hands);
            let old = row(&self.regrets, action, self.num_hands);
            let new = row_mut(&mut new_regrets, action, self.num_hands);

            for hand in 0..self.num_hands {
                let decoder = if old[hand] >= 0 { alpha_decoder } else { beta_decoder };
                new[hand] = old[hand] as f32 * decoder + utils[hand] - value[hand];
            }
        }

        self.regret_scale = encode_signed_slice(&mut self.regrets, &new_regrets);
    }

    /// Applies the discounted cumulative-strategy update:
    /// `new[h,a] = gamma * decode(old[h,a]) + strategy[h,a] * reach[h]`.
    pub(crate) fn update_cum_strategy(
        &mut self,
        strategy: &[f32],
        reach: &[f32],
        params: &DiscountParams,
    ) {
        debug_assert_eq!(strategy.len(), self.num_hands * self.num_actions);
        debug_assert_eq!(reach.len(), self.num_hands);

        match &mut self.strategy {
            StrategyStorage::Unallocated => unreachable!("DCFR storage not allocated"),
            StrategyStorage::Quantized { data, scale } => {
                let decoder = params.gamma_t * *scale / i16::MAX as f32;
                let mut new_strategy = vec![0.0f32; data.len()];

                for action in 0..self.num_actions {
                    let strat = row(strategy, action, self.num_hands);
                    let old = row(data, action, self.num_hands);
                    let new = row_mut(&mut new_strategy, action, self.num_hands);

                    for hand in 0..self.num_hands {
                        new[hand] = old[hand] as f32 * decoder + strat[hand] * reach[hand];
                    }
                }

                *scale = encode_signed_slice(data, &new_strategy);
            }
            StrategyStorage::Raw(data) => {
                let gamma = params.gamma_t;
                for action in 0..self.num_actions {
                    let strat = row(strategy, action, self.num_hands);
                    let old = row_mut(data, action, self.num_hands);

                    for hand in 0..self.num_hands {
                        old[hand] = old[hand] * gamma + strat[hand] * reach[hand];
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_params() {
        let params = DiscountParams::new(1);
        assert_eq!(params.alpha_t, 0.0);
        assert_eq!(params.beta_t, 0.5);
        assert!((params.gamma_t - 0.25).abs() < 1e-6);

        let params = DiscountParams::new(10);
        let pow = 27.0f64; // 9^1.5
        assert!((params.alpha_t as f64 - pow / (pow + 1.0)).abs() < 1e-6);
        assert!((params.gamma_t as f64 - (10.0f64 / 11.0).powi(2)).abs() < 1e-6);
    }

    #[test]
    fn test_encode_decode_error_bound() {
        let src = [1.5, -3.25, 0.0, 1000.0, -0.001];
        let mut dst = [0i16; 5];
        let scale = encode_signed_slice(&mut dst, &src);
        assert_eq!(scale, 1000.0);

        let bound = scale / i16::MAX as f32;
        for (d, s) in dst.iter().zip(&src) {
            let decoded = *d as f32 * scale / i16::MAX as f32;
            assert!((decoded - s).abs() <= bound, "{decoded} vs {s}");
        }
    }

    #[test]
    fn test_encode_all_zero() {
        let mut dst = [0i16; 3];
        let scale = encode_signed_slice(&mut dst, &[0.0; 3]);
        assert_eq!(scale, 1.0);
        assert_eq!(dst, [0; 3]);
    }

    #[test]
    fn test_current_strategy_uniform_fallback() {
        let mut state = DcfrState::new(2, 3);
        state.allocate(true);
        let strategy = state.current_strategy();
        assert!(strategy.iter().all(|&s| (s - 1.0 / 3.0).abs() < 1e-6));
    }

    #[test]
    fn test_current_strategy_regret_matching() {
        let mut state = DcfrState::new(1, 2);
        state.allocate(true);
        // hand 0: action 0 regret 3, action 1 regret 1
        let utils = [3.0, 1.0];
        let value = [0.0];
        state.update_regrets(&utils, &value, &DiscountParams::new(1));

        let strategy = state.current_strategy();
        assert!((strategy[0] - 0.75).abs() < 1e-4);
        assert!((strategy[1] - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_negative_regret_discounting() {
        let mut state = DcfrState::new(1, 2);
        state.allocate(true);
        let params = DiscountParams::new(2);
        state.update_regrets(&[-4.0, 4.0], &[0.0], &params);
        // second update halves the stored negative regret before adding
        state.update_regrets(&[0.0, 0.0], &[0.0], &params);

        let strategy = state.current_strategy();
        assert_eq!(strategy[0], 0.0);
        assert_eq!(strategy[1], 1.0);
    }

    #[test]
    fn test_strategy_simplex() {
        for compression in [false, true] {
            let mut state = DcfrState::new(3, 4);
            state.allocate(compression);
            let params = DiscountParams::new(5);
            let utils: Vec<f32> = (0..12).map(|i| (i as f32 * 0.37).sin()).collect();
            state.update_regrets(&utils, &[0.1, -0.2, 0.3], &params);
            state.update_cum_strategy(
                &state.current_strategy(),
                &[0.5, 1.0, 0.25],
                &params,
            );

            for strategy in [state.current_strategy(), state.average_strategy()] {
                for hand in 0..3 {
                    let sum: f32 = (0..4).map(|a| strategy[a * 3 + hand]).sum();
                    assert!((sum - 1.0).abs() < 1e-5, "sum = {sum}");
                }
            }
        }
    }
}
