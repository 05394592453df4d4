use crate::chain::Chain;

/// Computes the per-dimension Gelman-Rubin statistic over walker chains.
///
/// Each walker's recorded trajectory is treated as an independent chain.
/// With `n` recorded steps, within-chain variance `W` and between-chain
/// mean variance `B/n`, the statistic is
/// `sqrt((((n - 1) / n) * W + B/n) / W)`.
///
/// Fewer than two walkers or two recorded steps yields `+inf` on every
/// dimension, as does a stuck ensemble whose walkers disagree without any
/// within-chain spread; the driver then refuses to declare convergence.
pub fn gelman_rubin(chain: &Chain) -> Vec<f64> {
    let dim = chain.dim();
    let n_walkers = chain.n_walkers();
    let n_steps = chain.steps_recorded();
    if n_walkers < 2 || n_steps < 2 {
        return vec![f64::INFINITY; dim];
    }

    let mut sums = vec![0.0; n_walkers * dim];
    let mut squares = vec![0.0; n_walkers * dim];
    let mut counts = vec![0u64; n_walkers];
    for sample in chain.samples() {
        counts[sample.walker] += 1;
        let base = sample.walker * dim;
        for (d, &value) in sample.state.iter().enumerate() {
            sums[base + d] += value;
            squares[base + d] += value * value;
        }
    }

    let mut rhat = Vec::with_capacity(dim);
    for d in 0..dim {
        let mut means = Vec::with_capacity(n_walkers);
        let mut within = 0.0;
        for w in 0..n_walkers {
            let count = counts[w] as f64;
            let mean = sums[w * dim + d] / count;
            let variance = ((squares[w * dim + d] - count * mean * mean) / (count - 1.0)).max(0.0);
            means.push(mean);
            within += variance;
        }
        let within = within / n_walkers as f64;
        let grand = means.iter().sum::<f64>() / n_walkers as f64;
        let between_over_n = means
            .iter()
            .map(|mean| (mean - grand) * (mean - grand))
            .sum::<f64>()
            / (n_walkers as f64 - 1.0);

        let steps = n_steps as f64;
        let value = if within <= f64::EPSILON {
            if between_over_n <= f64::EPSILON {
                1.0
            } else {
                f64::INFINITY
            }
        } else {
            ((((steps - 1.0) / steps) * within + between_over_n) / within).sqrt()
        };
        rhat.push(value);
    }
    rhat
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_from(walker_series: &[&[f64]]) -> Chain {
        let n_walkers = walker_series.len();
        let n_steps = walker_series[0].len();
        let mut chain = Chain::new(1, n_walkers);
        for step in 0..n_steps {
            for (walker, series) in walker_series.iter().enumerate() {
                chain.append(walker, &[series[step]], 0.0);
            }
        }
        chain
    }

    #[test]
    fn matches_the_hand_computed_reference() {
        // Chains [1,2,3] and [2,3,4]: W = 1, B/n = 1/2, n = 3, so
        // R-hat = sqrt(2/3 + 1/2) = sqrt(7/6).
        let chain = chain_from(&[&[1.0, 2.0, 3.0], &[2.0, 3.0, 4.0]]);
        let rhat = gelman_rubin(&chain);
        assert!((rhat[0] - (7.0f64 / 6.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn identical_constant_chains_read_as_converged() {
        let chain = chain_from(&[&[0.5, 0.5, 0.5], &[0.5, 0.5, 0.5]]);
        assert_eq!(gelman_rubin(&chain), vec![1.0]);
    }

    #[test]
    fn disagreeing_stuck_chains_never_converge() {
        let chain = chain_from(&[&[1.0, 1.0, 1.0], &[2.0, 2.0, 2.0]]);
        assert_eq!(gelman_rubin(&chain), vec![f64::INFINITY]);
    }

    #[test]
    fn too_few_samples_yield_infinity() {
        let chain = chain_from(&[&[1.0], &[2.0]]);
        assert_eq!(gelman_rubin(&chain), vec![f64::INFINITY]);
        let empty = Chain::new(3, 8);
        assert_eq!(gelman_rubin(&empty), vec![f64::INFINITY; 3]);
    }
}
