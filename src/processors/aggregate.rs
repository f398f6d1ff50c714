//! Per-gain aggregation for the VIS channel.
//!
//! The exposure test samples each configuration repeatedly, so the VIS
//! chart shows one mean point with an error bar per gain level instead
//! of every raw sample.

/// Mean and spread of repeated samples at one gain level.
#[derive(Debug, Clone, PartialEq)]
pub struct GainStat {
    /// Gain setting the samples were taken at.
    pub gain: f64,
    /// Mean of the samples.
    pub mean: f64,
    /// Population standard deviation of the samples.
    pub std_dev: f64,
    /// Number of samples.
    pub count: usize,
}

/// Aggregate (gain, value) samples into per-gain statistics.
///
/// Samples are grouped by exact gain value; output is sorted by gain.
/// Non-finite samples must already have been filtered out by cleaning.
pub fn aggregate_by_gain(points: &[(f64, f64)]) -> Vec<GainStat> {
    let mut gains: Vec<f64> = points.iter().map(|(g, _)| *g).collect();
    gains.sort_by(|a, b| a.total_cmp(b));
    gains.dedup();

    gains
        .into_iter()
        .map(|gain| {
            let values: Vec<f64> = points
                .iter()
                .filter(|(g, _)| *g == gain)
                .map(|(_, v)| *v)
                .collect();

            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

            GainStat {
                gain,
                mean,
                std_dev: variance.sqrt(),
                count: values.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_mean_and_population_std() {
        let points = vec![(4.0, 10.0), (4.0, 12.0), (4.0, 14.0)];
        let stats = aggregate_by_gain(&points);

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].count, 3);
        assert!((stats[0].mean - 12.0).abs() < TOL);
        // population std of [10, 12, 14] = sqrt(8/3)
        assert!((stats[0].std_dev - (8.0f64 / 3.0).sqrt()).abs() < TOL);
    }

    #[test]
    fn test_sorted_by_gain() {
        let points = vec![(8.0, 1.0), (1.0, 2.0), (4.0, 3.0), (1.0, 4.0)];
        let stats = aggregate_by_gain(&points);

        let gains: Vec<f64> = stats.iter().map(|s| s.gain).collect();
        assert_eq!(gains, vec![1.0, 4.0, 8.0]);
        assert_eq!(stats[0].count, 2);
        assert!((stats[0].mean - 3.0).abs() < TOL);
    }

    #[test]
    fn test_single_sample_has_zero_spread() {
        let stats = aggregate_by_gain(&[(2.0, 5.0)]);
        assert_eq!(stats.len(), 1);
        assert!((stats[0].std_dev).abs() < TOL);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_by_gain(&[]).is_empty());
    }
}
