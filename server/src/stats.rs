//! Shared numeric primitives used by more than one engine: percentile lookup,
//! Shannon entropy, and the fixed CDF tables the hotspot engine normalizes
//! against.

/// Clamp a value into `[0,1]`.
pub fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// `sorted[floor(p*n/100)]`, clamped to the last index. Deliberately not
/// interpolated — see the open-question note in DESIGN.md.
pub fn percentile(sorted_ascending: &[f64], p: f64) -> f64 {
    if sorted_ascending.is_empty() {
        return 0.0;
    }
    let n = sorted_ascending.len();
    let idx = ((p * n as f64) / 100.0).floor() as usize;
    sorted_ascending[idx.min(n - 1)]
}

pub fn p50(sorted_ascending: &[f64]) -> f64 {
    percentile(sorted_ascending, 50.0)
}

pub fn p95(sorted_ascending: &[f64]) -> f64 {
    percentile(sorted_ascending, 95.0)
}

/// Shannon entropy (base 2) of a probability distribution that sums to 1.
/// Zero-probability buckets contribute nothing; an empty or single-bucket
/// distribution has entropy 0.
pub fn shannon_entropy(proportions: &[f64]) -> f64 {
    if proportions.len() <= 1 {
        return 0.0;
    }
    -proportions
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| p * p.log2())
        .sum::<f64>()
}

/// Linear interpolation over a fixed `(x, y)` table, clamped at the ends.
/// Used by the hotspot engine's CDF normalization.
fn interpolate(table: &[(f64, f64)], x: f64) -> f64 {
    if table.is_empty() {
        return 0.0;
    }
    if x <= table[0].0 {
        return table[0].1;
    }
    let last = table.len() - 1;
    if x >= table[last].0 {
        return table[last].1;
    }
    for window in table.windows(2) {
        let (x0, y0) = window[0];
        let (x1, y1) = window[1];
        if x >= x0 && x <= x1 {
            if (x1 - x0).abs() < f64::EPSILON {
                return y0;
            }
            let t = (x - x0) / (x1 - x0);
            return y0 + t * (y1 - y0);
        }
    }
    table[last].1
}

/// Empirical CDF for commit counts, calibrated against industry benchmarks
/// for "how churny is this file relative to a typical codebase".
const CHURN_CDF: &[(f64, f64)] = &[
    (0.0, 0.0),
    (1.0, 0.10),
    (5.0, 0.35),
    (10.0, 0.55),
    (20.0, 0.75),
    (50.0, 0.90),
    (100.0, 0.97),
    (250.0, 1.0),
];

/// Empirical CDF for average cognitive complexity per file.
const COMPLEXITY_CDF: &[(f64, f64)] = &[
    (0.0, 0.0),
    (2.0, 0.15),
    (5.0, 0.40),
    (10.0, 0.60),
    (15.0, 0.75),
    (25.0, 0.90),
    (40.0, 0.97),
    (80.0, 1.0),
];

pub fn normalize_churn_cdf(commits: f64) -> f64 {
    clamp01(interpolate(CHURN_CDF, commits))
}

pub fn normalize_complexity_cdf(avg_cognitive: f64) -> f64 {
    clamp01(interpolate(COMPLEXITY_CDF, avg_cognitive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_floor_rule() {
        let v = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(p50(&v), v[(0.5f64 * 10.0).floor() as usize]);
        assert_eq!(p95(&v), v[(0.95f64 * 10.0).floor() as usize]);
    }

    #[test]
    fn percentile_empty_is_zero() {
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn p50_le_p95() {
        let v: Vec<f64> = (1..=37).map(|n| n as f64).collect();
        assert!(p50(&v) <= p95(&v));
    }

    #[test]
    fn entropy_zero_for_single_bucket() {
        assert_eq!(shannon_entropy(&[1.0]), 0.0);
        assert_eq!(shannon_entropy(&[]), 0.0);
    }

    #[test]
    fn entropy_max_for_uniform_pair() {
        let e = shannon_entropy(&[0.5, 0.5]);
        assert!((e - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cdf_bounds() {
        assert_eq!(normalize_churn_cdf(0.0), 0.0);
        assert_eq!(normalize_churn_cdf(10_000.0), 1.0);
        assert!(normalize_churn_cdf(10.0) > normalize_churn_cdf(5.0));
    }
}
