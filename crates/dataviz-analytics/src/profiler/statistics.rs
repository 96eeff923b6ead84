//! Descriptive statistics over plain `f64` slices.
//!
//! Callers strip missing values before calling in; every function returns
//! `None` when the statistic is undefined for the input size.

use crate::types::Trend;

/// Relative change between half-means that counts as a trend.
const TREND_TOLERANCE: f64 = 0.05;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(&sorted(values), 0.5)
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() as f64 - 1.0);
    Some(variance.sqrt())
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Quantile of already-sorted values using linear interpolation between
/// the closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Compare the mean of the first half of the rows with the second half.
///
/// `values` is row-aligned; missing entries are skipped inside each half.
pub fn trend(values: &[Option<f64>]) -> Trend {
    let (first, second) = values.split_at(values.len() / 2);
    let first: Vec<f64> = first.iter().flatten().copied().collect();
    let second: Vec<f64> = second.iter().flatten().copied().collect();

    let (Some(first_mean), Some(second_mean)) = (mean(&first), mean(&second)) else {
        return Trend::Stable;
    };

    if second_mean > first_mean * (1.0 + TREND_TOLERANCE) {
        Trend::Increasing
    } else if second_mean < first_mean * (1.0 - TREND_TOLERANCE) {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Percent change of the second-half mean relative to the first-half mean.
pub fn half_change_pct(values: &[Option<f64>]) -> Option<f64> {
    let (first, second) = values.split_at(values.len() / 2);
    let first: Vec<f64> = first.iter().flatten().copied().collect();
    let second: Vec<f64> = second.iter().flatten().copied().collect();
    let first_mean = mean(&first)?;
    let second_mean = mean(&second)?;
    if first_mean == 0.0 {
        return None;
    }
    Some((second_mean - first_mean) / first_mean.abs() * 100.0)
}

/// Adjusted Fisher-Pearson skewness (the estimator pandas reports).
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len() as f64;
    if values.len() < 3 {
        return None;
    }
    let mean = mean(values)?;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if m2 == 0.0 {
        return Some(0.0);
    }
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
    let g1 = m3 / m2.powf(1.5);
    Some(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0))
}

/// Pearson correlation over rows where both values are present.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        cov += (a - mean_x) * (b - mean_y);
        var_x += (a - mean_x).powi(2);
        var_y += (b - mean_y).powi(2);
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}
