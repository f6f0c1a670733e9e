//! Small statistics helpers shared by the estimators
//!
//! Median, mean/std, gray histograms, percentiles and moving averages over
//! plain slices. Empty inputs give `None` (or an empty result) rather than NaN.

use crate::buffer::RasterBuffer;

/// Median of a slice (average of the two middle values for even lengths).
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut v: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    let n = v.len();
    Some(if n % 2 == 1 {
        v[n / 2]
    } else {
        (v[n / 2 - 1] + v[n / 2]) / 2.0
    })
}

/// Mean and population standard deviation.
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    Some((mean, var.max(0.0).sqrt()))
}

/// Population variance of integer counts.
pub fn variance_u32(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n
}

/// 256-bin histogram of the first channel.
pub fn gray_histogram(buf: &RasterBuffer) -> [u64; 256] {
    let mut hist = [0u64; 256];
    let c = buf.channels().max(1);
    for px in buf.data().chunks_exact(c) {
        hist[px[0] as usize] += 1;
    }
    hist
}

/// Value below which `percent` (0..=100) of the samples fall.
///
/// Uses a fixed-bin histogram between the sample minimum and maximum,
/// returning the lower edge of the bin where the cumulative count crosses.
pub fn histogram_percentile(values: &[f32], percent: f64, bins: usize) -> Option<f32> {
    let (lo, hi) = min_max(values)?;
    if hi <= lo || bins == 0 {
        return Some(lo);
    }
    let scale = (bins - 1) as f32 / (hi - lo);
    let mut hist = vec![0u64; bins];
    for &v in values {
        hist[((v - lo) * scale) as usize] += 1;
    }
    let target = (percent.clamp(0.0, 100.0) / 100.0 * values.len() as f64).ceil() as u64;
    let mut acc = 0u64;
    for (i, &h) in hist.iter().enumerate() {
        acc += h;
        if acc >= target.max(1) {
            return Some(lo + i as f32 / scale);
        }
    }
    Some(hi)
}

/// Minimum and maximum of finite samples.
pub fn min_max(values: &[f32]) -> Option<(f32, f32)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Centered moving average; the window shrinks at the ends.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let half = window / 2;
    let mut prefix = vec![0.0f64; n + 1];
    for (i, &v) in values.iter().enumerate() {
        prefix[i + 1] = prefix[i] + v;
    }
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            (prefix[hi] - prefix[lo]) / (hi - lo) as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn test_mean_std() {
        let (m, s) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((m - 5.0).abs() < 1e-12);
        assert!((s - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_percentile() {
        let values: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        let p = histogram_percentile(&values, 50.0, 1000).unwrap();
        assert!((p - 499.0).abs() <= 2.0);
        let lo = histogram_percentile(&values, 0.5, 1000).unwrap();
        assert!(lo <= 6.0);
    }

    #[test]
    fn test_moving_average() {
        let v = moving_average(&[0.0, 0.0, 3.0, 0.0, 0.0], 3);
        assert_eq!(v, vec![0.0, 1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_variance_u32() {
        assert_eq!(variance_u32(&[5, 5, 5]), 0.0);
        assert!((variance_u32(&[0, 10]) - 25.0).abs() < 1e-12);
    }
}
