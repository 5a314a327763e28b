//! Column-wise feature normalization.
//!
//! Statistics are taken over real entity rows only. Padded rows (all zero)
//! are skipped when fitting and left untouched when normalizing, so padding
//! stays recognisable in a normalized batch.

use crate::tensor::Tensor;

/// Per-column mean and standard deviation of feature rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStats {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

fn rows(x: &Tensor) -> impl Iterator<Item = &[f32]> {
    let width = x.shape().last().copied().unwrap_or(0).max(1);
    x.data().chunks(width)
}

fn is_padding(row: &[f32]) -> bool {
    row.iter().all(|&v| v == 0.0)
}

impl FeatureStats {
    /// Fit on the non-padded rows of a feature tensor of any rank.
    pub fn fit(x: &Tensor) -> Self {
        let width = x.shape().last().copied().unwrap_or(0);
        let mut sum = vec![0.0f64; width];
        let mut count = 0usize;
        for row in rows(x).filter(|r| !is_padding(r)) {
            for (s, &v) in sum.iter_mut().zip(row) {
                *s += v as f64;
            }
            count += 1;
        }
        let n = count.max(1) as f64;
        let mean: Vec<f64> = sum.iter().map(|s| s / n).collect();

        let mut sq = vec![0.0f64; width];
        for row in rows(x).filter(|r| !is_padding(r)) {
            for ((s, &v), m) in sq.iter_mut().zip(row).zip(&mean) {
                let d = v as f64 - m;
                *s += d * d;
            }
        }
        let std = sq
            .iter()
            .map(|s| {
                let sd = (s / n).sqrt();
                if sd == 0.0 {
                    1.0
                } else {
                    sd as f32
                }
            })
            .collect();

        Self {
            mean: mean.into_iter().map(|m| m as f32).collect(),
            std,
        }
    }

    pub fn normalize_row(&self, row: &mut [f32]) {
        for ((v, m), s) in row.iter_mut().zip(&self.mean).zip(&self.std) {
            *v = (*v - m) / s;
        }
    }

    pub fn unnormalize_row(&self, row: &mut [f32]) {
        for ((v, m), s) in row.iter_mut().zip(&self.mean).zip(&self.std) {
            *v = *v * s + m;
        }
    }

    /// Normalize every non-padded row of `x` in place.
    pub fn normalize(&self, x: &mut Tensor) {
        let width = self.mean.len().max(1);
        let data = x.data_mut();
        for row in data.chunks_mut(width) {
            if !is_padding(row) {
                self.normalize_row(row);
            }
        }
    }
}

/// Recover type indices from one-hot feature rows: the first column of the
/// leading `type_count` block that is (numerically) one. Rows with no such
/// column map to index 0, the unknown type.
pub fn node_types<'a>(rows: impl IntoIterator<Item = &'a [f32]>, type_count: usize) -> Vec<usize> {
    rows.into_iter()
        .map(|row| {
            row.iter()
                .take(type_count)
                .position(|&v| v > 0.99999)
                .unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn features() -> Tensor {
        // two samples, three rows, width 2; last row of sample 1 is padding
        let mut x = Tensor::zeros(&[2, 3, 2]);
        x.set(&[0, 0, 0], 1.0);
        x.set(&[0, 1, 1], 1.0);
        x.set(&[0, 2, 1], 1.0);
        x.set(&[1, 0, 0], 1.0);
        x.set(&[1, 1, 1], 1.0);
        x
    }

    #[test]
    fn fit_ignores_padding() {
        let stats = FeatureStats::fit(&features());
        // five real rows: column 0 is one in two of them
        assert_abs_diff_eq!(stats.mean[0], 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(stats.mean[1], 0.6, epsilon = 1e-6);
        assert_abs_diff_eq!(stats.std[0], 0.24f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn constant_column_gets_unit_std() {
        let mut x = Tensor::zeros(&[1, 2, 2]);
        x.set(&[0, 0, 0], 1.0);
        x.set(&[0, 1, 0], 1.0);
        let stats = FeatureStats::fit(&x);
        assert_eq!(stats.std, vec![1.0, 1.0]);
    }

    #[test]
    fn normalized_columns_are_centered() {
        let mut x = features();
        let stats = FeatureStats::fit(&x);
        stats.normalize(&mut x);
        let real: Vec<&[f32]> = x.data().chunks(2).filter(|r| !is_padding(r)).collect();
        assert_eq!(real.len(), 5);
        let mean0: f32 = real.iter().map(|r| r[0]).sum::<f32>() / 5.0;
        assert_abs_diff_eq!(mean0, 0.0, epsilon = 1e-5);
        assert_eq!(x.row(1, 2), &[0.0, 0.0]);
    }

    #[test]
    fn unnormalize_recovers_types() {
        let original = features();
        let mut x = original.clone();
        let stats = FeatureStats::fit(&x);
        stats.normalize(&mut x);

        let mut restored: Vec<Vec<f32>> = x.data().chunks(2).map(<[f32]>::to_vec).collect();
        for row in restored.iter_mut().take(5) {
            stats.unnormalize_row(row);
        }
        for (r, o) in restored.iter().zip(original.data().chunks(2)) {
            assert_abs_diff_eq!(r[0], o[0], epsilon = 1e-5);
            assert_abs_diff_eq!(r[1], o[1], epsilon = 1e-5);
        }
        let types = node_types(restored.iter().map(Vec::as_slice), 2);
        assert_eq!(types, vec![0, 1, 1, 0, 1, 0]);
    }

    #[test]
    fn node_types_reads_leading_block() {
        let rows: [&[f32]; 3] = [&[0.0, 0.0, 1.0, 1.0], &[0.0, 1.0, 0.0, 0.0], &[0.2, 0.3, 0.0, 1.0]];
        assert_eq!(node_types(rows, 3), vec![2, 1, 0]);
    }
}
