use crate::helper::error_chain_fmt;

/// L2-normalizes a vector, putting it on the unit hypersphere so that
/// cosine similarity and Euclidean ranking order agree.
///
/// A vector with zero norm is returned unchanged: a true zero vector
/// signals degenerate input and callers must treat it as "no usable
/// embedding" rather than a comparable point.
pub fn l2_normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }

    vector.iter().map(|x| x / norm).collect()
}

/// Combines several equal-length vectors into one representative vector:
/// the componentwise (optionally weighted) arithmetic mean, L2-normalized.
///
/// Weights must be non-negative and aligned with `vectors`; weights
/// summing to zero make the weighted mean undefined and are rejected.
pub fn mean_pool(
    vectors: &[Vec<f32>],
    weights: Option<&[f32]>,
) -> Result<Vec<f32>, MeanPoolingError> {
    let first = vectors.first().ok_or(MeanPoolingError::EmptyInput)?;
    let dimension = first.len();

    for vector in vectors {
        if vector.len() != dimension {
            return Err(MeanPoolingError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }
    }

    let mean = match weights {
        None => {
            let mut sums = vec![0.0f32; dimension];
            for vector in vectors {
                for (sum, component) in sums.iter_mut().zip(vector) {
                    *sum += component;
                }
            }
            let count = vectors.len() as f32;
            sums.into_iter().map(|sum| sum / count).collect::<Vec<_>>()
        }
        Some(weights) => {
            if weights.len() != vectors.len() {
                return Err(MeanPoolingError::WeightsLengthMismatch {
                    weights: weights.len(),
                    vectors: vectors.len(),
                });
            }

            let weight_sum: f32 = weights.iter().sum();
            if !(weight_sum.abs() > f32::EPSILON) {
                return Err(MeanPoolingError::DegenerateWeights);
            }

            let mut sums = vec![0.0f32; dimension];
            for (vector, weight) in vectors.iter().zip(weights) {
                for (sum, component) in sums.iter_mut().zip(vector) {
                    *sum += component * weight;
                }
            }
            sums.into_iter()
                .map(|sum| sum / weight_sum)
                .collect::<Vec<_>>()
        }
    };

    Ok(l2_normalize(&mean))
}

#[derive(thiserror::Error)]
pub enum MeanPoolingError {
    #[error("No vectors to pool")]
    EmptyInput,

    #[error("Vectors have mismatched dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Got {weights} weights for {vectors} vectors")]
    WeightsLengthMismatch { weights: usize, vectors: usize },

    #[error("Weights sum to zero, the weighted mean is undefined")]
    DegenerateWeights,
}

impl std::fmt::Debug for MeanPoolingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
