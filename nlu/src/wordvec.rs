use sha2::{Digest, Sha256};

pub const DEFAULT_WORDVEC_MODEL_ID: &str = "wordvec-default-v1";
pub const DEFAULT_WORDVEC_DIMS: usize = 64;

/// Word-vector model seam: a word-mover distance between token sequences.
/// Either side empty is an undefined comparison and maps to infinity, which
/// the similarity transform turns into zero.
pub trait WordVectors: Send + Sync {
    fn distance(&self, left: &[String], right: &[String]) -> f32;
}

/// Deterministic embedding model seeded by hashing `(model_id, word)`.
/// Computes a relaxed word-mover distance: the symmetric mean of each side's
/// average nearest-neighbor transport cost.
pub struct HashEmbeddingModel {
    model_id: String,
    dims: usize,
}

impl HashEmbeddingModel {
    pub fn new(model_id: impl Into<String>, dims: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dims: dims.max(1),
        }
    }

    fn embed(&self, word: &str) -> Vec<f32> {
        let mut hasher = Sha256::new();
        hasher.update(self.model_id.as_bytes());
        hasher.update(word.as_bytes());
        let digest = hasher.finalize();

        let mut out = Vec::with_capacity(self.dims);
        for i in 0..self.dims {
            let byte = digest[i % digest.len()];
            let value = (byte as f32 / 127.5) - 1.0;
            out.push(value);
        }

        out
    }
}

impl Default for HashEmbeddingModel {
    fn default() -> Self {
        Self::new(DEFAULT_WORDVEC_MODEL_ID, DEFAULT_WORDVEC_DIMS)
    }
}

impl WordVectors for HashEmbeddingModel {
    fn distance(&self, left: &[String], right: &[String]) -> f32 {
        if left.is_empty() || right.is_empty() {
            return f32::INFINITY;
        }

        let left_vectors: Vec<Vec<f32>> = left.iter().map(|word| self.embed(word)).collect();
        let right_vectors: Vec<Vec<f32>> = right.iter().map(|word| self.embed(word)).collect();

        (directional_cost(&left_vectors, &right_vectors)
            + directional_cost(&right_vectors, &left_vectors))
            / 2.0
    }
}

/// Mean over `from` of the cheapest move into `to`.
fn directional_cost(from: &[Vec<f32>], to: &[Vec<f32>]) -> f32 {
    let total: f32 = from
        .iter()
        .map(|vector| {
            to.iter()
                .map(|other| euclidean(vector, other))
                .fold(f32::INFINITY, f32::min)
        })
        .sum();
    total / from.len() as f32
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn identical_sequences_have_zero_distance() {
        let model = HashEmbeddingModel::default();
        let tokens = words(&["细", "胞", "凋", "亡"]);
        assert_eq!(model.distance(&tokens, &tokens), 0.0);
    }

    #[test]
    fn disjoint_sequences_have_positive_distance() {
        let model = HashEmbeddingModel::default();
        let a = words(&["线", "粒", "体"]);
        let b = words(&["核", "糖", "体"]);
        assert!(model.distance(&a, &b) > 0.0);
    }

    #[test]
    fn distance_is_symmetric_and_deterministic() {
        let model = HashEmbeddingModel::default();
        let a = words(&["细", "胞"]);
        let b = words(&["凋", "亡"]);
        assert_eq!(model.distance(&a, &b), model.distance(&b, &a));
        assert_eq!(model.distance(&a, &b), model.distance(&a, &b));
    }

    #[test]
    fn empty_side_is_infinite() {
        let model = HashEmbeddingModel::default();
        let a = words(&["细"]);
        assert!(model.distance(&a, &[]).is_infinite());
        assert!(model.distance(&[], &a).is_infinite());
    }

    #[test]
    fn model_id_changes_the_space() {
        let a = HashEmbeddingModel::new("wordvec-a", 16);
        let b = HashEmbeddingModel::new("wordvec-b", 16);
        let left = words(&["细", "胞"]);
        let right = words(&["凋", "亡"]);
        assert_ne!(a.distance(&left, &right), b.distance(&left, &right));
    }
}
