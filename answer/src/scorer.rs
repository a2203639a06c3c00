//! Pure scoring primitives shared by the resolvers. No I/O.

/// Longest common contiguous subsequence of two token slices, via dynamic
/// programming over a `(len+1) x (len+1)` table. Ties on equal length keep
/// the first hit of the left-to-right, top-to-bottom scan (strict `>`).
/// Returns the matched run as a sub-slice of `query` plus its length.
pub fn longest_common_substring<'a>(
    query: &'a [String],
    target: &[String],
) -> (&'a [String], usize) {
    let mut table = vec![vec![0usize; target.len() + 1]; query.len() + 1];
    let mut best_len = 0;
    let mut best_end = 0; // exclusive end of the best run in `query`

    for i in 0..query.len() {
        for j in 0..target.len() {
            if query[i] == target[j] {
                table[i + 1][j + 1] = table[i][j] + 1;
                if table[i + 1][j + 1] > best_len {
                    best_len = table[i + 1][j + 1];
                    best_end = i + 1;
                }
            }
        }
    }

    (&query[best_end - best_len..best_end], best_len)
}

/// Longest-common-substring length over the target's token count.
/// The target must be non-empty; callers skip candidates with empty fields.
pub fn lcs_ratio(query: &[String], target: &[String]) -> f32 {
    let (_, len) = longest_common_substring(query, target);
    len as f32 / target.len() as f32
}

/// Map a word-mover distance into (0, 1] via `exp(-distance / decay)`.
/// Strictly decreasing, so every threshold in the engine compares
/// `similarity > threshold`; an infinite distance maps to 0.
pub fn similarity_from_distance(distance: f32, decay: f32) -> f32 {
    if distance.is_nan() {
        return 0.0;
    }
    (-distance / decay.max(f32::EPSILON)).exp()
}
