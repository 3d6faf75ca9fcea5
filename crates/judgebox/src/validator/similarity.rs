//! Character-overlap similarity used for "did you mean" suggestions.

/// Largest length difference for which two names are compared at all.
pub const MAX_LENGTH_DIFFERENCE: usize = 2;
/// Scores must be strictly above this to count as similar.
pub const SIMILARITY_THRESHOLD: f64 = 0.5;

/// Fraction of the shorter name's characters that occur anywhere in the longer one.
///
/// Case-insensitive. Returns `None` when the lengths differ by more than
/// [`MAX_LENGTH_DIFFERENCE`] or either name is empty.
#[must_use]
pub fn similarity(a: &str, b: &str) -> Option<f64> {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    if len_a == 0 || len_b == 0 || len_a.abs_diff(len_b) > MAX_LENGTH_DIFFERENCE {
        return None;
    }
    let (shorter, longer, shorter_len) = if len_a <= len_b {
        (&a, &b, len_a)
    } else {
        (&b, &a, len_b)
    };
    let shared = shorter.chars().filter(|c| longer.contains(*c)).count();
    #[allow(clippy::cast_precision_loss)]
    let score = shared as f64 / shorter_len as f64;
    Some(score)
}

/// Most similar candidate above the threshold.
///
/// Ties go to the smaller length difference, then to the earlier candidate.
#[must_use]
pub fn closest<'a>(name: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let name_len = name.chars().count();
    let mut best: Option<(f64, usize, &'a str)> = None;
    for &candidate in candidates {
        let Some(score) = similarity(name, candidate) else {
            continue;
        };
        if score <= SIMILARITY_THRESHOLD {
            continue;
        }
        let diff = name_len.abs_diff(candidate.chars().count());
        let better = match best {
            None => true,
            Some((best_score, best_diff, _)) => {
                score > best_score
                    || ((score - best_score).abs() < f64::EPSILON && diff < best_diff)
            }
        };
        if better {
            best = Some((score, diff, candidate));
        }
    }
    best.map(|(_, _, candidate)| candidate)
}
