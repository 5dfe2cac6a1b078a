//! Longest-matching-block similarity ratio
//!
//! Ratcliff/Obershelp: find the longest common block, recurse on the pieces
//! to its left and right, and score `2 * matched / (len(a) + len(b))`.

/// Similarity of two strings in `[0, 1]`.
///
/// The greedy block search can differ with argument order, so both
/// directions are scored and the larger wins, which keeps the ratio
/// symmetric. Two empty strings are identical (1.0).
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matching_characters(&a, &b).max(matching_characters(&b, &a));
    2.0 * matched as f64 / total as f64
}

/// Count characters covered by recursively found longest blocks
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, a_lo, a_hi, b_lo, b_hi);
        if size == 0 {
            continue;
        }
        matched += size;
        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            pending.push((i + size, a_hi, j + size, b_hi));
        }
    }

    matched
}

/// Longest common block of `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
///
/// Returns `(start_in_a, start_in_b, size)`; the earliest block wins ties.
fn longest_match(
    a: &[char],
    b: &[char],
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let width = b_hi - b_lo + 1;
    let mut best = (a_lo, b_lo, 0);
    // run[j - b_lo + 1] = length of the common run ending at (i, j)
    let mut previous = vec![0usize; width];
    let mut current = vec![0usize; width];

    for i in a_lo..a_hi {
        current.fill(0);
        for j in b_lo..b_hi {
            if a[i] == b[j] {
                let run = previous[j - b_lo] + 1;
                current[j - b_lo + 1] = run;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    best
}
