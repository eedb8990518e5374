//! Block-matching similarity ratio.
//!
//! `ratio(a, b) = 2·M / (|a| + |b|)` where `M` is the total length of the
//! matching blocks found by repeatedly taking the longest common substring
//! and recursing on the pieces to its left and right. Lengths are in chars.
//! The matcher thresholds are calibrated against this exact measure.

/// A run `a[a_start..a_start+len] == b[b_start..b_start+len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub a_start: usize,
    pub b_start: usize,
    pub len: usize,
}

pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched: usize = matching_blocks(&a, &b).iter().map(|blk| blk.len).sum();
    2.0 * matched as f64 / total as f64
}

/// Non-overlapping matching blocks in ascending order.
pub fn matching_blocks(a: &[char], b: &[char]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let blk = longest_match(a, b, alo, ahi, blo, bhi);
        if blk.len == 0 {
            continue;
        }
        if alo < blk.a_start && blo < blk.b_start {
            queue.push((alo, blk.a_start, blo, blk.b_start));
        }
        if blk.a_start + blk.len < ahi && blk.b_start + blk.len < bhi {
            queue.push((blk.a_start + blk.len, ahi, blk.b_start + blk.len, bhi));
        }
        blocks.push(blk);
    }

    blocks.sort_by_key(|blk| (blk.a_start, blk.b_start));
    blocks
}

/// Longest common substring of `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Among equally long candidates the one starting earliest in `a` wins,
/// then earliest in `b`.
fn longest_match(a: &[char], b: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
    let mut best = Block { a_start: alo, b_start: blo, len: 0 };
    // prev[j - blo] = length of the common suffix ending at a[i-1], b[j]
    let width = bhi.saturating_sub(blo);
    let mut prev = vec![0usize; width];
    let mut curr = vec![0usize; width];

    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo;
            curr[col] = if a[i] == b[j] {
                let run = if col > 0 { prev[col - 1] + 1 } else { 1 };
                if run > best.len {
                    best = Block { a_start: i + 1 - run, b_start: j + 1 - run, len: run };
                }
                run
            } else {
                0
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}
