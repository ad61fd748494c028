/// Sequence similarity in the Ratcliff/Obershelp style.
///
/// `ratio` is `2*M / T`, where `T` is the combined length of both sequences and
/// `M` is the number of characters covered by the matching blocks: the longest
/// common substring, then recursively the longest common substrings to its left
/// and right. Sequences are compared as Unicode scalar values.
///
/// The second sequence (`b`) is indexed once, so comparing one query against many
/// candidates only pays for the index a single time.
use std::collections::HashMap;

/// `b` sequences at least this long ignore "popular" characters when seeding
/// matches (characters occurring more than 1% + 1 times).
const AUTOJUNK_MIN_LEN: usize = 200;

pub struct Matcher {
    b: Vec<char>,
    /// Positions of every non-popular character of `b`, ascending.
    b2j: HashMap<char, Vec<usize>>,
    /// Full character counts of `b`, popular characters included.
    b_counts: HashMap<char, usize>,
}

impl Matcher {
    pub fn new(b: &str) -> Self {
        let b: Vec<char> = b.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }
        let b_counts = b2j.iter().map(|(&c, idxs)| (c, idxs.len())).collect();

        if b.len() >= AUTOJUNK_MIN_LEN {
            let ntest = b.len() / 100 + 1;
            b2j.retain(|_, idxs| idxs.len() <= ntest);
        }

        Self { b, b2j, b_counts }
    }

    /// Similarity of `a` against the indexed sequence, in `[0, 1]`.
    pub fn ratio(&self, a: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        score(self.matching_chars(&a), a.len() + self.b.len())
    }

    /// Upper bound on `ratio` from shared character counts, ignoring order.
    pub fn quick_ratio(&self, a: &str) -> f64 {
        let mut avail: HashMap<char, usize> = HashMap::new();
        let mut matches = 0;
        let mut len_a = 0;
        for c in a.chars() {
            len_a += 1;
            let left = avail
                .entry(c)
                .or_insert_with(|| self.b_counts.get(&c).copied().unwrap_or(0));
            if *left > 0 {
                *left -= 1;
                matches += 1;
            }
        }
        score(matches, len_a + self.b.len())
    }

    /// Upper bound on `ratio` from lengths alone.
    pub fn real_quick_ratio(&self, a: &str) -> f64 {
        let len_a = a.chars().count();
        score(len_a.min(self.b.len()), len_a + self.b.len())
    }

    fn matching_chars(&self, a: &[char]) -> usize {
        let mut pending = vec![(0, a.len(), 0, self.b.len())];
        let mut total = 0;
        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, k) = self.find_longest_match(a, alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }
        total
    }

    /// Longest block with `a[i..i+k] == b[j..j+k]` inside the given windows.
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    fn find_longest_match(
        &self,
        a: &[char],
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);

        // j2len[j] = length of the match ending at a[i-1] and b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(c) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = if j > 0 {
                        j2len.get(&(j - 1)).copied().unwrap_or(0)
                    } else {
                        0
                    };
                    let k = prev + 1;
                    next.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            j2len = next;
        }

        // Popular characters never seed a match; grow the block through them.
        while best_i > alo && best_j > blo && a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_k += 1;
        }
        while best_i + best_k < ahi
            && best_j + best_k < bhi
            && a[best_i + best_k] == self.b[best_j + best_k]
        {
            best_k += 1;
        }

        (best_i, best_j, best_k)
    }
}

fn score(matches: usize, length: usize) -> f64 {
    if length == 0 {
        return 1.0;
    }
    2.0 * matches as f64 / length as f64
}

/// The best `n` candidates scoring at least `cutoff` against `word`, as
/// `(candidate index, score)` pairs. Highest score first; equal scores keep
/// candidate order.
pub fn close_matches<'a, I>(word: &str, candidates: I, n: usize, cutoff: f64) -> Vec<(usize, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    if n == 0 {
        return Vec::new();
    }
    let matcher = Matcher::new(word);
    let mut scored: Vec<(usize, f64)> = candidates
        .into_iter()
        .enumerate()
        .filter(|(_, c)| {
            matcher.real_quick_ratio(c) >= cutoff && matcher.quick_ratio(c) >= cutoff
        })
        .map(|(idx, c)| (idx, matcher.ratio(c)))
        .filter(|&(_, s)| s >= cutoff)
        .collect();
    scored.sort_by(|x, y| y.1.total_cmp(&x.1));
    scored.truncate(n);
    scored
}
