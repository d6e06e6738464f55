//! K-way merge of sorted chunk files.
//!
//! A min-heap holds the head line of every chunk, keyed by the caller's
//! comparator; popping the minimum and refilling from that chunk yields
//! the merged order. Ties break toward the smaller chunk index, which
//! preserves the stability of the chunk sort across the merge.

use crate::common::Result;
use crate::extsort::Lines;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io::BufRead;

/// One heap entry: a chunk's current head line.
struct MergeEntry<'c, C> {
    line: String,
    chunk: usize,
    cmp: &'c C,
}

impl<C: Fn(&str, &str) -> Ordering> MergeEntry<'_, C> {
    /// Merge order: comparator first, then chunk index.
    fn order(&self, other: &Self) -> Ordering {
        (self.cmp)(&self.line, &other.line).then_with(|| self.chunk.cmp(&other.chunk))
    }
}

impl<C: Fn(&str, &str) -> Ordering> PartialEq for MergeEntry<'_, C> {
    fn eq(&self, other: &Self) -> bool {
        self.order(other) == Ordering::Equal
    }
}

impl<C: Fn(&str, &str) -> Ordering> Eq for MergeEntry<'_, C> {}

impl<C: Fn(&str, &str) -> Ordering> PartialOrd for MergeEntry<'_, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: Fn(&str, &str) -> Ordering> Ord for MergeEntry<'_, C> {
    // Reversed so the max-heap pops the minimum entry
    fn cmp(&self, other: &Self) -> Ordering {
        self.order(other).reverse()
    }
}

/// Interleave sorted chunk readers into one sorted stream.
///
/// `emit` receives every line in merged order.
pub(crate) fn k_way_merge<B, C, F>(
    readers: Vec<Lines<B>>,
    cmp: &C,
    mut emit: F,
) -> Result<()>
where
    B: BufRead,
    C: Fn(&str, &str) -> Ordering,
    F: FnMut(&str) -> Result<()>,
{
    let mut readers = readers;
    let mut heap: BinaryHeap<MergeEntry<'_, C>> = BinaryHeap::with_capacity(readers.len());

    // Seed the heap with the head of each chunk
    for (chunk, reader) in readers.iter_mut().enumerate() {
        if let Some(line) = reader.next().transpose()? {
            heap.push(MergeEntry { line, chunk, cmp });
        }
    }

    while let Some(entry) = heap.pop() {
        emit(&entry.line)?;

        if let Some(line) = readers[entry.chunk].next().transpose()? {
            heap.push(MergeEntry {
                line,
                chunk: entry.chunk,
                cmp,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge(chunks: &[&str]) -> Vec<String> {
        let readers = chunks
            .iter()
            .map(|c| Lines::new(c.as_bytes()))
            .collect::<Vec<_>>();

        let mut out = Vec::new();
        k_way_merge(readers, &|a: &str, b: &str| a.cmp(b), |line| {
            out.push(line.to_string());
            Ok(())
        })
        .unwrap();
        out
    }

    #[test]
    fn test_merge_two_chunks() {
        let merged = merge(&["a\nc\ne\n", "b\nd\nf\n"]);
        assert_eq!(merged, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_merge_uneven_chunks() {
        let merged = merge(&["z\n", "a\nb\nc\n", ""]);
        assert_eq!(merged, vec!["a", "b", "c", "z"]);
    }

    #[test]
    fn test_ties_prefer_earlier_chunk() {
        // Identical keys: chunk 0's copy must come out first
        let merged = merge(&["k0\n", "k1\n"]);
        let cmp = |a: &str, b: &str| a[..1].cmp(&b[..1]);

        let readers = vec![Lines::new("k0\n".as_bytes()), Lines::new("k1\n".as_bytes())];
        let mut out = Vec::new();
        k_way_merge(readers, &cmp, |line| {
            out.push(line.to_string());
            Ok(())
        })
        .unwrap();

        assert_eq!(out, vec!["k0", "k1"]);
        assert_eq!(merged, vec!["k0", "k1"]);
    }
}
