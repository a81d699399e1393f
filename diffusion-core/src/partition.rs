use std::ops::Range;

/// Split `range` into exactly `workers` contiguous chunks.
///
/// Every chunk gets `len / workers` indices and the remainder is spread
/// one index each over the trailing chunks, so sizes differ by at most one.
/// Chunks are disjoint, in order, and cover `range`. With more workers
/// than indices the leading chunks are empty.
pub fn partition(range: Range<usize>, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let len = range.end.saturating_sub(range.start);
    let chunk = len / workers;
    let first_long = workers - len % workers;

    let mut out = Vec::with_capacity(workers);
    let mut lo = range.start;
    for w in 0..workers {
        let hi = lo + chunk + usize::from(w >= first_long);
        out.push(lo..hi);
        lo = hi;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(chunks: &[Range<usize>], range: Range<usize>) {
        let mut expect = range.start;
        for c in chunks {
            assert_eq!(c.start, expect, "chunks must be contiguous: {chunks:?}");
            assert!(c.end >= c.start);
            expect = c.end;
        }
        assert_eq!(expect, range.end);
    }

    #[test]
    fn even_split() {
        let chunks = partition(1..9, 4);
        assert_eq!(chunks, vec![1..3, 3..5, 5..7, 7..9]);
    }

    #[test]
    fn trailing_chunk_takes_remainder() {
        let chunks = partition(1..10, 4);
        assert_eq!(chunks, vec![1..3, 3..5, 5..7, 7..10]);
        assert_covers(&chunks, 1..10);
    }

    #[test]
    fn more_workers_than_indices_gives_empty_chunks() {
        let chunks = partition(1..4, 8);
        assert_eq!(chunks.len(), 8);
        assert!(chunks[..5].iter().all(|c| c.is_empty()));
        assert_eq!(chunks[5..], [1..2, 2..3, 3..4]);
        assert_covers(&chunks, 1..4);
    }

    #[test]
    fn remainder_is_spread_over_trailing_chunks() {
        let chunks = partition(1..16, 8);
        assert_eq!(
            chunks,
            vec![1..2, 2..4, 4..6, 6..8, 8..10, 10..12, 12..14, 14..16]
        );
    }

    #[test]
    fn single_worker_takes_everything() {
        assert_eq!(partition(1..99, 1), vec![1..99]);
    }

    #[test]
    fn many_shapes_cover_exactly() {
        for len in 0..40 {
            for workers in 1..12 {
                let range = 1..1 + len;
                let chunks = partition(range.clone(), workers);
                assert_eq!(chunks.len(), workers);
                let sizes = chunks.iter().map(|c| c.len());
                let (min, max) = (sizes.clone().min().unwrap(), sizes.max().unwrap());
                assert!(max - min <= 1, "unbalanced: {chunks:?}");
                assert_covers(&chunks, range);
            }
        }
    }
}
