use crate::libs::domain::Candidate;

/// Collapses candidates found more than once, typically in overlapping
/// windows.
///
/// Two candidates are the same domain when both their starts and their ends
/// are at most `tolerance` bins apart; the higher score survives and a tie
/// keeps the one further upstream.
///
/// A candidate spanning two adjacent candidates that both outscore it only
/// echoes their boundaries and is dropped. The result is sorted by
/// `(start, end)`.
pub fn merge_candidates(mut raw: Vec<Candidate>, tolerance: usize) -> Vec<Candidate> {
    raw.sort_by(|x, y| {
        y.score
            .total_cmp(&x.score)
            .then((x.start, x.end).cmp(&(y.start, y.end)))
    });

    let mut kept: Vec<Candidate> = vec![];
    for cand in raw {
        let duplicated = kept.iter().any(|k| {
            k.start.abs_diff(cand.start) <= tolerance && k.end.abs_diff(cand.end) <= tolerance
        });
        if !duplicated {
            kept.push(cand);
        }
    }

    let echoes: Vec<bool> = kept.iter().map(|c| is_echo(c, &kept, tolerance)).collect();
    let mut kept: Vec<Candidate> = kept
        .into_iter()
        .zip(echoes)
        .filter_map(|(c, echo)| (!echo).then_some(c))
        .collect();

    kept.sort_by_key(|c| (c.start, c.end));
    kept
}

fn is_echo(cand: &Candidate, all: &[Candidate], tolerance: usize) -> bool {
    let near = |x: usize, y: usize| x.abs_diff(y) <= tolerance;

    let heads = all
        .iter()
        .filter(|p| p.score > cand.score && near(p.start, cand.start) && p.end < cand.end);
    let tails: Vec<&Candidate> = all
        .iter()
        .filter(|q| q.score > cand.score && near(q.end, cand.end) && q.start > cand.start)
        .collect();

    heads
        .into_iter()
        .any(|p| tails.iter().any(|q| near(q.start, p.end + 1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::domain::Moments;

    fn cand(start: usize, end: usize, score: f64) -> Candidate {
        Candidate {
            start,
            end,
            score,
            control: 0.0,
            upper: Moments::default(),
            lower: Moments::default(),
        }
    }

    #[test]
    fn test_identical_collapse() {
        let merged = merge_candidates(vec![cand(40, 49, 1.2), cand(40, 49, 1.5)], 1);
        assert_eq!(merged, vec![cand(40, 49, 1.5)]);
    }

    #[test]
    fn test_tolerance() {
        let raw = vec![cand(40, 49, 1.2), cand(41, 48, 1.1), cand(42, 49, 1.9)];
        let merged = merge_candidates(raw.clone(), 1);
        assert_eq!(merged, vec![cand(40, 49, 1.2), cand(42, 49, 1.9)]);

        let merged = merge_candidates(raw, 0);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_tie_keeps_upstream() {
        let merged = merge_candidates(vec![cand(11, 20, 1.0), cand(10, 20, 1.0)], 1);
        assert_eq!(merged, vec![cand(10, 20, 1.0)]);
    }

    #[test]
    fn test_echo_dropped() {
        // (10, 69) only spans its two neighbours
        let raw = vec![cand(10, 69, 1.1), cand(10, 29, 1.98), cand(30, 69, 1.98)];
        let merged = merge_candidates(raw, 1);
        assert_eq!(merged, vec![cand(10, 29, 1.98), cand(30, 69, 1.98)]);

        // within tolerance on every joint
        let raw = vec![cand(10, 70, 1.1), cand(11, 29, 1.98), cand(31, 69, 1.98)];
        assert_eq!(merge_candidates(raw, 1).len(), 2);

        // a gap between the neighbours
        let raw = vec![cand(10, 69, 1.1), cand(10, 29, 1.98), cand(35, 69, 1.98)];
        assert_eq!(merge_candidates(raw, 1).len(), 3);
    }

    #[test]
    fn test_parent_domain_kept() {
        // the parent outscores one of its sub-domains
        let raw = vec![cand(10, 109, 1.99), cand(10, 39, 1.57), cand(40, 109, 1.75)];
        assert_eq!(merge_candidates(raw.clone(), 1).len(), 3);

        let raw = vec![cand(10, 109, 1.6), cand(10, 39, 1.57), cand(40, 109, 1.75)];
        assert_eq!(merge_candidates(raw, 1).len(), 3);
    }

    #[test]
    fn test_nested_kept_sorted() {
        let raw = vec![cand(50, 80, 1.0), cand(10, 90, 0.8), cand(10, 30, 1.3)];
        let merged = merge_candidates(raw, 1);
        let coords: Vec<(usize, usize)> = merged.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(coords, vec![(10, 30), (10, 90), (50, 80)]);
    }
}
