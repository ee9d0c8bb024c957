/// Append `segment` to a path under construction.
///
/// Stitched paths share their boundary node between consecutive segments,
/// and a segment may double back over ground the path already covers (at
/// cluster seams, sub-paths from different roots can overlap). Whenever a
/// segment node is already present in the path, the path is rewound to
/// that occurrence instead of appending — so the result never visits a
/// node twice.
pub fn join_path<N: PartialEq + Clone>(path: &mut Vec<N>, segment: &[N]) {
    for node in segment {
        match path.iter().position(|p| p == node) {
            Some(at) => path.truncate(at + 1),
            None => path.push(node.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_disjoint_segments() {
        let mut path = vec![1, 2, 3];
        join_path(&mut path, &[4, 5]);
        assert_eq!(path, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn drops_the_shared_boundary_node() {
        let mut path = vec![1, 2, 3];
        join_path(&mut path, &[3, 4, 5]);
        assert_eq!(path, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn rewinds_when_a_segment_revisits_the_prefix() {
        let mut path = vec![1, 2, 3, 4];
        // The segment backtracks through 2 before heading off to 7.
        join_path(&mut path, &[4, 3, 2, 7]);
        assert_eq!(path, vec![1, 2, 7]);
    }

    #[test]
    fn empty_cases_are_no_ops() {
        let mut path: Vec<i32> = Vec::new();
        join_path(&mut path, &[]);
        assert!(path.is_empty());
        join_path(&mut path, &[9]);
        assert_eq!(path, vec![9]);
    }
}
