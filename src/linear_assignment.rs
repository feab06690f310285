use ndarray::prelude::*;
use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;

/// A track/detection pairing accepted by the assignment solver.
#[derive(Debug, Clone)]
pub struct Match {
    track_idx: usize,
    detection_idx: usize,
    cost: f32,
}

impl Match {
    /// Return a new Match
    ///
    /// # Parameters
    ///
    /// * `track_idx`: The match track index.
    /// * `detection_idx`: The match detection index.
    /// * `cost`: Association cost of the pair.
    pub fn new(track_idx: usize, detection_idx: usize, cost: f32) -> Match {
        Match {
            track_idx,
            detection_idx,
            cost,
        }
    }

    /// Return the track index of the match
    pub fn track_idx(&self) -> usize {
        self.track_idx
    }

    /// Return the detection index of the match
    pub fn detection_idx(&self) -> usize {
        self.detection_idx
    }

    /// Return the association cost of the match
    pub fn cost(&self) -> f32 {
        self.cost
    }
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.track_idx == other.track_idx && self.detection_idx == other.detection_idx
    }
}

/// Solve the linear assignment problem over a cost matrix.
///
/// # Parameters
///
/// * `cost_matrix`: NxM matrix where entry (i, j) is the association cost
///   between the i-th track and the j-th detection.
/// * `max_cost`: Gating threshold. Optimal pairs with cost larger than this
///   value are rejected into the unmatched sets.
///
/// # Returns
///
/// A tuple with the following three entries:
///
/// - The accepted matches, ordered by ascending track index then detection index.
/// - The unmatched track indices, ascending.
/// - The unmatched detection indices, ascending.
pub fn min_cost_matching(
    cost_matrix: ArrayView2<f32>,
    max_cost: f32,
) -> (Vec<Match>, Vec<usize>, Vec<usize>) {
    let n_tracks = cost_matrix.nrows();
    let n_detections = cost_matrix.ncols();

    if n_tracks == 0 || n_detections == 0 {
        return (
            vec![],
            (0..n_tracks).collect(),
            (0..n_detections).collect(),
        );
    }

    let clamped = cost_matrix.mapv(|v| v.min(max_cost + 1e-5));

    // kuhn_munkres requires rows <= columns; solve the transposed problem
    // when there are more tracks than detections.
    let (clamped, transposed) = if n_tracks > n_detections {
        (clamped.t().to_owned(), true)
    } else {
        (clamped, false)
    };

    // Multiply by a large constant to convert from f32 [0.0..1.0] to i64,
    // which satisfies the solver's Ord requirement (f32 does not implement
    // `std::cmp::Ord`).
    let cost_vec = clamped
        .mapv(|v| (v * 10_000_000_000.0) as i64)
        .iter()
        .cloned()
        .collect::<Vec<i64>>();
    let matrix = Matrix::from_vec(clamped.nrows(), clamped.ncols(), cost_vec)
        .expect("cost matrix dimensions are consistent");

    // This is equivalent to `scipy.optimize.linear_sum_assignment(maximize=False)`,
    // but where scipy returns two arrays (row_ind and col_ind) `kuhn_munkres_min`
    // returns just the col_ind array, leaving row_ind to be derived as the row index.
    let (_, col_indices) = kuhn_munkres_min(&matrix);

    let mut matches: Vec<Match> = vec![];
    let mut track_matched = vec![false; n_tracks];
    let mut detection_matched = vec![false; n_detections];

    for (row, col) in col_indices.into_iter().enumerate() {
        let (track_idx, detection_idx) = if transposed { (col, row) } else { (row, col) };
        let cost = cost_matrix[[track_idx, detection_idx]];

        if cost <= max_cost {
            track_matched[track_idx] = true;
            detection_matched[detection_idx] = true;
            matches.push(Match::new(track_idx, detection_idx, cost));
        }
    }

    matches.sort_by_key(|m| (m.track_idx, m.detection_idx));

    let unmatched_tracks = track_matched
        .iter()
        .enumerate()
        .filter(|(_, matched)| !**matched)
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();
    let unmatched_detections = detection_matched
        .iter()
        .enumerate()
        .filter(|(_, matched)| !**matched)
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();

    (matches, unmatched_tracks, unmatched_detections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::*;

    #[test]
    fn empty_inputs() {
        let costs = Array2::<f32>::zeros((0, 3));
        let (matches, unmatched_tracks, unmatched_detections) =
            min_cost_matching(costs.view(), 0.7);
        assert!(matches.is_empty());
        assert!(unmatched_tracks.is_empty());
        assert_eq!(unmatched_detections, vec![0, 1, 2]);

        let costs = Array2::<f32>::zeros((2, 0));
        let (matches, unmatched_tracks, unmatched_detections) =
            min_cost_matching(costs.view(), 0.7);
        assert!(matches.is_empty());
        assert_eq!(unmatched_tracks, vec![0, 1]);
        assert!(unmatched_detections.is_empty());
    }

    #[test]
    fn optimal_over_greedy() {
        // A greedy solver would pair track 0 with detection 0 (0.1) and
        // leave track 1 with 0.9; the optimal solution takes 0.2 + 0.3.
        let costs = arr2::<f32, _>(&[[0.1, 0.3], [0.2, 0.9]]);
        let (matches, unmatched_tracks, unmatched_detections) =
            min_cost_matching(costs.view(), 0.7);

        assert_eq!(
            matches,
            vec![Match::new(0, 1, 0.3), Match::new(1, 0, 0.2)]
        );
        assert!(unmatched_tracks.is_empty());
        assert!(unmatched_detections.is_empty());
    }

    #[test]
    fn gating_rejects_expensive_pairs() {
        let costs = arr2::<f32, _>(&[[0.2, 1.0], [1.0, 0.95]]);
        let (matches, unmatched_tracks, unmatched_detections) =
            min_cost_matching(costs.view(), 0.7);

        assert_eq!(matches, vec![Match::new(0, 0, 0.2)]);
        assert_eq!(unmatched_tracks, vec![1]);
        assert_eq!(unmatched_detections, vec![1]);
    }

    #[test]
    fn more_tracks_than_detections() {
        let costs = arr2::<f32, _>(&[[0.5], [0.1], [0.4]]);
        let (matches, unmatched_tracks, unmatched_detections) =
            min_cost_matching(costs.view(), 0.7);

        assert_eq!(matches, vec![Match::new(1, 0, 0.1)]);
        assert_eq!(unmatched_tracks, vec![0, 2]);
        assert!(unmatched_detections.is_empty());
    }

    #[test]
    fn more_detections_than_tracks() {
        let costs = arr2::<f32, _>(&[[0.9, 0.05, 0.6]]);
        let (matches, unmatched_tracks, unmatched_detections) =
            min_cost_matching(costs.view(), 0.7);

        assert_eq!(matches, vec![Match::new(0, 1, 0.05)]);
        assert!(unmatched_tracks.is_empty());
        assert_eq!(unmatched_detections, vec![0, 2]);
    }
}
