//! k-nearest-neighbor color classifier
//!
//! No training phase: every example is kept and a query is answered by a
//! majority vote among the `k` closest examples (Euclidean distance in RGB).
//! Example counts are small (tens to low hundreds) so a linear scan is fine.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use chromalink_protocol::Rgb;

use super::registry::Label;

/// Default neighbor count
pub const DEFAULT_K: usize = 3;

/// Classify was called with no training data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoDataError;

/// One training sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Example {
    pub color: Rgb,
    pub label: Label,
}

/// Result of one query
///
/// Confidence is kept as a vote ratio so threshold checks stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Classification {
    /// Winning label
    pub label: Label,
    /// Neighbors that voted for the winner
    pub votes: usize,
    /// Neighbors considered (min of k and example count)
    pub neighbors: usize,
}

impl Classification {
    /// Fraction of neighbors agreeing with the winner, in [0, 1]
    pub fn confidence(&self) -> f32 {
        self.votes as f32 / self.neighbors as f32
    }

    /// Confidence as a rounded percentage
    pub fn confidence_percent(&self) -> u8 {
        ((self.votes * 200 + self.neighbors) / (self.neighbors * 2)) as u8
    }

    /// True if confidence is strictly above `threshold_percent`
    pub fn exceeds(&self, threshold_percent: u8) -> bool {
        self.votes * 100 > threshold_percent as usize * self.neighbors
    }
}

/// Tally for one candidate label among the neighbors
#[derive(Default)]
struct Tally {
    votes: usize,
    distance_sum: u64,
}

/// In-memory k-NN model
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    examples: Vec<Example>,
    k: usize,
}

impl Default for KnnClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_K)
    }
}

impl KnnClassifier {
    /// Create an empty classifier voting among `k` neighbors (min 1)
    pub fn new(k: usize) -> Self {
        Self {
            examples: Vec::new(),
            k: k.max(1),
        }
    }

    /// Neighbor count
    pub fn k(&self) -> usize {
        self.k
    }

    /// Store a training example
    pub fn add_example(&mut self, color: Rgb, label: Label) {
        self.examples.push(Example { color, label });
    }

    /// Classify a color
    ///
    /// Ties in vote count go to the label whose neighbors are closer in
    /// total, then to the lower identifier. Ties in distance among
    /// candidate neighbors favour the earlier example.
    pub fn classify(&self, color: Rgb) -> Result<Classification, NoDataError> {
        if self.examples.is_empty() {
            return Err(NoDataError);
        }

        let mut ranked: Vec<(u32, Label)> = self
            .examples
            .iter()
            .map(|e| (e.color.distance_squared(&color), e.label))
            .collect();
        // Stable sort keeps insertion order among equal distances
        ranked.sort_by_key(|(d, _)| *d);

        let neighbors = self.k.min(ranked.len());
        let mut tallies: BTreeMap<Label, Tally> = BTreeMap::new();
        for &(distance, label) in &ranked[..neighbors] {
            let tally = tallies.entry(label).or_default();
            tally.votes += 1;
            tally.distance_sum += distance as u64;
        }

        // BTreeMap iterates in label order, so the first best wins the id tie
        let mut best: Option<(Label, &Tally)> = None;
        for (label, tally) in &tallies {
            let better = match best {
                None => true,
                Some((_, b)) => {
                    tally.votes > b.votes
                        || (tally.votes == b.votes && tally.distance_sum < b.distance_sum)
                }
            };
            if better {
                best = Some((*label, tally));
            }
        }

        let (label, tally) = best.ok_or(NoDataError)?;
        Ok(Classification {
            label,
            votes: tally.votes,
            neighbors,
        })
    }

    /// Number of stored examples per label
    pub fn count_by_label(&self) -> BTreeMap<Label, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.examples {
            *counts.entry(e.label).or_insert(0) += 1;
        }
        counts
    }

    /// Number of examples stored for one label
    pub fn count_for(&self, label: Label) -> usize {
        self.examples.iter().filter(|e| e.label == label).count()
    }

    /// Drop every example
    pub fn clear_all(&mut self) {
        self.examples.clear();
    }

    /// Stored examples in insertion order
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Label = Label::new(1);
    const GREEN: Label = Label::new(2);
    const BLUE: Label = Label::new(3);

    #[test]
    fn test_empty_classifier_has_no_data() {
        let knn = KnnClassifier::default();
        assert_eq!(knn.classify(Rgb::new(1, 2, 3)), Err(NoDataError));
    }

    #[test]
    fn test_single_example_full_confidence() {
        let mut knn = KnnClassifier::default();
        let c = Rgb::new(90, 30, 200);
        knn.add_example(c, RED);

        let result = knn.classify(c).unwrap();
        assert_eq!(result.label, RED);
        assert_eq!(result.confidence(), 1.0);
        assert_eq!(result.confidence_percent(), 100);
    }

    #[test]
    fn test_red_green_scenario() {
        let mut knn = KnnClassifier::default();
        knn.add_example(Rgb::new(250, 10, 5), RED);
        knn.add_example(Rgb::new(10, 250, 5), GREEN);

        // Two neighbors, one vote each; red is closer
        let result = knn.classify(Rgb::new(240, 20, 10)).unwrap();
        assert_eq!(result.label, RED);
        assert_eq!(result.votes, 1);
        assert_eq!(result.neighbors, 2);
        assert_eq!(result.confidence_percent(), 50);
    }

    #[test]
    fn test_majority_vote() {
        let mut knn = KnnClassifier::new(3);
        knn.add_example(Rgb::new(250, 0, 0), RED);
        knn.add_example(Rgb::new(240, 10, 0), RED);
        knn.add_example(Rgb::new(200, 60, 0), GREEN);
        knn.add_example(Rgb::new(0, 0, 255), BLUE);

        let result = knn.classify(Rgb::new(245, 5, 0)).unwrap();
        assert_eq!(result.label, RED);
        assert_eq!(result.votes, 2);
        assert_eq!(result.neighbors, 3);
        assert_eq!(result.confidence_percent(), 67);
    }

    #[test]
    fn test_vote_tie_prefers_lower_label_at_equal_distance() {
        let mut knn = KnnClassifier::new(2);
        knn.add_example(Rgb::new(0, 0, 10), GREEN);
        knn.add_example(Rgb::new(0, 0, 0), RED);

        // Query equidistant from both
        let result = knn.classify(Rgb::new(0, 0, 5)).unwrap();
        assert_eq!(result.label, RED);
    }

    #[test]
    fn test_exceeds_is_strict() {
        let c = Classification {
            label: RED,
            votes: 7,
            neighbors: 10,
        };
        assert!(!c.exceeds(70));
        assert!(c.exceeds(69));

        let two_thirds = Classification {
            label: RED,
            votes: 2,
            neighbors: 3,
        };
        assert!(two_thirds.exceeds(60));
        assert!(!two_thirds.exceeds(70));
    }

    #[test]
    fn test_count_by_label_tracks_adds_and_clear() {
        let mut knn = KnnClassifier::default();
        knn.add_example(Rgb::new(1, 1, 1), RED);
        knn.add_example(Rgb::new(1, 1, 1), RED);
        knn.add_example(Rgb::new(2, 2, 2), GREEN);

        let counts = knn.count_by_label();
        assert_eq!(counts.get(&RED), Some(&2));
        assert_eq!(counts.get(&GREEN), Some(&1));
        assert_eq!(knn.count_for(BLUE), 0);

        knn.clear_all();
        assert!(knn.count_by_label().is_empty());
        assert_eq!(knn.classify(Rgb::new(1, 1, 1)), Err(NoDataError));
    }

    #[test]
    fn test_zero_k_clamped() {
        let knn = KnnClassifier::new(0);
        assert_eq!(knn.k(), 1);
    }
}
