//! Property tests for sampling, labelling and classification

use chromalink_core::classifier::{KnnClassifier, LabelRegistry};
use chromalink_core::gate::{Decision, DecisionGate, DEFAULT_MIN_INTERVAL_MS};
use chromalink_core::sampler::{sample_region, PixelBuffer, Region};
use chromalink_core::Rgb;
use proptest::prelude::*;

fn rgb() -> impl Strategy<Value = Rgb> {
    (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(r, g, b)| Rgb::new(r, g, b))
}

proptest! {
    #[test]
    fn labels_are_sequential(n in 1usize..50) {
        let mut registry = LabelRegistry::new();
        for expected in 1..=n as u32 {
            prop_assert_eq!(registry.create_label("x").unwrap().id(), expected);
        }
        registry.reset();
        prop_assert_eq!(registry.create_label("x").unwrap().id(), 1);
    }

    #[test]
    fn single_example_is_certain(train in rgb(), query in rgb(), k in 1usize..8) {
        let mut registry = LabelRegistry::new();
        let label = registry.create_label("only").unwrap();
        let mut knn = KnnClassifier::new(k);
        knn.add_example(train, label);

        let result = knn.classify(query).unwrap();
        prop_assert_eq!(result.label, label);
        prop_assert_eq!(result.confidence(), 1.0);
    }

    #[test]
    fn exact_match_wins_with_k1(colors in proptest::collection::vec(rgb(), 1..20), pick in any::<prop::sample::Index>()) {
        let mut registry = LabelRegistry::new();
        let mut knn = KnnClassifier::new(1);
        let mut labels = Vec::new();
        for color in &colors {
            let label = registry.create_label("c").unwrap();
            knn.add_example(*color, label);
            labels.push(label);
        }

        let i = pick.index(colors.len());
        let result = knn.classify(colors[i]).unwrap();
        // Duplicate colors resolve to the earliest example
        let first = colors.iter().position(|c| *c == colors[i]).unwrap();
        prop_assert_eq!(result.label, labels[first]);
    }

    #[test]
    fn uniform_frame_samples_its_color(color in rgb(), w in 1u32..120, h in 1u32..120, size in 1u32..60) {
        let data = [color.r, color.g, color.b, 255].repeat((w * h) as usize);
        let frame = PixelBuffer::new(&data, w, h);
        prop_assert_eq!(sample_region(&frame, Region::centered(w, h, size)), Some(color));
    }

    #[test]
    fn at_most_one_frame_per_interval(steps in proptest::collection::vec(1u64..60, 1..200)) {
        let mut registry = LabelRegistry::new();
        let label = registry.create_label("a").unwrap();
        let mut knn = KnnClassifier::new(3);
        knn.add_example(Rgb::BLACK, label);
        let result = knn.classify(Rgb::BLACK).unwrap();

        let mut gate = DecisionGate::new(70, DEFAULT_MIN_INTERVAL_MS);
        gate.start();

        let mut now = 0u64;
        let mut last_sent: Option<u64> = None;
        for step in steps {
            now += step;
            if let Decision::Transmit(_) = gate.evaluate(&result, Rgb::BLACK, now) {
                if let Some(last) = last_sent {
                    prop_assert!(now - last > DEFAULT_MIN_INTERVAL_MS);
                }
                last_sent = Some(now);
            }
        }
    }
}
