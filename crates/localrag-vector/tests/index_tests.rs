use localrag_core::{DistanceMetric, Error, Passage};
use localrag_vector::VectorIndex;

fn passage(doc_id: &str, text: &str) -> Passage {
    let len = text.chars().count();
    Passage {
        text: text.to_string(),
        doc_id: doc_id.to_string(),
        doc_meta: Default::default(),
        index: 0,
        total: 1,
        start: 0,
        end: len,
    }
}

fn toy_index(metric: DistanceMetric) -> VectorIndex {
    let mut index = VectorIndex::new(metric);
    index
        .insert_batch(vec![
            (passage("a", "alpha"), vec![1.0, 0.0, 0.0]),
            (passage("b", "bravo"), vec![0.0, 1.0, 0.0]),
            (passage("c", "charlie"), vec![0.0, 0.0, 1.0]),
            (passage("d", "delta"), vec![0.9, 0.1, 0.0]),
        ])
        .unwrap();
    index
}

fn texts(result: &[localrag_core::ScoredPassage]) -> Vec<&str> {
    result.iter().map(|s| s.passage.text.as_str()).collect()
}

#[test]
fn insert_assigns_positions_in_order() {
    let mut index = toy_index(DistanceMetric::L2);
    assert_eq!(index.len(), 4);
    assert_eq!(index.dim(), Some(3));

    index.insert_batch(vec![(passage("e", "echo"), vec![0.5, 0.5, 0.0])]).unwrap();
    assert_eq!(index.len(), 5);
    let positions: Vec<usize> = index.entries().iter().map(|e| e.position).collect();
    assert_eq!(positions, vec![0, 1, 2, 3, 4]);
    assert_eq!(index.entries()[4].passage.text, "echo");
}

#[test]
fn search_returns_k_nearest_in_ascending_order() {
    let index = toy_index(DistanceMetric::L2);
    let result = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
    assert_eq!(texts(&result), vec!["alpha", "delta"]);
    assert_eq!(result[0].distance, 0.0);
    assert!(result[0].distance <= result[1].distance);

    let all = index.search(&[1.0, 0.0, 0.0], 4).unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn two_passages_ordered_by_literal_distance() {
    let mut index = VectorIndex::new(DistanceMetric::L2);
    index
        .insert_batch(vec![(passage("d1", "far"), vec![3.0, 4.0]), (passage("d2", "near"), vec![1.0, 0.0])])
        .unwrap();
    let result = index.search(&[0.0, 0.0], 2).unwrap();
    assert_eq!(texts(&result), vec!["near", "far"]);
    assert_eq!(result[0].distance, 1.0);
    assert_eq!(result[1].distance, 5.0);
    assert_eq!((result[0].position, result[1].position), (1, 0));
}

#[test]
fn k_larger_than_size_returns_everything() {
    let index = toy_index(DistanceMetric::Cosine);
    assert_eq!(index.search(&[0.0, 1.0, 0.0], 10).unwrap().len(), 4);
}

#[test]
fn empty_index_returns_empty_result() {
    let index = VectorIndex::new(DistanceMetric::L2);
    assert!(index.search(&[1.0, 2.0], 3).unwrap().is_empty());
}

#[test]
fn zero_k_is_rejected() {
    let index = toy_index(DistanceMetric::L2);
    assert!(matches!(index.search(&[1.0, 0.0, 0.0], 0), Err(Error::InvalidArgument(_))));
}

#[test]
fn ties_resolve_to_earlier_insertion() {
    let mut index = VectorIndex::new(DistanceMetric::L2);
    index
        .insert_batch(vec![
            (passage("x", "first"), vec![1.0, 0.0]),
            (passage("y", "second"), vec![0.0, 1.0]),
            (passage("z", "third"), vec![1.0, 0.0]),
        ])
        .unwrap();
    // All three are equidistant from the origin.
    let result = index.search(&[0.0, 0.0], 2).unwrap();
    assert_eq!(texts(&result), vec!["first", "second"]);

    let result = index.search(&[1.0, 0.0], 3).unwrap();
    assert_eq!(texts(&result), vec!["first", "third", "second"]);
}

#[test]
fn duplicate_inserts_are_kept() {
    let mut index = VectorIndex::new(DistanceMetric::L2);
    for _ in 0..2 {
        index.insert_batch(vec![(passage("a", "same"), vec![1.0, 1.0])]).unwrap();
    }
    let result = index.search(&[1.0, 1.0], 5).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!((result[0].position, result[1].position), (0, 1));
}

#[test]
fn search_is_deterministic() {
    let index = toy_index(DistanceMetric::InnerProduct);
    let q = [0.3, 0.7, 0.2];
    assert_eq!(index.search(&q, 3).unwrap(), index.search(&q, 3).unwrap());
}

#[test]
fn inner_product_ranks_by_dot() {
    let index = toy_index(DistanceMetric::InnerProduct);
    let result = index.search(&[0.0, 2.0, 0.0], 2).unwrap();
    assert_eq!(texts(&result), vec!["bravo", "delta"]);
    assert_eq!(result[0].distance, -2.0);
}

#[test]
fn dimension_mismatch_leaves_index_unchanged() {
    let mut index = toy_index(DistanceMetric::L2);
    let err = index
        .insert_batch(vec![(passage("ok", "ok"), vec![0.0, 0.0, 1.0]), (passage("bad", "bad"), vec![1.0, 0.0])])
        .unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 3, got: 2 }));
    assert_eq!(index.len(), 4);
    assert_eq!(index.dim(), Some(3));

    let err = index.search(&[1.0, 0.0], 1).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 3, got: 2 }));
}

#[test]
fn mismatch_within_first_batch_does_not_establish_dim() {
    let mut index = VectorIndex::new(DistanceMetric::L2);
    let err = index
        .insert_batch(vec![(passage("a", "a"), vec![1.0, 0.0]), (passage("b", "b"), vec![1.0])])
        .unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 2, got: 1 }));
    assert_eq!(index.dim(), None);
    assert!(index.is_empty());
}

#[test]
fn empty_batch_is_a_no_op() {
    let mut index = VectorIndex::new(DistanceMetric::L2);
    index.insert_batch(Vec::new()).unwrap();
    assert_eq!(index.dim(), None);
    assert_eq!(index.len(), 0);
}

#[test]
fn clear_resets_size_and_dimension() {
    let mut index = toy_index(DistanceMetric::L2);
    index.clear();
    assert!(index.is_empty());
    assert_eq!(index.dim(), None);

    index.insert_batch(vec![(passage("n", "new"), vec![1.0, 2.0])]).unwrap();
    assert_eq!(index.dim(), Some(2));
    assert_eq!(index.entries()[0].position, 0);
}

#[test]
fn brute_force_matches_manual_ranking() {
    let mut seed: u64 = 42;
    let mut rng = || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        (seed >> 33) as f32 / (u32::MAX as f32) - 0.5
    };

    let mut index = VectorIndex::new(DistanceMetric::L2);
    let mut vectors = Vec::new();
    let mut batch = Vec::new();
    for i in 0..200 {
        let v: Vec<f32> = (0..8).map(|_| rng()).collect();
        vectors.push(v.clone());
        batch.push((passage(&format!("doc{i}"), &format!("passage {i}")), v));
    }
    index.insert_batch(batch).unwrap();

    let query: Vec<f32> = (0..8).map(|_| rng()).collect();
    let mut expected: Vec<(f32, usize)> = vectors
        .iter()
        .enumerate()
        .map(|(i, v)| (localrag_vector::distance(DistanceMetric::L2, &query, v), i))
        .collect();
    expected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let got: Vec<usize> = index.search(&query, 10).unwrap().iter().map(|s| s.position).collect();
    let want: Vec<usize> = expected.iter().take(10).map(|(_, i)| *i).collect();
    assert_eq!(got, want);
}
