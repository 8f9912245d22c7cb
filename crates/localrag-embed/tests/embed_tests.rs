use localrag_core::{Embedder, Error};
use localrag_embed::{get_default_embedder, FnEmbedder, HashingEmbedder, DEFAULT_DIM};

#[test]
fn hashing_embedder_shapes_and_determinism() {
    let embedder = HashingEmbedder::new(64).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 64);

    let single = embedder.embed("retrieval").unwrap();
    let norm: f32 = single.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn hashing_embedder_ignores_case_and_punctuation() {
    let embedder = HashingEmbedder::new(128).unwrap();
    assert_eq!(embedder.embed("April Fools Day!").unwrap(), embedder.embed("april, fools day").unwrap());
}

#[test]
fn empty_text_embeds_to_zero_vector() {
    let embedder = HashingEmbedder::new(16).unwrap();
    let v = embedder.embed("").expect("empty input is allowed");
    assert_eq!(v, vec![0.0; 16]);
}

#[test]
fn overlong_input_is_an_embedding_failure() {
    let embedder = HashingEmbedder::new(16).unwrap().with_max_len(5);
    assert!(matches!(embedder.embed("too long input"), Err(Error::Embedding(_))));
    assert!(embedder.embed("short").is_ok());
}

#[test]
fn zero_dimension_is_rejected() {
    assert!(matches!(HashingEmbedder::new(0), Err(Error::InvalidConfig(_))));
}

#[test]
fn seeds_change_the_space() {
    let a = HashingEmbedder::new(256).unwrap();
    let b = HashingEmbedder::new(256).unwrap().with_seed(7);
    assert_ne!(a.embed("rust retrieval").unwrap(), b.embed("rust retrieval").unwrap());
}

#[test]
fn fn_embedder_delegates_and_propagates_errors() -> anyhow::Result<()> {
    let embedder = FnEmbedder::new(2, |text| {
        if text == "offline" {
            Err(Error::embedding("backend unavailable"))
        } else {
            Ok(vec![text.len() as f32, 1.0])
        }
    });
    assert_eq!(embedder.embed("abc")?, vec![3.0, 1.0]);
    assert!(matches!(embedder.embed("offline"), Err(Error::Embedding(_))));

    let batch = embedder.embed_batch(&["a".to_string(), "offline".to_string()]);
    assert!(batch.is_err());
    Ok(())
}

#[test]
fn default_embedder_uses_default_dim() {
    std::env::remove_var("APP_EMBED_DIM");
    let embedder = get_default_embedder().expect("embedder");
    assert_eq!(embedder.dim(), DEFAULT_DIM);
    assert_eq!(embedder.embed("anything").unwrap().len(), DEFAULT_DIM);
}
