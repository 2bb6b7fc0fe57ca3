//! Text embeddings: Model2Vec backend with a deterministic fallback

use crate::config::Config;
use crate::error::{RecommenderError, Result};
use log::{info, warn};
use model2vec_rs::model::StaticModel;
use sha2::{Digest, Sha256};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Added to vector norms in `batch_similarity`
const NORM_EPSILON: f64 = 1e-8;

static SHARED: Mutex<Option<Arc<EmbeddingProvider>>> = Mutex::new(None);

/// A pretrained text encoder
pub trait EmbeddingBackend: Send + Sync {
    fn name(&self) -> &str;
    fn encode(&self, text: &str) -> Result<Vec<f32>>;
}

pub struct Model2VecBackend {
    model: StaticModel,
    name: String,
}

impl Model2VecBackend {
    pub fn load(model_path: &Path) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(
            model_path,
            None, // token
            None, // normalize
            None, // subfolder
        )?;

        info!("Model loaded in {:.2?}", start_time.elapsed());

        let name = model_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| model_path.display().to_string());

        Ok(Self { model, name })
    }
}

impl EmbeddingBackend for Model2VecBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = panic::catch_unwind(AssertUnwindSafe(|| self.model.encode_single(text)))
            .map_err(|_| RecommenderError::Embedding("model panicked while encoding".to_string()))?;

        if embedding.is_empty() {
            return Err(RecommenderError::Embedding(
                "model returned an empty embedding".to_string(),
            ));
        }
        Ok(embedding)
    }
}

/// Turns text into fixed-dimension vectors.
///
/// With a backend every call goes to the model; a failed call (or a vector of
/// the wrong dimension) degrades to `fallback_embedding` for that call only.
pub struct EmbeddingProvider {
    backend: Option<Arc<dyn EmbeddingBackend>>,
    dimension: usize,
}

impl EmbeddingProvider {
    /// Provider that only ever produces fallback vectors
    pub fn fallback(dimension: usize) -> Self {
        Self {
            backend: None,
            dimension,
        }
    }

    pub fn with_backend(backend: Arc<dyn EmbeddingBackend>, dimension: usize) -> Self {
        Self {
            backend: Some(backend),
            dimension,
        }
    }

    /// Load the configured model; any failure leaves a fallback-only provider
    pub fn from_config(config: &Config) -> Self {
        let configured_dim = config.models.embedding_dim;

        let Some(model_path) = &config.models.embedding_model_path else {
            info!("No embedding model configured, using fallback embeddings");
            return Self::fallback(configured_dim);
        };

        match Model2VecBackend::load(model_path) {
            Ok(backend) => {
                // the model decides the dimension; fallback vectors must agree with it
                let dimension = match backend.encode("dimension probe") {
                    Ok(probe) => probe.len(),
                    Err(e) => {
                        warn!("Embedding model probe failed ({}), using fallback embeddings", e);
                        return Self::fallback(configured_dim);
                    }
                };
                if dimension != configured_dim {
                    info!(
                        "Model dimension {} overrides configured dimension {}",
                        dimension, configured_dim
                    );
                }
                Self::with_backend(Arc::new(backend), dimension)
            }
            Err(e) => {
                warn!("Failed to load embedding model ({}), using fallback embeddings", e);
                Self::fallback(configured_dim)
            }
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.as_ref().map_or("fallback", |b| b.name())
    }

    /// Never fails: backend errors are logged and replaced by the fallback
    pub fn embed(&self, text: &str) -> Vec<f32> {
        match self.try_embed(text) {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Embedding generation failed, using fallback: {}", e);
                fallback_embedding(text, self.dimension)
            }
        }
    }

    fn try_embed(&self, text: &str) -> Result<Vec<f32>> {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return Ok(fallback_embedding(text, self.dimension)),
        };

        let embedding = backend.encode(text)?;
        if embedding.len() != self.dimension {
            return Err(RecommenderError::Embedding(format!(
                "expected {} dimensions, model produced {}",
                self.dimension,
                embedding.len()
            )));
        }
        Ok(embedding)
    }

    pub fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Deterministic pseudo-embedding: standard normal samples from a PRNG seeded
/// by the first 8 hex digits of the text's SHA-256, modulo 2^31
pub fn fallback_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    let seed = u64::from(prefix) % (1u64 << 31);

    let mut rng = fastrand::Rng::with_seed(seed);
    let mut values = Vec::with_capacity(dimension);
    while values.len() < dimension {
        // Box-Muller: two uniforms give two independent normals
        let u1 = 1.0 - rng.f64();
        let u2 = rng.f64();
        let radius = (-2.0 * u1.ln()).sqrt();
        let angle = 2.0 * std::f64::consts::PI * u2;
        values.push((radius * angle.cos()) as f32);
        if values.len() < dimension {
            values.push((radius * angle.sin()) as f32);
        }
    }
    values
}

fn norm(v: &[f32]) -> f64 {
    v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt()
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum()
}

/// Cosine similarity rescaled to [0, 1]; 0.0 when either vector has zero norm
pub fn similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(RecommenderError::Embedding(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    let cosine = dot(a, b) / (norm_a * norm_b);
    Ok(((cosine + 1.0) / 2.0).clamp(0.0, 1.0))
}

/// Rescaled cosine of `query` against every corpus row. Norms carry a small
/// epsilon and results are not clamped.
pub fn batch_similarity(query: &[f32], corpus: &[Vec<f32>]) -> Result<Vec<f64>> {
    let query_norm = norm(query) + NORM_EPSILON;

    corpus
        .iter()
        .map(|row| {
            if row.len() != query.len() {
                return Err(RecommenderError::Embedding(format!(
                    "Embedding dimensions don't match: {} vs {}",
                    query.len(),
                    row.len()
                )));
            }
            let cosine = dot(query, row) / (query_norm * (norm(row) + NORM_EPSILON));
            Ok((cosine + 1.0) / 2.0)
        })
        .collect()
}

/// Little-endian f32 bytes for storage
pub fn to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn from_bytes(data: &[u8]) -> Result<Vec<f32>> {
    if data.len() % 4 != 0 {
        return Err(RecommenderError::InvalidInput(format!(
            "embedding byte length {} is not a multiple of 4",
            data.len()
        )));
    }
    Ok(data
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn shared_slot() -> std::sync::MutexGuard<'static, Option<Arc<EmbeddingProvider>>> {
    SHARED.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-wide provider, loaded from `config` on first use.
///
/// The lock is held while loading so concurrent first callers load once. The
/// returned handle is used without the lock.
pub fn shared(config: &Config) -> Arc<EmbeddingProvider> {
    let mut slot = shared_slot();
    if let Some(provider) = slot.as_ref() {
        return Arc::clone(provider);
    }

    let provider = Arc::new(EmbeddingProvider::from_config(config));
    info!(
        "Embedding provider ready: {} ({} dimensions)",
        provider.backend_name(),
        provider.dimension()
    );
    *slot = Some(Arc::clone(&provider));
    provider
}

/// Replace the process-wide provider
pub fn install(provider: EmbeddingProvider) -> Arc<EmbeddingProvider> {
    let provider = Arc::new(provider);
    *shared_slot() = Some(Arc::clone(&provider));
    provider
}

/// Drop the process-wide provider; the next `shared` call loads again
pub fn teardown() {
    *shared_slot() = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    // tests touching the process-wide provider run one at a time
    static SHARED_TEST: Mutex<()> = Mutex::new(());

    fn shared_test_lock() -> std::sync::MutexGuard<'static, ()> {
        SHARED_TEST.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    struct FailingBackend;

    impl EmbeddingBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn encode(&self, _text: &str) -> Result<Vec<f32>> {
            Err(RecommenderError::Embedding("offline".to_string()))
        }
    }

    struct ConstantBackend(usize);

    impl EmbeddingBackend for ConstantBackend {
        fn name(&self) -> &str {
            "constant"
        }

        fn encode(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0; self.0])
        }
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let provider = EmbeddingProvider::fallback(384);
        let first = provider.embed("Senior Rust engineer");
        let second = provider.embed("Senior Rust engineer");
        assert_eq!(first.len(), 384);
        assert_eq!(first, second);
        assert_ne!(first, provider.embed("Junior Go engineer"));
    }

    #[test]
    fn test_fallback_looks_standard_normal() {
        let values = fallback_embedding("distribution check", 4000);
        let mean = values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64;
        let variance = values
            .iter()
            .map(|v| (f64::from(*v) - mean).powi(2))
            .sum::<f64>()
            / values.len() as f64;
        assert!(mean.abs() < 0.1);
        assert!((variance - 1.0).abs() < 0.15);
    }

    #[test]
    fn test_backend_failure_degrades_to_fallback() {
        let provider = EmbeddingProvider::with_backend(Arc::new(FailingBackend), 16);
        assert_eq!(provider.embed("text"), fallback_embedding("text", 16));

        let wrong_dim = EmbeddingProvider::with_backend(Arc::new(ConstantBackend(8)), 16);
        assert_eq!(wrong_dim.embed("text").len(), 16);

        let working = EmbeddingProvider::with_backend(Arc::new(ConstantBackend(16)), 16);
        assert_eq!(working.embed("text"), vec![1.0; 16]);
        assert_eq!(working.backend_name(), "constant");
    }

    #[test]
    fn test_similarity() {
        let a = vec![1.0, 0.0];
        assert!((similarity(&a, &a).unwrap() - 1.0).abs() < 1e-9);
        assert!((similarity(&a, &[0.0, 1.0]).unwrap() - 0.5).abs() < 1e-9);
        assert!(similarity(&a, &[-1.0, 0.0]).unwrap().abs() < 1e-9);
        assert_eq!(similarity(&a, &[0.0, 0.0]).unwrap(), 0.0);
        assert!(matches!(
            similarity(&a, &[1.0, 0.0, 0.0]),
            Err(RecommenderError::Embedding(_))
        ));
    }

    #[test]
    fn test_batch_similarity_is_not_clamped() {
        let query = vec![1.0, 0.0];
        let corpus = vec![vec![1.0, 0.0], vec![-1.0, 0.0], vec![0.0, 0.0]];
        let scores = batch_similarity(&query, &corpus).unwrap();

        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!(scores[1].abs() < 1e-6);
        assert!((scores[2] - 0.5).abs() < 1e-9);
        assert!(batch_similarity(&query, &[vec![1.0]]).is_err());
    }

    #[test]
    fn test_bytes_round_trip() {
        let embedding = vec![0.25, -1.5, 3.0];
        let bytes = to_bytes(&embedding);
        assert_eq!(bytes.len(), 12);
        assert_eq!(from_bytes(&bytes).unwrap(), embedding);
        assert!(from_bytes(&bytes[..5]).is_err());
    }

    #[test]
    fn test_shared_provider_lifecycle() {
        let _guard = shared_test_lock();
        let config = Config::default();

        let installed = install(EmbeddingProvider::fallback(32));
        let shared_handle = shared(&config);
        assert!(Arc::ptr_eq(&installed, &shared_handle));
        assert_eq!(shared_handle.dimension(), 32);

        teardown();
        let reloaded = shared(&config);
        assert!(!reloaded.has_backend());
        assert_eq!(reloaded.dimension(), config.models.embedding_dim);
        assert!(Arc::ptr_eq(&reloaded, &shared(&config)));
        teardown();
    }

    #[test]
    fn test_concurrent_first_use_loads_once() {
        let _guard = shared_test_lock();
        let config = Config::default();
        teardown();

        let handles: Vec<Arc<EmbeddingProvider>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8).map(|_| scope.spawn(|| shared(&config))).collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        let first = &handles[0];
        assert!(handles.iter().all(|handle| Arc::ptr_eq(first, handle)));
        assert!(Arc::ptr_eq(first, &shared(&config)));
        teardown();
    }
}
