// src/utils/candle.rs
use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use once_cell::sync::Lazy;

static CANDLE_DEVICE: Lazy<Device> = Lazy::new(|| match Device::new_metal(0) {
    Ok(device) if device.is_metal() => {
        log::info!("🧮 Embedding similarity running on the Candle Metal device");
        device
    }
    Ok(_) => Device::Cpu,
    Err(err) => {
        log::debug!("Metal unavailable ({}), using the Candle CPU device", err);
        Device::Cpu
    }
});

fn squared_sum(t: &Tensor, what: &str) -> Result<f64> {
    let value = (t * t)
        .with_context(|| format!("Element-wise square of {} failed", what))?
        .sum_all()
        .with_context(|| format!("Summing {} failed", what))?
        .to_scalar::<f32>()
        .with_context(|| format!("Reading {} back as a scalar failed", what))?;
    Ok(value as f64)
}

/// Raw cosine of two equal-length embeddings. A zero-norm side yields 0.0.
pub fn cosine_similarity_candle(v1: &[f32], v2: &[f32]) -> Result<f64> {
    if v1.len() != v2.len() {
        anyhow::bail!("Embedding lengths differ: {} vs {}", v1.len(), v2.len());
    }
    if v1.is_empty() {
        anyhow::bail!("Embeddings must not be empty");
    }

    let t1 = Tensor::from_slice(v1, (v1.len(),), &CANDLE_DEVICE)
        .with_context(|| format!("Failed to build tensor of len {}", v1.len()))?;
    let t2 = Tensor::from_slice(v2, (v2.len(),), &CANDLE_DEVICE)
        .with_context(|| format!("Failed to build tensor of len {}", v2.len()))?;

    let dot = (&t1 * &t2)
        .context("Element-wise product failed")?
        .sum_all()
        .context("Summing dot product failed")?
        .to_scalar::<f32>()
        .context("Reading dot product failed")? as f64;
    let norm1 = squared_sum(&t1, "first norm")?.sqrt();
    let norm2 = squared_sum(&t2, "second norm")?.sqrt();

    if norm1 == 0.0 || norm2 == 0.0 {
        return Ok(0.0);
    }
    let similarity = dot / (norm1 * norm2);
    if !similarity.is_finite() {
        log::warn!(
            "Non-finite cosine (dot {}, norms {} / {}), treating as 0",
            dot,
            norm1,
            norm2
        );
        return Ok(0.0);
    }
    Ok(similarity)
}

/// Cosine clamped into [0, 1]. Missing, mismatched or degenerate embeddings score 0.0.
pub fn embedding_similarity(v1: Option<&[f32]>, v2: Option<&[f32]>) -> f64 {
    match (v1, v2) {
        (Some(a), Some(b)) => match cosine_similarity_candle(a, b) {
            Ok(sim) => sim.clamp(0.0, 1.0),
            Err(e) => {
                log::debug!("Embedding similarity unavailable: {:#}", e);
                0.0
            }
        },
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_basic_cases() {
        let same = cosine_similarity_candle(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!((same - 1.0).abs() < 1e-6);
        let orthogonal = cosine_similarity_candle(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(orthogonal.abs() < 1e-6);
        let zero = cosine_similarity_candle(&[0.0, 0.0], &[1.0, 1.0]).unwrap();
        assert_eq!(zero, 0.0);
    }

    #[test]
    fn test_cosine_rejects_bad_shapes() {
        assert!(cosine_similarity_candle(&[1.0], &[1.0, 2.0]).is_err());
        assert!(cosine_similarity_candle(&[], &[]).is_err());
    }

    #[test]
    fn test_embedding_similarity_clamps_and_defaults() {
        let a = [1.0f32, 0.0];
        let b = [-1.0f32, 0.0];
        assert_eq!(embedding_similarity(Some(&a), Some(&b)), 0.0);
        assert_eq!(embedding_similarity(None, Some(&b)), 0.0);
        assert_eq!(embedding_similarity(Some(&a[..1]), Some(&b)), 0.0);
        assert!((embedding_similarity(Some(&a), Some(&a)) - 1.0).abs() < 1e-6);
    }
}
