use candle_core::{Device, Tensor, Var};
use candle_nn::{AdamW, Optimizer, ParamsAdamW};
use evaluation::features::{LEARNED_UNIT_CP, NUM_FEATURES};
use evaluation::LearnedWeights;

use super::loss::huber;
use super::samples::Sample;
use super::targets::VALUE_SCALE_CP;
use crate::config::OptimizerConfig;
use crate::error::{Result, TrainingError};

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub samples: usize,
    pub loss_before: f32,
    pub loss_after: f32,
    pub weights: LearnedWeights,
}

struct Batch {
    heuristic: Tensor,
    features: Tensor,
    target: Tensor,
}

/// Fits the learned weights so that `tanh((heuristic + 100 w·f) / 400)`
/// matches the sample targets.
pub struct Learner {
    weights: Var,
    optimizer: AdamW,
    config: OptimizerConfig,
    device: Device,
}

impl Learner {
    pub fn new(initial: &LearnedWeights, config: OptimizerConfig) -> Result<Self> {
        let device = Device::Cpu;
        let weights = Var::from_tensor(&Tensor::from_slice(
            initial.0.as_slice(),
            (NUM_FEATURES, 1),
            &device,
        )?)?;
        let optimizer = Self::optimizer(&weights, &config)?;

        Ok(Self {
            weights,
            optimizer,
            config,
            device,
        })
    }

    fn optimizer(weights: &Var, config: &OptimizerConfig) -> Result<AdamW> {
        Ok(AdamW::new(
            vec![weights.clone()],
            ParamsAdamW {
                lr: config.learning_rate,
                weight_decay: config.weight_decay,
                ..ParamsAdamW::default()
            },
        )?)
    }

    pub fn weights(&self) -> Result<LearnedWeights> {
        let values = self.weights.as_tensor().flatten_all()?.to_vec1::<f32>()?;
        let mut weights = [0.0; NUM_FEATURES];
        weights.copy_from_slice(&values);
        Ok(LearnedWeights(weights))
    }

    /// Starts over from `weights` with fresh optimizer state.
    pub fn reset(&mut self, weights: &LearnedWeights) -> Result<()> {
        let tensor = Tensor::from_slice(weights.0.as_slice(), (NUM_FEATURES, 1), &self.device)?;
        self.weights.set(&tensor)?;
        self.optimizer = Self::optimizer(&self.weights, &self.config)?;
        Ok(())
    }

    pub fn loss(&self, samples: &[Sample]) -> Result<f32> {
        let batch = self.batch(samples)?;
        self.batch_loss(&batch)
    }

    /// Runs the configured optimizer steps on `samples`.
    ///
    /// An update leaving non-finite weights or a weight above `max_weight` is
    /// undone and reported as `DivergentUpdate`.
    pub fn fit(&mut self, samples: &[Sample]) -> Result<UpdateReport> {
        if samples.is_empty() {
            return Ok(UpdateReport {
                samples: 0,
                loss_before: 0.0,
                loss_after: 0.0,
                weights: self.weights()?,
            });
        }

        let batch = self.batch(samples)?;
        let saved = self.weights.as_tensor().copy()?;
        let loss_before = self.batch_loss(&batch)?;

        for _ in 0..self.config.steps_per_game {
            let loss = huber(&self.predict(&batch)?, &batch.target)?;
            self.optimizer.backward_step(&loss)?;
        }

        let loss_after = self.batch_loss(&batch)?;
        let weights = self.weights()?;
        let max_abs = weights.max_abs();

        if !weights.is_finite() || !loss_after.is_finite() || max_abs > self.config.max_weight {
            self.weights.set(&saved)?;
            self.optimizer = Self::optimizer(&self.weights, &self.config)?;
            return Err(TrainingError::DivergentUpdate { max_abs });
        }

        Ok(UpdateReport {
            samples: samples.len(),
            loss_before,
            loss_after,
            weights,
        })
    }

    fn batch(&self, samples: &[Sample]) -> Result<Batch> {
        let n = samples.len();
        let heuristic: Vec<f32> = samples.iter().map(|s| s.heuristic).collect();
        let features: Vec<f32> = samples.iter().flat_map(|s| s.features).collect();
        let target: Vec<f32> = samples.iter().map(|s| s.target).collect();

        Ok(Batch {
            heuristic: Tensor::from_vec(heuristic, n, &self.device)?,
            features: Tensor::from_vec(features, (n, NUM_FEATURES), &self.device)?,
            target: Tensor::from_vec(target, n, &self.device)?,
        })
    }

    fn predict(&self, batch: &Batch) -> candle_core::Result<Tensor> {
        let learned = batch.features.matmul(self.weights.as_tensor())?.squeeze(1)?;
        let cp = (&batch.heuristic + (learned * LEARNED_UNIT_CP as f64)?)?;
        (cp / VALUE_SCALE_CP as f64)?.tanh()
    }

    fn batch_loss(&self, batch: &Batch) -> Result<f32> {
        let loss = huber(&self.predict(batch)?, &batch.target)?;
        Ok(loss.to_vec0::<f32>()?)
    }
}
