use candle_core::{safetensors, DType, Device, Tensor};
use log::{error, info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::features::NUM_FEATURES;
use crate::hce::PieceSquareTables;
use crate::params::{EvaluatorParameters, LearnedWeights, TermWeights};
use crate::piece_values::PieceValues;

const FILE_NAME: &str = "params.safetensors";

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode checkpoint: {0}")]
    Encode(#[from] candle_core::Error),
    #[error("no checkpoint at {0}")]
    NotFound(PathBuf),
    #[error("checkpoint {path} is corrupted: {reason}")]
    Corrupted { path: PathBuf, reason: String },
}

/// Opaque reference to a saved parameter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointHandle {
    pub version: u32,
    pub path: PathBuf,
}

/// Versioned checkpoint directory: `<root>/v<N>/params.safetensors`.
///
/// Each save goes to a fresh version directory and is written to a temporary
/// file first, then renamed into place, so an interrupted save never damages
/// an earlier checkpoint.
pub struct CheckpointStore {
    root: PathBuf,
}

impl CheckpointStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions(&self) -> Result<Vec<u32>, CheckpointError> {
        let mut versions = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(num) = name.strip_prefix('v').and_then(|s| s.parse::<u32>().ok()) {
                versions.push(num);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    pub fn handle(&self, version: u32) -> CheckpointHandle {
        CheckpointHandle {
            version,
            path: self.root.join(format!("v{}", version)).join(FILE_NAME),
        }
    }

    pub fn latest(&self) -> Result<Option<CheckpointHandle>, CheckpointError> {
        Ok(self.versions()?.last().map(|v| self.handle(*v)))
    }

    pub fn save(&self, params: &EvaluatorParameters) -> Result<CheckpointHandle, CheckpointError> {
        let next = self.versions()?.last().map_or(0, |v| v + 1);
        let handle = self.handle(next);
        let dir = self.root.join(format!("v{}", next));
        fs::create_dir_all(&dir)?;

        let tmp = dir.join(format!("{}.tmp", FILE_NAME));
        safetensors::save(&encode(params)?, &tmp)?;
        fs::rename(&tmp, &handle.path)?;

        info!(
            "Saved evaluator parameters v{} to {}",
            params.version,
            handle.path.display()
        );
        Ok(handle)
    }

    pub fn load(&self, handle: &CheckpointHandle) -> Result<EvaluatorParameters, CheckpointError> {
        read(&handle.path)
    }

    /// Newest checkpoint that passes integrity checks, or defaults when none does.
    pub fn load_latest(&self) -> (EvaluatorParameters, Option<CheckpointHandle>) {
        let versions = match self.versions() {
            Ok(v) => v,
            Err(e) => {
                error!("Cannot list checkpoints in {}: {}", self.root.display(), e);
                Vec::new()
            }
        };

        for version in versions.into_iter().rev() {
            let handle = self.handle(version);
            match self.load(&handle) {
                Ok(params) => return (params, Some(handle)),
                Err(CheckpointError::NotFound(path)) => {
                    warn!("Skipping incomplete checkpoint {}", path.display());
                }
                Err(e) => error!("{}; falling back to an older checkpoint", e),
            }
        }

        warn!(
            "No usable checkpoint in {}, using default parameters",
            self.root.display()
        );
        (EvaluatorParameters::default(), None)
    }
}

/// Reads and verifies a single checkpoint file.
pub fn read(path: &Path) -> Result<EvaluatorParameters, CheckpointError> {
    if !path.is_file() {
        return Err(CheckpointError::NotFound(path.to_path_buf()));
    }
    let tensors = safetensors::load(path, &Device::Cpu).map_err(|e| corrupted(path, e))?;
    decode(path, &tensors)
}

fn encode(params: &EvaluatorParameters) -> Result<HashMap<String, Tensor>, CheckpointError> {
    let device = Device::Cpu;
    let (lo, hi) = split(checksum(params));

    let mut tensors = HashMap::new();
    tensors.insert("version".to_string(), Tensor::new(&[params.version], &device)?);
    tensors.insert(
        "piece_values".to_string(),
        Tensor::new(&params.piece_values.to_array(), &device)?,
    );
    tensors.insert(
        "terms".to_string(),
        Tensor::from_vec(params.terms.to_vec(), TermWeights::LEN, &device)?,
    );
    tensors.insert(
        "pst".to_string(),
        Tensor::from_vec(params.pst.to_vec(), (6, 2, 64), &device)?,
    );
    tensors.insert("learned".to_string(), Tensor::new(&params.learned.0, &device)?);
    tensors.insert("checksum".to_string(), Tensor::new(&[lo, hi], &device)?);
    Ok(tensors)
}

fn decode(
    path: &Path,
    tensors: &HashMap<String, Tensor>,
) -> Result<EvaluatorParameters, CheckpointError> {
    let version = values::<u32>(path, tensors, "version", DType::U32, 1)?[0];

    let pv = values::<f32>(path, tensors, "piece_values", DType::F32, PieceValues::LEN)?;
    let mut pv_array = [0.0; PieceValues::LEN];
    pv_array.copy_from_slice(&pv);

    let terms = values::<f32>(path, tensors, "terms", DType::F32, TermWeights::LEN)?;
    let pst = values::<f32>(path, tensors, "pst", DType::F32, PieceSquareTables::LEN)?;

    let learned = values::<f32>(path, tensors, "learned", DType::F32, NUM_FEATURES)?;
    let mut learned_array = [0.0; NUM_FEATURES];
    learned_array.copy_from_slice(&learned);

    let stored = values::<u32>(path, tensors, "checksum", DType::U32, 2)?;

    let params = EvaluatorParameters {
        version,
        piece_values: PieceValues::from_array(pv_array),
        terms: TermWeights::from_slice(&terms)
            .ok_or_else(|| corrupted(path, "bad term weights"))?,
        pst: PieceSquareTables::from_slice(&pst).ok_or_else(|| corrupted(path, "bad tables"))?,
        learned: LearnedWeights(learned_array),
    };

    if split(checksum(&params)) != (stored[0], stored[1]) {
        return Err(corrupted(path, "checksum mismatch"));
    }
    if !params.is_finite() {
        return Err(corrupted(path, "non-finite weights"));
    }
    Ok(params)
}

fn values<T: candle_core::WithDType>(
    path: &Path,
    tensors: &HashMap<String, Tensor>,
    name: &str,
    dtype: DType,
    len: usize,
) -> Result<Vec<T>, CheckpointError> {
    let tensor = tensors
        .get(name)
        .ok_or_else(|| corrupted(path, format!("missing tensor '{}'", name)))?;
    if tensor.dtype() != dtype || tensor.elem_count() != len {
        return Err(corrupted(
            path,
            format!(
                "tensor '{}' has {:?} x {}, expected {:?} x {}",
                name,
                tensor.dtype(),
                tensor.elem_count(),
                dtype,
                len
            ),
        ));
    }
    tensor
        .flatten_all()
        .and_then(|t| t.to_vec1::<T>())
        .map_err(|e| corrupted(path, e))
}

fn corrupted(path: &Path, reason: impl ToString) -> CheckpointError {
    CheckpointError::Corrupted {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

// FNV-1a over the version and every weight's bit pattern.
fn checksum(params: &EvaluatorParameters) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    let mut feed = |bytes: [u8; 4]| {
        for b in bytes {
            hash ^= b as u64;
            hash = hash.wrapping_mul(PRIME);
        }
    };

    feed(params.version.to_le_bytes());
    let floats = params
        .piece_values
        .to_array()
        .into_iter()
        .chain(params.terms.to_vec())
        .chain(params.pst.to_vec())
        .chain(params.learned.0);
    for v in floats {
        feed(v.to_bits().to_le_bytes());
    }
    hash
}

fn split(v: u64) -> (u32, u32) {
    (v as u32, (v >> 32) as u32)
}
