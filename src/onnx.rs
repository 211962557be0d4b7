//! ONNX Runtime evaluator.
//!
//! Runs a policy/value network exported to ONNX. The model takes a
//! `[1, 21, 8, 8]` float tensor and produces a value output, whose first
//! element is the value (or its logit), and a policy output with one score
//! per vocabulary move.

use std::{fs, io::copy, path::Path};

use ndarray::Ix2;
use ort::{session::Session, value::Tensor};

use crate::{
    config::{Backend, ModelConfig},
    error::EngineError,
    evaluator::Evaluator,
    tensor::EncodedPosition,
    types::RawEvaluation,
};

impl Backend {
    /// Register the backend with ONNX Runtime. Must run before any session is
    /// created.
    ///
    /// Returns `false` if a backend was already registered; that one stays in
    /// effect.
    pub fn install(self) -> bool {
        let installed = match self {
            Backend::Tract => ort::set_api(ort_tract::api()),
            Backend::Candle => ort::set_api(ort_candle::api()),
        };
        if installed {
            log::debug!("using {self:?} inference backend");
        } else {
            log::warn!("inference backend already set, ignoring {self:?}");
        }
        installed
    }
}

pub struct OnnxEvaluator {
    session: Session,
    input_name: String,
    value_output: String,
    policy_output: String,
    value_tanh: bool,
}

impl std::fmt::Debug for OnnxEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEvaluator")
            .field("input_name", &self.input_name)
            .field("value_output", &self.value_output)
            .field("policy_output", &self.policy_output)
            .finish_non_exhaustive()
    }
}

impl OnnxEvaluator {
    /// Initialize from the model described by `config`, downloading it first
    /// if it is missing and a URL is configured.
    pub fn from_config(config: &ModelConfig) -> Result<Self, EngineError> {
        config.backend.install();
        if !config.path.exists() {
            match &config.url {
                Some(url) => download_model(url, &config.path)?,
                None => log::warn!("model {} not found", config.path.display()),
            }
        }
        let session = Session::builder()?.commit_from_file(&config.path)?;
        log::info!("loaded model {}", config.path.display());
        Ok(Self::with_session(session, config))
    }

    /// Initialize from raw bytes
    pub fn from_memory(model_bytes: &[u8], config: &ModelConfig) -> Result<Self, EngineError> {
        config.backend.install();
        let session = Session::builder()?.commit_from_memory(model_bytes)?;
        Ok(Self::with_session(session, config))
    }

    fn with_session(session: Session, config: &ModelConfig) -> Self {
        Self {
            session,
            input_name: config.input_name.clone(),
            value_output: config.value_output.clone(),
            policy_output: config.policy_output.clone(),
            value_tanh: config.value_tanh,
        }
    }
}

impl Evaluator for OnnxEvaluator {
    fn evaluate(&mut self, position: &EncodedPosition) -> Result<RawEvaluation, EngineError> {
        let outputs = self.session.run(ort::inputs! {
            self.input_name.as_str() => Tensor::from_array(position.to_batch())?,
        })?;

        let value_array = outputs
            .get(self.value_output.as_str())
            .ok_or_else(|| EngineError::MissingOutput(self.value_output.clone()))?
            .try_extract_array::<f32>()?;
        let raw_value = value_array
            .iter()
            .next()
            .copied()
            .ok_or_else(|| EngineError::MissingOutput(self.value_output.clone()))?;
        let value = if self.value_tanh {
            raw_value.tanh()
        } else {
            raw_value
        };

        // Policy is [1, moves].
        let policy = outputs
            .get(self.policy_output.as_str())
            .ok_or_else(|| EngineError::MissingOutput(self.policy_output.clone()))?
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix2>()?
            .iter()
            .copied()
            .collect();

        Ok(RawEvaluation { value, policy })
    }
}

/// Fetch a model over HTTP and store it at `path`.
pub fn download_model(url: &str, path: &Path) -> Result<(), EngineError> {
    log::info!("downloading model from {url}");
    let mut response =
        reqwest::blocking::get(url).map_err(|e| EngineError::Download(e.to_string()))?;

    if !response.status().is_success() {
        return Err(EngineError::Download(format!(
            "{url} returned {}",
            response.status()
        )));
    }

    let mut dest = fs::File::create(path)?;
    copy(&mut response, &mut dest)?;
    log::info!("saved model to {}", path.display());
    Ok(())
}
