//! 승률 모델 추론 포트.
//!
//! 모델은 별도로 학습되어 ONNX 형식으로 내보내야 합니다. 모델 입출력:
//! - 입력: [1, 15] 형태의 float32 텐서
//! - 출력: [1, 2] 형태의 float32 텐서 (win/loss, softmax 미적용 허용)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{MlError, MlResult};
use crate::features::FeatureVector;

/// 모델 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// ONNX 모델 파일 경로
    pub model_path: PathBuf,
    /// 로깅/식별을 위한 모델 이름
    pub model_name: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/win_probability.onnx"),
            model_name: "win_probability".to_string(),
        }
    }
}

impl ModelConfig {
    /// 주어진 모델 경로로 설정을 생성합니다.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    /// 모델 이름을 설정합니다.
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }
}

/// 승률 모델 포트.
///
/// 점수기는 이 trait을 통해서만 모델을 호출하며, 모델 부재 시
/// 조정을 건너뜁니다.
pub trait WinProbabilityModel: Send + Sync {
    /// feature vector에서 승률(0.0-1.0)을 예측합니다.
    fn predict(&self, features: &FeatureVector) -> MlResult<f64>;

    /// 모델 이름을 반환합니다.
    fn model_name(&self) -> &str;
}

/// ONNX Runtime 기반 승률 모델.
#[cfg(feature = "ml")]
pub struct OnnxModel {
    // ort Session.run은 가변 차용을 요구하므로 Mutex로 감쌈
    session: std::sync::Mutex<ort::session::Session>,
    config: ModelConfig,
}

#[cfg(feature = "ml")]
impl OnnxModel {
    /// 지정된 경로에서 ONNX 모델을 로드합니다.
    pub fn load(config: ModelConfig) -> MlResult<Self> {
        use ort::session::Session;

        let path = &config.model_path;
        if !path.exists() {
            return Err(MlError::ModelLoad(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        tracing::info!("Loading ONNX model from: {}", path.display());

        let session = Session::builder()
            .map_err(|e| MlError::ModelLoad(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| MlError::ModelLoad(format!("Failed to set optimization level: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| MlError::ModelLoad(format!("Failed to load model: {}", e)))?;

        tracing::info!("ONNX model loaded successfully: {}", config.model_name);

        Ok(Self {
            session: std::sync::Mutex::new(session),
            config,
        })
    }

    /// 기본 설정으로 파일 경로에서 모델을 로드합니다.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> MlResult<Self> {
        Self::load(ModelConfig::new(path.as_ref()))
    }

    fn run_inference(&self, features: &FeatureVector) -> MlResult<[f32; 2]> {
        use crate::features::FEATURE_COUNT;

        let input_data: Vec<f32> = features.to_array().to_vec();
        let input_shape = [1i64, FEATURE_COUNT as i64];

        let input_tensor =
            ort::value::Tensor::from_array((input_shape, input_data.into_boxed_slice()))
                .map_err(|e| MlError::Inference(format!("Failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| MlError::Inference("Model session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs!["input" => input_tensor])
            .map_err(|e| MlError::Inference(format!("Inference failed: {}", e)))?;

        let output_name = outputs
            .iter()
            .next()
            .map(|(name, _)| name.to_string())
            .ok_or_else(|| MlError::Inference("No output tensor found".to_string()))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| MlError::Inference("Failed to get output by name".to_string()))?;

        let (_, output_slice) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MlError::Inference(format!("Failed to extract output tensor: {}", e)))?;

        if output_slice.len() < 2 {
            return Err(MlError::Inference(format!(
                "Expected 2 output values, got {}",
                output_slice.len()
            )));
        }

        Ok([output_slice[0], output_slice[1]])
    }
}

#[cfg(feature = "ml")]
impl WinProbabilityModel for OnnxModel {
    fn predict(&self, features: &FeatureVector) -> MlResult<f64> {
        features.validate()?;

        let logits = self.run_inference(features)?;

        // 합이 1에서 벗어나면 softmax 적용
        let sum = logits[0] + logits[1];
        let win_prob = if (sum - 1.0).abs() > 0.01 {
            let max_val = logits[0].max(logits[1]);
            let exp_win = (logits[0] - max_val).exp();
            let exp_loss = (logits[1] - max_val).exp();
            exp_win / (exp_win + exp_loss)
        } else {
            logits[0]
        };

        tracing::debug!(
            win_prob = win_prob,
            model = %self.config.model_name,
            "Win probability predicted"
        );

        Ok(win_prob.clamp(0.0, 1.0) as f64)
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

/// 실제 모델 파일 없이 테스트하기 위한 mock 모델.
pub struct MockModel {
    /// 항상 반환할 고정 승률
    pub fixed_probability: f64,
}

impl MockModel {
    /// 고정 승률을 반환하는 mock 모델을 생성합니다.
    pub fn new(fixed_probability: f64) -> Self {
        Self { fixed_probability }
    }
}

impl WinProbabilityModel for MockModel {
    fn predict(&self, features: &FeatureVector) -> MlResult<f64> {
        features.validate()?;
        Ok(self.fixed_probability.clamp(0.0, 1.0))
    }

    fn model_name(&self) -> &str {
        "mock_model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_builder() {
        let config = ModelConfig::new("models/test.onnx").with_model_name("test_model");
        assert_eq!(config.model_name, "test_model");
        assert_eq!(config.model_path, PathBuf::from("models/test.onnx"));
    }

    #[test]
    fn test_mock_model_clamps() {
        let model = MockModel::new(1.5);
        let vector = FeatureVector {
            rsi: 50.0,
            macd_hist: 0.0,
            adx: 20.0,
            bb_pctb: 0.5,
            stoch_k: 50.0,
            atr_pct: 1.0,
            volume_ratio: 1.0,
            mtf_score: 0.0,
            sentiment_score: 0.0,
            fear_greed: 50.0,
            order_flow_score: 0.0,
            macro_score: 0.5,
            confidence: 50.0,
            tier_numeric: 3.0,
            is_crypto: 1.0,
        };

        assert_eq!(model.predict(&vector).unwrap(), 1.0);
    }

    #[cfg(feature = "ml")]
    #[test]
    fn test_model_not_found() {
        let config = ModelConfig::new("nonexistent/model.onnx");
        let result = OnnxModel::load(config);

        match result {
            Err(MlError::ModelLoad(msg)) => assert!(msg.contains("not found")),
            _ => panic!("Expected ModelLoad error"),
        }
    }
}
