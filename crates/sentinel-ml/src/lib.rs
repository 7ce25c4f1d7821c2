//! # Sentinel ML
//!
//! 학습된 승률 모델의 포트를 제공합니다.
//!
//! 모델 학습은 이 크레이트의 범위가 아닙니다. 별도로 학습된 분류기를
//! ONNX 형식으로 내보내 `ml` feature로 로드하거나, 테스트에서는
//! [`MockModel`]을 사용합니다.
//!
//! - **FeatureVector**: 점수기가 조립하는 고정 순서 15개 feature
//! - **WinProbabilityModel**: `predict -> MlResult<f64>` 추론 포트
//! - **OnnxModel**: ONNX Runtime 기반 구현 (`ml` feature)

pub mod error;
pub mod features;
pub mod predictor;

pub use error::{MlError, MlResult};
pub use features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
#[cfg(feature = "ml")]
pub use predictor::OnnxModel;
pub use predictor::{MockModel, ModelConfig, WinProbabilityModel};
