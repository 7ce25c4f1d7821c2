//! ML 모듈 에러 타입.

use thiserror::Error;

/// ML 작업에서 발생할 수 있는 에러.
#[derive(Debug, Error)]
pub enum MlError {
    /// ONNX 모델 로드 에러
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// 모델 추론 중 에러
    #[error("Inference error: {0}")]
    Inference(String),

    /// 유효하지 않은 입력 데이터
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// ONNX Runtime 에러
    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(String),
}

/// ML 작업을 위한 Result 타입.
pub type MlResult<T> = Result<T, MlError>;

impl MlError {
    /// 이 에러가 복구 가능한지 확인 (다른 입력으로 재시도 가능).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MlError::InvalidInput(_))
    }

    /// 이 에러가 모델 리로드를 필요로 하는지 확인.
    pub fn requires_reload(&self) -> bool {
        matches!(self, MlError::ModelLoad(_) | MlError::OnnxRuntime(_))
    }
}

#[cfg(feature = "ml")]
impl From<ort::Error> for MlError {
    fn from(err: ort::Error) -> Self {
        MlError::OnnxRuntime(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MlError::ModelLoad("file not found".to_string());
        assert_eq!(err.to_string(), "Model load error: file not found");
    }

    #[test]
    fn test_error_recoverable() {
        let err = MlError::InvalidInput("NaN feature".to_string());
        assert!(err.is_recoverable());

        let err = MlError::ModelLoad("corrupted".to_string());
        assert!(!err.is_recoverable());
        assert!(err.requires_reload());
    }
}
