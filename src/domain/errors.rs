use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Model load failed: {0}")]
    ModelLoad(String),
    #[error("Image decode failed: {0}")]
    ImageDecode(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl DomainError {
    /// Message shown to the person using the page. Internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            DomainError::InvalidInput(msg) => format!("The upload was rejected: {msg}"),
            DomainError::PayloadTooLarge(_) => "The uploaded file is too large.".into(),
            DomainError::NotFound(msg) => format!("A required file is missing: {msg}"),
            DomainError::ModelLoad(_) => {
                "The detection model could not be loaded. Please contact the administrator.".into()
            }
            DomainError::ImageDecode(_) => {
                "The uploaded file could not be read as an image. Please upload a valid PNG or JPEG.".into()
            }
            DomainError::Inference(_) => {
                "Detection failed while processing the image. Please try again.".into()
            }
            DomainError::Storage(_) => "The uploaded image could not be stored.".into(),
            DomainError::OperationFailed(_) => "Unexpected server error.".into(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_failure_has_its_own_message() {
        let errors = [
            DomainError::PayloadTooLarge("x".into()),
            DomainError::ModelLoad("x".into()),
            DomainError::ImageDecode("x".into()),
            DomainError::Inference("x".into()),
            DomainError::Storage("x".into()),
        ];
        let mut messages: Vec<String> = errors.iter().map(|e| e.user_message()).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn invalid_input_keeps_the_reason() {
        let err = DomainError::InvalidInput("unsupported extension: gif".into());
        assert!(err.user_message().contains("gif"));
    }
}
