//! Trait definitions for the converter module.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::enumerator::ConversionTask;

use super::error::ConverterError;
use super::types::{ConversionOutput, ConverterInfo};

/// Something that turns one raw file into one DNG by running an external
/// process.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<ConverterInfo, ConverterError>;

    /// Converts one task.
    ///
    /// When `cancel` fires the process is killed and
    /// [`ConverterError::Cancelled`] is returned.
    async fn convert(
        &self,
        task: &ConversionTask,
        cancel: CancellationToken,
    ) -> Result<ConversionOutput, ConverterError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct EchoConverter;

    #[async_trait]
    impl Converter for EchoConverter {
        fn name(&self) -> &str {
            "echo"
        }

        async fn validate(&self) -> Result<ConverterInfo, ConverterError> {
            Ok(ConverterInfo {
                name: self.name().to_string(),
                executable: PathBuf::from("echo"),
                version: None,
            })
        }

        async fn convert(
            &self,
            task: &ConversionTask,
            cancel: CancellationToken,
        ) -> Result<ConversionOutput, ConverterError> {
            if cancel.is_cancelled() {
                return Err(ConverterError::Cancelled {
                    output: String::new(),
                });
            }
            Ok(ConversionOutput {
                output_path: task.output_path(),
                exit_code: 0,
                output: task.source_name(),
                duration_ms: 0,
            })
        }
    }

    fn task() -> ConversionTask {
        ConversionTask {
            sequence_index: 1,
            source_path: PathBuf::from("/in/IMG_0001.CR3"),
            destination_folder: PathBuf::from("/out"),
            output_base_name: "shot".to_string(),
        }
    }

    #[tokio::test]
    async fn test_trait_object_convert() {
        let converter: Box<dyn Converter> = Box::new(EchoConverter);
        let out = converter
            .convert(&task(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.output_path, PathBuf::from("/out/shot.dng"));
        assert_eq!(out.output, "IMG_0001.CR3");
    }

    #[tokio::test]
    async fn test_trait_object_cancelled() {
        let converter: Box<dyn Converter> = Box::new(EchoConverter);
        let token = CancellationToken::new();
        token.cancel();
        let err = converter.convert(&task(), token).await.unwrap_err();
        assert!(matches!(err, ConverterError::Cancelled { .. }));
    }
}
