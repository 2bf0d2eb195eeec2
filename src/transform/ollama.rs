//! Transform backed by a local ollama model.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{Language, TextTransform, TransformError, strip_code_fence};

/// Runs `ollama run <model>` per file, feeding the prompt on stdin.
///
/// The model is expected to be pulled already; a missing model surfaces as a
/// [`TransformError::Backend`] on the first file and the run carries on with
/// the rest.
pub struct OllamaTransform {
    model: String,
}

impl OllamaTransform {
    pub fn new(model: impl Into<String>) -> Self {
        OllamaTransform {
            model: model.into(),
        }
    }

    fn prompt(language: Language, content: &str) -> String {
        format!(
            "You are an expert {} developer. Refactor the following code to \
             improve it: clean up formatting, remove dead code, simplify \
             logic, and improve naming where it helps readability. Keep the \
             behavior EXACTLY the same. Return ONLY the refactored code, with \
             no explanation and no markdown fences.\n\n{}",
            language.tag(),
            content
        )
    }
}

#[async_trait]
impl TextTransform for OllamaTransform {
    #[instrument(skip(self, content), fields(model = %self.model, language = language.tag()))]
    async fn transform(
        &self,
        language: Language,
        content: &str,
    ) -> Result<String, TransformError> {
        let mut child = Command::new("ollama")
            .args(["run", &self.model])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(TransformError::Spawn)?;

        let prompt = Self::prompt(language, content);
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransformError::Spawn(std::io::Error::other("child stdin unavailable")))?;
        stdin.write_all(prompt.as_bytes()).await?;
        drop(stdin); // close stdin so the model knows the prompt is complete

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(TransformError::Backend {
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let raw = String::from_utf8_lossy(&output.stdout).to_string();
        let cleaned = strip_code_fence(&raw);
        if cleaned.trim().is_empty() {
            return Err(TransformError::EmptyOutput);
        }

        debug!(
            input_bytes = content.len(),
            output_bytes = cleaned.len(),
            "transform complete"
        );
        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_the_language_and_carries_the_code() {
        let prompt = OllamaTransform::prompt(Language::Python, "print('x')");
        assert!(prompt.contains("python"));
        assert!(prompt.contains("print('x')"));
        assert!(prompt.contains("EXACTLY the same"));
    }
}
