//! Prompt loading and rendering.
//!
//! A rendered prompt is the agent's prompt document followed by one
//! section per input artifact:
//!
//! ```text
//! <prompt document>
//!
//! ## Input from 1_research.json
//! ```json
//! { ...pretty-printed artifact... }
//! ```
//! ```

use std::path::{Path, PathBuf};

use crate::error::{PipelineError, StoreError};

/// Reads prompt documents from a directory.
#[derive(Debug, Clone)]
pub struct PromptLoader {
    dir: PathBuf,
}

impl PromptLoader {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, source: &str) -> PathBuf {
        self.dir.join(source)
    }

    pub async fn load(&self, source: &str) -> Result<String, PipelineError> {
        let path = self.path_for(source);
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::PromptNotFound(path.display().to_string())
            } else {
                PipelineError::Store(StoreError::Io {
                    reference: path.display().to_string(),
                    detail: e.to_string(),
                })
            }
        })
    }
}

/// Append each `(reference, document)` to `prompt`, tagged with the
/// reference's file name.
pub fn render_prompt(prompt: &str, inputs: &[(String, serde_json::Value)]) -> String {
    let mut rendered = prompt.to_string();
    for (reference, document) in inputs {
        let source = Path::new(reference)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| reference.clone());
        let pretty =
            serde_json::to_string_pretty(document).unwrap_or_else(|_| document.to_string());
        rendered.push_str(&format!("\n\n## Input from {}\n```json\n{}\n```\n", source, pretty));
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_without_inputs_is_unchanged() {
        assert_eq!(render_prompt("Research the topic.", &[]), "Research the topic.");
    }

    #[test]
    fn test_render_tags_inputs_in_order() {
        let rendered = render_prompt(
            "Design it.",
            &[
                ("nested/1_research.json".to_string(), json!({ "a": 1 })),
                ("2_architecture.json".to_string(), json!(["x"])),
            ],
        );
        assert_eq!(
            rendered,
            "Design it.\n\n## Input from 1_research.json\n```json\n{\n  \"a\": 1\n}\n```\n\
             \n\n## Input from 2_architecture.json\n```json\n[\n  \"x\"\n]\n```\n"
        );
    }

    #[tokio::test]
    async fn test_missing_prompt_is_prompt_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = PromptLoader::new(dir.path());
        let err = loader.load("absent.md").await.unwrap_err();
        assert_eq!(err.kind(), "PromptNotFound");

        std::fs::write(dir.path().join("present.md"), "Hello").unwrap();
        assert_eq!(loader.load("present.md").await.unwrap(), "Hello");
    }
}
