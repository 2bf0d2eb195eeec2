//! The per-file text transform: language detection, the [`TextTransform`]
//! trait, and output cleanup shared by implementations.

mod ollama;

pub use ollama::OllamaTransform;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Languages the transform knows how to work on.
///
/// Detection is by file extension. Header files are deliberately absent:
/// rewriting a `.h` without its translation units breaks builds too easily,
/// so they are skipped like any other unsupported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    CSharp,
    JavaScript,
    Java,
    Python,
    C,
    Cpp,
}

impl Language {
    /// Detects the language from a file path, or `None` for unsupported
    /// files. Extensions match case-insensitively (`PROG.CS` is C#).
    pub fn from_path(path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "cs" => Some(Language::CSharp),
            "js" => Some(Language::JavaScript),
            "java" => Some(Language::Java),
            "py" => Some(Language::Python),
            "c" => Some(Language::C),
            "cpp" | "cc" | "cxx" => Some(Language::Cpp),
            _ => None,
        }
    }

    /// The name used in prompts and log lines.
    pub fn tag(&self) -> &'static str {
        match self {
            Language::CSharp => "csharp",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::Python => "python",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }
}

/// Errors from a transform attempt. Each failure covers one file only.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The transform backend could not be invoked.
    #[error("failed to invoke transform backend: {0}")]
    Spawn(std::io::Error),

    /// The backend ran but exited unsuccessfully.
    #[error("transform backend failed: {stderr}")]
    Backend { stderr: String },

    /// The backend returned output unusable as file content.
    #[error("transform produced empty output")]
    EmptyOutput,

    /// IO while feeding or reading the backend.
    #[error("IO error talking to transform backend: {0}")]
    Io(#[from] std::io::Error),
}

/// A source-to-source transform over one file's contents.
#[async_trait]
pub trait TextTransform: Send + Sync {
    /// Rewrites `content` (one file in `language`) and returns the new file
    /// body. Implementations must return content ready to write to disk.
    async fn transform(
        &self,
        language: Language,
        content: &str,
    ) -> Result<String, TransformError>;
}

/// Strips a surrounding Markdown code fence, if present.
///
/// Models routinely wrap output in ```` ```lang ... ``` ```` despite being
/// told not to. The fence lines are dropped; anything inside is kept
/// verbatim. Output without a leading fence passes through untouched.
pub(crate) fn strip_code_fence(output: &str) -> String {
    let trimmed = output.trim();
    if !trimmed.starts_with("```") {
        return output.to_string();
    }

    let mut lines = trimmed.lines();
    lines.next(); // opening fence, possibly with a language tag

    let mut body: Vec<&str> = lines.collect();
    if let Some(last) = body.last()
        && last.trim() == "```"
    {
        body.pop();
    }

    let mut result = body.join("\n");
    result.push('\n');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_supported_languages() {
        let cases = [
            ("src/Program.cs", Language::CSharp),
            ("app.js", Language::JavaScript),
            ("Main.java", Language::Java),
            ("tool.py", Language::Python),
            ("core.c", Language::C),
            ("engine.cpp", Language::Cpp),
            ("engine.cc", Language::Cpp),
            ("PROG.CS", Language::CSharp),
            ("tool.PY", Language::Python),
        ];
        for (path, expected) in cases {
            assert_eq!(
                Language::from_path(&PathBuf::from(path)),
                Some(expected),
                "for {path}"
            );
        }
    }

    #[test]
    fn header_files_are_unsupported() {
        assert_eq!(Language::from_path(&PathBuf::from("core.h")), None);
        assert_eq!(Language::from_path(&PathBuf::from("core.H")), None);
    }

    #[test]
    fn non_code_files_are_unsupported() {
        assert_eq!(Language::from_path(&PathBuf::from("README.md")), None);
        assert_eq!(Language::from_path(&PathBuf::from("Makefile")), None);
        assert_eq!(Language::from_path(&PathBuf::from(".gitignore")), None);
    }

    #[test]
    fn strips_fence_with_language_tag() {
        let output = "```python\nprint('hi')\n```";
        assert_eq!(strip_code_fence(output), "print('hi')\n");
    }

    #[test]
    fn strips_bare_fence() {
        let output = "```\nint main() {}\n```\n";
        assert_eq!(strip_code_fence(output), "int main() {}\n");
    }

    #[test]
    fn unfenced_output_passes_through() {
        let output = "def f():\n    return 1\n";
        assert_eq!(strip_code_fence(output), output);
    }

    #[test]
    fn fence_inside_content_is_preserved() {
        let output = "```python\ns = \"```\"\n```";
        assert_eq!(strip_code_fence(output), "s = \"```\"\n");
    }
}
