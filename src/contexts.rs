use serde::Serialize;

/// Values substituted into the Makefile template.
///
/// Owned so the context can move into the line producer thread.
#[derive(Debug, Clone, Serialize)]
pub struct MakefileContext {
    pub project_name: String,
    pub tool_version: String,
    pub date: String,
    pub version: String,
    pub variables: Vec<String>,
    pub build_command: String,
}
