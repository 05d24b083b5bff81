use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GomakerError {
    #[error("cannot read project directory {path}: {source}")]
    Directory { path: PathBuf, source: io::Error },

    #[error("not a Go project directory: no Go source files in {0}")]
    NoGoFiles(PathBuf),

    #[error("cannot read Go source {path}: {source}")]
    SourceRead { path: PathBuf, source: io::Error },

    #[error("{0} has no package clause")]
    MissingPackageClause(PathBuf),

    #[error("not a main project: {path} declares package {package}")]
    NotMainPackage { path: PathBuf, package: String },

    #[error("malformed substitution {input:?}: {reason}")]
    Substitution { input: String, reason: &'static str },

    #[error("cannot read config {path}: {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("invalid config {path}: {source}")]
    ConfigParse { path: PathBuf, source: toml::de::Error },

    #[error("refusing to overwrite existing {0}")]
    Clobber(PathBuf),

    #[error("cannot back up {path}: {source}")]
    Backup { path: PathBuf, source: io::Error },

    /// Rendering errors are flattened to text so they can cross the producer thread.
    #[error("template error: {0}")]
    Template(String),

    #[error("output error: {0}")]
    Io(#[from] io::Error),

    #[error("line producer stopped before end of output")]
    Truncated,

    #[error("line writer hung up before end of output")]
    WriterGone,

    #[error("line producer panicked")]
    ProducerPanicked,
}
