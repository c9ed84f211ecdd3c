use std::path::PathBuf;

use sheetcut_geometry::GeometryError;

use crate::config::FileFormat;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error for {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid color {value:?}: expected #rrggbb")]
    InvalidColor { value: String },
    #[error("unknown {what} {value:?}")]
    UnknownName { what: &'static str, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("diagram I/O error for {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid YAML diagram: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON diagram: {0}")]
    Json(#[from] serde_json::Error),
    #[error("part {part:?} projects unknown loop {name:?}")]
    UnknownLoop { part: String, name: String },
    #[error("loop {name:?}: {source}")]
    Geometry {
        name: String,
        #[source]
        source: GeometryError,
    },
}

/// Fatal failure while writing an export. Partially written files are left in place.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to {action} {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A reason the export refused to start. Reported before any file system access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("there is no cutting diagram to export")]
    MissingDiagram,
    #[error("the cutting diagram is obsolete and must be recomputed")]
    ObsoleteDiagram,
    #[error("the cutting diagram does not reference a material group")]
    MissingGroup,
    #[error("file format {0} is not supported for 2D export")]
    UnsupportedFormat(FileFormat),
}
