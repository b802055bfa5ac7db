pub mod obj;
pub mod stl;

use std::path::Path;

use crate::error::{ConvertError, Result};

/// Supported interchange formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshFormat {
    #[value(name = "stl")]
    Stl,
    #[value(name = "obj")]
    Obj,
}

impl MeshFormat {
    /// Parse a format tag such as `stl`, `OBJ` or `.stl` (case-insensitive).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        let tag = tag.strip_prefix('.').unwrap_or(tag);
        if tag.eq_ignore_ascii_case("stl") {
            Some(MeshFormat::Stl)
        } else if tag.eq_ignore_ascii_case("obj") {
            Some(MeshFormat::Obj)
        } else {
            None
        }
    }

    /// Detect format from file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        Self::from_tag(ext).ok_or_else(|| {
            ConvertError::Input(format!("Unsupported file format: .{}", ext.to_lowercase()))
        })
    }

    /// Canonical filename extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            MeshFormat::Stl => "stl",
            MeshFormat::Obj => "obj",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MeshFormat::Stl => "STL",
            MeshFormat::Obj => "OBJ",
        }
    }
}

impl std::fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// STL byte layout.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StlEncoding {
    #[default]
    #[value(name = "binary")]
    Binary,
    #[value(name = "ascii")]
    Ascii,
}

impl std::fmt::Display for StlEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StlEncoding::Binary => write!(f, "binary"),
            StlEncoding::Ascii => write!(f, "ascii"),
        }
    }
}

/// MIME type for binary STL payloads.
pub const CONTENT_TYPE_STL: &str = "model/stl";
/// MIME type for text payloads (OBJ, ASCII STL).
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// Content type of an encoded payload in `format`.
pub fn content_type(format: MeshFormat, bytes: &[u8]) -> &'static str {
    match format {
        MeshFormat::Stl => match stl::detect_encoding(bytes) {
            StlEncoding::Binary => CONTENT_TYPE_STL,
            StlEncoding::Ascii => CONTENT_TYPE_TEXT,
        },
        MeshFormat::Obj => CONTENT_TYPE_TEXT,
    }
}
