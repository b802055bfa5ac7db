use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{CliConfig, ConvertOptions};
use crate::error::{ConvertError, Result};
use crate::formats::{self, MeshFormat, StlEncoding, obj, stl};
use crate::transform::{self, NormalizeResult, coordinates::compute_bounding_box};
use crate::types::{BoundingBox, Mesh};

/// Geometry summary of a decoded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeshStats {
    pub vertices: usize,
    pub triangles: usize,
    /// Bounds as decoded, before any translation.
    pub bounds: Option<BoundingBox>,
    /// Translation applied by normalization (zero when disabled).
    pub offset: [f64; 3],
}

/// Encoded result of a single conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub bytes: Vec<u8>,
    pub format: MeshFormat,
    pub content_type: &'static str,
    /// Input returned unchanged because source and target matched.
    pub passthrough: bool,
    /// `None` for passthrough, where nothing is decoded.
    pub stats: Option<MeshStats>,
}

impl ConversionOutput {
    /// Canonical filename extension of the output.
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    /// Whether the decoded mesh had no triangles.
    pub fn is_empty(&self) -> bool {
        self.stats.is_some_and(|s| s.triangles == 0)
    }

    /// `<stem>.<ext>` for the output.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.extension())
    }
}

/// Per-file record of a CLI run.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub source: MeshFormat,
    pub target: MeshFormat,
    pub passthrough: bool,
    pub bytes_in: usize,
    pub bytes_out: usize,
    pub content_type: &'static str,
    pub stats: Option<MeshStats>,
}

/// Summary of a completed CLI run.
#[derive(Debug)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
    pub duration: Duration,
}

/// Decode `bytes` with the codec for `format`.
pub fn decode(bytes: &[u8], format: MeshFormat) -> Result<Mesh> {
    match format {
        MeshFormat::Stl => stl::decode(bytes),
        MeshFormat::Obj => obj::decode(bytes),
    }
}

/// Encode `mesh` with the codec for `format`.
pub fn encode(mesh: &Mesh, format: MeshFormat, stl_encoding: StlEncoding) -> Result<Vec<u8>> {
    match format {
        MeshFormat::Stl => stl::encode(mesh, stl_encoding),
        MeshFormat::Obj => obj::encode(mesh),
    }
}

/// Conversion orchestrator -- decode, normalize, encode.
pub struct Pipeline;

impl Pipeline {
    /// Convert an in-memory model from `source` to `target`.
    ///
    /// Matching formats return the input bytes untouched.
    pub fn convert(
        bytes: &[u8],
        source: MeshFormat,
        target: MeshFormat,
        options: &ConvertOptions,
    ) -> Result<ConversionOutput> {
        if source == target {
            debug!(format = %source, bytes = bytes.len(), "Same format, passing input through");
            return Ok(ConversionOutput {
                bytes: bytes.to_vec(),
                format: target,
                content_type: formats::content_type(target, bytes),
                passthrough: true,
                stats: None,
            });
        }

        let start = Instant::now();
        let mut mesh = decode(bytes, source)?;

        if mesh.is_empty() {
            if options.reject_empty {
                return Err(ConvertError::EmptyResult(format!(
                    "{source} input contains no triangles"
                )));
            }
            warn!(format = %source, "Input contains no triangles");
        }

        let NormalizeResult { bounds, offset } = if options.normalize {
            transform::normalize(&mut mesh)
        } else {
            NormalizeResult {
                bounds: compute_bounding_box(&mesh),
                offset: [0.0; 3],
            }
        };

        let encoded = encode(&mesh, target, options.stl_encoding)?;
        let content_type = formats::content_type(target, &encoded);

        info!(
            from = %source,
            to = %target,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            bytes_in = bytes.len(),
            bytes_out = encoded.len(),
            elapsed = ?start.elapsed(),
            "Converted mesh"
        );

        Ok(ConversionOutput {
            bytes: encoded,
            format: target,
            content_type,
            passthrough: false,
            stats: Some(MeshStats {
                vertices: mesh.vertex_count(),
                triangles: mesh.triangle_count(),
                bounds,
                offset,
            }),
        })
    }

    /// Like [`Pipeline::convert`] but with textual format tags (`"stl"`, `".OBJ"`).
    ///
    /// Any tag outside STL / OBJ is an unsupported conversion.
    pub fn convert_tags(
        bytes: &[u8],
        source: &str,
        target: &str,
        options: &ConvertOptions,
    ) -> Result<ConversionOutput> {
        match (MeshFormat::from_tag(source), MeshFormat::from_tag(target)) {
            (Some(s), Some(t)) => Self::convert(bytes, s, t, options),
            _ => Err(ConvertError::UnsupportedConversion {
                from: source.to_string(),
                to: target.to_string(),
            }),
        }
    }

    /// Convert every input file of a CLI run, in parallel.
    pub fn run(config: &CliConfig) -> Result<RunSummary> {
        let start = Instant::now();

        if config.inputs.is_empty() {
            return Err(ConvertError::Input("No input files given".into()));
        }

        info!(
            files = config.inputs.len(),
            target = %config.target,
            "Starting conversion"
        );

        let plan = plan_outputs(config)?;

        if let Some(dir) = &config.output_dir {
            fs::create_dir_all(dir).map_err(|e| {
                ConvertError::Output(format!(
                    "Failed to create output directory {}: {e}",
                    dir.display()
                ))
            })?;
        }

        let files = plan
            .par_iter()
            .map(|(input, output)| convert_file(input, output, config))
            .collect::<Result<Vec<_>>>()?;

        let duration = start.elapsed();
        info!(files = files.len(), elapsed = ?duration, "Conversion complete");

        Ok(RunSummary { files, duration })
    }
}

/// Pair every input with its output path, refusing plans where one file
/// would overwrite another input or output.
fn plan_outputs(config: &CliConfig) -> Result<Vec<(PathBuf, PathBuf)>> {
    let inputs: HashSet<&Path> = config.inputs.iter().map(PathBuf::as_path).collect();
    let mut seen = HashSet::new();
    let mut plan = Vec::with_capacity(config.inputs.len());

    for input in &config.inputs {
        let output = output_path(input, config.output_dir.as_deref(), config.target);
        if inputs.contains(output.as_path()) || !seen.insert(output.clone()) {
            return Err(ConvertError::Input(format!(
                "Output {} would overwrite another file of this run",
                output.display()
            )));
        }
        plan.push((input.clone(), output));
    }

    Ok(plan)
}

/// `<dir>/<stem>.<ext>`, where `dir` defaults to the input's directory.
pub fn output_path(input: &Path, output_dir: Option<&Path>, target: MeshFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh");
    let dir = output_dir
        .or_else(|| input.parent())
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let candidate = dir.join(format!("{stem}.{}", target.extension()));
    if candidate == input {
        let renamed = dir.join(format!("{stem}-converted.{}", target.extension()));
        warn!(
            input = %input.display(),
            output = %renamed.display(),
            "Output would overwrite input, renaming"
        );
        renamed
    } else {
        candidate
    }
}

fn convert_file(input: &Path, output: &Path, config: &CliConfig) -> Result<FileReport> {
    if !input.exists() {
        return Err(ConvertError::Input(format!(
            "Input file not found: {}",
            input.display()
        )));
    }

    let source = MeshFormat::from_path(input)?;
    info!(format = %source, path = %input.display(), "Reading input");

    let bytes = fs::read(input).map_err(|e| {
        ConvertError::Input(format!("Failed to read {}: {e}", input.display()))
    })?;

    let converted = Pipeline::convert(&bytes, source, config.target, &config.options)
        .map_err(|e| match e {
            ConvertError::MalformedInput(msg) => {
                ConvertError::MalformedInput(format!("{}: {msg}", input.display()))
            }
            ConvertError::EmptyResult(msg) => {
                ConvertError::EmptyResult(format!("{}: {msg}", input.display()))
            }
            other => other,
        })?;

    fs::write(output, &converted.bytes).map_err(|e| {
        ConvertError::Output(format!("Failed to write {}: {e}", output.display()))
    })?;
    info!(path = %output.display(), bytes = converted.bytes.len(), "Wrote output");

    Ok(FileReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        source,
        target: converted.format,
        passthrough: converted.passthrough,
        bytes_in: bytes.len(),
        bytes_out: converted.bytes.len(),
        content_type: converted.content_type,
        stats: converted.stats,
    })
}
