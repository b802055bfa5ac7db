use std::path::PathBuf;

use clap::Parser;

use crate::formats::{MeshFormat, StlEncoding};

/// Engine options shared by every driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Layout used when the target is STL.
    pub stl_encoding: StlEncoding,
    /// Re-center the decoded mesh on the origin before encoding.
    pub normalize: bool,
    /// Treat a decode that yields no triangles as an error instead of a warning.
    pub reject_empty: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            stl_encoding: StlEncoding::Binary,
            normalize: true,
            reject_empty: false,
        }
    }
}

/// Fully resolved CLI configuration (constructed from CLI args).
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub inputs: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub target: MeshFormat,
    pub options: ConvertOptions,
    pub report: bool,
    pub verbose: bool,
    pub threads: Option<usize>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output_dir: None,
            target: MeshFormat::Obj,
            options: ConvertOptions::default(),
            report: false,
            verbose: false,
            threads: None,
        }
    }
}

/// CLI argument definition (clap derive).
#[derive(Parser, Debug)]
#[command(
    name = "mesh-convert",
    about = "Convert triangle meshes between STL and OBJ",
    version
)]
pub struct CliArgs {
    /// Input file (STL or OBJ); repeat for several files
    #[arg(short = 'i', long, required = true)]
    pub input: Vec<PathBuf>,

    /// Target format
    #[arg(short = 't', long, value_enum)]
    pub to: MeshFormat,

    /// Output directory (default: next to each input)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// STL layout when writing STL
    #[arg(long, value_enum, default_value = "binary")]
    pub stl_encoding: StlEncoding,

    /// Keep original coordinates instead of centering on the origin
    #[arg(long)]
    pub no_normalize: bool,

    /// Fail when an input contains no triangles
    #[arg(long)]
    pub reject_empty: bool,

    /// Print a JSON report of every conversion to stdout
    #[arg(long)]
    pub report: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Worker thread count (default: all cores)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
}

impl From<CliArgs> for CliConfig {
    fn from(args: CliArgs) -> Self {
        CliConfig {
            inputs: args.input,
            output_dir: args.output,
            target: args.to,
            options: ConvertOptions {
                stl_encoding: args.stl_encoding,
                normalize: !args.no_normalize,
                reject_empty: args.reject_empty,
            },
            report: args.report,
            verbose: args.verbose,
            threads: args.threads,
        }
    }
}
