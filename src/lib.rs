pub mod config;
pub mod error;
pub mod formats;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;
pub mod transform;
pub mod types;

pub use config::{CliConfig, ConvertOptions};
pub use error::{ConvertError, ErrorKind};
pub use formats::{MeshFormat, StlEncoding};
pub use pipeline::{ConversionOutput, Pipeline};
pub use types::{BoundingBox, Mesh, Triangle, Vertex};
