//! STL reader and writer.
//!
//! Binary layout:
//!
//! ```text
//! UINT8[80]    header (ignored on read)
//! UINT32       triangle count N (little endian)
//! N x {
//!     REAL32[3]  normal
//!     REAL32[3]  vertex 1
//!     REAL32[3]  vertex 2
//!     REAL32[3]  vertex 3
//!     UINT16     attribute byte count (ignored, written as 0)
//! }
//! ```
//!
//! ASCII layout:
//!
//! ```text
//! solid name
//!   facet normal nx ny nz
//!     outer loop
//!       vertex x y z
//!       vertex x y z
//!       vertex x y z
//!     endloop
//!   endfacet
//! endsolid name
//! ```

use std::io::Write;
use std::str::SplitWhitespace;

use tracing::debug;

use super::StlEncoding;
use crate::error::{ConvertError, Result};
use crate::types::{Mesh, Triangle, Vertex};

const HEADER_SIZE: usize = 80;
const PREAMBLE_SIZE: usize = HEADER_SIZE + 4;
const RECORD_SIZE: usize = 50;

/// Written at the start of every binary header. Must never begin with `solid`.
const HEADER_TEXT: &[u8] = b"binary STL written by mesh-convert";

/// Decide between ASCII and binary parsing for `bytes`.
///
/// A buffer is ASCII only if it starts with `solid` and its length does not
/// match the binary size implied by the count at offset 80.
pub fn detect_encoding(bytes: &[u8]) -> StlEncoding {
    if bytes.starts_with(b"solid") && !binary_length_matches(bytes) {
        StlEncoding::Ascii
    } else {
        StlEncoding::Binary
    }
}

/// Exact byte length of a binary STL holding `triangles` records.
pub fn binary_size(triangles: u32) -> u64 {
    PREAMBLE_SIZE as u64 + RECORD_SIZE as u64 * u64::from(triangles)
}

fn declared_count(bytes: &[u8]) -> Option<u32> {
    let raw: [u8; 4] = bytes.get(HEADER_SIZE..PREAMBLE_SIZE)?.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

fn binary_length_matches(bytes: &[u8]) -> bool {
    declared_count(bytes).is_some_and(|n| binary_size(n) == bytes.len() as u64)
}

fn malformed(message: String) -> ConvertError {
    ConvertError::MalformedInput(message)
}

/// Decode an STL buffer, auto-detecting ASCII vs binary.
pub fn decode(bytes: &[u8]) -> Result<Mesh> {
    let encoding = detect_encoding(bytes);
    debug!(%encoding, bytes = bytes.len(), "Decoding STL");

    let mesh = match encoding {
        StlEncoding::Binary => decode_binary(bytes)?,
        StlEncoding::Ascii => decode_ascii(bytes)?,
    };

    debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "Decoded STL"
    );
    Ok(mesh)
}

fn decode_binary(bytes: &[u8]) -> Result<Mesh> {
    let count = declared_count(bytes).ok_or_else(|| {
        malformed(format!(
            "binary STL needs at least {PREAMBLE_SIZE} bytes, got {}",
            bytes.len()
        ))
    })?;

    let expected = binary_size(count);
    if expected != bytes.len() as u64 {
        return Err(malformed(format!(
            "binary STL declares {count} triangles ({expected} bytes) but holds {} bytes",
            bytes.len()
        )));
    }

    let count = count as usize;
    let mut mesh = Mesh::with_capacity(count * 3, count);

    for (i, record) in bytes[PREAMBLE_SIZE..].chunks_exact(RECORD_SIZE).enumerate() {
        let normal = read_f32x3(&record[0..12]);
        let mut corners = [0u32; 3];
        for (k, slot) in corners.iter_mut().enumerate() {
            let start = 12 + k * 12;
            let vertex = Vertex::from(read_f32x3(&record[start..start + 12]));
            if !vertex.is_finite() {
                return Err(malformed(format!(
                    "binary STL triangle {i} has a non-finite vertex"
                )));
            }
            *slot = mesh.push_vertex(vertex);
        }
        mesh.push_triangle(Triangle::with_normal(corners, normal));
    }

    Ok(mesh)
}

/// Read three little-endian f32s, widened to f64.
fn read_f32x3(buf: &[u8]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (slot, chunk) in out.iter_mut().zip(buf.chunks_exact(4)) {
        *slot = f64::from(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    out
}

/// Position inside the ASCII grammar: what the next line must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Solid,
    Facet,
    OuterLoop,
    Vertex(usize),
    EndLoop,
    EndFacet,
    Done,
}

impl Expect {
    fn describe(self) -> &'static str {
        match self {
            Expect::Solid => "`solid`",
            Expect::Facet => "`facet` or `endsolid`",
            Expect::OuterLoop => "`outer loop`",
            Expect::Vertex(_) => "`vertex`",
            Expect::EndLoop => "`endloop`",
            Expect::EndFacet => "`endfacet`",
            Expect::Done => "`solid` or end of input",
        }
    }
}

fn decode_ascii(bytes: &[u8]) -> Result<Mesh> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| malformed(format!("ASCII STL is not valid UTF-8: {e}")))?;

    let mut mesh = Mesh::new();
    let mut expect = Expect::Solid;
    let mut normal = [0.0; 3];
    let mut corners = [0u32; 3];

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };
        let keyword = first.to_ascii_lowercase();

        expect = match (expect, keyword.as_str()) {
            (Expect::Solid | Expect::Done, "solid") => {
                // Concatenated solids merge into one mesh; the first name wins
                if mesh.name().is_none() {
                    let name = line.trim_start()[first.len()..].trim();
                    if !name.is_empty() {
                        mesh.set_name(name);
                    }
                }
                Expect::Facet
            }
            (Expect::Facet, "facet") => {
                expect_keyword(&mut tokens, "normal", line_no)?;
                normal = parse_triple(&mut tokens, line_no)?;
                Expect::OuterLoop
            }
            (Expect::Facet, "endsolid") => Expect::Done,
            (Expect::OuterLoop, "outer") => {
                expect_keyword(&mut tokens, "loop", line_no)?;
                expect_end(&mut tokens, line_no)?;
                Expect::Vertex(0)
            }
            (Expect::Vertex(k), "vertex") => {
                let vertex = Vertex::from(parse_triple(&mut tokens, line_no)?);
                if !vertex.is_finite() {
                    return Err(malformed(format!(
                        "ASCII STL line {line_no}: non-finite vertex"
                    )));
                }
                corners[k] = mesh.push_vertex(vertex);
                if k == 2 {
                    Expect::EndLoop
                } else {
                    Expect::Vertex(k + 1)
                }
            }
            (Expect::EndLoop, "endloop") => {
                expect_end(&mut tokens, line_no)?;
                Expect::EndFacet
            }
            (Expect::EndFacet, "endfacet") => {
                expect_end(&mut tokens, line_no)?;
                mesh.push_triangle(Triangle::with_normal(corners, normal));
                Expect::Facet
            }
            (expect, _) => {
                return Err(malformed(format!(
                    "ASCII STL line {line_no}: expected {}, found `{first}`",
                    expect.describe()
                )));
            }
        };
    }

    if expect != Expect::Done {
        return Err(malformed(format!(
            "ASCII STL ended while expecting {}",
            expect.describe()
        )));
    }

    Ok(mesh)
}

fn expect_keyword(tokens: &mut SplitWhitespace<'_>, keyword: &str, line_no: usize) -> Result<()> {
    match tokens.next() {
        Some(t) if t.eq_ignore_ascii_case(keyword) => Ok(()),
        Some(t) => Err(malformed(format!(
            "ASCII STL line {line_no}: expected `{keyword}`, found `{t}`"
        ))),
        None => Err(malformed(format!(
            "ASCII STL line {line_no}: missing `{keyword}`"
        ))),
    }
}

fn expect_end(tokens: &mut SplitWhitespace<'_>, line_no: usize) -> Result<()> {
    match tokens.next() {
        None => Ok(()),
        Some(t) => Err(malformed(format!(
            "ASCII STL line {line_no}: unexpected trailing token `{t}`"
        ))),
    }
}

fn parse_triple(tokens: &mut SplitWhitespace<'_>, line_no: usize) -> Result<[f64; 3]> {
    let mut out = [0.0; 3];
    for slot in &mut out {
        let token = tokens.next().ok_or_else(|| {
            malformed(format!("ASCII STL line {line_no}: expected 3 numbers"))
        })?;
        *slot = token.parse::<f64>().map_err(|_| {
            malformed(format!("ASCII STL line {line_no}: invalid number `{token}`"))
        })?;
    }
    expect_end(tokens, line_no)?;
    Ok(out)
}

/// Encode `mesh` as STL in the requested layout.
pub fn encode(mesh: &Mesh, encoding: StlEncoding) -> Result<Vec<u8>> {
    debug!(%encoding, triangles = mesh.triangle_count(), "Encoding STL");
    match encoding {
        StlEncoding::Binary => encode_binary(mesh),
        StlEncoding::Ascii => encode_ascii(mesh),
    }
}

fn encode_binary(mesh: &Mesh) -> Result<Vec<u8>> {
    let count = u32::try_from(mesh.triangle_count()).map_err(|_| {
        ConvertError::Output(format!(
            "{} triangles exceed the binary STL limit",
            mesh.triangle_count()
        ))
    })?;

    let mut out = Vec::with_capacity(binary_size(count) as usize);

    let mut header = [0u8; HEADER_SIZE];
    header[..HEADER_TEXT.len()].copy_from_slice(HEADER_TEXT);
    out.extend_from_slice(&header);
    out.extend_from_slice(&count.to_le_bytes());

    for (i, tri) in mesh.triangles().iter().enumerate() {
        write_f32x3(&mut out, mesh.resolved_normal(tri).map(|c| c as f32));
        for corner in mesh.corners(tri) {
            write_f32x3(&mut out, narrow_vertex(corner, i)?);
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }

    Ok(out)
}

/// STL stores single precision. Coordinates that do not fit an f32 would be
/// written as infinities, which no reader accepts back.
fn narrow_vertex(vertex: Vertex, triangle: usize) -> Result<[f32; 3]> {
    let narrowed = vertex.to_array().map(|c| c as f32);
    if narrowed.iter().all(|c| c.is_finite()) {
        Ok(narrowed)
    } else {
        Err(malformed(format!(
            "STL triangle {triangle} has a vertex outside single-precision range: ({}, {}, {})",
            vertex.x, vertex.y, vertex.z
        )))
    }
}

fn write_f32x3(out: &mut Vec<u8>, v: [f32; 3]) {
    for c in v {
        out.extend_from_slice(&c.to_le_bytes());
    }
}

fn encode_ascii(mesh: &Mesh) -> Result<Vec<u8>> {
    let name = mesh.name().unwrap_or("mesh");
    // ~250 bytes per facet
    let mut out = Vec::with_capacity(64 + mesh.triangle_count() * 256);

    writeln!(out, "solid {name}")?;
    for (i, tri) in mesh.triangles().iter().enumerate() {
        let [nx, ny, nz] = mesh.resolved_normal(tri).map(|c| c as f32);
        writeln!(out, "  facet normal {nx:e} {ny:e} {nz:e}")?;
        writeln!(out, "    outer loop")?;
        for corner in mesh.corners(tri) {
            let [x, y, z] = narrow_vertex(corner, i)?;
            writeln!(out, "      vertex {x:e} {y:e} {z:e}")?;
        }
        writeln!(out, "    endloop")?;
        writeln!(out, "  endfacet")?;
    }
    writeln!(out, "endsolid {name}")?;

    Ok(out)
}
