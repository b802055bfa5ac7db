use std::io::Write;
use std::str::SplitWhitespace;

use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::types::{Mesh, Triangle, Vertex};

fn malformed(message: String) -> ConvertError {
    ConvertError::MalformedInput(message)
}

/// Decode Wavefront OBJ text into a mesh.
///
/// Only `v`, `f` and the first `o` are honoured; every other directive is
/// skipped. Polygons are fan-triangulated from their first corner, which is
/// only correct for convex faces.
pub fn decode(bytes: &[u8]) -> Result<Mesh> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| malformed(format!("OBJ is not valid UTF-8: {e}")))?;

    let mut mesh = Mesh::new();
    let mut face: Vec<u32> = Vec::with_capacity(8);
    let mut polygons = 0usize;

    for (i, raw_line) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw_line.split('#').next().unwrap_or_default();
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let vertex = parse_vertex(&mut tokens, line_no)?;
                mesh.push_vertex(vertex);
            }
            Some("f") => {
                face.clear();
                for token in tokens {
                    face.push(resolve_index(token, mesh.vertex_count(), line_no)?);
                }
                if face.len() < 3 {
                    return Err(malformed(format!(
                        "OBJ line {line_no}: face needs at least 3 vertices, got {}",
                        face.len()
                    )));
                }
                if face.len() > 3 {
                    polygons += 1;
                }
                for k in 1..face.len() - 1 {
                    mesh.push_triangle(Triangle::new(face[0], face[k], face[k + 1]));
                }
            }
            Some("o") if mesh.name().is_none() => {
                let name = line.trim_start()[1..].trim();
                if !name.is_empty() {
                    mesh.set_name(name);
                }
            }
            _ => {}
        }
    }

    debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        polygons,
        "Decoded OBJ"
    );
    Ok(mesh)
}

fn parse_vertex(tokens: &mut SplitWhitespace<'_>, line_no: usize) -> Result<Vertex> {
    let mut coords = [0.0; 3];
    for slot in &mut coords {
        let token = tokens.next().ok_or_else(|| {
            malformed(format!("OBJ line {line_no}: vertex needs 3 coordinates"))
        })?;
        let value = token.parse::<f64>().map_err(|_| {
            malformed(format!("OBJ line {line_no}: invalid coordinate `{token}`"))
        })?;
        if !value.is_finite() {
            return Err(malformed(format!(
                "OBJ line {line_no}: non-finite coordinate `{token}`"
            )));
        }
        *slot = value;
    }
    // Trailing w / colour components are ignored
    Ok(Vertex::from(coords))
}

/// Resolve the vertex part of `idx`, `idx/tex`, `idx//norm` or `idx/tex/norm`
/// against the `count` vertices defined so far.
fn resolve_index(token: &str, count: usize, line_no: usize) -> Result<u32> {
    let raw = token.split('/').next().unwrap_or_default();
    let idx: i64 = raw.parse().map_err(|_| {
        malformed(format!("OBJ line {line_no}: invalid face index `{token}`"))
    })?;

    let resolved = match idx {
        0 => {
            return Err(malformed(format!(
                "OBJ line {line_no}: face index 0 is not valid"
            )));
        }
        i if i > 0 => i - 1,
        i => count as i64 + i,
    };

    if resolved < 0 || resolved >= count as i64 {
        return Err(malformed(format!(
            "OBJ line {line_no}: face index {idx} out of range ({count} vertices defined)"
        )));
    }
    Ok(resolved as u32)
}

/// Encode a mesh as OBJ text: every vertex in order, then one `f` per triangle.
///
/// Vertices are written exactly as stored, without deduplication.
pub fn encode(mesh: &Mesh) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(32 + mesh.vertex_count() * 40 + mesh.triangle_count() * 24);

    writeln!(out, "# mesh-convert")?;
    if let Some(name) = mesh.name() {
        writeln!(out, "o {name}")?;
    }
    for v in mesh.vertices() {
        writeln!(out, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for tri in mesh.triangles() {
        let [a, b, c] = tri.indices.map(|i| u64::from(i) + 1);
        writeln!(out, "f {a} {b} {c}")?;
    }

    debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        bytes = out.len(),
        "Encoded OBJ"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    #[test]
    fn quad_fan_triangulation() {
        let mesh = decode(QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.triangle(0).unwrap().indices, [0, 1, 2]);
        assert_eq!(mesh.triangle(1).unwrap().indices, [0, 2, 3]);
    }

    #[test]
    fn hexagon_gives_four_triangles() {
        let mut text = String::new();
        for k in 0..6 {
            let a = k as f64 * std::f64::consts::FRAC_PI_3;
            text.push_str(&format!("v {} {} 0\n", a.cos(), a.sin()));
        }
        text.push_str("f 1 2 3 4 5 6\n");
        let mesh = decode(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 4);
        assert!(mesh.triangles().iter().all(|t| t.indices[0] == 0));
    }

    #[test]
    fn negative_indices_match_positive() {
        let positive = decode(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let negative = decode(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
        assert_eq!(positive.triangles(), negative.triangles());
    }

    #[test]
    fn negative_index_is_relative_to_current_table() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\nv 5 5 5\nf -4 -1 -2\n";
        let mesh = decode(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangle(1).unwrap().indices, [0, 3, 2]);
    }

    #[test]
    fn slash_forms_use_vertex_index_only() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vn 0 0 1
f 1/1 2//1 3/1/1
";
        let mesh = decode(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangle(0).unwrap().indices, [0, 1, 2]);
    }

    #[test]
    fn unknown_directives_ignored() {
        let text = "\
# exported model
mtllib scene.mtl
o widget
g group
usemtl steel
s off
v 0 0 0 1.0
v 1 0 0
v 0 1 0 # trailing comment
f 1 2 3
";
        let mesh = decode(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.name(), Some("widget"));
    }

    #[test]
    fn out_of_range_index_is_malformed() {
        let err = decode(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
        assert!(err.to_string().contains("line 4"));

        // Forward references are out of range at the point of use
        assert!(decode(b"f 1 2 3\nv 0 0 0\nv 1 0 0\nv 0 1 0\n").is_err());
        assert!(decode(b"v 0 0 0\nv 1 0 0\nf -1 -2 -3\n").is_err());
    }

    #[test]
    fn zero_index_is_malformed() {
        let err = decode(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n").unwrap_err();
        assert!(err.to_string().contains("index 0"));
    }

    #[test]
    fn degenerate_face_is_malformed() {
        assert!(decode(b"v 0 0 0\nv 1 0 0\nf 1 2\n").is_err());
    }

    #[test]
    fn bad_vertex_is_malformed() {
        assert!(decode(b"v 0 zero 0\n").is_err());
        assert!(decode(b"v 0 0\n").is_err());
        assert!(decode(b"v 0 inf 0\n").is_err());
        assert!(decode(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 x\n").is_err());
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        assert!(matches!(
            decode(&[b'v', b' ', 0xff, 0xfe]).unwrap_err(),
            ConvertError::MalformedInput(_)
        ));
    }

    #[test]
    fn crlf_line_endings() {
        let mesh = decode(QUAD.replace('\n', "\r\n").as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn encode_layout() {
        let mut mesh = Mesh::from_parts(
            vec![
                Vertex::new(0.0, 0.0, 0.0),
                Vertex::new(1.5, 0.0, 0.0),
                Vertex::new(0.0, -2.25, 0.0),
            ],
            vec![Triangle::new(0, 1, 2)],
        )
        .unwrap();
        mesh.set_name("part");

        let text = String::from_utf8(encode(&mesh).unwrap()).unwrap();
        assert_eq!(
            text,
            "# mesh-convert\no part\nv 0 0 0\nv 1.5 0 0\nv 0 -2.25 0\nf 1 2 3\n"
        );
    }

    #[test]
    fn encode_decode_preserves_mesh() {
        let mesh = decode(QUAD.as_bytes()).unwrap();
        let again = decode(&encode(&mesh).unwrap()).unwrap();
        assert_eq!(again.vertices(), mesh.vertices());
        assert_eq!(again.triangles(), mesh.triangles());
    }
}
