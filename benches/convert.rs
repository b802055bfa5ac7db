use criterion::{Criterion, criterion_group, criterion_main};
use mesh_convert::config::ConvertOptions;
use mesh_convert::formats::{StlEncoding, obj, stl};
use mesh_convert::types::{Mesh, Triangle, Vertex};
use mesh_convert::{MeshFormat, Pipeline};

/// Generate a flat grid mesh with `n x n` quads (2 triangles each).
fn make_grid(n: usize) -> Mesh {
    let verts_per_side = n + 1;
    let mut vertices = Vec::with_capacity(verts_per_side * verts_per_side);

    for y in 0..verts_per_side {
        for x in 0..verts_per_side {
            let fx = x as f64 / n as f64;
            let fy = y as f64 / n as f64;
            vertices.push(Vertex::new(fx, fy, (fx * fy).sin()));
        }
    }

    let mut triangles = Vec::with_capacity(n * n * 2);
    for y in 0..n {
        for x in 0..n {
            let tl = (y * verts_per_side + x) as u32;
            let tr = tl + 1;
            let bl = tl + verts_per_side as u32;
            let br = bl + 1;
            triangles.push(Triangle::new(tl, bl, tr));
            triangles.push(Triangle::new(tr, bl, br));
        }
    }

    Mesh::from_parts(vertices, triangles).expect("grid indices are in range")
}

fn bench_codecs(c: &mut Criterion) {
    // 224x224 grid = 100352 triangles
    let mesh = make_grid(224);
    let binary = stl::encode(&mesh, StlEncoding::Binary).unwrap();
    let ascii = stl::encode(&mesh, StlEncoding::Ascii).unwrap();
    let text = obj::encode(&mesh).unwrap();

    c.bench_function("stl_decode_binary_100k", |b| b.iter(|| stl::decode(&binary)));
    c.bench_function("stl_decode_ascii_100k", |b| b.iter(|| stl::decode(&ascii)));
    c.bench_function("obj_decode_100k", |b| b.iter(|| obj::decode(&text)));
    c.bench_function("stl_encode_binary_100k", |b| {
        b.iter(|| stl::encode(&mesh, StlEncoding::Binary))
    });
    c.bench_function("obj_encode_100k", |b| b.iter(|| obj::encode(&mesh)));
}

fn bench_pipeline(c: &mut Criterion) {
    let mesh = make_grid(224);
    let binary = stl::encode(&mesh, StlEncoding::Binary).unwrap();
    let options = ConvertOptions::default();

    c.bench_function("convert_stl_to_obj_100k", |b| {
        b.iter(|| Pipeline::convert(&binary, MeshFormat::Stl, MeshFormat::Obj, &options))
    });
}

criterion_group!(benches, bench_codecs, bench_pipeline);
criterion_main!(benches);
