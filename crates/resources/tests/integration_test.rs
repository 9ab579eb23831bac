//! Integration tests for mesh data construction.

use glam::Vec3;

use glimmer_resources::ModelData;

#[test]
fn test_cube_mesh_is_complete() {
    let cube = ModelData::cube(Vec3::ZERO);

    // 6 faces, 4 unique vertices each
    assert_eq!(cube.vertices.len(), 24);

    let indices = cube.indices.as_ref().expect("cube should be indexed");
    assert_eq!(indices.len(), 36, "6 faces of 2 triangles");

    // Every index must reference an existing vertex
    for &index in indices {
        assert!((index as usize) < cube.vertices.len());
    }

    // Every vertex must be referenced at least once
    for i in 0..cube.vertices.len() as u32 {
        assert!(
            indices.contains(&i),
            "vertex {} is not used by any triangle",
            i
        );
    }
}

#[test]
fn test_cube_faces_point_outward() {
    let cube = ModelData::cube(Vec3::ZERO);

    // Each vertex normal points away from the cube center along the
    // axis the vertex sits on
    for vertex in &cube.vertices {
        let along_normal = vertex.position.dot(vertex.normal);
        assert!(
            along_normal > 0.0,
            "normal {:?} points inward at {:?}",
            vertex.normal,
            vertex.position
        );
    }
}

#[test]
fn test_cube_offset_translates_every_vertex() {
    let offset = Vec3::new(1.0, -2.0, 2.5);
    let base = ModelData::cube(Vec3::ZERO);
    let moved = ModelData::cube(offset);

    for (a, b) in base.vertices.iter().zip(moved.vertices.iter()) {
        let delta = b.position - a.position;
        assert!((delta - offset).length() < 1e-6);
        // Normals and colors are unaffected by the offset
        assert_eq!(a.normal, b.normal);
        assert_eq!(a.color, b.color);
    }
}
