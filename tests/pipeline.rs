use glam::Vec3;
use smooth_normals::{
    NormalSource, Ops, PolyMesh, Settings, SmoothNormalsError, Weighting, WriteChannel,
    ZeroNormalFallback, oct_quad_encode, smooth_normals, smooth_normals_all,
    smooth_normals_with_settings,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn assert_close<const N: usize>(found: [f32; N], expected: [f32; N]) {
    for (a, b) in found.iter().zip(&expected) {
        assert!((a - b).abs() < 1e-6, "expected {expected:?}; found {found:?}");
    }
}

/// A flat quad whose tangent basis is the identity for every loop, so the
/// tangent-space output equals the smoothed object-space normal.
fn identity_basis_quad(loop_normals: Vec<[f32; 3]>) -> PolyMesh {
    let mut mesh = PolyMesh::new(
        vec![[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [0., 1., 0.]],
        &[&[0, 1, 2, 3]],
    )
    .unwrap();
    mesh.set_vertex_normals(vec![[0., 0., 1.]; 4]);
    mesh.set_loop_normals(loop_normals);
    mesh.set_loop_tangents(vec![[1., 0., 0.]; 4]);
    mesh
}

#[test]
fn single_quad_writes_one_encoding_per_loop() {
    init_tracing();

    let loop_normals = vec![
        [0.6, 0., 0.8],
        [0., 0.6, 0.8],
        [-0.6, 0., 0.8],
        [0., -0.6, -0.8],
    ];
    let mut mesh = identity_basis_quad(loop_normals.clone());

    let summary = smooth_normals(&mut mesh).unwrap();
    assert_eq!(summary.loops(), 4);
    assert_eq!(summary.polygons(), 1);
    assert_eq!(summary.groups(), 4);
    assert_eq!(summary.write_channel(), WriteChannel::Uv2);

    // Every group holds a single loop, so each loop keeps its own normal.
    let uv2 = mesh.uv_channel_by_name("UV2").unwrap();
    assert_eq!(uv2.len(), 4);
    for (found, normal) in uv2.iter().zip(loop_normals) {
        assert_close(*found, oct_quad_encode(normal));
    }
    // The lower hemisphere folds away from the positive quadrant.
    assert_close(uv2[3], [-4. / 7., -1.]);
}

#[test]
fn triangles_sharing_an_edge_agree_on_shared_positions() {
    init_tracing();

    let mut mesh = PolyMesh::new(
        vec![[0., 0., 0.], [1., 0., 0.], [0., 1., 0.], [1., 1., 1.]],
        &[&[0, 1, 2], &[1, 3, 2]],
    )
    .unwrap();
    mesh.calc_normals_split();
    let split = mesh.loop_normals().unwrap().to_vec();
    mesh.set_vertex_normals(vec![[0., 0., 1.]; 4]);
    mesh.set_loop_tangents(vec![[1., 0., 0.]; 6]);

    let settings = Settings::default().with_write_channel(WriteChannel::Tangent);
    let summary = smooth_normals_with_settings(&mut mesh, &settings).unwrap();
    assert_eq!(summary.groups(), 4);

    let smoothed = mesh.loop_tangents().unwrap();
    // Vertex 1 sits on loops 1 and 3, vertex 2 on loops 2 and 5.
    for (a, b) in [(1, 3), (2, 5)] {
        assert_eq!(smoothed[a], smoothed[b]);
        let average = (Vec3::from(split[a]) + Vec3::from(split[b])).normalize();
        assert_close(smoothed[a], average.into());
    }
    // Unshared corners keep their polygon's normal.
    assert_close(smoothed[0], split[0]);
    assert_close(smoothed[4], split[4]);
}

#[test]
fn reruns_are_bit_identical() {
    let mut mesh = PolyMesh::new(
        vec![
            [0., 0., 0.],
            [1., 0., 0.2],
            [1.2, 1., 0.],
            [0., 1., -0.3],
            [0.5, 2., 0.4],
        ],
        &[&[0, 1, 2, 3], &[3, 2, 4]],
    )
    .unwrap();
    mesh.set_polygon_smooth(0, true);
    mesh.calc_normals_split();
    let channel = mesh.add_uv_channel("UVMap");
    mesh.set_uv_channel_data(
        channel,
        &[[0., 0.], [1., 0.], [1., 1.], [0., 1.], [0., 1.], [1., 1.], [0.5, 2.]],
    )
    .unwrap();
    mesh.calc_tangents(channel).unwrap();

    let settings = Settings::default().with_weighting(Weighting::Angle);
    let mut first = mesh.clone();
    smooth_normals_with_settings(&mut first, &settings).unwrap();
    let mut second = mesh.clone();
    smooth_normals_with_settings(&mut second, &settings).unwrap();
    assert_eq!(first, second);

    // Running again reuses the existing channel.
    let channels = first.num_uv_channels();
    smooth_normals_with_settings(&mut first, &settings).unwrap();
    assert_eq!(first.num_uv_channels(), channels);
    assert_eq!(first, second);
}

#[test]
fn writing_uv2_keeps_the_active_channel() {
    let mut mesh = identity_basis_quad(vec![[0., 0., 1.]; 4]);
    let uv_map = mesh.add_uv_channel("UVMap");
    assert_eq!(mesh.active_uv_channel(), Some(uv_map));

    smooth_normals(&mut mesh).unwrap();

    assert_eq!(mesh.active_uv_channel(), Some(uv_map));
    assert_eq!(mesh.num_uv_channels(), 2);
    assert!(mesh.find_uv_channel("UV2").is_some());
}

#[test]
fn custom_channel_name() {
    let mut mesh = identity_basis_quad(vec![[0., 0., 1.]; 4]);
    let settings = Settings::default().with_uv_channel_name("SmoothNormals");
    smooth_normals_with_settings(&mut mesh, &settings).unwrap();

    assert!(mesh.find_uv_channel("UV2").is_none());
    assert_eq!(mesh.uv_channel_by_name("SmoothNormals").unwrap().len(), 4);
}

#[test]
fn canceling_normals_use_the_configured_fallback() {
    init_tracing();

    // Both polygons cover the same triangle with opposite winding.
    let mut mesh = PolyMesh::new(
        vec![[0., 0., 0.], [1., 0., 0.], [0., 1., 0.]],
        &[&[0, 1, 2], &[0, 2, 1]],
    )
    .unwrap();
    mesh.calc_normals_split();
    mesh.set_vertex_normals(vec![[0., 0., 1.]; 3]);
    mesh.set_loop_tangents(vec![[1., 0., 0.]; 6]);

    let settings = Settings::default().with_write_channel(WriteChannel::Tangent);

    let mut zero = mesh.clone();
    let summary = smooth_normals_with_settings(&mut zero, &settings).unwrap();
    assert_eq!(summary.degenerate_groups(), 3);
    assert!(zero.loop_tangents().unwrap().iter().all(|t| *t == [0.; 3]));

    let mut first = mesh.clone();
    let settings = settings.with_zero_fallback(ZeroNormalFallback::FirstMember);
    smooth_normals_with_settings(&mut first, &settings).unwrap();
    for t in first.loop_tangents().unwrap() {
        assert_close(*t, [0., 0., 1.]);
    }
}

#[test]
fn collapsed_edges_are_counted() {
    let mut mesh = PolyMesh::new(
        vec![[0., 0., 0.], [1., 0., 0.], [1., 0., 0.], [0., 1., 0.]],
        &[&[0, 1, 2, 3]],
    )
    .unwrap();
    mesh.calc_normals_split();
    mesh.set_loop_tangents(vec![[1., 0., 0.]; 4]);

    let settings = Settings::default().with_weighting(Weighting::Angle);
    let summary = smooth_normals_with_settings(&mut mesh, &settings).unwrap();
    assert_eq!(summary.degenerate_corners(), 2);
    assert_eq!(summary.groups(), 3);
}

#[test]
fn empty_mesh_writes_nothing() {
    let mut mesh = PolyMesh::new(Vec::new(), &[]).unwrap();
    let summary = smooth_normals(&mut mesh).unwrap();

    assert_eq!(summary.loops(), 0);
    assert_eq!(summary.groups(), 0);
    assert_eq!(mesh.num_uv_channels(), 0);
}

#[test]
fn missing_split_normals_leave_the_mesh_untouched() {
    let mut mesh = PolyMesh::new(
        vec![[0., 0., 0.], [1., 0., 0.], [0., 1., 0.]],
        &[&[0, 1, 2]],
    )
    .unwrap();
    mesh.set_loop_tangents(vec![[1., 0., 0.]; 3]);
    let before = mesh.clone();

    let error = smooth_normals(&mut mesh).unwrap_err();
    assert_eq!(error, SmoothNormalsError::MissingNormal { loop_index: 0 });
    assert_eq!(
        error.to_string(),
        "loop 0 has no split normal, calculate split normals first"
    );
    assert_eq!(mesh, before);
}

#[test]
fn missing_vertex_normals_leave_the_mesh_untouched() {
    let mut mesh = PolyMesh::new(
        vec![[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [0., 1., 0.]],
        &[&[0, 1, 2, 3]],
    )
    .unwrap();
    mesh.set_loop_normals(vec![[0., 0., 1.]; 4]);
    mesh.set_loop_tangents(vec![[1., 0., 0.]; 4]);
    let before = mesh.clone();

    let error = smooth_normals(&mut mesh).unwrap_err();
    assert_eq!(
        error,
        SmoothNormalsError::MissingVertexNormal {
            loop_index: 0,
            vertex: 0
        }
    );
    assert_eq!(
        error.to_string(),
        "loop 0 uses vertex 0 which has no normal, calculate normals first"
    );
    assert_eq!(mesh, before);
}

#[test]
fn tiny_split_normals_still_smooth_to_unit_length() {
    init_tracing();

    let expected = 3f32.sqrt().recip();
    for weighting in [Weighting::Uniform, Weighting::Angle] {
        let mut mesh = identity_basis_quad(vec![[1e-25; 3]; 4]);
        let settings = Settings::default()
            .with_write_channel(WriteChannel::Tangent)
            .with_weighting(weighting);
        let summary = smooth_normals_with_settings(&mut mesh, &settings).unwrap();
        assert_eq!(summary.degenerate_groups(), 0);
        for &n in mesh.loop_tangents().unwrap() {
            assert_close(n, [expected; 3]);
        }

        let mut mesh = identity_basis_quad(vec![[1e-25; 3]; 4]);
        let settings = Settings::default().with_weighting(weighting);
        smooth_normals_with_settings(&mut mesh, &settings).unwrap();
        for &uv in mesh.uv_channel_by_name("UV2").unwrap() {
            assert_close(uv, oct_quad_encode([expected; 3]));
        }
    }
}

#[test]
fn batches_stop_at_the_first_failure() {
    let good = identity_basis_quad(vec![[0., 0., 1.]; 4]);
    let mut bad = good.clone();
    bad.clear_loop_tangents();

    let mut meshes = [good.clone(), bad, good];
    let error = smooth_normals_all(&mut meshes, &Settings::default()).unwrap_err();

    let SmoothNormalsError::Mesh { index, source } = &error else {
        panic!("unexpected error {error:?}");
    };
    assert_eq!(*index, 1);
    assert_eq!(**source, SmoothNormalsError::MissingTangent { loop_index: 0 });
    assert_eq!(
        error.to_string(),
        "mesh 1 failed: loop 0 has no tangent, calculate tangents first"
    );

    assert!(meshes[0].find_uv_channel("UV2").is_some());
    assert!(meshes[1].find_uv_channel("UV2").is_none());
    assert!(meshes[2].find_uv_channel("UV2").is_none());
}

#[test]
fn batches_report_each_summary() {
    let mut meshes = vec![identity_basis_quad(vec![[0., 0., 1.]; 4]); 3];
    let summaries = smooth_normals_all(&mut meshes, &Settings::default()).unwrap();

    assert_eq!(summaries.len(), 3);
    assert!(summaries.iter().all(|s| s.loops() == 4));
}

#[test]
fn write_channel_parses_both_spellings() {
    assert_eq!("0".parse(), Ok(WriteChannel::Uv2));
    assert_eq!("uv2".parse(), Ok(WriteChannel::Uv2));
    assert_eq!("1".parse(), Ok(WriteChannel::Tangent));
    assert_eq!("tangent".parse(), Ok(WriteChannel::Tangent));
    assert!("2".parse::<WriteChannel>().is_err());
}

/// Runs the pipeline through a [`libm`] backend, as a `no_std` caller would.
#[derive(Clone, Copy, PartialEq, Debug)]
struct LibmOps;

impl Ops for LibmOps {
    fn sqrt(x: f32) -> f32 {
        libm::sqrtf(x)
    }

    fn acos(x: f32) -> f32 {
        libm::acosf(x)
    }
}

#[test]
fn libm_backend_agrees_with_std() {
    let positions = vec![
        [0., 0., 0.],
        [1., 0., 0.3],
        [1., 1., 0.],
        [0., 1., 0.2],
        [2., 0.5, 1.],
    ];
    let polygons: &[&[usize]] = &[&[0, 1, 2, 3], &[1, 4, 2]];
    let uvs = [[0., 0.], [1., 0.], [1., 1.], [0., 1.], [1., 0.], [2., 0.5], [1., 1.]];
    let settings = Settings::default()
        .with_weighting(Weighting::Angle)
        .with_normal_source(NormalSource::Loop);

    let mut with_std = PolyMesh::new(positions.clone(), polygons).unwrap();
    with_std.set_polygon_smooth(1, true);
    with_std.calc_normals_split();
    let channel = with_std.add_uv_channel("UVMap");
    with_std.set_uv_channel_data(channel, &uvs).unwrap();
    with_std.calc_tangents(channel).unwrap();
    smooth_normals_with_settings(&mut with_std, &settings).unwrap();

    let mut with_libm = PolyMesh::<LibmOps>::with_ops(positions, polygons).unwrap();
    with_libm.set_polygon_smooth(1, true);
    with_libm.calc_normals_split();
    let channel = with_libm.add_uv_channel("UVMap");
    with_libm.set_uv_channel_data(channel, &uvs).unwrap();
    with_libm.calc_tangents(channel).unwrap();
    smooth_normals_with_settings(&mut with_libm, &settings).unwrap();

    let expected = with_std.uv_channel_by_name("UV2").unwrap();
    let found = with_libm.uv_channel_by_name("UV2").unwrap();
    for (a, b) in found.iter().zip(expected) {
        assert!((a[0] - b[0]).abs() < 1e-5 && (a[1] - b[1]).abs() < 1e-5);
    }
}
