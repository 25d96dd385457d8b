use arbitrary::{Arbitrary, Unstructured};
use smooth_normals::{
    NormalSource, PolyMesh, Settings, Weighting, WriteChannel, ZeroNormalFallback,
    smooth_normals_with_settings,
};

/// Inputs beyond this magnitude overflow intermediate products.
const LIMIT: f32 = 1e6;

/// Slack allowed on the encoded components.
const EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Arbitrary)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Arbitrary)]
pub enum Face {
    Triangle([usize; 3]),
    Quad([usize; 4]),
    Arbitrary(Vec<usize>),
}

impl core::ops::Deref for Face {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Triangle(inner) => &*inner,
            Self::Quad(inner) => &*inner,
            Self::Arbitrary(inner) => inner.as_slice(),
        }
    }
}

impl core::ops::DerefMut for Face {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Triangle(inner) => &mut *inner,
            Self::Quad(inner) => &mut *inner,
            Self::Arbitrary(inner) => inner.as_mut_slice(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
}

impl Geometry {
    pub fn validate(&mut self) -> Result<(), arbitrary::Error> {
        let Self { vertices, faces } = self;

        // Known failure: no vertices
        if vertices.is_empty() {
            return Err(arbitrary::Error::IncorrectFormat);
        }

        // Known failure: polygons with fewer than 3 corners
        for face in faces.iter_mut() {
            if face.len() < 3 {
                return Err(arbitrary::Error::IncorrectFormat);
            }

            for vertex in face.iter_mut() {
                *vertex %= vertices.len();
            }
        }

        // Known failure: NaN, infinite or overflowing values
        if vertices
            .iter()
            .flat_map(|vertex| {
                vertex
                    .position
                    .iter()
                    .copied()
                    .chain(vertex.normal)
                    .chain(vertex.tangent)
            })
            .any(|v| !v.is_finite() || v.abs() > LIMIT)
        {
            return Err(arbitrary::Error::IncorrectFormat);
        }

        Ok(())
    }

    /// Builds a mesh whose split normals are its vertex normals.
    pub fn to_poly_mesh(&self) -> PolyMesh {
        let positions = self.vertices.iter().map(|v| v.position).collect();
        let faces = self.faces.iter().map(|f| &**f).collect::<Vec<_>>();
        let mut mesh = PolyMesh::new(positions, &faces).expect("faces were validated");

        mesh.set_vertex_normals(self.vertices.iter().map(|v| v.normal).collect());
        let corners = self.faces.iter().flat_map(|f| f.iter());
        mesh.set_loop_normals(corners.clone().map(|&v| self.vertices[v].normal).collect());
        mesh.set_loop_tangents(corners.map(|&v| self.vertices[v].tangent).collect());
        mesh
    }
}

impl Arbitrary<'_> for Geometry {
    fn arbitrary(u: &mut Unstructured<'_>) -> Result<Self, arbitrary::Error> {
        let mut value = Self {
            vertices: Vec::<Vertex>::arbitrary(u)?,
            faces: Vec::<Face>::arbitrary(u)?,
        };

        value.validate()?;

        Ok(value)
    }
}

/// Picks one value for every configuration knob.
#[derive(Debug, Clone, Copy, Arbitrary)]
pub struct Knobs {
    tangent: bool,
    angle: bool,
    loop_normals: bool,
    first_member: bool,
}

impl Knobs {
    pub fn settings(self) -> Settings {
        Settings::default()
            .with_write_channel(if self.tangent {
                WriteChannel::Tangent
            } else {
                WriteChannel::Uv2
            })
            .with_weighting(if self.angle {
                Weighting::Angle
            } else {
                Weighting::Uniform
            })
            .with_normal_source(if self.loop_normals {
                NormalSource::Loop
            } else {
                NormalSource::Vertex
            })
            .with_zero_fallback(if self.first_member {
                ZeroNormalFallback::FirstMember
            } else {
                ZeroNormalFallback::Zero
            })
    }
}

/// Runs the pipeline twice on `geometry`, panicking if the runs differ or an
/// output escapes its range.
pub fn check(geometry: &Geometry, settings: &Settings) {
    let run = || {
        let mut mesh = geometry.to_poly_mesh();
        smooth_normals_with_settings(&mut mesh, settings).expect("mesh was validated");
        mesh
    };
    let (first, second) = (run(), run());

    if first != second {
        panic!("Repeated runs differ:\n{first:?}\n{second:?}");
    }

    match settings.write_channel() {
        WriteChannel::Uv2 => {
            for uv in first.uv_channel_by_name(settings.uv_channel_name()).unwrap_or(&[]) {
                assert!(
                    uv.iter().all(|c| c.abs() <= 1. + EPSILON),
                    "Encoded value {uv:?} out of range"
                );
            }
        }
        WriteChannel::Tangent => {
            for n in first.loop_tangents().unwrap_or(&[]) {
                let length = n.iter().map(|c| c * c).sum::<f32>().sqrt();
                assert!(
                    length == 0. || (length - 1.).abs() <= EPSILON,
                    "Tangent-space normal {n:?} is neither unit nor zero"
                );
            }
        }
    }
}
