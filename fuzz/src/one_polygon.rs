#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use smooth_normals::Settings;
use smooth_normals_fuzz::{Face, Geometry, Vertex, check};

#[derive(Debug)]
struct OnePolygon(Geometry);

impl Arbitrary<'_> for OnePolygon {
    fn arbitrary(u: &mut Unstructured<'_>) -> Result<Self, arbitrary::Error> {
        let corners = u.int_in_range(3..=8)?;
        let vertices = (0..corners)
            .map(|_| Vertex::arbitrary(u))
            .collect::<Result<Vec<_>, _>>()?;
        let faces = vec![Face::Arbitrary((0..corners).collect())];
        let mut value = Geometry { vertices, faces };

        value.validate()?;

        Ok(Self(value))
    }

    fn size_hint(depth: usize) -> (usize, Option<usize>) {
        let (min, max) = Vertex::size_hint(depth);
        (3 * min, max.map(|max| 8 * max + 4))
    }
}

fuzz_target!(|value: OnePolygon| {
    let OnePolygon(value) = value;
    check(&value, &Settings::default());
});
