#![no_main]

use libfuzzer_sys::fuzz_target;
use smooth_normals_fuzz::{Geometry, Knobs, check};

fuzz_target!(|value: (Geometry, Knobs)| {
    let (geometry, knobs) = value;
    check(&geometry, &knobs.settings());
});
