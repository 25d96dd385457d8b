#![no_main]

use libfuzzer_sys::fuzz_target;
use smooth_normals::Settings;
use smooth_normals_fuzz::{Geometry, check};

fuzz_target!(|value: Geometry| {
    check(&value, &Settings::default());
});
