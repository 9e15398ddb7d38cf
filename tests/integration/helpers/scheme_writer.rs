//! Primer scheme fixtures.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Reference name used by every fixture scheme.
pub const SCHEME_REF: &str = "MN908947.3";

/// Two tiled amplicons on [`SCHEME_REF`]: `[0,400)` in pool 1 and `[350,720)` in pool 2.
pub const TWO_AMPLICONS: &str = "MN908947.3\t0\t20\tnCoV-2019_1_LEFT\t1\n\
                                 MN908947.3\t380\t400\tnCoV-2019_1_RIGHT\t1\n\
                                 MN908947.3\t350\t370\tnCoV-2019_2_LEFT\t2\n\
                                 MN908947.3\t700\t720\tnCoV-2019_2_RIGHT\t2\n";

/// Write `contents` to `scheme.bed` in `dir`.
pub fn write_scheme(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("scheme.bed");
    fs::write(&path, contents).expect("Failed to write scheme");
    path
}
