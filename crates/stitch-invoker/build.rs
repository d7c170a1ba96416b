//! Build script for the stitch invoker
//!
//! With `native-stitch` enabled, links the prebuilt stitcher library found
//! in `PANO_STITCHER_LIB_DIR` (or the default linker search path).

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=PANO_STITCHER_LIB_DIR");

    if env::var_os("CARGO_FEATURE_NATIVE_STITCH").is_none() {
        return;
    }

    if let Some(dir) = env::var_os("PANO_STITCHER_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
    }
    println!("cargo:rustc-link-lib=pano_stitch");

    // The stitcher is C++
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("linux") {
        println!("cargo:rustc-link-lib=stdc++");
    }
}
