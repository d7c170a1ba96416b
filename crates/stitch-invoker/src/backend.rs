//! Stitcher backends
//!
//! `CommandStitcher` runs a stitcher executable. `NativeStitcher` calls the
//! linked C entry point `pano_stitch_main(argc, argv)`; without the
//! `native-stitch` feature a stand-in reports the library as unavailable.

use libc::{c_char, c_int};
use std::ffi::CString;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info, warn};

/// Status for a stitcher that could not be started
pub const STATUS_NOT_STARTED: i32 = -1;

/// Status of the stand-in native entry point
pub const STATUS_UNAVAILABLE: i32 = -2;

/// Something that stitches given a command-line style argument vector
pub trait Stitcher: Send + Sync {
    /// Run to completion; 0 means success
    fn stitch(&self, args: &[String]) -> i32;
}

/// Runs an external stitcher program with `args[1..]`
#[derive(Debug, Clone)]
pub struct CommandStitcher {
    program: PathBuf,
}

impl Default for CommandStitcher {
    fn default() -> Self {
        Self::new("stitching_detailed")
    }
}

impl CommandStitcher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Stitcher for CommandStitcher {
    fn stitch(&self, args: &[String]) -> i32 {
        info!("Running {}", self.program.display());
        match Command::new(&self.program).args(args.iter().skip(1)).status() {
            Ok(status) => status.code().unwrap_or(STATUS_NOT_STARTED),
            Err(e) => {
                warn!("Failed to start {}: {}", self.program.display(), e);
                STATUS_NOT_STARTED
            }
        }
    }
}

// Linked at build time via build.rs
#[cfg(feature = "native-stitch")]
extern "C" {
    fn pano_stitch_main(argc: c_int, argv: *const *const c_char) -> c_int;
}

// Stand-in for when the native library is not linked
#[cfg(not(feature = "native-stitch"))]
mod mock_ffi {
    use super::*;
    use std::ffi::CStr;

    pub unsafe fn pano_stitch_main(argc: c_int, argv: *const *const c_char) -> c_int {
        for i in 0..argc.max(0) as usize {
            let arg = CStr::from_ptr(*argv.add(i));
            debug!("argv[{}] = {}", i, arg.to_string_lossy());
        }
        STATUS_UNAVAILABLE
    }
}

#[cfg(not(feature = "native-stitch"))]
use mock_ffi::*;

/// Calls the stitcher library linked into this binary
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeStitcher;

impl Stitcher for NativeStitcher {
    fn stitch(&self, args: &[String]) -> i32 {
        let owned: Result<Vec<CString>, _> = args.iter().map(|a| CString::new(a.as_str())).collect();
        let owned = match owned {
            Ok(owned) => owned,
            Err(e) => {
                warn!("Stitch argument not representable as a C string: {}", e);
                return STATUS_NOT_STARTED;
            }
        };
        let mut argv: Vec<*const c_char> = owned.iter().map(|a| a.as_ptr()).collect();
        argv.push(std::ptr::null());

        debug!("Calling native stitcher with {} arguments", owned.len());
        // `owned` keeps every pointer in `argv` alive across the call
        unsafe { pano_stitch_main(owned.len() as c_int, argv.as_ptr()) }
    }
}
