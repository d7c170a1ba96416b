//! Retrying camera driver
//!
//! Some camera states reject preview and shutter calls for a few
//! milliseconds (typically right after a preview stop). Those rejections are
//! retried here and never reach the capture loop. By default there is no
//! retry cap and no backoff, so a camera that stays busy forever keeps the
//! caller spinning.

use crate::device::{CameraDevice, PictureCallback};
use crate::{CameraConfig, CameraError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Retry policy for transient camera rejections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Give up after this many attempts; `None` retries forever
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retry until the call succeeds
    pub fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    /// Give up after `attempts` tries
    pub fn capped(attempts: u32) -> Self {
        Self {
            max_attempts: Some(attempts.max(1)),
        }
    }
}

/// Run `op` until it succeeds or fails with a non-transient error.
///
/// Returns the value and the number of attempts it took. Between attempts
/// the task yields to the scheduler but does not sleep.
pub async fn retry_until_success<T, F>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<(T, u32), CameraError>
where
    F: FnMut() -> Result<T, CameraError>,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match op() {
            Ok(value) => {
                if attempts > 1 {
                    debug!("{} succeeded after {} attempts", what, attempts);
                }
                return Ok((value, attempts));
            }
            Err(e) if e.is_transient() => {
                if let Some(max) = policy.max_attempts {
                    if attempts >= max {
                        warn!("{} still rejected after {} attempts: {}", what, attempts, e);
                        return Err(CameraError::RetriesExhausted { attempts });
                    }
                }
                tokio::task::yield_now().await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Attempt counters, for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Total `start_preview` calls made on the device
    pub preview_attempts: u64,
    /// Total `take_picture` calls made on the device
    pub capture_attempts: u64,
    /// Pictures successfully triggered
    pub captures: u64,
}

/// Camera driver wrapper
pub struct CameraDriver<C: CameraDevice> {
    device: C,
    config: CameraConfig,
    retry: RetryPolicy,
    opened: bool,
    previewing: bool,
    stats: DriverStats,
}

impl<C: CameraDevice> CameraDriver<C> {
    /// Wrap a device; nothing is opened yet
    pub fn new(device: C, config: CameraConfig, retry: RetryPolicy) -> Self {
        Self {
            device,
            config,
            retry,
            opened: false,
            previewing: false,
            stats: DriverStats::default(),
        }
    }

    /// Open and configure the device. Failures are not retried.
    pub fn open(&mut self) -> Result<(), CameraError> {
        self.device.open()?;
        self.opened = true;
        self.device.configure(&self.config)?;
        info!(
            "Camera opened at {}x{}",
            self.config.width, self.config.height
        );
        Ok(())
    }

    /// Start the preview, retrying while the device is busy
    pub async fn start_preview(&mut self) -> Result<(), CameraError> {
        let device = &mut self.device;
        let result = retry_until_success(&self.retry, "Start preview", || {
            device.start_preview()
        })
        .await;
        self.record(result.as_ref().map(|(_, n)| *n), |s, n| s.preview_attempts += n);
        result?;
        self.previewing = true;
        Ok(())
    }

    /// Fire the shutter, retrying while the device is busy
    pub async fn trigger_capture(&mut self, on_taken: PictureCallback) -> Result<(), CameraError> {
        let device = &mut self.device;
        let result = retry_until_success(&self.retry, "Take picture", || {
            device.take_picture(on_taken.clone())
        })
        .await;
        self.record(result.as_ref().map(|(_, n)| *n), |s, n| s.capture_attempts += n);
        result?;
        self.stats.captures += 1;
        Ok(())
    }

    /// Stop the preview
    pub fn stop_preview(&mut self) {
        if self.previewing {
            self.device.stop_preview();
            self.previewing = false;
        }
    }

    /// Release the device
    pub fn release(&mut self) {
        if self.opened {
            self.stop_preview();
            self.device.release();
            self.opened = false;
            info!("Camera released");
        }
    }

    /// Check if the preview is running
    pub fn is_previewing(&self) -> bool {
        self.previewing
    }

    /// Attempt counters so far
    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// The wrapped device
    pub fn device(&self) -> &C {
        &self.device
    }

    fn record(
        &mut self,
        attempts: Result<u32, &CameraError>,
        apply: impl FnOnce(&mut DriverStats, u64),
    ) {
        let n = match attempts {
            Ok(n) => n,
            Err(CameraError::RetriesExhausted { attempts }) => *attempts,
            Err(_) => 1,
        };
        apply(&mut self.stats, u64::from(n));
    }
}

impl<C: CameraDevice> Drop for CameraDriver<C> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    /// Device whose preview and shutter are rejected a fixed number of times
    struct FlakyDevice {
        preview_failures: u32,
        capture_failures: u32,
        preview_calls: u32,
        capture_calls: u32,
        released: bool,
    }

    impl FlakyDevice {
        fn new(preview_failures: u32, capture_failures: u32) -> Self {
            Self {
                preview_failures,
                capture_failures,
                preview_calls: 0,
                capture_calls: 0,
                released: false,
            }
        }
    }

    impl CameraDevice for FlakyDevice {
        fn open(&mut self) -> Result<(), CameraError> {
            Ok(())
        }

        fn configure(&mut self, _config: &CameraConfig) -> Result<(), CameraError> {
            Ok(())
        }

        fn start_preview(&mut self) -> Result<(), CameraError> {
            self.preview_calls += 1;
            if self.preview_calls <= self.preview_failures {
                return Err(CameraError::Busy("preview".into()));
            }
            Ok(())
        }

        fn stop_preview(&mut self) {}

        fn take_picture(&mut self, on_taken: PictureCallback) -> Result<(), CameraError> {
            self.capture_calls += 1;
            if self.capture_calls <= self.capture_failures {
                return Err(CameraError::Busy("shutter".into()));
            }
            on_taken(vec![0xFF, 0xD8]);
            Ok(())
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    fn driver(device: FlakyDevice, retry: RetryPolicy) -> CameraDriver<FlakyDevice> {
        let mut driver = CameraDriver::new(device, CameraConfig::default(), retry);
        driver.open().unwrap();
        driver
    }

    #[tokio::test]
    async fn test_preview_fails_twice_then_succeeds() {
        let mut driver = driver(FlakyDevice::new(2, 0), RetryPolicy::default());
        driver.start_preview().await.unwrap();

        assert_eq!(driver.device().preview_calls, 3);
        assert_eq!(driver.stats().preview_attempts, 3);
        assert!(driver.is_previewing());
    }

    #[tokio::test]
    async fn test_capture_retries_reuse_callback() {
        let mut driver = driver(FlakyDevice::new(0, 4), RetryPolicy::unbounded());
        let delivered = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let counter = delivered.clone();
        let cb: PictureCallback = Arc::new(move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        driver.trigger_capture(cb).await.unwrap();
        assert_eq!(driver.device().capture_calls, 5);
        assert_eq!(delivered.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(driver.stats().captures, 1);
    }

    #[tokio::test]
    async fn test_capped_policy_gives_up() {
        let mut driver = driver(FlakyDevice::new(10, 0), RetryPolicy::capped(3));
        let err = driver.start_preview().await.unwrap_err();

        assert_eq!(err, CameraError::RetriesExhausted { attempts: 3 });
        assert_eq!(driver.device().preview_calls, 3);
        assert!(!driver.is_previewing());
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        let mut calls = 0;
        let result: Result<((), u32), _> =
            retry_until_success(&RetryPolicy::unbounded(), "Start preview", || {
                calls += 1;
                Err(CameraError::Device("gone".into()))
            })
            .await;

        assert_eq!(result.unwrap_err(), CameraError::Device("gone".into()));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_release_on_drop_is_idempotent() {
        let mut driver = driver(FlakyDevice::new(0, 0), RetryPolicy::default());
        driver.release();
        assert!(driver.device().released);
        drop(driver);
    }

    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }

    proptest! {
        #[test]
        fn attempts_are_failures_plus_one(failures in 0u32..50) {
            let mut calls = 0u32;
            let (_, attempts) = block_on(retry_until_success(&RetryPolicy::unbounded(), "Take picture", || {
                calls += 1;
                if calls <= failures {
                    Err(CameraError::Busy("shutter".into()))
                } else {
                    Ok(())
                }
            }))
            .unwrap();
            prop_assert_eq!(attempts, failures + 1);
            prop_assert_eq!(calls, failures + 1);
        }

        #[test]
        fn cap_bounds_attempts(failures in 1u32..50, cap in 1u32..50) {
            let mut calls = 0u32;
            let result = block_on(retry_until_success(&RetryPolicy::capped(cap), "Start preview", || {
                calls += 1;
                if calls <= failures {
                    Err(CameraError::Busy("preview".into()))
                } else {
                    Ok(())
                }
            }));
            if failures < cap {
                prop_assert_eq!(result.map(|(_, n)| n), Ok(failures + 1));
            } else {
                prop_assert_eq!(result, Err(CameraError::RetriesExhausted { attempts: cap }));
            }
            prop_assert!(calls <= cap);
        }
    }
}
