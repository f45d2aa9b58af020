//! Task Watchdog Timer (TWDT) driver.
//!
//! Subscribes the control task to the ESP-IDF TWDT so the device resets
//! if the scan loop stalls.  Long waits (presence countdown, dispensing,
//! notices) go through
//! [`Esp32TimeAdapter`](crate::adapters::time::Esp32TimeAdapter), which
//! sleeps in slices shorter than the timeout and feeds between them.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

/// Reset the device if the control task goes this long without feeding.
pub const WATCHDOG_TIMEOUT_MS: u32 = 10_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    /// Initialise and subscribe the current task to the TWDT.
    pub fn new() -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms: WATCHDOG_TIMEOUT_MS,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!("TWDT reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({} ms timeout)", WATCHDOG_TIMEOUT_MS);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog(sim): no-op");
            Self {}
        }
    }

    /// Feed the watchdog.  Must be called at least every
    /// [`WATCHDOG_TIMEOUT_MS`].
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}
