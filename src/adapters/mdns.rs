//! mDNS service advertisement adapter.
//!
//! Advertises `_http._tcp` on the focuser's HTTP port so ASCOM/Alpaca
//! clients can find `<hostname>.local` without knowing the static IP.
//! Uses the ESP-IDF mDNS component on target and is a no-op on
//! simulation targets.
//!
//! Lifecycle is tied to WiFi: start once connected, stop on disconnect.

use log::{info, warn};

#[cfg(target_os = "espidf")]
use super::utils::c_string;
use super::utils::is_valid_hostname;
use crate::error::CommsError;

const MDNS_SERVICE_TYPE: &str = "_http";
const MDNS_SERVICE_PROTO: &str = "_tcp";
const MDNS_INSTANCE_NAME: &str = "LNA Focuser";

/// mDNS advertisement adapter.
pub struct MdnsAdapter {
    hostname: heapless::String<32>,
    port: u16,
    active: bool,
}

impl MdnsAdapter {
    pub fn new(hostname: &str, port: u16) -> Result<Self, CommsError> {
        if !is_valid_hostname(hostname) {
            warn!("mDNS: invalid hostname {:?}", hostname);
            return Err(CommsError::MdnsFailed);
        }
        let mut name = heapless::String::new();
        name.push_str(hostname).map_err(|_| CommsError::MdnsFailed)?;
        Ok(Self {
            hostname: name,
            port,
            active: false,
        })
    }

    /// Whether mDNS is currently advertising.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start hostname + service advertisement.
    /// Call after WiFi is connected and has an IP.
    pub fn start(&mut self) -> Result<(), CommsError> {
        if self.active {
            return Ok(());
        }
        self.platform_start()?;
        self.active = true;
        info!(
            "mDNS: advertising {}.local → {}.{}:{}",
            self.hostname, MDNS_SERVICE_TYPE, MDNS_SERVICE_PROTO, self.port
        );
        Ok(())
    }

    /// Stop advertisement.  Call before WiFi disconnect.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.platform_stop();
        self.active = false;
        info!("mDNS: stopped");
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&self) -> Result<(), CommsError> {
        use esp_idf_svc::sys::*;

        let hostname: [u8; 33] = c_string(&self.hostname);
        let instance: [u8; 32] = c_string(MDNS_INSTANCE_NAME);
        let svc_type: [u8; 8] = c_string(MDNS_SERVICE_TYPE);
        let svc_proto: [u8; 8] = c_string(MDNS_SERVICE_PROTO);
        let version: [u8; 16] = c_string(env!("CARGO_PKG_VERSION"));

        unsafe {
            let ret = mdns_init();
            if ret != ESP_OK as i32 {
                log::error!("mDNS: mdns_init failed ({})", ret);
                return Err(CommsError::MdnsFailed);
            }
            mdns_hostname_set(hostname.as_ptr() as *const _);
            mdns_instance_name_set(instance.as_ptr() as *const _);

            let ret = mdns_service_add(
                instance.as_ptr() as *const _,
                svc_type.as_ptr() as *const _,
                svc_proto.as_ptr() as *const _,
                self.port,
                core::ptr::null_mut(),
                0,
            );
            if ret != ESP_OK as i32 {
                log::error!("mDNS: service add failed ({})", ret);
                mdns_free();
                return Err(CommsError::MdnsFailed);
            }

            mdns_service_txt_item_set(
                svc_type.as_ptr() as *const _,
                svc_proto.as_ptr() as *const _,
                b"version\0".as_ptr() as *const _,
                version.as_ptr() as *const _,
            );
            mdns_service_txt_item_set(
                svc_type.as_ptr() as *const _,
                svc_proto.as_ptr() as *const _,
                b"path\0".as_ptr() as *const _,
                b"/\0".as_ptr() as *const _,
            );
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&self) -> Result<(), CommsError> {
        info!(
            "mDNS(sim): registered '{}' at {}.local:{} v={}",
            MDNS_INSTANCE_NAME,
            self.hostname,
            self.port,
            env!("CARGO_PKG_VERSION")
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&self) {
        unsafe {
            esp_idf_svc::sys::mdns_free();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&self) {
        info!("mDNS(sim): unregistered");
    }
}
