//! WiFi station link for the door controller.
//!
//! The link is brought up once at boot. The main loop calls
//! [`Esp32Wifi::maintain`] periodically, which rejoins the access point
//! after a drop and returns the signal strength for the status string.
//!
//! ```ignore
//! use rs_garage::hal::esp32::Esp32Wifi;
//! use rs_garage::config::WifiConfig;
//!
//! let config = WifiConfig::default()
//!     .with_ssid("garage-ap")
//!     .with_password("secret123");
//!
//! let mut wifi = Esp32Wifi::new(modem, sysloop, Some(nvs), &config)?;
//! if let Some(dbm) = wifi.maintain() {
//!     door.set_signal_strength(dbm);
//! }
//! ```

use std::net::Ipv4Addr;

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::{esp_wifi_sta_get_ap_info, wifi_ap_record_t, ESP_OK};
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{info, warn};

use crate::config::WifiConfig;

/// Station-mode WiFi connection.
pub struct Esp32Wifi<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
}

impl<'a> Esp32Wifi<'a> {
    /// Start the driver and block until DHCP hands out an address.
    ///
    /// # Errors
    ///
    /// Fails if the driver cannot start, the access point rejects the
    /// credentials, or the interface never comes up.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
    ) -> anyhow::Result<Self> {
        let driver = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(driver, sysloop)?;

        let mut client = ClientConfiguration::default();
        client
            .ssid
            .push_str(config.ssid.as_str())
            .map_err(|_| anyhow::anyhow!("ssid longer than 32 bytes"))?;
        client
            .password
            .push_str(config.password.as_str())
            .map_err(|_| anyhow::anyhow!("password longer than 64 bytes"))?;
        wifi.set_configuration(&Configuration::Client(client))?;

        wifi.start()?;
        info!("wifi joining {:?}", config.ssid.as_str());
        let mut link = Self { wifi };
        link.join()?;
        Ok(link)
    }

    fn join(&mut self) -> anyhow::Result<()> {
        self.wifi.connect()?;
        self.wifi.wait_netif_up()?;
        info!("wifi up, ip {:?}", self.ip_addr());
        Ok(())
    }

    /// Rejoin if the link dropped, then report the signal strength.
    ///
    /// Returns `None` while the station is not associated.
    pub fn maintain(&mut self) -> Option<i8> {
        if !self.is_connected() {
            warn!("wifi link lost, rejoining");
            if let Err(e) = self.join() {
                warn!("wifi rejoin failed: {:?}", e);
                return None;
            }
        }
        self.rssi()
    }

    /// Signal strength of the associated access point in dBm.
    pub fn rssi(&self) -> Option<i8> {
        let mut record = wifi_ap_record_t::default();
        // SAFETY: the driver is started while self lives and `record` is a
        // valid out-pointer.
        let err = unsafe { esp_wifi_sta_get_ap_info(&mut record) };
        (err == ESP_OK).then_some(record.rssi)
    }

    /// Current station address, if DHCP has assigned one.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|ip| ip.ip)
    }

    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}
