//! Door configuration persisted in the default NVS partition.

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

use crate::storage::ConfigStore;

/// NVS namespace holding the door record.
const NAMESPACE: &str = "garage";
/// Key of the encoded [`crate::config::DoorConfig`].
const KEY: &str = "door_cfg";
/// Upper bound on the encoded record size.
const MAX_RECORD: usize = 64;

/// [`ConfigStore`] backed by ESP-IDF non-volatile storage.
///
/// # Example
///
/// ```ignore
/// use rs_garage::hal::esp32::Esp32NvsStore;
/// use rs_garage::storage::load_or_default;
///
/// let nvs = EspDefaultNvsPartition::take()?;
/// let mut store = Esp32NvsStore::new(nvs.clone())?;
/// let door_config = load_or_default(&mut store);
/// ```
pub struct Esp32NvsStore {
    nvs: EspNvs<NvsDefault>,
}

impl Esp32NvsStore {
    /// Open (or create) the door namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace cannot be opened read-write.
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, esp_idf_svc::sys::EspError> {
        let nvs = EspNvs::new(partition, NAMESPACE, true)?;
        Ok(Self { nvs })
    }
}

impl ConfigStore for Esp32NvsStore {
    type Error = esp_idf_svc::sys::EspError;

    fn load(&mut self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut buf = [0u8; MAX_RECORD];
        Ok(self.nvs.get_raw(KEY, &mut buf)?.map(<[u8]>::to_vec))
    }

    fn save(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.nvs.set_raw(KEY, bytes)?;
        Ok(())
    }
}
