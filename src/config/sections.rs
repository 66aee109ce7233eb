//! Device, network, presence, NVS and web page sections
//!
//! These sections have no keyed collections; they are read, patched as a
//! whole and written back. Defaults are the compiled-in factory values.

use serde::{Deserialize, Serialize};

use crate::collection::BoundedVec;
use crate::consts::{
    FW_VERSION, MAX_BLE_DEVICES, MAX_COMMON_ASSETS, MAX_NVS_ENTRIES, MAX_PAGE_ASSETS, MAX_PAGES,
    MAX_REDIRECTS, MAX_STA_NETWORKS,
};

// === system ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SystemMeta {
    pub version: String,
    pub device_name: String,
    pub last_update: String,
}

impl Default for SystemMeta {
    fn default() -> Self {
        Self {
            version: FW_VERSION.to_string(),
            device_name: "SmartNatureWind".to_string(),
            last_update: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfig {
    pub level: String,
    pub max_entries: u16,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            max_entries: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemRuntime {
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanPwm {
    pub pin: i16,
    pub channel: u8,
    pub freq: u32,
    /// PWM resolution in bits
    pub res: u8,
}

impl Default for FanPwm {
    fn default() -> Self {
        Self {
            pin: 6,
            channel: 0,
            freq: 25_000,
            res: 10,
        }
    }
}

/// Fan duty bands, in percent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FanBands {
    pub start_percent_min: u8,
    pub comfort_percent_min: u8,
    pub comfort_percent_max: u8,
    pub hard_percent_max: u8,
}

impl Default for FanBands {
    fn default() -> Self {
        Self {
            start_percent_min: 10,
            comfort_percent_min: 20,
            comfort_percent_max: 80,
            hard_percent_max: 95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PirHardware {
    pub enabled: bool,
    pub pin: i16,
    pub debounce_sec: u16,
    pub hold_sec: u16,
}

impl Default for PirHardware {
    fn default() -> Self {
        Self {
            enabled: true,
            pin: 13,
            debounce_sec: 5,
            hold_sec: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TempHumHardware {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub pin: i16,
    pub interval_sec: u16,
}

impl Default for TempHumHardware {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: "DHT22".to_string(),
            pin: 23,
            interval_sec: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BleHardware {
    pub enabled: bool,
    pub scan_interval: u16,
}

impl Default for BleHardware {
    fn default() -> Self {
        Self {
            enabled: true,
            scan_interval: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Hardware {
    pub fan_pwm: FanPwm,
    pub fan_config: FanBands,
    pub pir: PirHardware,
    pub temp_hum: TempHumHardware,
    pub ble: BleHardware,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Security {
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeSync {
    pub ntp_server: String,
    pub timezone: String,
    pub sync_interval_min: u16,
}

impl Default for TimeSync {
    fn default() -> Self {
        Self {
            ntp_server: "pool.ntp.org".to_string(),
            timezone: "Asia/Seoul".to_string(),
            sync_interval_min: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub meta: SystemMeta,
    pub system: SystemRuntime,
    pub hw: Hardware,
    pub security: Security,
    pub time: TimeSync,
}

// === wifi ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum WifiMode {
    Ap,
    Sta,
    #[default]
    ApSta,
}

impl From<WifiMode> for u8 {
    fn from(mode: WifiMode) -> u8 {
        match mode {
            WifiMode::Ap => 0,
            WifiMode::Sta => 1,
            WifiMode::ApSta => 2,
        }
    }
}

impl TryFrom<u8> for WifiMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WifiMode::Ap),
            1 => Ok(WifiMode::Sta),
            2 => Ok(WifiMode::ApSta),
            other => Err(format!("unknown wifi mode {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiCredentials {
    pub ssid: String,
    #[serde(alias = "password")]
    pub pass: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WifiConfig {
    pub wifi_mode: WifiMode,
    pub wifi_mode_desc: String,
    pub ap: WifiCredentials,
    pub sta: BoundedVec<WifiCredentials, MAX_STA_NETWORKS>,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            wifi_mode: WifiMode::ApSta,
            wifi_mode_desc: "0=AP,1=STA,2=AP+STA".to_string(),
            ap: WifiCredentials {
                ssid: "NatureWind".to_string(),
                pass: "2540".to_string(),
            },
            sta: BoundedVec::new(),
        }
    }
}

// === motion ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PirPresence {
    pub enabled: bool,
    pub hold_sec: u16,
}

impl Default for PirPresence {
    fn default() -> Self {
        Self {
            enabled: true,
            hold_sec: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrustedDevice {
    pub alias: String,
    pub name: String,
    pub mac: String,
    pub manuf_prefix: String,
    pub prefix_len: u8,
    pub enabled: bool,
}

/// RSSI hysteresis for presence detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RssiPolicy {
    pub on: i16,
    pub off: i16,
    pub avg_count: u8,
    pub persist_count: u8,
    pub exit_delay_sec: u16,
}

impl Default for RssiPolicy {
    fn default() -> Self {
        Self {
            on: -65,
            off: -75,
            avg_count: 8,
            persist_count: 5,
            exit_delay_sec: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlePresence {
    pub enabled: bool,
    pub trusted_devices: BoundedVec<TrustedDevice, MAX_BLE_DEVICES>,
    pub rssi: RssiPolicy,
}

impl Default for BlePresence {
    fn default() -> Self {
        Self {
            enabled: true,
            trusted_devices: BoundedVec::new(),
            rssi: RssiPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MotionTiming {
    pub sim_interval_ms: u16,
    pub gust_interval_ms: u16,
    pub thermal_interval_ms: u16,
}

impl Default for MotionTiming {
    fn default() -> Self {
        Self {
            sim_interval_ms: 500,
            gust_interval_ms: 2000,
            thermal_interval_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub pir: PirPresence,
    pub ble: BlePresence,
    pub timing: MotionTiming,
}

// === nvsSpec ===

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NvsEntry {
    pub key: String,
    /// "uint8", "bool", "string", ...
    #[serde(rename = "type")]
    pub kind: String,
    /// Default value in string form ("0", "false", "")
    pub default_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NvsSpecConfig {
    #[serde(rename = "namespace")]
    pub namespace_name: String,
    pub entries: BoundedVec<NvsEntry, MAX_NVS_ENTRIES>,
}

impl Default for NvsSpecConfig {
    fn default() -> Self {
        Self {
            namespace_name: "naturewind".to_string(),
            entries: BoundedVec::new(),
        }
    }
}

// === webPage ===

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageAsset {
    pub uri: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageItem {
    pub uri: String,
    pub path: String,
    pub label: String,
    pub enable: bool,
    pub is_main: bool,
    pub order: u16,
    pub page_assets: BoundedVec<PageAsset, MAX_PAGE_ASSETS>,
}

impl Default for PageItem {
    fn default() -> Self {
        Self {
            uri: String::new(),
            path: String::new(),
            label: String::new(),
            enable: true,
            is_main: false,
            order: 0,
            page_assets: BoundedVec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RedirectItem {
    pub uri_from: String,
    pub uri_to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommonAsset {
    pub uri: String,
    pub path: String,
    pub is_common: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebPageConfig {
    pub pages: BoundedVec<PageItem, MAX_PAGES>,
    #[serde(rename = "reDirect")]
    pub redirects: BoundedVec<RedirectItem, MAX_REDIRECTS>,
    pub assets: BoundedVec<CommonAsset, MAX_COMMON_ASSETS>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_defaults_fill_partial_document() {
        let cfg: SystemConfig =
            serde_json::from_value(json!({"meta": {"deviceName": "fan-2"}, "hw": {"fanPwm": {"pin": 4}}}))
                .unwrap();
        assert_eq!(cfg.meta.device_name, "fan-2");
        assert_eq!(cfg.meta.version, FW_VERSION);
        assert_eq!(cfg.hw.fan_pwm.pin, 4);
        assert_eq!(cfg.hw.fan_pwm.freq, 25_000);
        assert_eq!(cfg.time.ntp_server, "pool.ntp.org");
    }

    #[test]
    fn test_wifi_mode_is_numeric() {
        let cfg = WifiConfig::default();
        let value = serde_json::to_value(&cfg).unwrap();
        assert_eq!(value["wifiMode"], json!(2));
        assert!(serde_json::from_value::<WifiConfig>(json!({"wifiMode": 7})).is_err());

        let sta: WifiConfig =
            serde_json::from_value(json!({"sta": [{"ssid": "home", "password": "pw"}]})).unwrap();
        assert_eq!(sta.sta.get(0).map(|c| c.pass.as_str()), Some("pw"));
    }

    #[test]
    fn test_sta_list_is_bounded() {
        let nets: Vec<_> = (0..6).map(|i| json!({"ssid": format!("n{}", i)})).collect();
        assert!(serde_json::from_value::<WifiConfig>(json!({ "sta": nets })).is_err());
    }

    #[test]
    fn test_web_page_keys() {
        let cfg: WebPageConfig = serde_json::from_value(json!({
            "pages": [{"uri": "/P010_main.html", "isMain": true}],
            "reDirect": [{"uriFrom": "/", "uriTo": "/P010_main.html"}]
        }))
        .unwrap();
        assert!(cfg.pages.get(0).is_some_and(|p| p.is_main && p.enable));
        assert_eq!(cfg.redirects.len(), 1);
        assert!(cfg.assets.is_empty());
    }
}
