//! Wind preset/style dictionary
//!
//! Presets carry base physical parameters, styles carry multiplicative
//! factors. Codes are unique within their list, compared case-insensitively,
//! and lookups return the first match in stored order.

use serde::{Deserialize, Serialize};

use crate::collection::BoundedVec;
use crate::consts::{MAX_PRESETS, MAX_STYLES};
use crate::error::{ConfigError, Result};

/// Base parameters of a preset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindBase {
    pub wind_intensity: f32,
    pub gust_frequency: f32,
    pub wind_variability: f32,
    pub fan_limit: f32,
    pub min_fan: f32,
    pub turbulence_length_scale: f32,
    pub turbulence_intensity_sigma: f32,
    pub thermal_bubble_strength: f32,
    pub thermal_bubble_radius: f32,

    // Simulator seeds, passed through untouched
    pub base_min_wind: f32,
    pub base_max_wind: f32,
    pub gust_prob_base: f32,
    pub gust_strength_max: f32,
    pub thermal_freq_base: f32,
}

impl Default for WindBase {
    fn default() -> Self {
        Self {
            wind_intensity: 70.0,
            gust_frequency: 40.0,
            wind_variability: 50.0,
            fan_limit: 95.0,
            min_fan: 10.0,
            turbulence_length_scale: 40.0,
            turbulence_intensity_sigma: 0.5,
            thermal_bubble_strength: 2.0,
            thermal_bubble_radius: 18.0,
            base_min_wind: 1.8,
            base_max_wind: 5.5,
            gust_prob_base: 0.040,
            gust_strength_max: 2.10,
            thermal_freq_base: 0.022,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetEntry {
    pub code: String,
    pub name: String,
    pub factors: WindBase,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleFactors {
    pub intensity_factor: f32,
    pub variability_factor: f32,
    pub gust_factor: f32,
    pub thermal_factor: f32,
}

impl Default for StyleFactors {
    fn default() -> Self {
        Self {
            intensity_factor: 1.0,
            variability_factor: 1.0,
            gust_factor: 1.0,
            thermal_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleEntry {
    pub code: String,
    pub name: String,
    pub factors: StyleFactors,
}

/// Entry with a case-insensitive code key
pub trait CodedEntry {
    const COLLECTION: &'static str;
    fn code(&self) -> &str;
}

impl CodedEntry for PresetEntry {
    const COLLECTION: &'static str = "presets";
    fn code(&self) -> &str {
        &self.code
    }
}

impl CodedEntry for StyleEntry {
    const COLLECTION: &'static str = "styles";
    fn code(&self) -> &str {
        &self.code
    }
}

/// Body of the `windDict` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindProfileDict {
    #[serde(default)]
    pub presets: BoundedVec<PresetEntry, MAX_PRESETS>,
    #[serde(default)]
    pub styles: BoundedVec<StyleEntry, MAX_STYLES>,
}

impl Default for WindProfileDict {
    /// One sample preset and the neutral style
    fn default() -> Self {
        let mut presets = BoundedVec::new();
        let _ = presets.push(PresetEntry {
            code: "OCEAN".to_string(),
            name: "Ocean Breeze".to_string(),
            factors: WindBase {
                gust_frequency: 45.0,
                fan_limit: 90.0,
                ..Default::default()
            },
        });
        let mut styles = BoundedVec::new();
        let _ = styles.push(StyleEntry {
            code: "BALANCE".to_string(),
            name: "Balance".to_string(),
            factors: StyleFactors::default(),
        });
        Self { presets, styles }
    }
}

fn position<T: CodedEntry>(items: &[T], code: &str) -> Option<usize> {
    items.iter().position(|entry| entry.code().eq_ignore_ascii_case(code))
}

fn check_code<T: CodedEntry>(items: &[T], code: &str, skip: Option<usize>) -> Result<()> {
    if code.trim().is_empty() {
        return Err(ConfigError::invalid("code", "must not be empty"));
    }
    let clash = items
        .iter()
        .enumerate()
        .any(|(i, entry)| Some(i) != skip && entry.code().eq_ignore_ascii_case(code));
    if clash {
        return Err(ConfigError::DuplicateKey {
            collection: T::COLLECTION,
            field: "code",
            value: code.to_string(),
        });
    }
    Ok(())
}

fn add_entry<T: CodedEntry, const N: usize>(list: &mut BoundedVec<T, N>, entry: T) -> Result<()> {
    if list.is_full() {
        return Err(ConfigError::Capacity {
            collection: T::COLLECTION,
            capacity: N,
        });
    }
    check_code(list.as_slice(), entry.code(), None)?;
    list.push(entry).map_err(|_| ConfigError::Capacity {
        collection: T::COLLECTION,
        capacity: N,
    })
}

fn update_entry<T: CodedEntry, const N: usize>(
    list: &mut BoundedVec<T, N>,
    code: &str,
    entry: T,
) -> Result<()> {
    let index = position(list.as_slice(), code).ok_or_else(|| missing::<T>(code))?;
    check_code(list.as_slice(), entry.code(), Some(index))?;
    list.replace(index, entry);
    Ok(())
}

fn remove_entry<T: CodedEntry, const N: usize>(list: &mut BoundedVec<T, N>, code: &str) -> Result<T> {
    let index = position(list.as_slice(), code).ok_or_else(|| missing::<T>(code))?;
    list.remove_at(index).ok_or_else(|| missing::<T>(code))
}

fn missing<T: CodedEntry>(code: &str) -> ConfigError {
    ConfigError::NotFound {
        collection: T::COLLECTION,
        key: code.to_string(),
    }
}

impl WindProfileDict {
    /// A dictionary with no presets or styles
    pub fn empty() -> Self {
        Self {
            presets: BoundedVec::new(),
            styles: BoundedVec::new(),
        }
    }

    pub fn find_preset(&self, code: &str) -> Option<&PresetEntry> {
        position(self.presets.as_slice(), code).and_then(|i| self.presets.get(i))
    }

    pub fn find_style(&self, code: &str) -> Option<&StyleEntry> {
        position(self.styles.as_slice(), code).and_then(|i| self.styles.get(i))
    }

    pub fn add_preset(&mut self, entry: PresetEntry) -> Result<()> {
        add_entry(&mut self.presets, entry)
    }

    /// Replace the preset stored under `code`; the new entry may rename it
    pub fn update_preset(&mut self, code: &str, entry: PresetEntry) -> Result<()> {
        update_entry(&mut self.presets, code, entry)
    }

    pub fn delete_preset(&mut self, code: &str) -> Result<PresetEntry> {
        remove_entry(&mut self.presets, code)
    }

    pub fn add_style(&mut self, entry: StyleEntry) -> Result<()> {
        add_entry(&mut self.styles, entry)
    }

    pub fn update_style(&mut self, code: &str, entry: StyleEntry) -> Result<()> {
        update_entry(&mut self.styles, code, entry)
    }

    pub fn delete_style(&mut self, code: &str) -> Result<StyleEntry> {
        remove_entry(&mut self.styles, code)
    }

    /// Codes must be non-empty and unique per list
    pub fn validate(&self) -> Result<()> {
        for (i, preset) in self.presets.iter().enumerate() {
            check_code(self.presets.as_slice(), &preset.code, Some(i))?;
        }
        for (i, style) in self.styles.iter().enumerate() {
            check_code(self.styles.as_slice(), &style.code, Some(i))?;
        }
        Ok(())
    }
}
