//! Wind parameter resolution
//!
//! Pure computation: a preset's base parameters, scaled by an optional style
//! and shifted by user deltas, clamped into the ranges the actuator and the
//! turbulence simulator accept.

use serde::Serialize;

use crate::config::{AdjustDelta, Segment, SegmentMode, WindProfileDict};

/// Lower bounds of the physical parameters
pub mod floors {
    pub const TURBULENCE_LENGTH_SCALE: f32 = 1.0;
    pub const TURBULENCE_SIGMA: f32 = 0.0;
    pub const THERMAL_STRENGTH: f32 = 0.1;
    pub const THERMAL_RADIUS: f32 = 1.0;
}

/// Final parameter set handed to the actuator and simulator
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedWind {
    pub preset_code: String,
    pub style_code: String,

    pub valid: bool,
    pub fixed_mode: bool,
    pub fixed_speed: f32,

    /// Percentages in [0, 100]
    pub wind_intensity: f32,
    pub gust_frequency: f32,
    pub wind_variability: f32,
    /// Fan duty bounds in [0, 100], `min_fan <= fan_limit`
    pub fan_limit: f32,
    pub min_fan: f32,

    pub turbulence_length_scale: f32,
    pub turbulence_intensity_sigma: f32,
    pub thermal_bubble_strength: f32,
    pub thermal_bubble_radius: f32,

    pub base_min_wind: f32,
    pub base_max_wind: f32,
    pub gust_prob_base: f32,
    pub gust_strength_max: f32,
    pub thermal_freq_base: f32,
}

#[inline]
fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Combine preset, style and adjustment into a [`ResolvedWind`].
///
/// An unknown preset yields `valid == false` with both codes echoed as
/// given. An empty or unknown style leaves the preset unscaled.
pub fn resolve(
    dict: &WindProfileDict,
    preset_code: &str,
    style_code: Option<&str>,
    adjust: Option<&AdjustDelta>,
) -> ResolvedWind {
    let style_code = style_code.unwrap_or_default();

    let Some(preset) = dict.find_preset(preset_code) else {
        log::warn!("Unknown wind preset '{}'", preset_code);
        return ResolvedWind {
            preset_code: preset_code.to_string(),
            style_code: style_code.to_string(),
            ..Default::default()
        };
    };
    let base = &preset.factors;

    let mut intensity = base.wind_intensity;
    let mut variability = base.wind_variability;
    let mut gust = base.gust_frequency;
    let mut fan_limit = base.fan_limit;
    let mut min_fan = base.min_fan;
    let mut thermal_strength = base.thermal_bubble_strength;

    // Style scales the feel of the wind, never the fan bounds or turbulence
    if !style_code.is_empty() {
        match dict.find_style(style_code) {
            Some(style) => {
                let f = &style.factors;
                intensity *= f.intensity_factor;
                variability *= f.variability_factor;
                gust *= f.gust_factor;
                thermal_strength *= f.thermal_factor;
            }
            None => log::debug!("Unknown wind style '{}', using preset as is", style_code),
        }
    }

    let delta = adjust.copied().unwrap_or_default();
    intensity += delta.wind_intensity;
    variability += delta.wind_variability;
    gust += delta.gust_frequency;
    fan_limit += delta.fan_limit;
    min_fan += delta.min_fan;

    let fan_limit = clamp_percent(fan_limit);
    let min_fan = clamp_percent(min_fan).min(fan_limit);

    ResolvedWind {
        preset_code: preset_code.to_string(),
        style_code: style_code.to_string(),

        valid: true,
        fixed_mode: false,
        fixed_speed: 0.0,

        wind_intensity: clamp_percent(intensity),
        gust_frequency: clamp_percent(gust),
        wind_variability: clamp_percent(variability),
        fan_limit,
        min_fan,

        turbulence_length_scale: base
            .turbulence_length_scale
            .max(floors::TURBULENCE_LENGTH_SCALE),
        turbulence_intensity_sigma: base.turbulence_intensity_sigma.max(floors::TURBULENCE_SIGMA),
        thermal_bubble_strength: thermal_strength.max(floors::THERMAL_STRENGTH),
        thermal_bubble_radius: base.thermal_bubble_radius.max(floors::THERMAL_RADIUS),

        base_min_wind: base.base_min_wind,
        base_max_wind: base.base_max_wind,
        gust_prob_base: base.gust_prob_base,
        gust_strength_max: base.gust_strength_max,
        thermal_freq_base: base.thermal_freq_base,
    }
}

/// Resolve what a segment asks for: a fixed duty, or preset + style + adjust
pub fn resolve_segment(dict: &WindProfileDict, segment: &Segment) -> ResolvedWind {
    match segment.mode {
        SegmentMode::Fixed => ResolvedWind {
            valid: true,
            fixed_mode: true,
            fixed_speed: clamp_percent(segment.fixed_speed),
            ..Default::default()
        },
        SegmentMode::Preset => resolve(
            dict,
            &segment.preset_code,
            Some(segment.style_code.as_str()),
            Some(&segment.adjust),
        ),
    }
}
