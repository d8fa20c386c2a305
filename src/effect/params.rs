use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ParamError;

// Glitch timing
pub const GLITCH_FREQUENCY: &str = "glitch_frequency";
pub const GLITCH_DURATION: &str = "glitch_duration";
pub const MIN_GLITCH_INTENSITY: &str = "min_glitch_intensity";
pub const MAX_GLITCH_INTENSITY: &str = "max_glitch_intensity";

// Scanline shape
pub const SCANLINE_SPEED: &str = "scanline_speed";
pub const SCANLINE_INTENSITY: &str = "scanline_intensity";
pub const THICK_SCANLINE_SPEED: &str = "thick_scanline_speed";
pub const THICK_SCANLINE_INTENSITY: &str = "thick_scanline_intensity";
pub const SCANLINE_GLITCH_THRESHOLD: &str = "scanline_glitch_threshold";

// Distortion shape
pub const HORIZONTAL_DISTORTION: &str = "horizontal_distortion";
pub const SCANLINE_JITTER: &str = "scanline_jitter";
pub const VERTICAL_GLITCH_BARS: &str = "vertical_glitch_bars";
pub const RGB_SHIFT_INTENSITY: &str = "rgb_shift_intensity";

// Color grading, grain, vignette
pub const COLOR_R: &str = "color_r";
pub const COLOR_G: &str = "color_g";
pub const COLOR_B: &str = "color_b";
pub const NOISE_INTENSITY: &str = "noise_intensity";
pub const VIGNETTE_STRENGTH: &str = "vignette_strength";

// Display and playback
pub const IMAGE_SCALE: &str = "image_scale";
pub const PAUSED: &str = "paused";

/// A single tunable value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Float(f32),
}

impl ParamValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Float(_) => None,
        }
    }

    /// Parse a control-panel style textual value (`0.4`, `true`, `off`, ...)
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" => Some(ParamValue::Bool(true)),
            "false" | "off" | "no" => Some(ParamValue::Bool(false)),
            other => other.parse::<f32>().ok().map(ParamValue::Float),
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Float(value as f32)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Float,
    Bool,
}

impl ParamKind {
    fn label(&self) -> &'static str {
        match self {
            ParamKind::Float => "numeric",
            ParamKind::Bool => "boolean",
        }
    }
}

/// Name, kind, valid range and default of one tunable
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub min: f32,
    pub max: f32,
    pub default: ParamValue,
    pub description: &'static str,
}

impl ParamSpec {
    const fn float(
        name: &'static str,
        min: f32,
        max: f32,
        default: f32,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind: ParamKind::Float,
            min,
            max,
            default: ParamValue::Float(default),
            description,
        }
    }

    const fn flag(name: &'static str, default: bool, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Bool,
            min: 0.0,
            max: 1.0,
            default: ParamValue::Bool(default),
            description,
        }
    }

    /// Bring a value into this parameter's range.
    ///
    /// Returns the stored value and whether it had to be clamped.
    pub fn sanitize(&self, value: ParamValue) -> Result<(ParamValue, bool), ParamError> {
        match (self.kind, value) {
            (ParamKind::Float, ParamValue::Float(v)) => {
                if !v.is_finite() {
                    return Err(ParamError::NotFinite { name: self.name.to_string(), value: v });
                }
                let clamped = v.clamp(self.min, self.max);
                Ok((ParamValue::Float(clamped), clamped != v))
            }
            (ParamKind::Bool, ParamValue::Bool(_)) => Ok((value, false)),
            (kind, _) => Err(ParamError::KindMismatch {
                name: self.name.to_string(),
                expected: kind.label().to_string(),
            }),
        }
    }
}

static PARAM_SPECS: &[ParamSpec] = &[
    ParamSpec::float(
        GLITCH_FREQUENCY,
        0.0,
        1.0,
        0.5,
        "Chance of a glitch per wake-up; also shortens the wait between wake-ups",
    ),
    ParamSpec::float(
        GLITCH_DURATION,
        16.0,
        5000.0,
        350.0,
        "How long a glitch burst holds its target intensity (ms)",
    ),
    ParamSpec::float(
        MIN_GLITCH_INTENSITY,
        0.0,
        2.0,
        0.3,
        "Lower bound of a burst's target intensity",
    ),
    ParamSpec::float(
        MAX_GLITCH_INTENSITY,
        0.0,
        2.0,
        1.3,
        "Upper bound of a burst's target intensity",
    ),
    ParamSpec::float(SCANLINE_SPEED, 0.0, 2.0, 0.15, "Vertical scroll speed of the fine scanlines"),
    ParamSpec::float(
        SCANLINE_INTENSITY,
        0.0,
        0.5,
        0.04,
        "Darkening amplitude of the fine scanlines",
    ),
    ParamSpec::float(
        THICK_SCANLINE_SPEED,
        0.0,
        1.0,
        0.03,
        "Extra scroll speed of the thick scanline bands",
    ),
    ParamSpec::float(
        THICK_SCANLINE_INTENSITY,
        0.0,
        0.5,
        0.02,
        "Darkening amplitude of the thick scanline bands",
    ),
    ParamSpec::float(
        SCANLINE_GLITCH_THRESHOLD,
        0.0,
        1.0,
        0.98,
        "Hash value above which a scanline glitches and bleeds color",
    ),
    ParamSpec::float(
        HORIZONTAL_DISTORTION,
        0.0,
        0.5,
        0.1,
        "Horizontal tearing per unit of glitch intensity",
    ),
    ParamSpec::float(
        SCANLINE_JITTER,
        0.0,
        0.2,
        0.03,
        "Extra horizontal jitter on the rare wonky scanlines",
    ),
    ParamSpec::float(
        VERTICAL_GLITCH_BARS,
        0.0,
        1.0,
        0.2,
        "Offset of the sparse glitch bars per unit of intensity",
    ),
    ParamSpec::float(
        RGB_SHIFT_INTENSITY,
        0.0,
        0.1,
        0.01,
        "Red/blue channel separation per unit of intensity",
    ),
    ParamSpec::float(COLOR_R, 0.0, 2.0, 1.1, "Red channel grading multiplier"),
    ParamSpec::float(COLOR_G, 0.0, 2.0, 0.95, "Green channel grading multiplier"),
    ParamSpec::float(COLOR_B, 0.0, 2.0, 0.9, "Blue channel grading multiplier"),
    ParamSpec::float(NOISE_INTENSITY, 0.0, 0.5, 0.05, "Amount of additive grain"),
    ParamSpec::float(VIGNETTE_STRENGTH, 0.0, 2.0, 0.3, "Radial darkening toward the image edges"),
    ParamSpec::float(
        IMAGE_SCALE,
        0.1,
        2.0,
        0.8,
        "Displayed image size relative to the fitted size",
    ),
    ParamSpec::flag(PAUSED, false, "Freeze the animation clock (glitch smoothing keeps running)"),
];

/// Look up a parameter definition by name
pub fn param_spec(name: &str) -> Option<&'static ParamSpec> {
    PARAM_SPECS.iter().find(|spec| spec.name == name)
}

/// All known parameters in display order
pub fn param_specs() -> &'static [ParamSpec] {
    PARAM_SPECS
}

/// Named tunables with range-checked values
///
/// Every known parameter is always present. Values are clamped into their
/// declared range on the way in, so readers never see an out-of-range value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, ParamValue>", into = "BTreeMap<String, ParamValue>")]
pub struct ParameterSet {
    values: BTreeMap<String, ParamValue>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterSet {
    /// Create a set holding every parameter at its default
    pub fn new() -> Self {
        let values = PARAM_SPECS
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default))
            .collect();
        Self { values }
    }

    /// Set a parameter, clamping it into range.
    ///
    /// Returns the value actually stored.
    pub fn set<V: Into<ParamValue>>(
        &mut self,
        name: &str,
        value: V,
    ) -> Result<ParamValue, ParamError> {
        let spec = param_spec(name).ok_or_else(|| ParamError::Unknown { name: name.to_string() })?;
        let requested = value.into();
        let (stored, clamped) = spec.sanitize(requested)?;
        if clamped {
            warn!("Parameter {} = {} is out of range [{}, {}], clamped to {}",
                  name, requested, spec.min, spec.max, stored);
        }
        self.values.insert(name.to_string(), stored);
        Ok(stored)
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    pub fn get_f32(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(|v| v.as_f32())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|v| v.as_bool())
    }

    /// Put every parameter back to its default
    pub fn reset_all(&mut self) {
        for spec in PARAM_SPECS {
            self.values.insert(spec.name.to_string(), spec.default);
        }
    }

    /// Reset one parameter to its default
    pub fn reset(&mut self, name: &str) -> Result<ParamValue, ParamError> {
        let spec = param_spec(name).ok_or_else(|| ParamError::Unknown { name: name.to_string() })?;
        self.values.insert(name.to_string(), spec.default);
        Ok(spec.default)
    }

    pub fn is_paused(&self) -> bool {
        self.get_bool(PAUSED).unwrap_or(false)
    }

    /// Iterate over `(name, value)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Typed copy of the current values, read once per frame
    pub fn snapshot(&self) -> EffectParams {
        let f = |name: &str| {
            self.get_f32(name)
                .or_else(|| param_spec(name).and_then(|s| s.default.as_f32()))
                .unwrap_or(0.0)
        };

        EffectParams {
            glitch_frequency: f(GLITCH_FREQUENCY),
            glitch_duration_ms: f(GLITCH_DURATION),
            min_glitch_intensity: f(MIN_GLITCH_INTENSITY),
            max_glitch_intensity: f(MAX_GLITCH_INTENSITY),
            scanline_speed: f(SCANLINE_SPEED),
            scanline_intensity: f(SCANLINE_INTENSITY),
            thick_scanline_speed: f(THICK_SCANLINE_SPEED),
            thick_scanline_intensity: f(THICK_SCANLINE_INTENSITY),
            scanline_glitch_threshold: f(SCANLINE_GLITCH_THRESHOLD),
            horizontal_distortion: f(HORIZONTAL_DISTORTION),
            scanline_jitter: f(SCANLINE_JITTER),
            vertical_glitch_bars: f(VERTICAL_GLITCH_BARS),
            rgb_shift_intensity: f(RGB_SHIFT_INTENSITY),
            color_grade: [f(COLOR_R), f(COLOR_G), f(COLOR_B)],
            noise_intensity: f(NOISE_INTENSITY),
            vignette_strength: f(VIGNETTE_STRENGTH),
            image_scale: f(IMAGE_SCALE),
            paused: self.is_paused(),
        }
    }
}

impl TryFrom<BTreeMap<String, ParamValue>> for ParameterSet {
    type Error = ParamError;

    fn try_from(map: BTreeMap<String, ParamValue>) -> Result<Self, Self::Error> {
        let mut set = ParameterSet::new();
        for (name, value) in map {
            set.set(&name, value)?;
        }
        Ok(set)
    }
}

impl From<ParameterSet> for BTreeMap<String, ParamValue> {
    fn from(set: ParameterSet) -> Self {
        set.values
    }
}

/// Plain snapshot of every tunable, as consumed by the shading pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    pub glitch_frequency: f32,
    pub glitch_duration_ms: f32,
    pub min_glitch_intensity: f32,
    pub max_glitch_intensity: f32,
    pub scanline_speed: f32,
    pub scanline_intensity: f32,
    pub thick_scanline_speed: f32,
    pub thick_scanline_intensity: f32,
    pub scanline_glitch_threshold: f32,
    pub horizontal_distortion: f32,
    pub scanline_jitter: f32,
    pub vertical_glitch_bars: f32,
    pub rgb_shift_intensity: f32,
    pub color_grade: [f32; 3],
    pub noise_intensity: f32,
    pub vignette_strength: f32,
    pub image_scale: f32,
    pub paused: bool,
}

impl Default for EffectParams {
    fn default() -> Self {
        ParameterSet::new().snapshot()
    }
}

/// Shared single-threaded handle to the one parameter store.
///
/// The frame driver, the glitch scheduler and the control panel each hold a
/// clone; edits made through any of them are seen by the others on their next
/// read.
#[derive(Debug, Clone, Default)]
pub struct ParamHandle(Rc<RefCell<ParameterSet>>);

impl ParamHandle {
    pub fn new(set: ParameterSet) -> Self {
        Self(Rc::new(RefCell::new(set)))
    }

    pub fn borrow(&self) -> Ref<'_, ParameterSet> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ParameterSet> {
        self.0.borrow_mut()
    }

    pub fn snapshot(&self) -> EffectParams {
        self.0.borrow().snapshot()
    }

    pub fn set<V: Into<ParamValue>>(
        &self,
        name: &str,
        value: V,
    ) -> Result<ParamValue, ParamError> {
        self.0.borrow_mut().set(name, value)
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.0.borrow().get(name)
    }
}
