//! # Control Panel
//!
//! External access to the tunables: read and write any parameter by name,
//! toggle pause, fire a manual glitch, resize the surface. Commands can be
//! issued directly or scheduled from a small text script:
//!
//! ```text
//! # frame  command
//! @0    set scanline_speed 0.4
//! @120  trigger
//! @180  pause
//! @240  resume
//! @300  resize 800 600
//! ```

use std::path::Path;
use std::str::FromStr;

use tracing::{info, warn};

use crate::effect::params::{param_specs, ParamHandle, ParamSpec, ParamValue, PAUSED};
use crate::error::{ConfigError, ParamError, Result};
use crate::surface::types::SurfaceSize;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    Set { name: String, value: ParamValue },
    Reset { name: String },
    Pause(bool),
    Trigger,
    Resize(SurfaceSize),
}

impl FromStr for ControlCommand {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let words: Vec<&str> = s.split_whitespace().collect();
        match words.as_slice() {
            ["set", name, value] => {
                let value = ParamValue::parse(value)
                    .ok_or_else(|| format!("cannot parse value '{}'", value))?;
                Ok(ControlCommand::Set { name: name.to_string(), value })
            }
            ["reset", name] => Ok(ControlCommand::Reset { name: name.to_string() }),
            ["pause"] => Ok(ControlCommand::Pause(true)),
            ["resume"] => Ok(ControlCommand::Pause(false)),
            ["trigger"] => Ok(ControlCommand::Trigger),
            ["resize", w, h] => {
                let width = w.parse().map_err(|_| format!("bad width '{}'", w))?;
                let height = h.parse().map_err(|_| format!("bad height '{}'", h))?;
                Ok(ControlCommand::Resize(SurfaceSize::new(width, height)))
            }
            [] => Err("empty command".to_string()),
            [verb, ..] => Err(format!("unknown command '{}'", verb)),
        }
    }
}

/// Parse a `name=value` assignment as given to `--set`
pub fn parse_assignment(text: &str) -> std::result::Result<(String, ParamValue), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", text))?;
    let value = ParamValue::parse(value).ok_or_else(|| format!("cannot parse value '{}'", value))?;
    Ok((name.trim().to_string(), value))
}

/// What the engine still has to do after the panel handled a command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Routed {
    /// Parameter store updated
    Applied,
    /// Fire a glitch through the scheduler
    Trigger,
    /// Resize the surface
    Resize(SurfaceSize),
}

/// Get/set access to every parameter, backed by the shared store
#[derive(Debug, Clone)]
pub struct ControlPanel {
    params: ParamHandle,
}

impl ControlPanel {
    pub fn new(params: ParamHandle) -> Self {
        Self { params }
    }

    pub fn get(&self, name: &str) -> std::result::Result<ParamValue, ParamError> {
        self.params.get(name).ok_or_else(|| ParamError::Unknown { name: name.to_string() })
    }

    pub fn set<V: Into<ParamValue>>(&self, name: &str, value: V) -> std::result::Result<ParamValue, ParamError> {
        self.params.set(name, value)
    }

    pub fn specs(&self) -> &'static [ParamSpec] {
        param_specs()
    }

    pub fn reset_defaults(&self) {
        self.params.borrow_mut().reset_all();
    }

    /// Apply parameter commands; hand trigger and resize back to the caller
    pub fn apply(&self, command: &ControlCommand) -> std::result::Result<Routed, ParamError> {
        match command {
            ControlCommand::Set { name, value } => {
                let stored = self.params.set(name, *value)?;
                info!("Control: {} = {}", name, stored);
                Ok(Routed::Applied)
            }
            ControlCommand::Reset { name } => {
                let stored = self.params.borrow_mut().reset(name)?;
                info!("Control: {} reset to {}", name, stored);
                Ok(Routed::Applied)
            }
            ControlCommand::Pause(paused) => {
                self.params.set(PAUSED, *paused)?;
                info!("Control: {}", if *paused { "paused" } else { "resumed" });
                Ok(Routed::Applied)
            }
            ControlCommand::Trigger => Ok(Routed::Trigger),
            ControlCommand::Resize(size) => Ok(Routed::Resize(*size)),
        }
    }

    /// One line per parameter: name, current value, range and description
    pub fn describe(&self) -> Vec<String> {
        let set = self.params.borrow();
        param_specs()
            .iter()
            .map(|spec| {
                let current = set.get(spec.name).unwrap_or(spec.default);
                let range = match spec.default {
                    ParamValue::Bool(_) => "on/off".to_string(),
                    ParamValue::Float(_) => format!("{} - {}", spec.min, spec.max),
                };
                format!("{:<26} {:>8}  [{}]  {}", spec.name, current.to_string(), range, spec.description)
            })
            .collect()
    }
}

/// Control commands keyed by the frame they fire on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlScript {
    entries: Vec<(u64, ControlCommand)>,
}

impl ControlScript {
    pub fn parse(text: &str) -> std::result::Result<Self, ConfigError> {
        let mut entries = Vec::new();

        for (i, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let script_error = |reason: String| ConfigError::ScriptParse { line: i + 1, reason };

            let (at, command) = line
                .split_once(char::is_whitespace)
                .ok_or_else(|| script_error("expected '@<frame> <command>'".to_string()))?;
            let frame = at
                .strip_prefix('@')
                .and_then(|f| f.parse::<u64>().ok())
                .ok_or_else(|| script_error(format!("bad frame marker '{}'", at)))?;
            let command = command.trim().parse::<ControlCommand>().map_err(script_error)?;

            entries.push((frame, command));
        }

        entries.sort_by_key(|(frame, _)| *frame);
        Ok(Self { entries })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;
        let script = Self::parse(&text)?;
        if script.entries.is_empty() {
            warn!("Control script {:?} has no commands", path);
        }
        Ok(script)
    }

    pub fn entries(&self) -> &[(u64, ControlCommand)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::params::{ParameterSet, NOISE_INTENSITY};

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "set noise_intensity 0.2".parse::<ControlCommand>().unwrap(),
            ControlCommand::Set { name: NOISE_INTENSITY.to_string(), value: ParamValue::Float(0.2) }
        );
        assert_eq!("trigger".parse::<ControlCommand>().unwrap(), ControlCommand::Trigger);
        assert_eq!("resume".parse::<ControlCommand>().unwrap(), ControlCommand::Pause(false));
        assert_eq!(
            "resize 800 600".parse::<ControlCommand>().unwrap(),
            ControlCommand::Resize(SurfaceSize::new(800, 600))
        );
        assert!("explode".parse::<ControlCommand>().is_err());
        assert!("set noise_intensity loud".parse::<ControlCommand>().is_err());
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("paused=true").unwrap(), ("paused".to_string(), ParamValue::Bool(true)));
        assert_eq!(parse_assignment(" image_scale = 0.5").unwrap().1, ParamValue::Float(0.5));
        assert!(parse_assignment("image_scale").is_err());
    }

    #[test]
    fn test_panel_edits_shared_store() {
        let params = ParamHandle::new(ParameterSet::new());
        let panel = ControlPanel::new(params.clone());

        assert_eq!(panel.apply(&ControlCommand::Pause(true)).unwrap(), Routed::Applied);
        assert!(params.snapshot().paused);

        panel.set(NOISE_INTENSITY, 0.3).unwrap();
        assert_eq!(params.get(NOISE_INTENSITY), Some(ParamValue::Float(0.3)));

        panel.reset_defaults();
        assert_eq!(panel.get(NOISE_INTENSITY).unwrap(), ParamValue::Float(0.05));
        assert!(!params.snapshot().paused);

        assert_eq!(panel.apply(&ControlCommand::Trigger).unwrap(), Routed::Trigger);
        assert!(panel.get("nope").is_err());
        assert_eq!(panel.describe().len(), panel.specs().len());
    }

    #[test]
    fn test_script_parsing() {
        let script = ControlScript::parse(
            "# warm up\n@120 trigger\n@0 set scanline_speed 0.4  # faster\n\n@60 pause\n",
        ).unwrap();
        let frames: Vec<u64> = script.entries().iter().map(|(f, _)| *f).collect();
        assert_eq!(frames, vec![0, 60, 120]);
        assert_eq!(script.entries()[2].1, ControlCommand::Trigger);
    }

    #[test]
    fn test_script_errors_name_the_line() {
        match ControlScript::parse("@1 trigger\n12 pause\n") {
            Err(ConfigError::ScriptParse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(ControlScript::parse("@x trigger").is_err());
        assert!(ControlScript::parse("@5 dance").is_err());
    }
}
