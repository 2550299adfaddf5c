//! Fleet scale presets.

use amr_core::{CoreError, CoreResult};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleCounts {
    pub robots: u32,
    pub jobs: u32,
}

#[derive(Debug, Clone)]
pub struct ScaleMap {
    presets: HashMap<&'static str, ScaleCounts>,
}

const PRESET_NAMES: [&str; 4] = ["mini", "small", "demo", "large"];

impl Default for ScaleMap {
    fn default() -> Self {
        let mut presets = HashMap::new();
        presets.insert("mini", ScaleCounts { robots: 5, jobs: 5 });
        presets.insert("small", ScaleCounts { robots: 5, jobs: 25 });
        presets.insert("demo", ScaleCounts { robots: 10, jobs: 50 });
        presets.insert("large", ScaleCounts { robots: 20, jobs: 100 });
        Self { presets }
    }
}

impl ScaleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// When both overrides are set and positive, every preset is overwritten with the
    /// same counts — matching `_build_scale_map`'s global-override semantics exactly.
    pub fn with_overrides(mut self, robots: Option<u32>, jobs: Option<u32>) -> CoreResult<Self> {
        match (robots, jobs) {
            (Some(r), Some(j)) => {
                if r == 0 || j == 0 {
                    return Err(CoreError::Validation(
                        "robots/jobs override must both be > 0".into(),
                    ));
                }
                for name in PRESET_NAMES {
                    self.presets.insert(name, ScaleCounts { robots: r, jobs: j });
                }
                Ok(self)
            }
            (None, None) => Ok(self),
            _ => Err(CoreError::Validation(
                "robots/jobs overrides must be provided together".into(),
            )),
        }
    }

    pub fn get(&self, scale: &str) -> CoreResult<ScaleCounts> {
        self.presets
            .get(scale)
            .copied()
            .ok_or_else(|| CoreError::unknown_scale(scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_presets() {
        let map = ScaleMap::new();
        assert_eq!(map.get("demo").unwrap(), ScaleCounts { robots: 10, jobs: 50 });
    }

    #[test]
    fn test_unknown_scale_rejected() {
        let map = ScaleMap::new();
        assert!(map.get("huge").is_err());
    }

    #[test]
    fn test_override_must_be_joint() {
        let map = ScaleMap::new();
        assert!(map.clone().with_overrides(Some(3), None).is_err());
        assert!(map.clone().with_overrides(None, Some(3)).is_err());
    }

    #[test]
    fn test_override_overwrites_all_presets() {
        let map = ScaleMap::new().with_overrides(Some(7), Some(9)).unwrap();
        for name in PRESET_NAMES {
            assert_eq!(map.get(name).unwrap(), ScaleCounts { robots: 7, jobs: 9 });
        }
    }

    #[test]
    fn test_override_rejects_zero() {
        let map = ScaleMap::new();
        assert!(map.with_overrides(Some(0), Some(1)).is_err());
    }
}
