use std::collections::BTreeSet;
use std::path::Path;

use ndnfw_dsa::{FaceId, Name, Status};
use serde::Deserialize;

use crate::error::FwError;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Outstanding-interest budget for faces without an explicit override.
    pub default_max_outstanding: usize,
    /// Depth of the event broadcast channel.
    pub event_capacity: usize,
    /// Status assigned to a next hop before the prober reports on it.
    pub initial_status: Status,
    pub rtt: RttConfig,
    pub scoring: ScoringConfig,
    pub decision: DecisionConfig,
    pub faces: Vec<FaceConfig>,
    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RttConfig {
    pub alpha: f64,
    pub beta: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScoringConfig {
    pub status_weight: f64,
    pub rtt_weight: f64,
    pub pi_weight: f64,
    pub cost_weight: f64,
    /// RTTs at or above this ceiling normalize to zero.
    pub rtt_ceiling_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DecisionConfig {
    pub exclude_red: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FaceConfig {
    pub id: FaceId,
    pub max_outstanding: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouteConfig {
    pub prefix: String,
    #[serde(default)]
    pub nexthops: Vec<NextHopConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NextHopConfig {
    pub face: FaceId,
    #[serde(default)]
    pub cost: i32,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            default_max_outstanding: 100,
            event_capacity: 1024,
            initial_status: Status::Yellow,
            rtt: RttConfig::default(),
            scoring: ScoringConfig::default(),
            decision: DecisionConfig::default(),
            faces: Vec::new(),
            routes: Vec::new(),
        }
    }
}

impl Default for RttConfig {
    fn default() -> Self {
        Self {
            alpha: 0.125,
            beta: 0.25,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            status_weight: 0.4,
            rtt_weight: 0.3,
            pi_weight: 0.2,
            cost_weight: 0.1,
            rtt_ceiling_ms: 1000,
        }
    }
}

impl ForwarderConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, FwError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FwError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    /// Budget for `face`, honoring per-face overrides.
    pub fn max_outstanding_for(&self, face: FaceId) -> usize {
        self.faces
            .iter()
            .find(|f| f.id == face)
            .and_then(|f| f.max_outstanding)
            .unwrap_or(self.default_max_outstanding)
    }

    pub fn validate(&self) -> Result<(), FwError> {
        if self.event_capacity == 0 {
            return Err(FwError::Config("event_capacity must be positive".into()));
        }
        for (key, gain) in [("rtt.alpha", self.rtt.alpha), ("rtt.beta", self.rtt.beta)] {
            if !(gain > 0.0 && gain <= 1.0) {
                return Err(FwError::Config(format!("{} must be in (0, 1], got {}", key, gain)));
            }
        }
        let weights = [
            ("scoring.status_weight", self.scoring.status_weight),
            ("scoring.rtt_weight", self.scoring.rtt_weight),
            ("scoring.pi_weight", self.scoring.pi_weight),
            ("scoring.cost_weight", self.scoring.cost_weight),
        ];
        for (key, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(FwError::Config(format!("{} must be finite and >= 0, got {}", key, weight)));
            }
        }
        if self.scoring.rtt_ceiling_ms == 0 {
            return Err(FwError::Config("scoring.rtt_ceiling_ms must be positive".into()));
        }

        let mut declared = BTreeSet::new();
        for face in &self.faces {
            if !declared.insert(face.id) {
                return Err(FwError::Config(format!("duplicate face {}", face.id)));
            }
        }
        for route in &self.routes {
            Name::parse(&route.prefix).map_err(|_| FwError::InvalidName(route.prefix.clone()))?;
            for hop in &route.nexthops {
                if !declared.contains(&hop.face) {
                    return Err(FwError::Config(format!(
                        "route {} names undeclared {}",
                        route.prefix, hop.face
                    )));
                }
            }
        }
        Ok(())
    }
}
