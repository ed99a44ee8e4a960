use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::{RingClosureError, Result};

/// How closability of a candidate ring is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClosabilityMode {
    /// Accept anything the ring-size rules accept.
    #[default]
    #[serde(rename = "RING_SIZE")]
    RingSize,
    /// Element and pattern criteria on the ring constitution.
    #[serde(rename = "CONSTITUTION")]
    Constitution,
    /// Torsional search for a closable conformation.
    #[serde(rename = "3D-CONFORMATION")]
    Conformation3D,
    #[serde(rename = "CONSTITUTION_AND_3D-CONFORMATION")]
    ConstitutionAnd3D,
}

impl ClosabilityMode {
    pub fn checks_constitution(self) -> bool {
        matches!(self, Self::Constitution | Self::ConstitutionAnd3D)
    }

    pub fn checks_conformation(self) -> bool {
        matches!(self, Self::Conformation3D | Self::ConstitutionAnd3D)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::RingSize => "RING_SIZE",
            Self::Constitution => "CONSTITUTION",
            Self::Conformation3D => "3D-CONFORMATION",
            Self::ConstitutionAnd3D => "CONSTITUTION_AND_3D-CONFORMATION",
        }
    }
}

impl fmt::Display for ClosabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ClosabilityMode {
    type Err = RingClosureError;

    /// Accepts the mode names and the numeric codes -1, 0, 1 and 2.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RING_SIZE" | "-1" => Ok(Self::RingSize),
            "CONSTITUTION" | "0" => Ok(Self::Constitution),
            "3D-CONFORMATION" | "1" => Ok(Self::Conformation3D),
            "CONSTITUTION_AND_3D-CONFORMATION" | "2" => Ok(Self::ConstitutionAnd3D),
            _ => Err(invalid("EVALUATIONCLOSABILITYMODE", s, "unknown closability mode")),
        }
    }
}

/// Settings of the ring-closure machinery.
///
/// Built with [`Default`], deserialized from JSON, or read from
/// `RC-KEYWORD=value` lines with [`from_keywords`](Self::from_keywords). Call
/// [`check`](Self::check) before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RingClosureParams {
    pub enabled: bool,
    pub mode: ClosabilityMode,
    /// Chains with more than `max_rot_bonds + 2` atoms skip the torsional
    /// search and are assumed closable.
    pub max_rot_bonds: usize,
    /// Rings must be strictly smaller than this.
    pub max_ring_size: usize,
    pub min_rcv_per_type: usize,
    pub max_rcv_per_type: usize,
    pub min_ring_closures: usize,
    pub max_ring_closures: usize,
    /// Degrees. Bonds flanked by a wider angle are not rotated.
    pub linearity_limit: f64,
    pub distance_tolerance: f64,
    pub extra_distance_tolerance: f64,
    pub max_dot: f64,
    /// Degrees.
    pub conf_search_step: f64,
    /// Weight by ring size; index is the number of ring members.
    pub ring_size_bias: Vec<u32>,
    /// Element symbols, at least one of which must be in the ring.
    pub required_elements: Vec<String>,
    /// Ring patterns, at least one of which must match.
    pub patterns: Vec<String>,
    pub exhaustive_conf_search: bool,
    pub check_interdependent_chains: bool,
    pub archive_index: Option<PathBuf>,
    pub archive_folder: Option<PathBuf>,
}

impl Default for RingClosureParams {
    fn default() -> Self {
        let max_ring_size = 9;
        let mut ring_size_bias = vec![0; max_ring_size + 1];
        ring_size_bias[5] = 2;
        ring_size_bias[6] = 4;
        ring_size_bias[7] = 1;
        Self {
            enabled: false,
            mode: ClosabilityMode::RingSize,
            max_rot_bonds: 7,
            max_ring_size,
            min_rcv_per_type: 0,
            max_rcv_per_type: 50,
            min_ring_closures: 0,
            max_ring_closures: 50,
            linearity_limit: 178.5,
            distance_tolerance: 0.33,
            extra_distance_tolerance: 1.1,
            max_dot: -0.75,
            conf_search_step: 12.0,
            ring_size_bias,
            required_elements: Vec::new(),
            patterns: Vec::new(),
            exhaustive_conf_search: false,
            check_interdependent_chains: false,
            archive_index: None,
            archive_folder: None,
        }
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> RingClosureError {
    RingClosureError::InvalidParameter {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Torsion scan steps must split a full turn into a finite number of
/// rotations.
pub(crate) fn check_search_step(step: f64) -> Result<()> {
    if step > 0.0 && step <= 360.0 {
        Ok(())
    } else {
        Err(invalid("CONFSEARCHSTEP", &step.to_string(), "must be in (0, 360]"))
    }
}

fn parse_num<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, value, "not a valid number"))
}

impl RingClosureParams {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reads `RC-KEYWORD[=value]` lines. Blank lines and `#` comments are
    /// skipped.
    pub fn from_keywords(text: &str) -> Result<Self> {
        let mut params = Self::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            params.interpret_keyword(line)?;
        }
        Ok(params)
    }

    pub fn interpret_keyword(&mut self, line: &str) -> Result<()> {
        let (raw_key, value) = match line.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (line.trim(), ""),
        };
        let upper = raw_key.to_ascii_uppercase();
        let key = upper.strip_prefix("RC-").unwrap_or(&upper);
        match key {
            "CLOSERINGS" => self.enabled = true,
            "EXHAUSTIVECONFSEARCH" => self.exhaustive_conf_search = true,
            "CHECKINTERDEPENDENTCHAINS" => self.check_interdependent_chains = true,
            "EVALUATIONCLOSABILITYMODE" => self.mode = value.parse()?,
            "MAXROTBONDS" => self.max_rot_bonds = parse_num(key, value)?,
            "MAXSIZENEWRINGS" => {
                self.max_ring_size = parse_num(key, value)?;
                if self.ring_size_bias.len() <= self.max_ring_size {
                    self.ring_size_bias.resize(self.max_ring_size + 1, 0);
                }
            }
            "MINRCAPERTYPEPERGRAPH" => self.min_rcv_per_type = parse_num(key, value)?,
            "MAXRCAPERTYPEPERGRAPH" => self.max_rcv_per_type = parse_num(key, value)?,
            "MINNUMBEROFRINGCLOSURES" => self.min_ring_closures = parse_num(key, value)?,
            "MAXNUMBERRINGCLOSURES" => self.max_ring_closures = parse_num(key, value)?,
            "LINEARITYLIMIT" => self.linearity_limit = parse_num(key, value)?,
            "DISTANCETOLERANCEFACTOR" => self.distance_tolerance = parse_num(key, value)?,
            "EXTRADISTANCETOLERANCEFACTOR" => {
                self.extra_distance_tolerance = parse_num(key, value)?
            }
            "MAXDOTPROD" => self.max_dot = parse_num(key, value)?,
            "CONFSEARCHSTEP" => self.conf_search_step = parse_num(key, value)?,
            "RINGSIZEBIAS" => self.set_ring_size_bias_from(value)?,
            "CLOSABLERINGSMARTS" => self.patterns.push(value.to_string()),
            "REQUIREDELEMENTINRINGS" => self
                .required_elements
                .extend(value.split_whitespace().map(str::to_string)),
            "RCCINDEX" => self.archive_index = Some(PathBuf::from(value)),
            "RCCFOLDER" => self.archive_folder = Some(PathBuf::from(value)),
            _ => return Err(RingClosureError::UnknownKeyword(raw_key.to_string())),
        }
        Ok(())
    }

    /// `"size weight"`, both non-negative integers.
    fn set_ring_size_bias_from(&mut self, value: &str) -> Result<()> {
        const KEY: &str = "RINGSIZEBIAS";
        let parts: Vec<&str> = value.split_whitespace().collect();
        let [size, weight] = parts[..] else {
            return Err(invalid(KEY, value, "expected 'size weight'"));
        };
        let size: i64 = size
            .parse()
            .map_err(|_| invalid(KEY, value, "ring size is not an integer"))?;
        let weight: i64 = weight
            .parse()
            .map_err(|_| invalid(KEY, value, "weight is not an integer"))?;
        if size < 0 {
            return Err(invalid(KEY, value, "ring size must not be negative"));
        }
        let weight = u32::try_from(weight)
            .map_err(|_| invalid(KEY, value, "weight must not be negative"))?;
        self.set_ring_size_bias(size as usize, weight);
        Ok(())
    }

    /// Sets the weight of one ring size. A size beyond the current maximum
    /// raises the maximum so that the size becomes reachable.
    pub fn set_ring_size_bias(&mut self, size: usize, weight: u32) {
        if self.ring_size_bias.len() <= size {
            self.ring_size_bias.resize(size + 1, 0);
        }
        self.ring_size_bias[size] = weight;
        if size >= self.max_ring_size {
            self.max_ring_size = size + 1;
        }
    }

    pub fn ring_size_weight(&self, size: usize) -> u32 {
        if size >= self.max_ring_size {
            return 0;
        }
        self.ring_size_bias.get(size).copied().unwrap_or(0)
    }

    /// Validates the settings and derives dependent ones.
    pub fn check(&mut self) -> Result<()> {
        if !self.enabled {
            return Err(RingClosureError::Disabled);
        }
        if self.min_rcv_per_type > self.max_rcv_per_type {
            return Err(RingClosureError::InvertedRange {
                what: "number of ring-closing vertices per type",
                min: self.min_rcv_per_type,
                max: self.max_rcv_per_type,
            });
        }
        if self.min_ring_closures > self.max_ring_closures {
            return Err(RingClosureError::InvertedRange {
                what: "number of ring closures",
                min: self.min_ring_closures,
                max: self.max_ring_closures,
            });
        }
        check_search_step(self.conf_search_step)?;
        if !(self.distance_tolerance > 0.0) || !(self.extra_distance_tolerance > 0.0) {
            return Err(invalid(
                "DISTANCETOLERANCEFACTOR",
                &format!("{} {}", self.distance_tolerance, self.extra_distance_tolerance),
                "tolerance factors must be positive",
            ));
        }
        if self.check_interdependent_chains && !self.exhaustive_conf_search {
            warn!("interdependent chain checks need all closable conformations; enabling exhaustive search");
            self.exhaustive_conf_search = true;
        }
        if self.exhaustive_conf_search {
            warn!("exhaustive conformational search is enabled; ring closure evaluation will be slow");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_prefer_five_and_six_membered_rings() {
        let p = RingClosureParams::default();
        assert_eq!(p.ring_size_bias, vec![0, 0, 0, 0, 0, 2, 4, 1, 0, 0]);
        assert_eq!(p.ring_size_weight(6), 4);
        assert_eq!(p.ring_size_weight(9), 0);
        assert_eq!(p.ring_size_weight(42), 0);
        assert_eq!(p.mode, ClosabilityMode::RingSize);
        assert!(!p.enabled);
    }

    #[test]
    fn keywords_are_interpreted() {
        let p = RingClosureParams::from_keywords(
            "# ring closure settings\n\
             RC-CLOSERINGS\n\
             RC-EVALUATIONCLOSABILITYMODE=CONSTITUTION_AND_3D-CONFORMATION\n\
             RC-MAXROTBONDS=5\n\
             RC-CONFSEARCHSTEP=30\n\
             RC-RINGSIZEBIAS=8 3\n\
             RC-REQUIREDELEMENTINRINGS=O N\n\
             RC-CLOSABLERINGSMARTS=[#6]1[#6][#8][#6][#6][#6]1\n\
             RC-RCCINDEX=/tmp/index.txt\n\
             \n\
             RC-CHECKINTERDEPENDENTCHAINS\n",
        )
        .unwrap();
        assert!(p.enabled);
        assert_eq!(p.mode, ClosabilityMode::ConstitutionAnd3D);
        assert_eq!(p.max_rot_bonds, 5);
        assert_eq!(p.conf_search_step, 30.0);
        assert_eq!(p.ring_size_weight(8), 3);
        assert_eq!(p.required_elements, vec!["O", "N"]);
        assert_eq!(p.patterns, vec!["[#6]1[#6][#8][#6][#6][#6]1"]);
        assert_eq!(p.archive_index, Some(PathBuf::from("/tmp/index.txt")));
        assert!(p.check_interdependent_chains);
    }

    #[test]
    fn bias_beyond_max_extends_the_table() {
        let mut p = RingClosureParams::default();
        p.interpret_keyword("RC-RINGSIZEBIAS=12 5").unwrap();
        assert_eq!(p.ring_size_bias.len(), 13);
        assert_eq!(p.max_ring_size, 13);
        assert_eq!(p.ring_size_weight(12), 5);
    }

    #[test]
    fn malformed_values_are_fatal() {
        let mut p = RingClosureParams::default();
        for line in [
            "RC-RINGSIZEBIAS=6",
            "RC-RINGSIZEBIAS=6 x",
            "RC-RINGSIZEBIAS=-1 2",
            "RC-RINGSIZEBIAS=6 -2",
            "RC-MAXROTBONDS=many",
            "RC-EVALUATIONCLOSABILITYMODE=GUESS",
        ] {
            assert!(
                matches!(
                    p.interpret_keyword(line),
                    Err(RingClosureError::InvalidParameter { .. })
                ),
                "{line}"
            );
        }
        assert!(matches!(
            p.interpret_keyword("RC-NOSUCHTHING=1"),
            Err(RingClosureError::UnknownKeyword(_))
        ));
    }

    #[test]
    fn check_rejects_disabled_and_inverted_ranges() {
        let mut p = RingClosureParams::default();
        assert!(matches!(p.check(), Err(RingClosureError::Disabled)));

        let mut p = RingClosureParams::enabled();
        p.min_ring_closures = 4;
        p.max_ring_closures = 2;
        assert!(matches!(p.check(), Err(RingClosureError::InvertedRange { .. })));

        let mut p = RingClosureParams::enabled();
        p.min_rcv_per_type = 3;
        p.max_rcv_per_type = 1;
        assert!(matches!(p.check(), Err(RingClosureError::InvertedRange { .. })));

        let mut p = RingClosureParams::enabled();
        p.conf_search_step = 0.0;
        assert!(matches!(p.check(), Err(RingClosureError::InvalidParameter { .. })));
    }

    #[test]
    fn interdependent_checks_force_exhaustive_search() {
        let mut p = RingClosureParams::enabled();
        p.check_interdependent_chains = true;
        p.check().unwrap();
        assert!(p.exhaustive_conf_search);
    }

    #[test]
    fn json_uses_defaults_for_missing_fields() {
        let p = RingClosureParams::from_json_str(
            r#"{"enabled": true, "mode": "3D-CONFORMATION", "conf_search_step": 30.0}"#,
        )
        .unwrap();
        assert!(p.enabled);
        assert_eq!(p.mode, ClosabilityMode::Conformation3D);
        assert_eq!(p.max_rot_bonds, 7);
        assert!(RingClosureParams::from_json_str(r#"{"bogus": 1}"#).is_err());
    }
}
