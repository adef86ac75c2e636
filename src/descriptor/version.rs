//! Version constraints for provider requirements.
//!
//! Constraints follow the operator set used by infrastructure descriptors
//! rather than Cargo's: a bare version is an exact pin, and `~>` is the
//! pessimistic operator that only lets the rightmost given component grow.
//!
//! | Constraint | Matches |
//! |------------|---------|
//! | `4.57.0` / `= 4.57.0` | exactly 4.57.0 |
//! | `!= 4.57.0` | anything but 4.57.0 |
//! | `>= 4.0, < 5.0` | 4.x |
//! | `~> 4.57` | `>= 4.57.0, < 5.0.0` |
//! | `~> 4.57.0` | `>= 4.57.0, < 4.58.0` |

use crate::error::{Error, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a single constraint clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// `~>`
    Pessimistic,
}

impl Operator {
    fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Pessimistic => "~>",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Clause {
    op: Operator,
    version: Version,
    /// Number of numeric components written (1..=3)
    precision: usize,
}

impl Clause {
    fn parse(raw: &str, whole: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::invalid_constraint(whole, "empty clause"));
        }

        // Longest operators first so ">=" is not read as ">".
        let (op, rest) = [
            ("~>", Operator::Pessimistic),
            (">=", Operator::Ge),
            ("<=", Operator::Le),
            ("!=", Operator::Ne),
            (">", Operator::Gt),
            ("<", Operator::Lt),
            ("=", Operator::Eq),
        ]
        .iter()
        .find_map(|(prefix, op)| raw.strip_prefix(prefix).map(|rest| (*op, rest)))
        .unwrap_or((Operator::Eq, raw));

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(Error::invalid_constraint(whole, "operator without a version"));
        }
        if !rest.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(Error::invalid_constraint(
                whole,
                format!("unrecognised operator or version '{}'", rest),
            ));
        }

        let (version, precision) = parse_partial_version(rest, whole)?;

        if op == Operator::Pessimistic && precision < 2 {
            return Err(Error::invalid_constraint(
                whole,
                "'~>' needs at least a major and minor version",
            ));
        }

        Ok(Self {
            op,
            version,
            precision,
        })
    }

    fn matches(&self, v: &Version) -> bool {
        match self.op {
            Operator::Eq => v == &self.version,
            Operator::Ne => v != &self.version,
            Operator::Gt => v > &self.version,
            Operator::Ge => v >= &self.version,
            Operator::Lt => v < &self.version,
            Operator::Le => v <= &self.version,
            Operator::Pessimistic => {
                // No upper bound once the growing component is already at u64::MAX.
                let upper = if self.precision == 2 {
                    self.version
                        .major
                        .checked_add(1)
                        .map(|major| Version::new(major, 0, 0))
                } else {
                    self.version
                        .minor
                        .checked_add(1)
                        .map(|minor| Version::new(self.version.major, minor, 0))
                };
                v >= &self.version && upper.map_or(true, |upper| v < &upper)
            }
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.version;
        let numeric = match self.precision {
            1 => format!("{}", v.major),
            2 => format!("{}.{}", v.major, v.minor),
            _ => format!("{}.{}.{}", v.major, v.minor, v.patch),
        };
        let pre = if v.pre.is_empty() {
            String::new()
        } else {
            format!("-{}", v.pre)
        };
        write!(f, "{} {}{}", self.op.as_str(), numeric, pre)
    }
}

/// Parses `X`, `X.Y` or `X.Y.Z[-pre]`, padding missing components with zero.
fn parse_partial_version(raw: &str, whole: &str) -> Result<(Version, usize)> {
    let (core, pre) = match raw.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (raw, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
        return Err(Error::invalid_constraint(
            whole,
            format!("version '{}' has more than three components", raw),
        ));
    }

    let mut numbers = [0u64; 3];
    for (i, part) in parts.iter().enumerate() {
        numbers[i] = part.parse().map_err(|_| {
            Error::invalid_constraint(whole, format!("'{}' is not a number in '{}'", part, raw))
        })?;
    }

    let mut version = Version::new(numbers[0], numbers[1], numbers[2]);
    if let Some(pre) = pre {
        if parts.len() != 3 {
            return Err(Error::invalid_constraint(
                whole,
                "pre-release versions must have three components",
            ));
        }
        version.pre = semver::Prerelease::new(pre)
            .map_err(|e| Error::invalid_constraint(whole, e.to_string()))?;
    }

    Ok((version, parts.len()))
}

/// A parsed, comma-separated set of version clauses. All clauses must hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionConstraint {
    clauses: Vec<Clause>,
}

impl VersionConstraint {
    /// Parse a constraint string such as `"4.57.0"` or `">= 1.2, < 2.0"`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(Error::invalid_constraint(raw, "constraint is empty"));
        }
        let clauses = raw
            .split(',')
            .map(|clause| Clause::parse(clause, raw))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { clauses })
    }

    /// Constraint that admits exactly `version`.
    pub fn exact(version: Version) -> Self {
        Self {
            clauses: vec![Clause {
                op: Operator::Eq,
                version,
                precision: 3,
            }],
        }
    }

    /// Constraint `>= major.minor`.
    pub fn at_least(major: u64, minor: u64) -> Self {
        Self {
            clauses: vec![Clause {
                op: Operator::Ge,
                version: Version::new(major, minor, 0),
                precision: 2,
            }],
        }
    }

    /// Returns true if `version` satisfies every clause.
    ///
    /// Pre-release versions only match a clause that pins them exactly.
    pub fn matches(&self, version: &Version) -> bool {
        if !version.pre.is_empty()
            && !self
                .clauses
                .iter()
                .any(|c| c.op == Operator::Eq && &c.version == version)
        {
            return false;
        }
        self.clauses.iter().all(|c| c.matches(version))
    }

    /// Returns the pinned version if this constraint is a single exact pin.
    pub fn exact_pin(&self) -> Option<&Version> {
        match self.clauses.as_slice() {
            [clause] if clause.op == Operator::Eq => Some(&clause.version),
            _ => None,
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pin) = self.exact_pin() {
            return write!(f, "{}", pin);
        }
        let rendered: Vec<String> = self.clauses.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join(", "))
    }
}

impl FromStr for VersionConstraint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionConstraint {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VersionConstraint> for String {
    fn from(value: VersionConstraint) -> Self {
        value.to_string()
    }
}
