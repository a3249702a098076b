use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ExportError;
use crate::gradient::Gradient;

static RULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+[0-9]+(?:\.[0-9]+)?)(?:@([a-z0-9][a-z0-9-]*))?$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Enterprise,
    Mobile,
}

impl Domain {
    /// Namespace marker accepted in front of a domain name.
    pub const PREFIX: &'static str = "mitre-";

    pub fn parse(value: &str) -> Result<Self, ExportError> {
        let stripped = value.strip_prefix(Self::PREFIX).unwrap_or(value);
        match stripped {
            "enterprise" => Ok(Self::Enterprise),
            "mobile" => Ok(Self::Mobile),
            _ => Err(ExportError::UnknownDomain(value.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enterprise => "enterprise",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tactic {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtechnique {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub subtechniques: Vec<Subtechnique>,
    #[serde(default)]
    pub color: Option<String>,
}

impl Technique {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score: None,
            subtechniques: Vec::new(),
            color: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_subtechnique(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.subtechniques.push(Subtechnique {
            id: id.into(),
            name: name.into(),
            score: None,
            color: None,
        });
        self
    }
}

/// One matrix cell: a technique or a subtechnique.
pub trait MatrixEntry {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn score(&self) -> Option<f64>;
    fn color(&self) -> Option<&str>;
}

impl MatrixEntry for Technique {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn score(&self) -> Option<f64> {
        self.score
    }
    fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }
}

impl MatrixEntry for Subtechnique {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn score(&self) -> Option<f64> {
        self.score
    }
    fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticColumn {
    pub tactic: Tactic,
    #[serde(default)]
    pub techniques: Vec<Technique>,
}

impl TacticColumn {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tactic: Tactic {
                id: id.into(),
                name: name.into(),
            },
            techniques: Vec::new(),
        }
    }

    pub fn with_technique(mut self, technique: Technique) -> Self {
        self.techniques.push(technique);
        self
    }
}

/// Selects a technique id, either in one tactic or (`tactic == None`) in all of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchRule {
    #[serde(rename = "techniqueID")]
    pub technique_id: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub tactic: Option<String>,
}

impl MatchRule {
    pub fn any_tactic(technique_id: impl Into<String>) -> Self {
        Self {
            technique_id: technique_id.into(),
            tactic: None,
        }
    }

    pub fn in_tactic(technique_id: impl Into<String>, tactic: impl Into<String>) -> Self {
        Self {
            technique_id: technique_id.into(),
            tactic: Some(tactic.into()),
        }
    }

    pub fn matches(&self, technique_id: &str, tactic: &str) -> bool {
        self.technique_id == technique_id
            && self.tactic.as_deref().is_none_or(|scope| scope == tactic)
    }
}

impl FromStr for MatchRule {
    type Err = ExportError;

    /// Accepts `T1078` (any tactic) or `T1078@initial-access`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RULE_RE
            .captures(s.trim())
            .ok_or_else(|| ExportError::InvalidRule(s.to_string()))?;
        let technique_id = caps[1].to_string();
        Ok(match caps.get(2) {
            Some(tactic) => Self::in_tactic(technique_id, tactic.as_str()),
            None => Self::any_tactic(technique_id),
        })
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|scope| !scope.trim().is_empty()))
}

/// Records keyed by a [`MatchRule`].
pub trait Scoped {
    fn rule(&self) -> &MatchRule;
}

impl Scoped for MatchRule {
    fn rule(&self) -> &MatchRule {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    #[serde(flatten)]
    pub rule: MatchRule,
    pub score: f64,
}

impl Scoped for ScoreEntry {
    fn rule(&self) -> &MatchRule {
        &self.rule
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorOverride {
    #[serde(flatten)]
    pub rule: MatchRule,
    pub color: String,
}

impl Scoped for ColorOverride {
    fn rule(&self) -> &MatchRule {
        &self.rule
    }
}

/// Finds the entry for `(technique_id, tactic)`. A rule scoped to exactly
/// `tactic` wins over a wildcard rule; among equals the first one listed wins.
pub fn find_match<'a, T: Scoped>(entries: &'a [T], technique_id: &str, tactic: &str) -> Option<&'a T> {
    let mut wildcard = None;
    for entry in entries {
        let rule = entry.rule();
        if !rule.matches(technique_id, tactic) {
            continue;
        }
        if rule.tactic.is_some() {
            return Some(entry);
        }
        if wildcard.is_none() {
            wildcard = Some(entry);
        }
    }
    wildcard
}

/// Which text a technique cell and a column heading carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    NameOnly,
    IdOnly,
    Both,
    Neither,
}

impl DisplayMode {
    pub fn from_flags(show_name: bool, show_id: bool) -> Self {
        match (show_name, show_id) {
            (true, true) => Self::Both,
            (true, false) => Self::NameOnly,
            (false, true) => Self::IdOnly,
            (false, false) => Self::Neither,
        }
    }

    pub fn label(self, id: &str, name: &str) -> String {
        match self {
            Self::Both => format!("{id}: {name}"),
            Self::NameOnly => name.to_string(),
            Self::IdOnly => id.to_string(),
            Self::Neither => String::new(),
        }
    }
}

/// Technique order within each column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SortMode {
    #[default]
    NameAscending,
    NameDescending,
    ScoreAscending,
    ScoreDescending,
}

impl TryFrom<u8> for SortMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NameAscending),
            1 => Ok(Self::NameDescending),
            2 => Ok(Self::ScoreAscending),
            3 => Ok(Self::ScoreDescending),
            other => Err(format!("sort mode {other} out of range 0..=3")),
        }
    }
}

impl From<SortMode> for u8 {
    fn from(mode: SortMode) -> Self {
        match mode {
            SortMode::NameAscending => 0,
            SortMode::NameDescending => 1,
            SortMode::ScoreAscending => 2,
            SortMode::ScoreDescending => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub stages: Vec<String>,
}

impl Filters {
    pub fn platform_line(&self) -> String {
        self.platforms.join(", ")
    }

    pub fn first_stage(&self) -> &str {
        self.stages.first().map(String::as_str).unwrap_or("")
    }
}

fn default_true() -> bool {
    true
}

/// A scored overlay on the matrix, already materialized from its file form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub filters: Option<Filters>,
    #[serde(default)]
    pub gradient: Option<Gradient>,
    #[serde(default = "default_true")]
    pub show_name: bool,
    #[serde(default, rename = "showID")]
    pub show_id: bool,
    #[serde(default, rename = "sorting")]
    pub sort_mode: SortMode,
    #[serde(default)]
    pub scores: Vec<ScoreEntry>,
    #[serde(default)]
    pub color_overrides: Vec<ColorOverride>,
    #[serde(default)]
    pub visible_subtechniques: Vec<MatchRule>,
    #[serde(default)]
    pub excluded: Vec<MatchRule>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            filters: None,
            gradient: None,
            show_name: true,
            show_id: false,
            sort_mode: SortMode::default(),
            scores: Vec::new(),
            color_overrides: Vec::new(),
            visible_subtechniques: Vec::new(),
            excluded: Vec::new(),
        }
    }

    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn display_mode(&self) -> DisplayMode {
        DisplayMode::from_flags(self.show_name, self.show_id)
    }
}
