use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

use crate::error::MatrixError;
use crate::ir::{Domain, MatrixEntry, ScoreEntry, SortMode, TacticColumn, find_match};

pub trait MatrixProvider {
    /// Tactic columns for `domain` in matrix order.
    fn get_matrix(&self, domain: Domain) -> Result<Vec<TacticColumn>, MatrixError>;

    /// Canonical tactic key used by match rules, e.g. `"Initial Access"` -> `"initial-access"`.
    fn normalize_tactic_id(&self, name: &str) -> String {
        normalize_tactic_name(name)
    }

    /// Reorders techniques (and their subtechniques) inside every column.
    /// Column order is left untouched.
    fn adjust_ordering(
        &self,
        columns: Vec<TacticColumn>,
        sort: SortMode,
        scores: &[ScoreEntry],
    ) -> Vec<TacticColumn> {
        columns
            .into_iter()
            .map(|mut column| {
                let tactic = self.normalize_tactic_id(&column.tactic.name);
                sort_entries(&mut column.techniques, sort, scores, &tactic);
                for technique in &mut column.techniques {
                    sort_entries(&mut technique.subtechniques, sort, scores, &tactic);
                }
                column
            })
            .collect()
    }
}

impl<P: MatrixProvider + ?Sized> MatrixProvider for &P {
    fn get_matrix(&self, domain: Domain) -> Result<Vec<TacticColumn>, MatrixError> {
        (**self).get_matrix(domain)
    }

    fn normalize_tactic_id(&self, name: &str) -> String {
        (**self).normalize_tactic_id(name)
    }

    fn adjust_ordering(
        &self,
        columns: Vec<TacticColumn>,
        sort: SortMode,
        scores: &[ScoreEntry],
    ) -> Vec<TacticColumn> {
        (**self).adjust_ordering(columns, sort, scores)
    }
}

pub fn normalize_tactic_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

fn sort_entries<E: MatrixEntry>(entries: &mut [E], sort: SortMode, scores: &[ScoreEntry], tactic: &str) {
    let score_of = |entry: &E| {
        entry
            .score()
            .or_else(|| find_match(scores, entry.id(), tactic).map(|hit| hit.score))
            .unwrap_or(0.0)
    };
    match sort {
        SortMode::NameAscending => entries.sort_by(|a, b| a.name().cmp(b.name())),
        SortMode::NameDescending => entries.sort_by(|a, b| b.name().cmp(a.name())),
        SortMode::ScoreAscending | SortMode::ScoreDescending => {
            entries.sort_by(|a, b| {
                let by_score = score_of(a).total_cmp(&score_of(b));
                let by_score = if sort == SortMode::ScoreDescending {
                    by_score.reverse()
                } else {
                    by_score
                };
                by_score.then_with(|| a.name().cmp(b.name()))
            });
        }
    }
}

/// Matrix data held in memory, usually loaded from a JSON file shaped as
/// `{"enterprise": [column, ...], "mobile": [column, ...]}`.
#[derive(Debug, Clone, Default)]
pub struct LocalMatrix {
    domains: BTreeMap<Domain, Vec<TacticColumn>>,
}

impl LocalMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, domain: Domain, columns: Vec<TacticColumn>) -> Self {
        self.domains.insert(domain, columns);
        self
    }

    pub fn from_json(input: &str) -> Result<Self, MatrixError> {
        let raw: BTreeMap<String, Vec<TacticColumn>> = serde_json::from_str(input)?;
        let mut matrix = Self::new();
        for (key, columns) in raw {
            match Domain::parse(&key) {
                Ok(domain) => {
                    matrix.domains.insert(domain, columns);
                }
                Err(_) => warn!(domain = %key, "ignoring matrix data for unknown domain"),
            }
        }
        Ok(matrix)
    }

    pub fn from_path(path: &Path) -> Result<Self, MatrixError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl MatrixProvider for LocalMatrix {
    fn get_matrix(&self, domain: Domain) -> Result<Vec<TacticColumn>, MatrixError> {
        self.domains
            .get(&domain)
            .cloned()
            .ok_or(MatrixError::MissingDomain(domain))
    }
}
