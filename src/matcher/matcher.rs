//! Greedy one-pass schema matcher

use super::similarity::similarity_ratio;
use super::types::{ColumnDescriptor, ColumnMatch, MatchCounts};
use crate::config::MatcherConfig;

/// Normalize a column name for comparison: lower-case, no spaces or underscores
pub fn normalize_column_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Matches columns between a GBIF and an OBIS schema
#[derive(Debug, Clone, Default)]
pub struct SchemaMatcher {
    config: MatcherConfig,
}

struct Candidate<'a> {
    name: &'a str,
    normalized: String,
    consumed: bool,
}

impl<'a> Candidate<'a> {
    fn sorted(names: &'a [String]) -> Vec<Self> {
        let mut candidates: Vec<Self> = names
            .iter()
            .map(|name| Self {
                name,
                normalized: normalize_column_name(name),
                consumed: false,
            })
            .collect();
        candidates.sort_by(|a, b| a.name.cmp(b.name));
        candidates
    }
}

impl SchemaMatcher {
    /// Create a matcher with the given configuration
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Acceptance threshold for fuzzy matches
    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    /// Match two descriptor lists (provider fields are ignored; order is gbif, obis)
    pub fn match_descriptors(
        &self,
        gbif: &[ColumnDescriptor],
        obis: &[ColumnDescriptor],
    ) -> Vec<ColumnMatch> {
        let gbif: Vec<String> = gbif.iter().map(|c| c.name.clone()).collect();
        let obis: Vec<String> = obis.iter().map(|c| c.name.clone()).collect();
        self.match_columns(&gbif, &obis)
    }

    /// Build the complete comparison of two column-name lists.
    ///
    /// Both lists are walked in lexical order so the greedy allocation is
    /// reproducible. Duplicate normalized names are matched independently;
    /// an OBIS column is claimed at most once.
    pub fn match_columns(&self, gbif: &[String], obis: &[String]) -> Vec<ColumnMatch> {
        let mut gbif = Candidate::sorted(gbif);
        let mut obis = Candidate::sorted(obis);
        let mut matches = Vec::with_capacity(gbif.len() + obis.len());

        // Exact: identical normalized names
        for g in &mut gbif {
            if let Some(o) = obis
                .iter_mut()
                .find(|o| !o.consumed && o.normalized == g.normalized)
            {
                matches.push(ColumnMatch::exact(g.name, o.name, &g.normalized));
                g.consumed = true;
                o.consumed = true;
            }
        }

        // Fuzzy: best remaining candidate, first one wins ties
        for g in gbif.iter_mut().filter(|g| !g.consumed) {
            let mut best: Option<(usize, f64)> = None;
            for (idx, o) in obis.iter().enumerate() {
                if o.consumed {
                    continue;
                }
                let score = similarity_ratio(&g.normalized, &o.normalized);
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((idx, score));
                }
            }

            if let Some((idx, score)) = best {
                if score >= self.config.threshold {
                    let o = &mut obis[idx];
                    matches.push(ColumnMatch::fuzzy(g.name, o.name, &g.normalized, score));
                    g.consumed = true;
                    o.consumed = true;
                }
            }
        }

        matches.extend(
            gbif.iter()
                .filter(|g| !g.consumed)
                .map(|g| ColumnMatch::only_in_gbif(g.name, &g.normalized)),
        );
        matches.extend(
            obis.iter()
                .filter(|o| !o.consumed)
                .map(|o| ColumnMatch::only_in_obis(o.name, &o.normalized)),
        );

        let counts = MatchCounts::from_matches(&matches);
        tracing::debug!(
            "Compared schemas: {} exact, {} fuzzy, {} gbif-only, {} obis-only",
            counts.exact,
            counts.fuzzy,
            counts.only_in_gbif,
            counts.only_in_obis
        );

        matches
    }
}
