use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use super::super::domain::{Item, ItemId, Relaxation};
use super::super::preferences::{CategoryWeights, SeasonalCurve};

/// An item eligible on a date, with its computed selection weight.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub item: &'a Item,
    pub category: String,
    pub weight: f64,
}

/// Filtered, weighted set of items eligible for one date.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool<'a> {
    candidates: Vec<Candidate<'a>>,
}

impl<'a> CandidatePool<'a> {
    pub fn candidates(&self) -> &[Candidate<'a>] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.candidates.iter().map(|c| c.weight).collect()
    }
}

/// Per-run inputs the pool builder reads but never changes.
pub(crate) struct PoolRules<'a> {
    pub min_days_between_category: u32,
    pub allow_repeats: bool,
    pub weights: &'a CategoryWeights,
    pub seasonal: Option<&'a dyn SeasonalCurve>,
}

/// Pool for one date plus what had to be loosened to produce it.
pub(crate) struct PoolBuild<'a> {
    pub pool: CandidatePool<'a>,
    pub relaxations: Vec<Relaxation>,
    pub reset_uniqueness: bool,
}

/// Applies the per-date filters in order: uniqueness, category spacing, never-evaluated
/// priority, then weighting.
pub(crate) fn build_pool<'a>(
    items: &'a [Item],
    date: NaiveDate,
    selected: &HashSet<ItemId>,
    recency: &HashMap<String, NaiveDate>,
    rules: &PoolRules<'_>,
) -> PoolBuild<'a> {
    let mut relaxations = Vec::new();
    let mut reset_uniqueness = false;

    let mut remaining: Vec<(&'a Item, String)> = items
        .iter()
        .filter(|item| !selected.contains(&item.id))
        .map(|item| (item, item.category_key()))
        .collect();

    if remaining.is_empty() {
        if !rules.allow_repeats || items.is_empty() {
            return PoolBuild {
                pool: CandidatePool::default(),
                relaxations,
                reset_uniqueness,
            };
        }
        reset_uniqueness = true;
        relaxations.push(Relaxation::Uniqueness { date });
        remaining = items
            .iter()
            .map(|item| (item, item.category_key()))
            .collect();
    }

    if rules.min_days_between_category > 0 {
        let min_days = i64::from(rules.min_days_between_category);
        let too_recent = |category: &str| {
            recency
                .get(category)
                .map(|last| (date - *last).num_days() < min_days)
                .unwrap_or(false)
        };
        let spaced: Vec<(&'a Item, String)> = remaining
            .iter()
            .filter(|(_, category)| !too_recent(category))
            .cloned()
            .collect();

        if spaced.is_empty() {
            let categories: BTreeSet<String> =
                remaining.iter().map(|(_, category)| category.clone()).collect();
            relaxations.push(Relaxation::Spacing {
                date,
                categories: categories.into_iter().collect(),
            });
        } else {
            remaining = spaced;
        }
    }

    if remaining.iter().any(|(item, _)| !item.evaluated) {
        remaining.retain(|(item, _)| !item.evaluated);
    }

    let month = date.month();
    let candidates = remaining
        .into_iter()
        .map(|(item, category)| {
            let mut weight = rules.weights.weight(&category);
            if let Some(curve) = rules.seasonal {
                weight *= curve.factor(month, item.strength);
            }
            Candidate {
                item,
                category,
                weight,
            }
        })
        .collect();

    PoolBuild {
        pool: CandidatePool { candidates },
        relaxations,
        reset_uniqueness,
    }
}
