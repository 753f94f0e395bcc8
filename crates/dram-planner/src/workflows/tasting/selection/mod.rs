mod draw;
mod pool;

pub use draw::weighted_draw;
pub use pool::{Candidate, CandidatePool};

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{Item, ItemId, Relaxation, Schedule};
use super::error::ExhaustedPoolError;
use super::preferences::{Preferences, SeasonalCurve};
use pool::{build_pool, PoolRules};

/// The item picked for one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub item_id: ItemId,
    pub category: String,
    pub is_repeat: bool,
    pub pool_size: usize,
}

/// State carried from one date to the next within a run.
#[derive(Debug, Clone, Default)]
struct SelectionState {
    selected: HashSet<ItemId>,
    ever_selected: HashSet<ItemId>,
    recency: HashMap<String, NaiveDate>,
}

/// Picks one item per date, enforcing uniqueness, category spacing and never-evaluated priority.
///
/// The engine borrows an immutable snapshot of the collection; it never mutates items.
pub struct SelectionEngine<'a> {
    items: &'a [Item],
    preferences: &'a Preferences,
    curve: &'a dyn SeasonalCurve,
    state: SelectionState,
    relaxations: Vec<Relaxation>,
}

impl<'a> SelectionEngine<'a> {
    pub fn new(
        items: &'a [Item],
        preferences: &'a Preferences,
        curve: &'a dyn SeasonalCurve,
    ) -> Self {
        Self {
            items,
            preferences,
            curve,
            state: SelectionState::default(),
            relaxations: Vec::new(),
        }
    }

    /// Seeds uniqueness and recency from an existing schedule, for append runs.
    pub fn with_history(mut self, history: &Schedule) -> Self {
        for entry in history.items() {
            self.state.selected.insert(entry.item_id);
            self.state.ever_selected.insert(entry.item_id);
        }
        self.state.recency = history.latest_by_category();
        self
    }

    pub fn select<R>(
        &mut self,
        date: NaiveDate,
        position: u32,
        rng: &mut R,
    ) -> Result<Selection, ExhaustedPoolError>
    where
        R: Rng + ?Sized,
    {
        let rules = PoolRules {
            min_days_between_category: self.preferences.min_days_between_category(),
            allow_repeats: self.preferences.allow_repeats(),
            weights: self.preferences.category_weights(),
            seasonal: self
                .preferences
                .seasonal_adjustments()
                .then_some(self.curve),
        };
        let build = build_pool(
            self.items,
            date,
            &self.state.selected,
            &self.state.recency,
            &rules,
        );

        for relaxation in &build.relaxations {
            warn!(%date, position, %relaxation, "selection constraint relaxed");
        }
        self.relaxations.extend(build.relaxations);
        if build.reset_uniqueness {
            self.state.selected.clear();
        }

        let pool = build.pool;
        let Some(index) = weighted_draw(&pool.weights(), rng) else {
            return Err(ExhaustedPoolError {
                date,
                position,
                relaxations: self.relaxations.clone(),
            });
        };
        let candidate = &pool.candidates()[index];
        let item_id = candidate.item.id;
        let is_repeat = candidate.item.evaluated || self.state.ever_selected.contains(&item_id);

        self.state.selected.insert(item_id);
        self.state.ever_selected.insert(item_id);
        self.state
            .recency
            .insert(candidate.category.clone(), date);

        debug!(
            %date,
            position,
            item_id = %item_id,
            category = %candidate.category,
            pool_size = pool.len(),
            "item selected"
        );

        Ok(Selection {
            item_id,
            category: candidate.category.clone(),
            is_repeat,
            pool_size: pool.len(),
        })
    }

    /// Relaxations recorded so far in this run.
    pub fn relaxations(&self) -> &[Relaxation] {
        &self.relaxations
    }

    pub fn into_relaxations(self) -> Vec<Relaxation> {
        self.relaxations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::tasting::domain::{CompletionStatus, ScheduleItem};
    use crate::workflows::tasting::preferences::FlatSeasonalCurve;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).expect("valid date")
    }

    #[test]
    fn single_item_is_exhausted_on_the_second_date() {
        let items = vec![Item::new(1, "Only", "bourbon")];
        let preferences = Preferences::default();
        let mut engine = SelectionEngine::new(&items, &preferences, &FlatSeasonalCurve);
        let mut rng = StdRng::seed_from_u64(1);

        let first = engine.select(day(1, 3), 1, &mut rng).expect("first pick");
        assert_eq!(first.item_id, ItemId(1));
        assert!(!first.is_repeat);

        let error = engine
            .select(day(1, 10), 2, &mut rng)
            .expect_err("pool exhausted");
        assert_eq!(error.date, day(1, 10));
        assert_eq!(error.position, 2);
    }

    #[test]
    fn repeats_are_flagged_after_a_reset() {
        let items = vec![Item::new(1, "Only", "bourbon")];
        let preferences = Preferences::builder()
            .allow_repeats(true)
            .build()
            .expect("valid preferences");
        let mut engine = SelectionEngine::new(&items, &preferences, &FlatSeasonalCurve);
        let mut rng = StdRng::seed_from_u64(1);

        engine.select(day(1, 3), 1, &mut rng).expect("first pick");
        let second = engine.select(day(1, 10), 2, &mut rng).expect("repeat pick");
        assert!(second.is_repeat);
        assert_eq!(
            engine.relaxations(),
            &[Relaxation::Uniqueness { date: day(1, 10) }]
        );
    }

    #[test]
    fn history_counts_as_already_selected() {
        let items = vec![Item::new(1, "Old", "rye"), Item::new(2, "New", "gin")];
        let preferences = Preferences::builder()
            .min_days_between_category(30)
            .build()
            .expect("valid preferences");
        let history = Schedule::from_items(vec![ScheduleItem {
            position: 1,
            date: day(1, 3),
            item_id: ItemId(1),
            category: "rye".to_string(),
            is_repeat: false,
            status: CompletionStatus::Pending,
            completed_on: None,
        }]);
        let mut engine =
            SelectionEngine::new(&items, &preferences, &FlatSeasonalCurve).with_history(&history);
        let mut rng = StdRng::seed_from_u64(3);

        let pick = engine.select(day(1, 10), 2, &mut rng).expect("pick");
        assert_eq!(pick.item_id, ItemId(2));
        assert_eq!(pick.pool_size, 1);
        assert!(engine.relaxations().is_empty());
    }
}
