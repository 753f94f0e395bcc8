use super::super::domain::normalize_category;
use super::super::error::ConfigurationError;
use std::collections::BTreeMap;

/// Category multipliers. Unknown categories weigh 1.0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryWeights {
    weights: BTreeMap<String, f64>,
}

impl CategoryWeights {
    pub const DEFAULT_WEIGHT: f64 = 1.0;

    /// Builds the table, rejecting non-finite or non-positive weights.
    ///
    /// `field_prefix` is the key path reported in errors, e.g.
    /// `user_preferences.category_preferences`.
    pub fn try_from_pairs<I, K>(pairs: I, field_prefix: &str) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut weights = BTreeMap::new();
        for (category, weight) in pairs {
            let category = category.as_ref();
            if !weight.is_finite() || weight <= 0.0 {
                return Err(ConfigurationError::new(
                    format!("{field_prefix}.{category}"),
                    format!("weight must be a positive number, got {weight}"),
                ));
            }
            weights.insert(normalize_category(category), weight);
        }
        Ok(Self { weights })
    }

    pub fn weight(&self, category: &str) -> f64 {
        self.weights
            .get(&normalize_category(category))
            .copied()
            .unwrap_or(Self::DEFAULT_WEIGHT)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Maps a calendar month and an item's strength to a selection multiplier.
///
/// Implementations must be deterministic and return strictly positive factors.
pub trait SeasonalCurve: Send + Sync {
    fn factor(&self, month: u32, strength: Option<f64>) -> f64;
}

/// Favors stronger pours in winter and lighter ones in summer.
///
/// Month intensity follows a cosine over the year: +1 in January, -1 in July. Strength is
/// normalized around 40% ABV, saturating at 20 points either side. The factor is
/// `1 + 0.5 * intensity * z`, so it always lies in `[0.5, 1.5]`. Items without a known
/// strength are left at 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSeasonalCurve;

const MONTH_INTENSITY: [f64; 12] = [
    1.0, 0.866, 0.5, 0.0, -0.5, -0.866, -1.0, -0.866, -0.5, 0.0, 0.5, 0.866,
];
const BASELINE_ABV: f64 = 40.0;
const ABV_SPREAD: f64 = 20.0;
const AMPLITUDE: f64 = 0.5;

impl SeasonalCurve for DefaultSeasonalCurve {
    fn factor(&self, month: u32, strength: Option<f64>) -> f64 {
        let Some(abv) = strength.filter(|abv| abv.is_finite() && *abv > 0.0) else {
            return 1.0;
        };
        let index = (month.clamp(1, 12) - 1) as usize;
        let z = ((abv - BASELINE_ABV) / ABV_SPREAD).clamp(-1.0, 1.0);
        1.0 + AMPLITUDE * MONTH_INTENSITY[index] * z
    }
}

/// Seasonal strategy that never changes a weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatSeasonalCurve;

impl SeasonalCurve for FlatSeasonalCurve {
    fn factor(&self, _month: u32, _strength: Option<f64>) -> f64 {
        1.0
    }
}
