//! Typed, validated scheduling preferences.
//!
//! Preferences are persisted as a JSON document whose `user_preferences` object carries loose
//! key/value pairs. Everything is validated once, here, and consumers only ever see the
//! immutable [`Preferences`] snapshot.

mod weighting;

pub use weighting::{CategoryWeights, DefaultSeasonalCurve, FlatSeasonalCurve, SeasonalCurve};

use super::error::ConfigurationError;
use chrono::{Datelike, NaiveDate, Weekday};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;

const SECTION: &str = "user_preferences";

/// Number of assignments scheduled when nothing else is configured (two years of weeks).
pub const DEFAULT_SCHEDULE_WEEKS: usize = 104;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    EveryNDays(u32),
}

impl Frequency {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "bi-weekly",
            Self::Monthly => "monthly",
            Self::EveryNDays(_) => "custom",
        }
    }
}

/// Requested schedule size: a number of assignments or a last allowed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleLength {
    Count(usize),
    Until(NaiveDate),
}

/// Set of allowed weekdays. Empty means every day is allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn allows(self, date: NaiveDate) -> bool {
        self.is_empty() || self.contains(date.weekday())
    }

    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .filter(move |day| self.contains(*day))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        let mut set = Self::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

/// Immutable, validated scheduling preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    frequency: Frequency,
    preferred_days: WeekdaySet,
    blackout_dates: BTreeSet<NaiveDate>,
    category_weights: CategoryWeights,
    seasonal_adjustments: bool,
    min_days_between_category: u32,
    length: ScheduleLength,
    allow_repeats: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            frequency: Frequency::Weekly,
            preferred_days: WeekdaySet::empty(),
            blackout_dates: BTreeSet::new(),
            category_weights: CategoryWeights::default(),
            seasonal_adjustments: false,
            min_days_between_category: 0,
            length: ScheduleLength::Count(DEFAULT_SCHEDULE_WEEKS),
            allow_repeats: false,
        }
    }
}

impl Preferences {
    pub fn builder() -> PreferencesBuilder {
        PreferencesBuilder::default()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigurationError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| ConfigurationError::new(SECTION, format!("invalid JSON: {err}")))?;
        Self::from_document(&value)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ConfigurationError::new(SECTION, format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Parses a whole configuration document. A missing `user_preferences` section yields the
    /// defaults; keys belonging to other collaborators are ignored.
    pub fn from_document(document: &Value) -> Result<Self, ConfigurationError> {
        let root = document
            .as_object()
            .ok_or_else(|| ConfigurationError::new(SECTION, "document must be a JSON object"))?;

        match root.get(SECTION) {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::Object(section)) => Self::from_section(section),
            Some(_) => Err(ConfigurationError::new(SECTION, "must be an object")),
        }
    }

    /// Parses the key/value pairs of the `user_preferences` section.
    pub fn from_section(section: &Map<String, Value>) -> Result<Self, ConfigurationError> {
        let mut builder = Self::builder();

        let frequency = optional(section, "tasting_frequency")
            .map(|value| expect_str(value, "tasting_frequency"))
            .transpose()?;
        let custom_interval = optional(section, "custom_interval_days");

        match frequency.map(|raw| raw.trim().to_ascii_lowercase()) {
            None => {}
            Some(raw) => match raw.as_str() {
                "weekly" => builder = builder.frequency(Frequency::Weekly),
                "bi-weekly" | "biweekly" => builder = builder.frequency(Frequency::Biweekly),
                "monthly" => builder = builder.frequency(Frequency::Monthly),
                "custom" => {
                    let value = custom_interval.ok_or_else(|| {
                        ConfigurationError::new(
                            key("custom_interval_days"),
                            "required when tasting_frequency is custom",
                        )
                    })?;
                    let days = expect_u32(value, "custom_interval_days")?;
                    builder = builder.frequency(Frequency::EveryNDays(days));
                }
                other => {
                    return Err(ConfigurationError::new(
                        key("tasting_frequency"),
                        format!(
                            "unknown frequency '{other}' (expected weekly, bi-weekly, monthly or custom)"
                        ),
                    ))
                }
            },
        }

        if let Some(value) = optional(section, "preferred_days") {
            let entries = expect_array(value, "preferred_days")?;
            for (index, entry) in entries.iter().enumerate() {
                let field = format!("preferred_days[{index}]");
                let raw = expect_str(entry, &field)?;
                let day = raw.trim().parse::<Weekday>().map_err(|_| {
                    ConfigurationError::new(key(&field), format!("'{raw}' is not a weekday name"))
                })?;
                builder = builder.preferred_day(day);
            }
        }

        if let Some(value) = optional(section, "avoid_dates") {
            let entries = expect_array(value, "avoid_dates")?;
            for (index, entry) in entries.iter().enumerate() {
                let field = format!("avoid_dates[{index}]");
                let date = expect_date(entry, &field)?;
                builder = builder.blackout_date(date);
            }
        }

        if let Some(value) = optional(section, "category_preferences") {
            let entries = value.as_object().ok_or_else(|| {
                ConfigurationError::new(key("category_preferences"), "must be an object")
            })?;
            for (category, weight) in entries {
                let field = format!("category_preferences.{category}");
                let weight = weight.as_f64().ok_or_else(|| {
                    ConfigurationError::new(key(&field), "weight must be a number")
                })?;
                builder = builder.category_weight(category.clone(), weight);
            }
        }

        if let Some(value) = optional(section, "seasonal_adjustments") {
            builder = builder.seasonal_adjustments(expect_bool(value, "seasonal_adjustments")?);
        }

        if let Some(value) = optional(section, "min_days_between_category") {
            let days = whole_number(value)
                .and_then(|days| u32::try_from(days).ok())
                .ok_or_else(|| {
                    ConfigurationError::new(
                        key("min_days_between_category"),
                        format!("must be a non-negative integer, got {value}"),
                    )
                })?;
            builder = builder.min_days_between_category(days);
        }

        // An explicit end date wins over the week count the default document always carries.
        if let Some(value) = optional(section, "schedule_end_date") {
            builder = builder.length(ScheduleLength::Until(expect_date(
                value,
                "schedule_end_date",
            )?));
        } else if let Some(value) = optional(section, "default_schedule_weeks") {
            let weeks = whole_number(value)
                .and_then(|weeks| usize::try_from(weeks).ok())
                .ok_or_else(|| {
                    ConfigurationError::new(
                        key("default_schedule_weeks"),
                        format!("must be a positive integer, got {value}"),
                    )
                })?;
            builder = builder.length(ScheduleLength::Count(weeks));
        }

        if let Some(value) = optional(section, "allow_repeats") {
            builder = builder.allow_repeats(expect_bool(value, "allow_repeats")?);
        }

        builder.build()
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn preferred_days(&self) -> WeekdaySet {
        self.preferred_days
    }

    pub fn blackout_dates(&self) -> &BTreeSet<NaiveDate> {
        &self.blackout_dates
    }

    pub fn category_weights(&self) -> &CategoryWeights {
        &self.category_weights
    }

    pub fn seasonal_adjustments(&self) -> bool {
        self.seasonal_adjustments
    }

    pub fn min_days_between_category(&self) -> u32 {
        self.min_days_between_category
    }

    pub fn length(&self) -> ScheduleLength {
        self.length
    }

    pub fn allow_repeats(&self) -> bool {
        self.allow_repeats
    }
}

/// Programmatic construction with the same validation as the document parser.
#[derive(Debug, Clone, Default)]
pub struct PreferencesBuilder {
    frequency: Option<Frequency>,
    preferred_days: WeekdaySet,
    blackout_dates: BTreeSet<NaiveDate>,
    category_weights: Vec<(String, f64)>,
    seasonal_adjustments: bool,
    min_days_between_category: u32,
    length: Option<ScheduleLength>,
    allow_repeats: bool,
}

impl PreferencesBuilder {
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn preferred_day(mut self, day: Weekday) -> Self {
        self.preferred_days.insert(day);
        self
    }

    pub fn blackout_date(mut self, date: NaiveDate) -> Self {
        self.blackout_dates.insert(date);
        self
    }

    pub fn blackout_dates<I: IntoIterator<Item = NaiveDate>>(mut self, dates: I) -> Self {
        self.blackout_dates.extend(dates);
        self
    }

    pub fn category_weight(mut self, category: impl Into<String>, weight: f64) -> Self {
        self.category_weights.push((category.into(), weight));
        self
    }

    pub fn seasonal_adjustments(mut self, enabled: bool) -> Self {
        self.seasonal_adjustments = enabled;
        self
    }

    pub fn min_days_between_category(mut self, days: u32) -> Self {
        self.min_days_between_category = days;
        self
    }

    pub fn length(mut self, length: ScheduleLength) -> Self {
        self.length = Some(length);
        self
    }

    pub fn allow_repeats(mut self, allowed: bool) -> Self {
        self.allow_repeats = allowed;
        self
    }

    pub fn build(self) -> Result<Preferences, ConfigurationError> {
        let frequency = self.frequency.unwrap_or(Frequency::Weekly);
        if frequency == Frequency::EveryNDays(0) {
            return Err(ConfigurationError::new(
                key("custom_interval_days"),
                "must be a positive number of days",
            ));
        }

        let length = self
            .length
            .unwrap_or(ScheduleLength::Count(DEFAULT_SCHEDULE_WEEKS));
        if length == ScheduleLength::Count(0) {
            return Err(ConfigurationError::new(
                key("default_schedule_weeks"),
                "must be a positive integer, got 0",
            ));
        }

        let category_weights =
            CategoryWeights::try_from_pairs(self.category_weights, &key("category_preferences"))?;

        Ok(Preferences {
            frequency,
            preferred_days: self.preferred_days,
            blackout_dates: self.blackout_dates,
            category_weights,
            seasonal_adjustments: self.seasonal_adjustments,
            min_days_between_category: self.min_days_between_category,
            length,
            allow_repeats: self.allow_repeats,
        })
    }
}

fn key(field: &str) -> String {
    format!("{SECTION}.{field}")
}

fn optional<'a>(section: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    section.get(name).filter(|value| !value.is_null())
}

fn expect_str<'a>(value: &'a Value, field: &str) -> Result<&'a str, ConfigurationError> {
    value
        .as_str()
        .ok_or_else(|| ConfigurationError::new(key(field), "must be a string"))
}

fn expect_bool(value: &Value, field: &str) -> Result<bool, ConfigurationError> {
    value
        .as_bool()
        .ok_or_else(|| ConfigurationError::new(key(field), "must be true or false"))
}

fn expect_array<'a>(value: &'a Value, field: &str) -> Result<&'a Vec<Value>, ConfigurationError> {
    value
        .as_array()
        .ok_or_else(|| ConfigurationError::new(key(field), "must be a list"))
}

/// Non-negative integer, also accepting floats with no fractional part (`10.0`).
fn whole_number(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|raw| raw.is_finite() && *raw >= 0.0 && raw.fract() == 0.0)
            .filter(|raw| *raw <= u64::MAX as f64)
            .map(|raw| raw as u64)
    })
}

fn expect_u32(value: &Value, field: &str) -> Result<u32, ConfigurationError> {
    whole_number(value)
        .and_then(|raw| u32::try_from(raw).ok())
        .filter(|raw| *raw > 0)
        .ok_or_else(|| {
            ConfigurationError::new(key(field), format!("must be a positive integer, got {value}"))
        })
}

fn expect_date(value: &Value, field: &str) -> Result<NaiveDate, ConfigurationError> {
    let raw = expect_str(value, field)?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|err| {
        ConfigurationError::new(
            key(field),
            format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"),
        )
    })
}
