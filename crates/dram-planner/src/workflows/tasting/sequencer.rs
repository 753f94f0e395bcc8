use super::error::UnsatisfiableScheduleError;
use super::preferences::{Frequency, Preferences, ScheduleLength, WeekdaySet};
use chrono::{Duration, Months, NaiveDate};
use std::collections::BTreeSet;

/// Days searched past a step's theoretical date before giving up on it.
pub const LOOK_AHEAD_DAYS: i64 = 366;

/// Lazily yields tasting dates for a start date and cadence.
///
/// Step `k` is anchored on the start date (start + k intervals, or + k calendar months with the
/// day clamped to the month length), then snapped forward onto an allowed weekday that is not
/// blacked out. Emitted dates are strictly increasing. The iterator is fused after an error.
#[derive(Debug, Clone)]
pub struct DateSequencer<'a> {
    start: NaiveDate,
    frequency: Frequency,
    preferred_days: WeekdaySet,
    blackout_dates: &'a BTreeSet<NaiveDate>,
    length: ScheduleLength,
    step: u32,
    emitted: usize,
    previous: Option<NaiveDate>,
    finished: bool,
}

impl<'a> DateSequencer<'a> {
    pub fn new(start: NaiveDate, preferences: &'a Preferences, length: ScheduleLength) -> Self {
        Self::from_parts(
            start,
            preferences.frequency(),
            preferences.preferred_days(),
            preferences.blackout_dates(),
            length,
        )
    }

    /// Continues an existing schedule: anchored on `last`, the first emitted date is one cadence
    /// step after it.
    pub fn continuing(last: NaiveDate, preferences: &'a Preferences, length: ScheduleLength) -> Self {
        let mut sequencer = Self::new(last, preferences, length);
        sequencer.step = 1;
        sequencer.previous = Some(last);
        sequencer
    }

    pub fn from_parts(
        start: NaiveDate,
        frequency: Frequency,
        preferred_days: WeekdaySet,
        blackout_dates: &'a BTreeSet<NaiveDate>,
        length: ScheduleLength,
    ) -> Self {
        Self {
            start,
            frequency,
            preferred_days,
            blackout_dates,
            length,
            step: 0,
            emitted: 0,
            previous: None,
            finished: false,
        }
    }

    fn step_date(&self, step: u32) -> Option<NaiveDate> {
        let days = |interval: u32| {
            self.start
                .checked_add_signed(Duration::days(i64::from(interval) * i64::from(step)))
        };
        match self.frequency {
            Frequency::Weekly => days(7),
            Frequency::Biweekly => days(14),
            Frequency::EveryNDays(interval) => days(interval),
            Frequency::Monthly => self.start.checked_add_months(Months::new(step)),
        }
    }

    fn is_allowed(&self, date: NaiveDate) -> bool {
        self.preferred_days.allows(date) && !self.blackout_dates.contains(&date)
    }

    fn search(&self, from: NaiveDate, limit: NaiveDate) -> Option<NaiveDate> {
        let mut candidate = from;
        while candidate <= limit {
            if self.is_allowed(candidate) {
                return Some(candidate);
            }
            candidate = candidate.succ_opt()?;
        }
        None
    }

    fn fail(&mut self, error: UnsatisfiableScheduleError) -> Option<<Self as Iterator>::Item> {
        self.finished = true;
        Some(Err(error))
    }
}

impl Iterator for DateSequencer<'_> {
    type Item = Result<NaiveDate, UnsatisfiableScheduleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let ScheduleLength::Count(count) = self.length {
            if self.emitted >= count {
                self.finished = true;
                return None;
            }
        }

        let last = self.previous.unwrap_or(self.start);
        let Some(step_date) = self.step_date(self.step) else {
            return self.fail(UnsatisfiableScheduleError::OutOfRange { last });
        };
        self.step += 1;

        let earliest = match self.previous {
            Some(previous) if previous >= step_date => match previous.succ_opt() {
                Some(next) => next,
                None => return self.fail(UnsatisfiableScheduleError::OutOfRange { last }),
            },
            _ => step_date,
        };

        let Some(horizon) = step_date.checked_add_signed(Duration::days(LOOK_AHEAD_DAYS)) else {
            return self.fail(UnsatisfiableScheduleError::OutOfRange { last });
        };
        let (limit, bounded_by_end) = match self.length {
            ScheduleLength::Until(end) if end < horizon => (end, true),
            _ => (horizon, false),
        };

        match self.search(earliest, limit) {
            Some(date) => {
                self.emitted += 1;
                self.previous = Some(date);
                Some(Ok(date))
            }
            None if bounded_by_end => {
                if self.emitted == 0 {
                    return self.fail(UnsatisfiableScheduleError::EmptyWindow {
                        start: self.start,
                        end: limit,
                    });
                }
                self.finished = true;
                None
            }
            None => self.fail(UnsatisfiableScheduleError::LookAheadExceeded {
                step_date,
                window_days: LOOK_AHEAD_DAYS,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn collect(
        start: NaiveDate,
        frequency: Frequency,
        days: &[Weekday],
        blackout: &BTreeSet<NaiveDate>,
        length: ScheduleLength,
    ) -> Result<Vec<NaiveDate>, UnsatisfiableScheduleError> {
        DateSequencer::from_parts(
            start,
            frequency,
            days.iter().copied().collect(),
            blackout,
            length,
        )
        .collect()
    }

    #[test]
    fn weekly_steps_snap_forward_to_the_preferred_day() {
        let dates = collect(
            date(2025, 1, 6),
            Frequency::Weekly,
            &[Weekday::Fri],
            &BTreeSet::new(),
            ScheduleLength::Count(5),
        )
        .expect("dates resolve");

        assert_eq!(
            dates,
            vec![
                date(2025, 1, 10),
                date(2025, 1, 17),
                date(2025, 1, 24),
                date(2025, 1, 31),
                date(2025, 2, 7),
            ]
        );
    }

    #[test]
    fn first_date_is_the_start_when_unrestricted() {
        let dates = collect(
            date(2025, 1, 6),
            Frequency::Biweekly,
            &[],
            &BTreeSet::new(),
            ScheduleLength::Count(3),
        )
        .expect("dates resolve");
        assert_eq!(
            dates,
            vec![date(2025, 1, 6), date(2025, 1, 20), date(2025, 2, 3)]
        );
    }

    #[test]
    fn monthly_steps_clamp_without_drifting() {
        let dates = collect(
            date(2025, 1, 31),
            Frequency::Monthly,
            &[],
            &BTreeSet::new(),
            ScheduleLength::Count(4),
        )
        .expect("dates resolve");
        assert_eq!(
            dates,
            vec![
                date(2025, 1, 31),
                date(2025, 2, 28),
                date(2025, 3, 31),
                date(2025, 4, 30),
            ]
        );
    }

    #[test]
    fn blackout_dates_push_to_the_next_allowed_day() {
        let blackout: BTreeSet<NaiveDate> = [date(2025, 1, 17)].into_iter().collect();
        let dates = collect(
            date(2025, 1, 10),
            Frequency::Weekly,
            &[Weekday::Fri, Weekday::Sat],
            &blackout,
            ScheduleLength::Count(3),
        )
        .expect("dates resolve");
        assert_eq!(
            dates,
            vec![date(2025, 1, 10), date(2025, 1, 18), date(2025, 1, 24)]
        );
    }

    #[test]
    fn short_custom_intervals_never_repeat_a_date() {
        let dates = collect(
            date(2025, 1, 6),
            Frequency::EveryNDays(2),
            &[Weekday::Fri],
            &BTreeSet::new(),
            ScheduleLength::Count(3),
        )
        .expect("dates resolve");
        assert_eq!(
            dates,
            vec![date(2025, 1, 10), date(2025, 1, 17), date(2025, 1, 24)]
        );
        assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn continuation_starts_one_step_after_the_anchor() {
        let preferences = Preferences::builder()
            .frequency(Frequency::Biweekly)
            .build()
            .expect("valid preferences");
        let dates: Vec<NaiveDate> = DateSequencer::continuing(
            date(2025, 1, 6),
            &preferences,
            ScheduleLength::Count(2),
        )
        .collect::<Result<_, _>>()
        .expect("dates resolve");
        assert_eq!(dates, vec![date(2025, 1, 20), date(2025, 2, 3)]);
    }

    #[test]
    fn end_date_bounds_the_sequence() {
        let dates = collect(
            date(2025, 3, 1),
            Frequency::Weekly,
            &[Weekday::Fri],
            &BTreeSet::new(),
            ScheduleLength::Until(date(2025, 3, 31)),
        )
        .expect("dates resolve");
        assert_eq!(dates.len(), 4);
        assert!(dates.iter().all(|d| d.weekday() == Weekday::Fri));
        assert_eq!(dates.last(), Some(&date(2025, 3, 28)));
    }

    #[test]
    fn fully_blacked_out_month_is_unsatisfiable() {
        let blackout: BTreeSet<NaiveDate> = [7, 14, 21, 28]
            .into_iter()
            .map(|d| date(2025, 3, d))
            .collect();
        let result = collect(
            date(2025, 3, 1),
            Frequency::Weekly,
            &[Weekday::Fri],
            &blackout,
            ScheduleLength::Until(date(2025, 3, 31)),
        );
        assert_eq!(
            result,
            Err(UnsatisfiableScheduleError::EmptyWindow {
                start: date(2025, 3, 1),
                end: date(2025, 3, 31),
            })
        );
    }

    #[test]
    fn look_ahead_bound_stops_contradictory_configurations() {
        let start = date(2025, 1, 6);
        let blackout: BTreeSet<NaiveDate> = (0..120)
            .map(|week| date(2025, 1, 10) + Duration::weeks(week))
            .collect();
        let mut sequencer = DateSequencer::from_parts(
            start,
            Frequency::Weekly,
            [Weekday::Fri].into_iter().collect(),
            &blackout,
            ScheduleLength::Count(2),
        );

        match sequencer.next() {
            Some(Err(UnsatisfiableScheduleError::LookAheadExceeded {
                step_date,
                window_days,
            })) => {
                assert_eq!(step_date, start);
                assert_eq!(window_days, LOOK_AHEAD_DAYS);
            }
            other => panic!("expected look-ahead failure, got {other:?}"),
        }
        assert!(sequencer.next().is_none(), "sequencer is fused after an error");
    }
}
