//! Calendar arithmetic for the daily Psalm cycle.
//!
//! Every local calendar day maps to one Psalm: day 1 of the year reads Psalm 1,
//! day 150 reads Psalm 150, day 151 starts over at Psalm 1. This module holds
//! that mapping, the slideshow step model built on top of it, and the `Clock`
//! used to supply "today" explicitly. Nothing here touches storage.

use crate::constants::{
    DATE_FORMAT_COMPACT, DATE_FORMAT_ISO, PSALMS_COUNT, REFUGE_STEPS, TOTAL_STEPS,
};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

/// A local calendar day, serialized as `YYYY-MM-DD`.
///
/// Built from calendar fields only, so two instants on the same local day always
/// produce the same key regardless of the time of day.
///
/// ```
/// use devotions::calendar::DateKey;
/// use chrono::NaiveDate;
///
/// let key = DateKey::new(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
/// assert_eq!(key.to_string(), "2024-03-05");
/// assert_eq!("20240305".parse::<DateKey>().unwrap(), key);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        DateKey(date)
    }

    /// Key for the calendar day `datetime` falls on in its own time zone.
    pub fn from_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>) -> Self {
        DateKey(datetime.date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Parse a date string in YYYY-MM-DD or YYYYMMDD format.
    pub fn parse(input: &str) -> Result<Self, chrono::ParseError> {
        NaiveDate::parse_from_str(input, DATE_FORMAT_ISO)
            .or_else(|_| NaiveDate::parse_from_str(input, DATE_FORMAT_COMPACT))
            .map(DateKey)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT_ISO))
    }
}

impl FromStr for DateKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateKey::parse(s)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        DateKey(date)
    }
}

/// A Psalm number in `1..=150`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PsalmIndex(u16);

impl PsalmIndex {
    pub const FIRST: PsalmIndex = PsalmIndex(1);
    pub const LAST: PsalmIndex = PsalmIndex(PSALMS_COUNT);

    /// Returns `None` outside `1..=150`.
    ///
    /// ```
    /// use devotions::calendar::PsalmIndex;
    ///
    /// assert_eq!(PsalmIndex::new(23).map(|p| p.get()), Some(23));
    /// assert!(PsalmIndex::new(0).is_none());
    /// assert!(PsalmIndex::new(151).is_none());
    /// ```
    pub fn new(number: u16) -> Option<Self> {
        if (1..=PSALMS_COUNT).contains(&number) {
            Some(PsalmIndex(number))
        } else {
            None
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// All Psalms in reading order.
    pub fn all() -> impl Iterator<Item = PsalmIndex> {
        (1..=PSALMS_COUNT).map(PsalmIndex)
    }
}

impl fmt::Display for PsalmIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Day of the year, 1 for January 1st up to 366 on a leap year's December 31st.
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

/// The Psalm read on `date`. Cycles with period 150 over the day of the year.
pub fn psalm_index_for_date(date: NaiveDate) -> PsalmIndex {
    let day = day_of_year(date);
    let index = ((day - 1) % u32::from(PSALMS_COUNT)) + 1;
    // index is in 1..=150 by construction
    PsalmIndex(index as u16)
}

/// Zero-based position of `date`'s Psalm among the 150 Psalm steps.
pub fn step_index_for_date(date: NaiveDate) -> usize {
    usize::from(psalm_index_for_date(date).get()) - 1
}

/// Slideshow step showing `date`'s Psalm, counting the refuge steps in front.
pub fn step_index_for_todays_psalm(date: NaiveDate) -> usize {
    REFUGE_STEPS + step_index_for_date(date)
}

/// A date in `today`'s year whose day of the year is `(step_index mod 150) + 1`.
///
/// Display convenience only: many dates share a Psalm, so this is not an inverse
/// of [`psalm_index_for_date`].
pub fn date_for_step(step_index: usize, today: NaiveDate) -> NaiveDate {
    let offset = (step_index % usize::from(PSALMS_COUNT)) as i64;
    let start_of_year = today - Duration::days(i64::from(today.ordinal0()));
    start_of_year + Duration::days(offset)
}

/// One screen of the devotions slideshow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Welcome screen.
    Entry,
    /// "How are you feeling?"
    MoodSelect,
    /// Free-text vent for the day.
    Vent,
    /// A Psalm with its prayer and reflection.
    Psalm(PsalmIndex),
}

impl Step {
    /// The step at `index`, or `None` past the last Psalm.
    pub fn from_index(index: usize) -> Option<Step> {
        match index {
            0 => Some(Step::Entry),
            1 => Some(Step::MoodSelect),
            2 => Some(Step::Vent),
            i if i < TOTAL_STEPS => {
                let number = (i - REFUGE_STEPS + 1) as u16;
                PsalmIndex::new(number).map(Step::Psalm)
            }
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Step::Entry => 0,
            Step::MoodSelect => 1,
            Step::Vent => 2,
            Step::Psalm(psalm) => REFUGE_STEPS + usize::from(psalm.get()) - 1,
        }
    }

    pub fn is_refuge(self) -> bool {
        !matches!(self, Step::Psalm(_))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Entry => write!(f, "Entry"),
            Step::MoodSelect => write!(f, "How are you feeling?"),
            Step::Vent => write!(f, "Vent"),
            Step::Psalm(psalm) => write!(f, "Psalm {}", psalm),
        }
    }
}

/// Direction of the last cursor move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Position within the slideshow, clamped to `0..TOTAL_STEPS`.
#[derive(Debug, Clone)]
pub struct StepCursor {
    step: usize,
    direction: Direction,
}

impl Default for StepCursor {
    fn default() -> Self {
        StepCursor {
            step: 0,
            direction: Direction::Forward,
        }
    }
}

impl StepCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn current(&self) -> Step {
        // step never leaves 0..TOTAL_STEPS
        Step::from_index(self.step).unwrap_or(Step::Entry)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn next(&mut self) {
        self.direction = Direction::Forward;
        if self.step < TOTAL_STEPS - 1 {
            self.step += 1;
        }
    }

    pub fn prev(&mut self) {
        self.direction = Direction::Backward;
        if self.step > 0 {
            self.step -= 1;
        }
    }

    /// Jump to `index`. Out-of-range indexes are ignored.
    pub fn go_to(&mut self, index: usize) {
        if index >= TOTAL_STEPS {
            return;
        }
        self.direction = if index > self.step {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.step = index;
    }

    pub fn go_to_todays_psalm(&mut self, today: NaiveDate) {
        self.go_to(step_index_for_todays_psalm(today));
    }

    pub fn is_first(&self) -> bool {
        self.step == 0
    }

    pub fn is_last(&self) -> bool {
        self.step == TOTAL_STEPS - 1
    }

    pub fn is_refuge_step(&self) -> bool {
        self.step < REFUGE_STEPS
    }
}

/// Source of the current date and time.
///
/// Everything that needs "today" takes it from a clock handed in by the caller.
pub trait Clock {
    /// The current local calendar day.
    fn today(&self) -> NaiveDate;

    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant, for tests and reproducible runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    today: NaiveDate,
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(today: NaiveDate, now: DateTime<Utc>) -> Self {
        FixedClock { today, now }
    }

    /// Frozen at noon UTC on `today`.
    pub fn at(today: NaiveDate) -> Self {
        let noon = today.and_hms_opt(12, 0, 0).unwrap_or_default();
        FixedClock {
            today,
            now: Utc.from_utc_datetime(&noon),
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
