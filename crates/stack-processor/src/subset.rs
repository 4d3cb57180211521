//! Calendar-based subsetting of a raster time series.

use raster_common::Season;

use crate::error::{Result, StackError};
use crate::stack::SeriesEntry;

/// A conjunctive calendar filter over time-series entries.
///
/// `years` combines with any single one of the sub-annual dimensions
/// (months, doys, seasons, quarters); supplying more than one sub-annual
/// dimension at a time is an error. An entry is kept iff it satisfies every
/// supplied constraint.
///
/// ```
/// use stack_processor::SubsetQuery;
///
/// // all June-August acquisitions of 2001
/// let query = SubsetQuery::new().months([6, 7, 8]).years([2001]);
/// assert!(query.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SubsetQuery {
    months: Option<Vec<u32>>,
    years: Option<Vec<i32>>,
    doys: Option<Vec<u16>>,
    seasons: Option<Vec<Season>>,
    quarters: Option<Vec<u8>>,
}

impl SubsetQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep entries from these months (1-12).
    pub fn months(mut self, months: impl IntoIterator<Item = u32>) -> Self {
        self.months = Some(months.into_iter().collect());
        self
    }

    /// Keep entries from these years.
    pub fn years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.years = Some(years.into_iter().collect());
        self
    }

    /// Keep entries from these days of year (1-366).
    pub fn doys(mut self, doys: impl IntoIterator<Item = u16>) -> Self {
        self.doys = Some(doys.into_iter().collect());
        self
    }

    /// Keep entries from these seasons.
    pub fn seasons(mut self, seasons: impl IntoIterator<Item = Season>) -> Self {
        self.seasons = Some(seasons.into_iter().collect());
        self
    }

    /// Keep entries from these quarters (1-4).
    pub fn quarters(mut self, quarters: impl IntoIterator<Item = u8>) -> Self {
        self.quarters = Some(quarters.into_iter().collect());
        self
    }

    /// Whether any constraint is set.
    pub fn is_unconstrained(&self) -> bool {
        self.months.is_none()
            && self.years.is_none()
            && self.doys.is_none()
            && self.seasons.is_none()
            && self.quarters.is_none()
    }

    /// Check dimension combinations and value ranges.
    pub fn validate(&self) -> Result<()> {
        let sub_annual = [
            self.months.is_some(),
            self.doys.is_some(),
            self.quarters.is_some(),
            self.seasons.is_some(),
        ];
        if sub_annual.iter().filter(|&&set| set).count() > 1 {
            return Err(StackError::invalid_parameter(
                "subset",
                "only one of months, doys, quarters or seasons can be set",
            ));
        }

        if let Some(months) = &self.months {
            if months.iter().any(|&m| m == 0 || m > 12) {
                return Err(StackError::invalid_parameter(
                    "months",
                    "months must be between 1 and 12 inclusive",
                ));
            }
        }
        if let Some(doys) = &self.doys {
            if doys.iter().any(|&d| d == 0 || d > 366) {
                return Err(StackError::invalid_parameter(
                    "doys",
                    "DOYs must be between 1 and 366",
                ));
            }
        }
        if let Some(quarters) = &self.quarters {
            if quarters.iter().any(|&q| q == 0 || q > 4) {
                return Err(StackError::invalid_parameter(
                    "quarters",
                    "quarters must contain one or more of 1, 2, 3, 4",
                ));
            }
        }

        Ok(())
    }

    /// Pure per-entry predicate: true iff the entry satisfies every supplied
    /// constraint.
    pub fn matches(&self, entry: &SeriesEntry) -> bool {
        if let Some(months) = &self.months {
            if !months.contains(&entry.month) {
                return false;
            }
        }
        if let Some(years) = &self.years {
            if !years.contains(&entry.year) {
                return false;
            }
        }
        if let Some(doys) = &self.doys {
            if !doys.contains(&entry.doy) {
                return false;
            }
        }
        if let Some(seasons) = &self.seasons {
            if !seasons.contains(&entry.season) {
                return false;
            }
        }
        if let Some(quarters) = &self.quarters {
            if !quarters.contains(&entry.quarter) {
                return false;
            }
        }
        true
    }

    /// Filter entries, re-sort the survivors by date and reindex.
    ///
    /// Fails when no entry survives.
    pub fn apply(&self, entries: &[SeriesEntry]) -> Result<Vec<SeriesEntry>> {
        self.validate()?;

        let mut kept: Vec<SeriesEntry> = entries
            .iter()
            .filter(|entry| self.matches(entry))
            .cloned()
            .collect();
        if kept.is_empty() {
            return Err(StackError::EmptySubset);
        }

        kept.sort_by_key(|entry| entry.date);
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};
    use raster_common::CalendarPolicy;

    fn entry(y: i32, m: u32, d: u32) -> SeriesEntry {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let doy = date.ordinal() as u16;
        let calendar = CalendarPolicy::default();
        SeriesEntry {
            path: format!("{}.tif", date),
            date,
            year: y,
            month: m,
            doy,
            season: calendar.season(doy),
            quarter: calendar.quarter(doy),
            observed: None,
        }
    }

    #[test]
    fn test_conjunction_of_months_and_years() {
        let entries = vec![
            entry(2000, 7, 1),
            entry(2001, 7, 1),
            entry(2001, 8, 15),
            entry(2001, 12, 1),
            entry(2002, 7, 1),
        ];

        let query = SubsetQuery::new().months([6, 7, 8]).years([2001]);
        let kept = query.apply(&entries).unwrap();

        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|e| e.year == 2001));
        assert!(kept.iter().all(|e| [6, 7, 8].contains(&e.month)));
    }

    #[test]
    fn test_two_sub_annual_dimensions_rejected() {
        let query = SubsetQuery::new().months([6]).quarters([2]);
        assert!(matches!(
            query.validate(),
            Err(StackError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(SubsetQuery::new().months([13]).validate().is_err());
        assert!(SubsetQuery::new().doys([367]).validate().is_err());
        assert!(SubsetQuery::new().quarters([5]).validate().is_err());
        assert!(SubsetQuery::new().months([12]).validate().is_ok());
        assert!(SubsetQuery::new().doys([366]).validate().is_ok());
    }

    #[test]
    fn test_empty_selection_is_an_error() {
        let entries = vec![entry(2001, 7, 1)];
        let query = SubsetQuery::new().years([1999]);
        assert!(matches!(
            query.apply(&entries),
            Err(StackError::EmptySubset)
        ));
    }

    #[test]
    fn test_survivors_resorted_by_date() {
        // entries deliberately out of order
        let entries = vec![
            entry(2003, 6, 1),
            entry(2001, 6, 1),
            entry(2002, 6, 1),
        ];

        let query = SubsetQuery::new().months([6]);
        let kept = query.apply(&entries).unwrap();
        let years: Vec<i32> = kept.iter().map(|e| e.year).collect();
        assert_eq!(years, vec![2001, 2002, 2003]);
    }

    #[test]
    fn test_season_filter() {
        let entries = vec![
            entry(2001, 1, 10),  // winter
            entry(2001, 4, 10),  // spring
            entry(2001, 7, 10),  // summer
            entry(2001, 10, 10), // autumn
        ];

        let query = SubsetQuery::new().seasons([Season::Winter]);
        let kept = query.apply(&entries).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].month, 1);
    }
}
