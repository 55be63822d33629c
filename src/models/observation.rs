use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::constants::{MISSING_VALUE, VALUE_SCALE};

/// One day of measurements for a station.
///
/// `date` is kept in the on-disk YYYYMMDD integer encoding. Measurements are in
/// natural units (°C, mm); `None` means the source carried the missing-value sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Observation {
    #[validate(range(min = 19850101, max = 20141231))]
    pub date: u32,

    pub max_temp: Option<f64>,

    pub min_temp: Option<f64>,

    pub precipitation: Option<f64>,
}

impl Observation {
    pub fn new(
        date: u32,
        max_temp: Option<f64>,
        min_temp: Option<f64>,
        precipitation: Option<f64>,
    ) -> Self {
        Self {
            date,
            max_temp,
            min_temp,
            precipitation,
        }
    }

    /// Build an observation from raw tenths-of-unit values
    pub fn from_raw(date: u32, max_temp: i64, min_temp: i64, precipitation: i64) -> Self {
        Self::new(
            date,
            scale_raw_value(max_temp),
            scale_raw_value(min_temp),
            scale_raw_value(precipitation),
        )
    }

    /// Calendar date, if the encoded integer names a real day
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        let year = (self.date / 10_000) as i32;
        let month = (self.date / 100) % 100;
        let day = self.date % 100;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

/// Convert a raw tenths value to natural units, mapping the sentinel to `None`
pub fn scale_raw_value(raw: i64) -> Option<f64> {
    if raw == MISSING_VALUE {
        None
    } else {
        Some(raw as f64 / VALUE_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_raw_value() {
        assert_eq!(scale_raw_value(250), Some(25.0));
        assert_eq!(scale_raw_value(5), Some(0.5));
        assert_eq!(scale_raw_value(-35), Some(-3.5));
        assert_eq!(scale_raw_value(0), Some(0.0));
        assert_eq!(scale_raw_value(MISSING_VALUE), None);
    }

    #[test]
    fn test_from_raw() {
        let obs = Observation::from_raw(19900101, 250, -9999, 5);
        assert_eq!(obs.max_temp, Some(25.0));
        assert_eq!(obs.min_temp, None);
        assert_eq!(obs.precipitation, Some(0.5));
    }

    #[test]
    fn test_date_range_validation() {
        assert!(Observation::from_raw(19850101, 0, 0, 0).validate().is_ok());
        assert!(Observation::from_raw(20141231, 0, 0, 0).validate().is_ok());

        let too_early = Observation::from_raw(19841231, 0, 0, 0);
        assert!(too_early.validate().is_err());

        assert!(Observation::from_raw(20150101, 0, 0, 0).validate().is_err());
    }

    #[test]
    fn test_calendar_date() {
        let obs = Observation::from_raw(19960229, 0, 0, 0);
        assert_eq!(obs.calendar_date(), NaiveDate::from_ymd_opt(1996, 2, 29));

        assert_eq!(Observation::from_raw(19900231, 0, 0, 0).calendar_date(), None);
        assert_eq!(Observation::from_raw(19901301, 0, 0, 0).calendar_date(), None);
    }
}
