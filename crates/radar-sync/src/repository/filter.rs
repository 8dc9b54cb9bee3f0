//! Asteroid list filter.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use radar_core::Asteroid;

use crate::storage::{CacheStore, DatabaseError};

/// Days after today included by [`AsteroidFilter::Week`].
pub const WEEK_SPAN_DAYS: u64 = 7;

/// Which cached asteroids the live list shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AsteroidFilter {
    /// Everything in the cache.
    #[default]
    AllSaved,
    /// Close approach date equal to today.
    Today,
    /// Close approach date in `[today, today + 7 days]`.
    Week,
}

impl AsteroidFilter {
    pub const ALL: [Self; 3] = [Self::AllSaved, Self::Today, Self::Week];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllSaved => "all",
            Self::Today => "today",
            Self::Week => "week",
        }
    }

    /// Run the store query this filter selects, relative to `today`.
    pub async fn query(
        self,
        store: &CacheStore,
        today: NaiveDate,
    ) -> Result<Vec<Asteroid>, DatabaseError> {
        match self {
            Self::AllSaved => store.all_asteroids().await,
            Self::Today => store.asteroids_on(today).await,
            Self::Week => {
                let end = today.checked_add_days(Days::new(WEEK_SPAN_DAYS)).unwrap_or(today);
                store.asteroids_between(today, end).await
            }
        }
    }
}

impl fmt::Display for AsteroidFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AsteroidFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "saved" | "all_saved" => Ok(Self::AllSaved),
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            other => Err(format!(
                "unknown filter '{other}' (expected one of: all, today, week)"
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_shows_everything() {
        assert_eq!(AsteroidFilter::default(), AsteroidFilter::AllSaved);
    }

    #[test]
    fn display_and_parse_agree() {
        for filter in AsteroidFilter::ALL {
            assert_eq!(filter.to_string().parse::<AsteroidFilter>().unwrap(), filter);
        }
        assert_eq!(" Week ".parse::<AsteroidFilter>().unwrap(), AsteroidFilter::Week);
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let err = "month".parse::<AsteroidFilter>().unwrap_err();
        assert!(err.contains("month"));
    }
}
