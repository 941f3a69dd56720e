//! Temporal filtering shared by both data sets.
//!
//! Bike counts derive weekday, month and minute of day from their timestamp; accident
//! records carry weekday and month directly and are never filtered by time of day.
//! Both end up compared in the accident weekday convention.

use crate::types::query::Query;
use crate::types::records::{AccidentRecord, BikeCountRecord};

/// A record that can be matched against a [`Query`].
pub trait TemporalMatch {
    /// `true` if the record satisfies every part of `query` that applies to it.
    fn matches(&self, query: &Query) -> bool;
}

impl TemporalMatch for BikeCountRecord {
    fn matches(&self, query: &Query) -> bool {
        query.weekday.matches(self.weekday())
            && query.month.matches(self.month())
            && query
                .time_range
                .map_or(true, |range| range.contains(self.minute_of_day()))
    }
}

impl TemporalMatch for AccidentRecord {
    fn matches(&self, query: &Query) -> bool {
        query.weekday.matches(self.weekday) && query.month.matches(self.month)
    }
}

pub trait TemporalFilterExt<T: TemporalMatch> {
    /// Keeps the records matching `query`.
    ///
    /// # Arguments
    /// * `query`: The weekday / month / time-of-day selection.
    ///
    /// # Returns
    /// A lazy iterator over the matching records, in input order.
    fn matching<'a>(&'a self, query: &'a Query) -> impl Iterator<Item = &'a T> + 'a
    where
        T: 'a;
}

impl<T: TemporalMatch> TemporalFilterExt<T> for [T] {
    fn matching<'a>(&'a self, query: &'a Query) -> impl Iterator<Item = &'a T> + 'a
    where
        T: 'a,
    {
        self.iter().filter(move |record| record.matches(query))
    }
}
