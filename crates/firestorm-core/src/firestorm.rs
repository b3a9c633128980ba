//! A filtered firestorm and its lazily built rate tables.

use std::sync::OnceLock;

use firestorm_common::{Error, Record, Result, Zone};
use firestorm_config::{EngineConfig, FirestormDescriptor};

use crate::aggregate::{build_table, Granularity, RateTable, TrackedRate};
use crate::filter::{default_filters, FilterLog, FilterPipeline};
use crate::segment::{self, Breakpoint, Phase, PhaseSegmenter};
use crate::window::{ActivityWindow, ActivityWindowDetector};

/// Filtered records of one firestorm.
///
/// The hourly and six-hourly tables are built on first use and cached; a
/// shared `&Firestorm` can be used from several threads. Tables are laid out
/// in the firestorm's zone, or in the first record's offset when none is set.
#[derive(Debug)]
pub struct Firestorm {
    records: Vec<Record>,
    filter_log: FilterLog,
    tracked: Vec<TrackedRate>,
    zone: Option<Zone>,
    hourly: OnceLock<RateTable>,
    six_hourly: OnceLock<RateTable>,
}

impl Firestorm {
    /// Run `pipeline` over `records` and keep the survivors.
    pub fn new(records: Vec<Record>, pipeline: &FilterPipeline, tracked: Vec<TrackedRate>) -> Self {
        let (records, filter_log) = pipeline.run(records);
        Firestorm {
            records,
            filter_log,
            tracked,
            zone: None,
            hourly: OnceLock::new(),
            six_hourly: OnceLock::new(),
        }
    }

    /// Records taken as they are, with a single-entry filter log.
    pub fn unfiltered(records: Vec<Record>, tracked: Vec<TrackedRate>) -> Self {
        Firestorm::new(records, &FilterPipeline::new(), tracked)
    }

    /// Apply the standard chain for a catalogued firestorm using the
    /// configured zone, language and tracked rates.
    pub fn from_descriptor(
        records: Vec<Record>,
        descriptor: &FirestormDescriptor,
        config: &EngineConfig,
    ) -> Result<Self> {
        let zone = config.zone().map_err(Error::from)?;
        let tracked = TrackedRate::resolve_all(&config.aggregation.tracked_rates)?;
        let pipeline = default_filters(descriptor, &zone, config.filters.language.as_deref());
        Ok(Firestorm::new(records, &pipeline, tracked).with_zone(zone))
    }

    /// Lay tables out in `zone`. Drops tables built so far.
    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = Some(zone);
        self.hourly = OnceLock::new();
        self.six_hourly = OnceLock::new();
        self
    }

    pub fn zone(&self) -> Option<&Zone> {
        self.zone.as_ref()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn filter_log(&self) -> &FilterLog {
        &self.filter_log
    }

    pub fn tracked(&self) -> &[TrackedRate] {
        &self.tracked
    }

    /// Rate table at `granularity`, built at most once.
    pub fn table(&self, granularity: Granularity) -> Result<&RateTable> {
        if self.records.is_empty() {
            return Err(Error::EmptyInput(format!(
                "firestorm has no records left after {} filter stages",
                self.filter_log.len().saturating_sub(1)
            )));
        }
        let cell = match granularity {
            Granularity::Hour => &self.hourly,
            Granularity::SixHourSlot => &self.six_hourly,
        };
        Ok(cell.get_or_init(|| {
            let zone = self.zone.unwrap_or_else(|| match self.records.first() {
                Some(first) => Zone::Fixed(*first.created_at.offset()),
                None => Zone::default(),
            });
            build_table(&self.records, granularity, &self.tracked, &zone)
        }))
    }

    pub fn hourly(&self) -> Result<&RateTable> {
        self.table(Granularity::Hour)
    }

    pub fn six_hourly(&self) -> Result<&RateTable> {
        self.table(Granularity::SixHourSlot)
    }

    /// Activity window on the hourly table.
    pub fn window(&self, detector: &ActivityWindowDetector) -> Result<ActivityWindow> {
        Ok(detector.detect(self.hourly()?))
    }

    /// Change points of the hourly table.
    pub fn breakpoints(&self, segmenter: &PhaseSegmenter) -> Result<Vec<Breakpoint>> {
        segmenter.breakpoints(self.hourly()?)
    }

    /// Records sliced at the hourly change points.
    pub fn phases(&self, segmenter: &PhaseSegmenter) -> Result<Vec<Phase>> {
        segment::phases(segmenter, self.hourly()?, &self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::EqualityFilter;
    use chrono::{Duration, FixedOffset, NaiveDate, TimeZone};

    fn records() -> Vec<Record> {
        let t0 = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2021, 4, 13, 0, 0, 0)
            .unwrap();
        (0..40u64)
            .map(|i| {
                let lang = if i % 4 == 0 { "en" } else { "de" };
                Record::new(i, t0 + Duration::minutes(i as i64 * 45), lang)
            })
            .collect()
    }

    #[test]
    fn tables_are_cached() {
        let storm = Firestorm::unfiltered(records(), TrackedRate::defaults().unwrap());
        let first = storm.hourly().unwrap() as *const RateTable;
        let second = storm.hourly().unwrap() as *const RateTable;
        assert_eq!(first, second);
        assert_eq!(storm.hourly().unwrap().len(), 48);
        assert_eq!(storm.six_hourly().unwrap().len(), 8);
    }

    #[test]
    fn filtered_to_nothing_is_empty_input() {
        let pipeline = FilterPipeline::new().with(EqualityFilter::lang("fr"));
        let storm = Firestorm::new(records(), &pipeline, Vec::new());
        assert!(storm.is_empty());
        assert_eq!(storm.filter_log().as_slice(), &[40, 0]);
        assert!(matches!(storm.hourly(), Err(Error::EmptyInput(_))));
    }

    #[test]
    fn from_descriptor_uses_config() {
        let descriptor = FirestormDescriptor {
            query: "#storm".into(),
            data_start_date: NaiveDate::from_ymd_opt(2021, 4, 12).unwrap(),
            data_end_date: NaiveDate::from_ymd_opt(2021, 4, 15).unwrap(),
            true_start_date: NaiveDate::from_ymd_opt(2021, 4, 13),
            true_end_date: NaiveDate::from_ymd_opt(2021, 4, 13),
        };
        let config = EngineConfig {
            timezone_offset_minutes: Some(60),
            ..EngineConfig::default()
        };
        let storm = Firestorm::from_descriptor(records(), &descriptor, &config).unwrap();
        // 45-minute spacing: 32 records fall on the 13th, a quarter are English
        assert_eq!(storm.filter_log().as_slice(), &[40, 32, 24]);
        assert!(storm.records().iter().all(|r| r.lang == "de"));
        assert_eq!(storm.tracked().len(), 11);
        assert_eq!(storm.hourly().unwrap().len(), 24);
    }

    #[test]
    fn from_descriptor_defaults_to_berlin_time() {
        let descriptor = FirestormDescriptor {
            query: "#storm".into(),
            data_start_date: NaiveDate::from_ymd_opt(2021, 4, 12).unwrap(),
            data_end_date: NaiveDate::from_ymd_opt(2021, 4, 15).unwrap(),
            true_start_date: NaiveDate::from_ymd_opt(2021, 4, 13),
            true_end_date: NaiveDate::from_ymd_opt(2021, 4, 13),
        };
        let storm =
            Firestorm::from_descriptor(records(), &descriptor, &EngineConfig::default()).unwrap();
        // the 13th in summer time runs from 22:00 UTC on the 12th: 31 records, 8 English
        assert_eq!(storm.filter_log().as_slice(), &[40, 31, 23]);
        assert_eq!(storm.zone(), Some(&Zone::default()));
        let hourly = storm.hourly().unwrap();
        assert_eq!(hourly.len(), 24);
        assert_eq!(hourly.start().unwrap().to_rfc3339(), "2021-04-13T00:00:00+02:00");
    }

    #[test]
    fn firestorm_is_sync() {
        fn assert_sync<T: Sync + Send>() {}
        assert_sync::<Firestorm>();
    }
}
