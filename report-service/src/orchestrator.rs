//! Drives one report invocation end to end:
//! expand days, resolve filters, fetch feeders and readings, build the
//! matrix, classify, route and render.

use std::{io::Write, sync::Arc, time::Instant};

use feeder_client::domain::{BusinessHub, Reading, Region};
use time::{Date, Duration};

use crate::{
    categories::{self, FeederAnalysis},
    clock::Clock,
    dates,
    error::{ReportError, ReportResult},
    grid::{
        self,
        render::{format_day, MAX_DAYS},
        GridDocument, RenderInput, Template,
    },
    matrix::{self, FeederMatrix},
    store::{
        find_business_hub, find_region, materialize, CachedReadings, FeederDirectory, FeederQuery,
        FeederView, HierarchyDirectory, ReadingRangeCache, ReadingStore,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Day(Date),
    Range { start: Date, end: Date },
}

impl ReportPeriod {
    pub fn bounds(&self) -> (Date, Date) {
        match *self {
            ReportPeriod::Day(day) => (day, day),
            ReportPeriod::Range { start, end } => (start, end),
        }
    }

    /// Expanded days; ranges too wide for one sheet are rejected before
    /// expansion.
    pub fn days(&self) -> ReportResult<Vec<Date>> {
        let (start, end) = self.bounds();
        let count = dates::day_count(start, end)?;
        if count > MAX_DAYS {
            return Err(ReportError::RangeTooLong {
                days: count,
                max: MAX_DAYS,
            });
        }
        dates::expand(start, end)
    }

    pub fn title(&self) -> String {
        match *self {
            ReportPeriod::Day(day) => {
                format!("DAILY FEEDER ENERGY NOMINATION REPORT FOR {}", format_day(day))
            }
            ReportPeriod::Range { start, end } => format!(
                "FEEDER ENERGY NOMINATION REPORT FROM {} TO {}",
                format_day(start),
                format_day(end)
            ),
        }
    }

    pub fn filename(&self) -> String {
        match *self {
            ReportPeriod::Day(day) => format!("feeder-report-{day}.xlsx"),
            ReportPeriod::Range { start, end } => format!("feeder-report-{start}-to-{end}.xlsx"),
        }
    }
}

/// Caller-facing parameters of a report run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportQuery {
    pub date: Option<Date>,
    pub start: Option<Date>,
    pub end: Option<Date>,
    pub region: Option<String>,
    pub business_hub: Option<String>,
    pub feeder_ids: Option<Vec<String>>,
    pub include_analysis: bool,
}

impl ReportQuery {
    /// An explicit start/end pair wins over `date`; with neither, the
    /// report covers `today`.
    pub fn period(&self, today: Date) -> ReportResult<ReportPeriod> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start == end => Ok(ReportPeriod::Day(start)),
            (Some(start), Some(end)) => {
                if end < start {
                    return Err(ReportError::InvalidRange { start, end });
                }
                Ok(ReportPeriod::Range { start, end })
            }
            (None, None) => Ok(ReportPeriod::Day(self.date.unwrap_or(today))),
            _ => Err(ReportError::IncompleteRange),
        }
    }

    fn is_filtered(&self) -> bool {
        self.region.is_some() || self.business_hub.is_some() || self.feeder_ids.is_some()
    }
}

/// A finished report.
#[derive(Debug, Clone)]
pub struct Report {
    pub period: ReportPeriod,
    pub title: String,
    pub filename: String,
    pub days: Vec<Date>,
    pub feeders: Vec<FeederView>,
    pub rows: Vec<FeederMatrix>,
    pub analyses: Vec<FeederAnalysis>,
    pub document: GridDocument,
}

impl Report {
    pub fn to_bytes(&self) -> ReportResult<Vec<u8>> {
        grid::xlsx::to_bytes(&self.document)
    }

    pub fn write_to<W: Write>(&self, out: W) -> ReportResult<()> {
        grid::xlsx::write_to(&self.document, out)
    }
}

pub struct Orchestrator {
    feeders: Arc<dyn FeederDirectory>,
    hierarchy: Arc<dyn HierarchyDirectory>,
    readings: Arc<dyn ReadingStore>,
    cache: ReadingRangeCache,
    template: Template,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    pub fn new<S>(
        store: Arc<S>,
        template: Template,
        clock: Arc<dyn Clock>,
        cache_ttl: Duration,
        cache_capacity: usize,
    ) -> Self
    where
        S: FeederDirectory + HierarchyDirectory + ReadingStore + 'static,
    {
        Self {
            feeders: store.clone(),
            hierarchy: store.clone(),
            readings: store,
            cache: ReadingRangeCache::new(cache_ttl, cache_capacity, Arc::clone(&clock)),
            template,
            clock,
        }
    }

    pub fn cache(&self) -> &ReadingRangeCache {
        &self.cache
    }

    /// Report for one day; `None` means today.
    pub async fn daily(&self, date: Option<Date>, include_analysis: bool) -> ReportResult<Report> {
        let query = ReportQuery {
            date,
            include_analysis,
            ..ReportQuery::default()
        };
        self.run(&query).await
    }

    pub async fn range(
        &self,
        start: Date,
        end: Date,
        include_analysis: bool,
    ) -> ReportResult<Report> {
        let query = ReportQuery {
            start: Some(start),
            end: Some(end),
            include_analysis,
            ..ReportQuery::default()
        };
        self.run(&query).await
    }

    /// Report over a feeder subset narrowed by region, hub and/or ids.
    pub async fn filtered(&self, query: &ReportQuery) -> ReportResult<Report> {
        self.run(query).await
    }

    pub async fn run(&self, query: &ReportQuery) -> ReportResult<Report> {
        let started = Instant::now();
        let today = dates::utc_day(self.clock.now());
        let period = query.period(today)?;
        let days = period.days()?;
        let (start, end) = period.bounds();

        let (regions, hubs) =
            tokio::try_join!(self.hierarchy.regions(), self.hierarchy.business_hubs())?;
        let feeder_query = resolve_filters(query, &regions, &hubs)?;

        let readings = CachedReadings::new(self.readings.as_ref(), &self.cache);
        let (feeders, readings) =
            tokio::try_join!(self.feeders.feeders(&feeder_query), readings.range(start, end))?;
        let feeders = materialize(feeders, &regions, &hubs);

        if feeders.is_empty() {
            tracing::info!(filtered = query.is_filtered(), "no feeders matched report selection");
            return Err(ReportError::NoFeedersFound);
        }

        let report = self.assemble(period, days, feeders, &readings, query.include_analysis)?;

        metrics::counter!("report_runs_total").increment(1);
        metrics::histogram!("report_build_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(
            feeders = report.feeders.len(),
            days = report.days.len(),
            analysed = report
                .analyses
                .iter()
                .filter(|a| a.classification.is_evaluated())
                .count(),
            sheets = report.document.sheets.len(),
            "report generated"
        );

        Ok(report)
    }

    fn assemble(
        &self,
        period: ReportPeriod,
        days: Vec<Date>,
        feeders: Vec<FeederView>,
        readings: &[Reading],
        include_analysis: bool,
    ) -> ReportResult<Report> {
        let rows = matrix::build(&feeders, &days, readings);
        let analyses: Vec<FeederAnalysis> = feeders
            .iter()
            .zip(&rows)
            .map(|(f, r)| categories::analyse(f, r))
            .collect();

        let title = period.title();
        let document = grid::render(
            &self.template,
            &RenderInput {
                title: &title,
                days: &days,
                feeders: &feeders,
                rows: &rows,
                analyses: &analyses,
                include_analysis,
            },
        )?;

        Ok(Report {
            filename: period.filename(),
            period,
            title,
            days,
            feeders,
            rows,
            analyses,
            document,
        })
    }
}

/// Turn region/hub names into ids. Runs before any reading is fetched.
fn resolve_filters(
    query: &ReportQuery,
    regions: &[Region],
    hubs: &[BusinessHub],
) -> ReportResult<FeederQuery> {
    let mut feeder_query = FeederQuery {
        feeder_ids: query.feeder_ids.clone(),
        active_only: true,
        ..FeederQuery::default()
    };

    if let Some(name) = &query.region {
        let region = find_region(regions, name).ok_or_else(|| ReportError::LookupNotFound {
            kind: "region",
            name: name.clone(),
        })?;
        feeder_query.region_id = Some(region.id.clone());
    }

    if let Some(name) = &query.business_hub {
        let hub = find_business_hub(hubs, name).ok_or_else(|| ReportError::LookupNotFound {
            kind: "business hub",
            name: name.clone(),
        })?;
        feeder_query.business_hub_id = Some(hub.id.clone());
    }

    Ok(feeder_query)
}
