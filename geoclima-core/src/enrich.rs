//! Pairs catalog records with weather lookups.
//!
//! Every record gets its own request and its own outcome, so one failure never
//! affects the rest of a batch. Output order always follows input order. With the
//! default concurrency of 1 the requests go out strictly one after another; a higher
//! limit keeps that many requests in flight.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::num::NonZeroUsize;
use tracing::info;

use crate::model::{LocationRecord, WeatherOutcome};
use crate::provider::WeatherProvider;

/// A record with the weather fetched for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enriched<'a> {
    pub record: &'a LocationRecord,
    pub weather: WeatherOutcome,
}

/// Counts of a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichSummary {
    pub available: usize,
    pub unavailable: usize,
}

impl EnrichSummary {
    pub fn of(batch: &[Enriched<'_>]) -> Self {
        let available = batch.iter().filter(|e| e.weather.is_available()).count();
        Self {
            available,
            unavailable: batch.len() - available,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Enricher<'p> {
    provider: &'p dyn WeatherProvider,
    concurrency: NonZeroUsize,
}

impl<'p> Enricher<'p> {
    /// Sequential enricher.
    pub fn new(provider: &'p dyn WeatherProvider) -> Self {
        Self {
            provider,
            concurrency: NonZeroUsize::MIN,
        }
    }

    /// Cap on simultaneous requests; 0 is treated as 1.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = NonZeroUsize::new(limit).unwrap_or(NonZeroUsize::MIN);
        self
    }

    /// Detail view: one record, one request.
    pub async fn one<'a>(&self, record: &'a LocationRecord) -> Enriched<'a> {
        Enriched {
            record,
            weather: self.provider.fetch(record.coordinates).await,
        }
    }

    /// Bulk view: one request per record, results in input order.
    pub async fn all<'a, I>(&self, records: I) -> Vec<Enriched<'a>>
    where
        I: IntoIterator<Item = &'a LocationRecord>,
    {
        self.all_with_progress(records, |_, _| {}).await
    }

    /// Like `all`, calling `on_progress(done, total)` after each record completes.
    pub async fn all_with_progress<'a, I, F>(
        &self,
        records: I,
        mut on_progress: F,
    ) -> Vec<Enriched<'a>>
    where
        I: IntoIterator<Item = &'a LocationRecord>,
        F: FnMut(usize, usize),
    {
        let records: Vec<&'a LocationRecord> = records.into_iter().collect();
        let total = records.len();
        let mut out = Vec::with_capacity(total);

        let mut results = stream::iter(records)
            .map(|record| self.one(record))
            .buffered(self.concurrency.get());

        while let Some(enriched) = results.next().await {
            out.push(enriched);
            on_progress(out.len(), total);
        }

        let summary = EnrichSummary::of(&out);
        info!(
            total,
            available = summary.available,
            unavailable = summary.unavailable,
            "Enrichment finished"
        );

        out
    }
}
