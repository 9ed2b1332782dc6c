use std::thread;
use std::time::{Duration, Instant};

use bson::doc;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::domain::{LicenseCategory, LicenseRecord};
use crate::error::OmmaError;
use crate::registry::{FetchEnvelope, RegistryClient};
use crate::store::RecordStore;

#[derive(Debug, Clone)]
pub struct RefreshSummary {
    pub categories: usize,
    pub failed_categories: usize,
    pub records_upserted: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct InitSummary {
    pub fetched: usize,
    pub inserted: usize,
}

pub struct App<C: RegistryClient, S: RecordStore> {
    registry: C,
    store: S,
}

impl<C: RegistryClient, S: RecordStore> App<C, S> {
    pub fn new(registry: C, store: S) -> Self {
        Self { registry, store }
    }

    pub fn query_by_category(
        &self,
        category: LicenseCategory,
    ) -> Result<Vec<LicenseRecord>, OmmaError> {
        let envelope = self.registry.fetch_by_category(category)?;
        let envelope = check_envelope(envelope, category.url_encoded_name())?;

        // The upstream keyword search can match loosely; keep only exact
        // category labels. An empty remainder is not an error.
        let mut records = envelope.result;
        records.retain(|record| record.license_type == category.display_name());
        Ok(records)
    }

    pub fn query_by_license_number(
        &self,
        license_number: &str,
    ) -> Result<LicenseRecord, OmmaError> {
        let envelope = self.registry.fetch_by_keyword(license_number)?;
        let mut envelope = check_envelope(envelope, license_number)?;
        Ok(envelope.result.swap_remove(0))
    }

    pub fn refresh(&self, categories: &[LicenseCategory]) -> RefreshSummary {
        let start = Instant::now();

        let outcomes: Vec<Option<usize>> = thread::scope(|scope| {
            let workers: Vec<_> = categories
                .iter()
                .enumerate()
                .map(|(worker, &category)| {
                    scope.spawn(move || self.refresh_category(worker, category))
                })
                .collect();
            workers
                .into_iter()
                .map(|handle| handle.join().unwrap_or(None))
                .collect()
        });

        let failed_categories = outcomes.iter().filter(|outcome| outcome.is_none()).count();
        let records_upserted = outcomes.iter().flatten().sum();
        let elapsed = start.elapsed();
        info!(
            "refreshed {} categories ({} failed, {} records) in {:.2?}",
            categories.len(),
            failed_categories,
            records_upserted,
            elapsed
        );

        RefreshSummary {
            categories: categories.len(),
            failed_categories,
            records_upserted,
            elapsed,
        }
    }

    fn refresh_category(&self, worker: usize, category: LicenseCategory) -> Option<usize> {
        let start = Instant::now();
        info!("[{worker:2}] processing category '{category}'");

        let mut records = match self.query_by_category(category) {
            Ok(records) => records,
            Err(err) => {
                error!("[{worker:2}] category '{category}' failed: {err}");
                return None;
            }
        };
        info!(
            "[{worker:2}] got {} records in {:.2?}",
            records.len(),
            start.elapsed()
        );

        let as_of = Utc::now();
        for record in &mut records {
            record.normalize(as_of);
        }

        let failures = self
            .store
            .upsert_many(&doc! { "licenseType": category.display_name() }, &records);
        for err in &failures {
            warn!("[{worker:2}] upsert failed for '{category}': {err}");
        }

        info!(
            "[{worker:2}] finished category '{category}' in {:.2?}",
            start.elapsed()
        );
        Some(records.len() - failures.len())
    }

    pub fn init_database(&self, destroy: bool) -> Result<InitSummary, OmmaError> {
        info!("collecting the full license dataset");
        let mut records = self.registry.fetch_all()?;

        let count = self.store.count_all()?;
        if count > 0 && !destroy {
            return Err(OmmaError::CollectionPopulated);
        }
        if count > 0 {
            info!("destroy set, dropping collection ({count} documents)");
            self.store.drop_collection()?;
        }

        info!("inserting {} records", records.len());
        let as_of = Utc::now();
        let mut inserted = 0usize;
        for record in &mut records {
            record.normalize(as_of);
            match self.store.insert_one(record) {
                Ok(()) => inserted += 1,
                Err(err) => {
                    warn!("insert failed for license {}: {err}", record.license_number);
                }
            }
        }

        info!("inserted {inserted} / {} records", records.len());
        Ok(InitSummary {
            fetched: records.len(),
            inserted,
        })
    }
}

// The three rejection conditions are OR'd: a non-zero code, a sub-1 count, or
// an empty array each fail the query on their own.
fn check_envelope(envelope: FetchEnvelope, query: &str) -> Result<FetchEnvelope, OmmaError> {
    if envelope.error_code != 0 {
        return Err(OmmaError::Registry {
            code: envelope.error_code,
            message: envelope.error_message,
        });
    }
    if envelope.result_count < 1 || envelope.result.is_empty() {
        return Err(OmmaError::EmptyResult(query.to_string()));
    }
    Ok(envelope)
}
