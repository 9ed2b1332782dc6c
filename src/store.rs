use bson::{Document, doc};
use mongodb::sync::{Client, Collection, Cursor};

use crate::config::MongoConfig;
use crate::domain::LicenseRecord;
use crate::error::OmmaError;

pub trait RecordStore: Send + Sync {
    fn count_all(&self) -> Result<u64, OmmaError>;
    fn drop_collection(&self) -> Result<(), OmmaError>;
    fn find_one(&self, filter: Document) -> Result<Option<Document>, OmmaError>;
    fn insert_one(&self, record: &LicenseRecord) -> Result<(), OmmaError>;
    fn upsert_one(&self, filter: Document, update: Document) -> Result<(), OmmaError>;

    // Each record gets its own filter value; the base filter is never
    // mutated. Individual failures are collected, not fatal.
    fn upsert_many(&self, base_filter: &Document, records: &[LicenseRecord]) -> Vec<OmmaError> {
        let mut failures = Vec::new();
        for record in records {
            let mut filter = base_filter.clone();
            filter.insert("licenseNumber", record.license_number.as_str());
            let update = match bson::to_document(record) {
                Ok(document) => document,
                Err(err) => {
                    failures.push(OmmaError::Database(err.to_string()));
                    continue;
                }
            };
            if let Err(err) = self.upsert_one(filter, doc! { "$set": update }) {
                failures.push(err);
            }
        }
        failures
    }
}

#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    collection: Collection<Document>,
}

impl MongoStore {
    // The driver connects lazily; the ping makes an unreachable server fail
    // here instead of inside the first worker thread.
    pub fn connect(config: &MongoConfig) -> Result<Self, OmmaError> {
        let client =
            Client::with_uri_str(config.uri()).map_err(|err| OmmaError::Database(err.to_string()))?;
        let database = client.database(&config.database);
        database
            .run_command(doc! { "ping": 1 })
            .run()
            .map_err(|err| OmmaError::Database(err.to_string()))?;
        let collection = database.collection(&config.collection);
        Ok(Self { client, collection })
    }

    pub fn close(self) {
        self.client.shutdown();
    }

    pub fn find(
        &self,
        filter: Document,
        projection: Document,
    ) -> Result<Cursor<Document>, OmmaError> {
        self.collection
            .find(filter)
            .projection(projection)
            .run()
            .map_err(|err| OmmaError::Database(err.to_string()))
    }
}

impl RecordStore for MongoStore {
    fn count_all(&self) -> Result<u64, OmmaError> {
        self.collection
            .count_documents(doc! {})
            .run()
            .map_err(|err| OmmaError::Database(err.to_string()))
    }

    fn drop_collection(&self) -> Result<(), OmmaError> {
        self.collection
            .drop()
            .run()
            .map_err(|err| OmmaError::Database(err.to_string()))
    }

    fn find_one(&self, filter: Document) -> Result<Option<Document>, OmmaError> {
        self.collection
            .find_one(filter)
            .run()
            .map_err(|err| OmmaError::Database(err.to_string()))
    }

    fn insert_one(&self, record: &LicenseRecord) -> Result<(), OmmaError> {
        let document =
            bson::to_document(record).map_err(|err| OmmaError::Database(err.to_string()))?;
        self.collection
            .insert_one(document)
            .run()
            .map_err(|err| OmmaError::Database(err.to_string()))?;
        Ok(())
    }

    fn upsert_one(&self, filter: Document, update: Document) -> Result<(), OmmaError> {
        self.collection
            .update_one(filter, update)
            .upsert(true)
            .run()
            .map_err(|err| OmmaError::Database(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct CapturingStore {
        upserts: Mutex<Vec<(Document, Document)>>,
        fail_for: Vec<String>,
    }

    impl RecordStore for CapturingStore {
        fn count_all(&self) -> Result<u64, OmmaError> {
            Ok(0)
        }

        fn drop_collection(&self) -> Result<(), OmmaError> {
            Ok(())
        }

        fn find_one(&self, _filter: Document) -> Result<Option<Document>, OmmaError> {
            Ok(None)
        }

        fn insert_one(&self, _record: &LicenseRecord) -> Result<(), OmmaError> {
            Ok(())
        }

        fn upsert_one(&self, filter: Document, update: Document) -> Result<(), OmmaError> {
            let number = filter
                .get_str("licenseNumber")
                .unwrap_or_default()
                .to_string();
            self.upserts.lock().unwrap().push((filter, update));
            if self.fail_for.contains(&number) {
                return Err(OmmaError::Database(format!("induced failure for {number}")));
            }
            Ok(())
        }
    }

    fn record(license_number: &str) -> LicenseRecord {
        let raw = format!(
            r#"{{"licenseNumber": "{license_number}", "licenseType": "Grower"}}"#
        );
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn upsert_many_builds_a_fresh_filter_per_record() {
        let store = CapturingStore::default();
        let base = doc! { "licenseType": "Grower" };
        let records = vec![record("A"), record("B"), record("C")];

        let failures = store.upsert_many(&base, &records);
        assert!(failures.is_empty());

        // base filter untouched
        assert_eq!(base, doc! { "licenseType": "Grower" });

        let upserts = store.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 3);
        for ((filter, update), number) in upserts.iter().zip(["A", "B", "C"]) {
            assert_eq!(filter.get_str("licenseType").unwrap(), "Grower");
            assert_eq!(filter.get_str("licenseNumber").unwrap(), number);
            let set = update.get_document("$set").unwrap();
            assert_eq!(set.get_str("licenseNumber").unwrap(), number);
        }
    }

    #[test]
    fn upsert_many_continues_past_failures() {
        let store = CapturingStore {
            fail_for: vec!["B".to_string(), "D".to_string()],
            ..CapturingStore::default()
        };
        let records = vec![record("A"), record("B"), record("C"), record("D")];

        let failures = store.upsert_many(&doc! { "licenseType": "Grower" }, &records);

        assert_eq!(failures.len(), 2);
        assert_eq!(store.upserts.lock().unwrap().len(), 4);
    }
}
