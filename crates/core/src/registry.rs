//! Patient registry operations.
//!
//! [`RegistryService`] is the single entry point for queries and mutations
//! over the patient collection. Every operation is a full load-mutate-save
//! cycle against the injected [`PatientStore`]: the whole mapping is read,
//! changed in memory, and (for writes) rewritten before the call returns.
//!
//! There is no cross-request mutual exclusion. Concurrent writers race and
//! the last `save` wins at whole-store granularity; callers that need
//! stronger guarantees should inject a store implementation that provides
//! them. This is an accepted property of the design, not an oversight.

use crate::error::{RegistryError, RegistryResult};
use crate::patient::{Patient, PatientPatch};
use crate::store::{PatientStore, Store};
use std::sync::Arc;

/// Field a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Gender,
    Age,
}

impl SortKey {
    /// Parses a sort field name.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidQuery` for anything other than
    /// `gender` or `age`.
    pub fn parse(input: &str) -> RegistryResult<Self> {
        match input {
            "gender" => Ok(SortKey::Gender),
            "age" => Ok(SortKey::Age),
            _ => Err(RegistryError::InvalidQuery(format!(
                "invalid sort field '{input}': valid fields are 'gender' and 'age'"
            ))),
        }
    }
}

/// Direction of a sorted listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Parses a sort direction, `asc` or `desc`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidQuery` for any other input.
    pub fn parse(input: &str) -> RegistryResult<Self> {
        match input {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(RegistryError::InvalidQuery(format!(
                "invalid order '{input}': valid orders are 'asc' and 'desc'"
            ))),
        }
    }
}

/// Pure registry operations over an injected store—no API concerns.
#[derive(Clone)]
pub struct RegistryService {
    store: Arc<dyn PatientStore>,
}

impl RegistryService {
    /// Creates a new registry over the given store.
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self { store }
    }

    /// Returns the full store as-is.
    ///
    /// Stored fields are returned verbatim, including any persisted derived
    /// snapshot; nothing is recomputed here. Use [`get`](Self::get) for a
    /// record with fresh metrics.
    pub fn list(&self) -> RegistryResult<Store> {
        self.store.load()
    }

    /// Fetches one record by exact id match.
    ///
    /// The whole collection is consulted; `NotFound` is returned only when
    /// no element matches. The result is rebuilt through the record model,
    /// so its derived metrics are freshly recomputed.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` for an unknown id.
    pub fn get(&self, id: &str) -> RegistryResult<Patient> {
        let store = self.store.load()?;
        let stored = store
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        Patient::from_stored(id, stored)
    }

    /// Returns all records sorted by `key` in the requested order.
    ///
    /// The sort is stable; records comparing equal keep the store's listing
    /// order. Descending reverses the comparison, not the output, so ties
    /// also keep listing order.
    pub fn sort(&self, key: SortKey, order: SortOrder) -> RegistryResult<Vec<Patient>> {
        let store = self.store.load()?;
        let mut records = store
            .iter()
            .map(|(id, stored)| Patient::from_stored(id.as_str(), stored))
            .collect::<RegistryResult<Vec<_>>>()?;

        match (key, order) {
            (SortKey::Age, SortOrder::Ascending) => records.sort_by_key(Patient::age),
            (SortKey::Age, SortOrder::Descending) => {
                records.sort_by(|a, b| b.age().cmp(&a.age()))
            }
            (SortKey::Gender, SortOrder::Ascending) => {
                records.sort_by(|a, b| a.gender().as_str().cmp(b.gender().as_str()))
            }
            (SortKey::Gender, SortOrder::Descending) => {
                records.sort_by(|a, b| b.gender().as_str().cmp(a.gender().as_str()))
            }
        }

        Ok(records)
    }

    /// Inserts a new record keyed by its id and persists the store.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateId` if the id is already present;
    /// the existing record is left unmodified and nothing is persisted.
    pub fn create(&self, patient: &Patient) -> RegistryResult<()> {
        let mut store = self.store.load()?;

        if store.contains_key(patient.id()) {
            return Err(RegistryError::DuplicateId(patient.id().to_string()));
        }

        store.insert(patient.id().to_string(), patient.to_stored());
        self.store.save(&store)
    }

    /// Overlays a partial edit onto an existing record and persists it.
    ///
    /// Only fields present in the patch are touched. The merged record goes
    /// through full model validation before anything is written, so a bad
    /// edit surfaces as a validation error instead of persisting invalid
    /// data.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` for an unknown id, or
    /// `RegistryError::InvalidField` if the merged fields fail validation.
    pub fn update(&self, id: &str, patch: &PatientPatch) -> RegistryResult<Patient> {
        let mut store = self.store.load()?;
        let stored = store
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        let merged = patch.apply(id, stored)?;
        store.insert(id.to_string(), merged.to_stored());
        self.store.save(&store)?;

        Ok(merged)
    }

    /// Removes a record and persists the store.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` for an unknown id.
    pub fn delete(&self, id: &str) -> RegistryResult<()> {
        let mut store = self.store.load()?;

        if store.remove(id).is_none() {
            return Err(RegistryError::NotFound(id.to_string()));
        }

        self.store.save(&store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::{Gender, Patch, Verdict};
    use crate::store::InMemoryStore;

    fn registry() -> RegistryService {
        RegistryService::new(Arc::new(InMemoryStore::new()))
    }

    fn patient(id: &str, age: i64, gender: Gender) -> Patient {
        Patient::new(id, "Test Patient", "Pokhara", age, gender, 1.7, 65.0).unwrap()
    }

    #[test]
    fn create_then_get_returns_fresh_derived_metrics() {
        let registry = registry();
        let created =
            Patient::new("P001", "Asha Rai", "Kathmandu", 30, Gender::Female, 1.75, 70.0).unwrap();
        registry.create(&created).unwrap();

        let fetched = registry.get("P001").unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.bmi(), 22.86);
        assert_eq!(fetched.verdict(), Verdict::NormalWeight);
    }

    #[test]
    fn get_scans_the_whole_collection() {
        let registry = registry();
        registry.create(&patient("P001", 30, Gender::Male)).unwrap();
        registry.create(&patient("P002", 40, Gender::Female)).unwrap();
        registry.create(&patient("P003", 50, Gender::Other)).unwrap();

        // A match beyond the first element must still be found.
        assert_eq!(registry.get("P003").unwrap().age(), 50);
        assert!(matches!(
            registry.get("P999"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn create_duplicate_id_is_a_conflict_and_leaves_the_record_alone() {
        let registry = registry();
        registry.create(&patient("P001", 30, Gender::Male)).unwrap();

        let err = registry
            .create(&patient("P001", 99, Gender::Other))
            .expect_err("duplicate id must be rejected");
        assert!(matches!(err, RegistryError::DuplicateId(_)));

        let unchanged = registry.get("P001").unwrap();
        assert_eq!(unchanged.age(), 30);
        assert_eq!(unchanged.gender(), Gender::Male);
    }

    #[test]
    fn update_with_only_age_leaves_everything_else_unchanged() {
        let registry = registry();
        registry.create(&patient("P001", 30, Gender::Male)).unwrap();

        let patch = PatientPatch {
            age: Patch::Value(31),
            ..PatientPatch::default()
        };
        let updated = registry.update("P001", &patch).unwrap();

        assert_eq!(updated.age(), 31);
        assert_eq!(updated.name(), "Test Patient");
        assert_eq!(updated.city(), "Pokhara");
        assert_eq!(updated.height(), 1.7);
        assert_eq!(updated.weight(), 65.0);
    }

    #[test]
    fn update_weight_recomputes_against_the_old_height() {
        let registry = registry();
        let created =
            Patient::new("P001", "Asha Rai", "Kathmandu", 30, Gender::Female, 1.75, 70.0).unwrap();
        registry.create(&created).unwrap();

        let patch = PatientPatch {
            weight: Patch::Value(95.0),
            ..PatientPatch::default()
        };
        registry.update("P001", &patch).unwrap();

        let fetched = registry.get("P001").unwrap();
        assert_eq!(fetched.height(), 1.75);
        assert_eq!(fetched.bmi(), 31.02);
        assert_eq!(fetched.verdict(), Verdict::Obese);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let registry = registry();
        let patch = PatientPatch::default();
        assert!(matches!(
            registry.update("P404", &patch),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn invalid_merge_surfaces_and_persists_nothing() {
        let registry = registry();
        registry.create(&patient("P001", 30, Gender::Male)).unwrap();

        let patch = PatientPatch {
            height: Patch::Value(0.0),
            ..PatientPatch::default()
        };
        assert!(matches!(
            registry.update("P001", &patch),
            Err(RegistryError::InvalidField { field: "height", .. })
        ));

        assert_eq!(registry.get("P001").unwrap().height(), 1.7);
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let registry = registry();
        registry.create(&patient("P001", 30, Gender::Male)).unwrap();

        registry.delete("P001").unwrap();
        assert!(matches!(
            registry.get("P001"),
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(
            registry.delete("P001"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn sort_by_age_in_both_directions() {
        let registry = registry();
        registry.create(&patient("P001", 30, Gender::Male)).unwrap();
        registry.create(&patient("P002", 20, Gender::Female)).unwrap();
        registry.create(&patient("P003", 25, Gender::Other)).unwrap();

        let ascending = registry.sort(SortKey::Age, SortOrder::Ascending).unwrap();
        let ages: Vec<u32> = ascending.iter().map(Patient::age).collect();
        assert_eq!(ages, vec![20, 25, 30]);

        let descending = registry.sort(SortKey::Age, SortOrder::Descending).unwrap();
        let ages: Vec<u32> = descending.iter().map(Patient::age).collect();
        assert_eq!(ages, vec![30, 25, 20]);
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let registry = registry();
        registry.create(&patient("P003", 30, Gender::Male)).unwrap();
        registry.create(&patient("P001", 30, Gender::Male)).unwrap();
        registry.create(&patient("P002", 30, Gender::Male)).unwrap();

        // All ages equal: listing (id) order must survive, in both directions.
        for order in [SortOrder::Ascending, SortOrder::Descending] {
            let sorted = registry.sort(SortKey::Age, order).unwrap();
            let ids: Vec<&str> = sorted.iter().map(Patient::id).collect();
            assert_eq!(ids, vec!["P001", "P002", "P003"]);
        }
    }

    #[test]
    fn sort_by_gender_compares_the_literals() {
        let registry = registry();
        registry.create(&patient("P001", 30, Gender::Other)).unwrap();
        registry.create(&patient("P002", 30, Gender::Male)).unwrap();
        registry.create(&patient("P003", 30, Gender::Female)).unwrap();

        let sorted = registry.sort(SortKey::Gender, SortOrder::Ascending).unwrap();
        let genders: Vec<&str> = sorted.iter().map(|p| p.gender().as_str()).collect();
        assert_eq!(genders, vec!["Female", "Male", "Other"]);
    }

    #[test]
    fn sort_key_and_order_parsing() {
        assert_eq!(SortKey::parse("gender").unwrap(), SortKey::Gender);
        assert_eq!(SortKey::parse("age").unwrap(), SortKey::Age);
        assert!(matches!(
            SortKey::parse("name"),
            Err(RegistryError::InvalidQuery(_))
        ));

        assert_eq!(SortOrder::parse("asc").unwrap(), SortOrder::Ascending);
        assert_eq!(SortOrder::parse("desc").unwrap(), SortOrder::Descending);
        assert!(matches!(
            SortOrder::parse("sideways"),
            Err(RegistryError::InvalidQuery(_))
        ));
    }

    #[test]
    fn list_returns_the_store_as_is() {
        let registry = registry();
        registry.create(&patient("P001", 30, Gender::Male)).unwrap();

        let store = registry.list().unwrap();
        assert_eq!(store.len(), 1);
        // The persisted derived snapshot is visible verbatim in a listing.
        assert_eq!(store["P001"].bmi, Some(22.49));
    }
}
