//! Patient record model.
//!
//! This module defines the patient entity and its validation rules, the
//! derived health metrics (body-mass index and verdict), and the partial-edit
//! overlay used by update operations.
//!
//! Derived metrics are pure functions of `height`/`weight`. They are never
//! independently settable: every read path recomputes them from the input
//! fields, and any snapshot of them found in a payload or on disk is ignored.
//!
//! ## Pure data operations
//!
//! This module contains **only** data operations—no API concerns such as
//! HTTP servers or wire formats. API-level logic belongs in `api-rest`.

use crate::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Patient gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Parses one of the three accepted literals: `Male`, `Female`, `Other`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidField` for any other input.
    pub fn parse(input: &str) -> RegistryResult<Self> {
        match input {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            "Other" => Ok(Gender::Other),
            _ => Err(RegistryError::InvalidField {
                field: "gender",
                constraint: format!("must be one of 'Male', 'Female' or 'Other' (got '{input}')"),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorical health classification derived from BMI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Underweight,
    #[serde(rename = "Normal weight")]
    NormalWeight,
    Overweight,
    Obese,
}

impl Verdict {
    /// Classifies a BMI value into its health band.
    ///
    /// The bands are deliberately kept exactly as the product defines them:
    /// values in `[24.9, 25)` fall through to `Obese`.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Verdict::Underweight
        } else if (18.5..24.9).contains(&bmi) {
            Verdict::NormalWeight
        } else if (25.0..29.9).contains(&bmi) {
            Verdict::Overweight
        } else {
            Verdict::Obese
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Underweight => "Underweight",
            Verdict::NormalWeight => "Normal weight",
            Verdict::Overweight => "Overweight",
            Verdict::Obese => "Obese",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body-mass index from height (metres) and weight (kilograms), rounded to
/// two decimal places.
pub fn bmi(height: f64, weight: f64) -> f64 {
    ((weight / (height * height)) * 100.0).round() / 100.0
}

/// A validated patient record.
///
/// Construction enforces the field constraints; fields are private so a
/// record cannot drift out of its validated state. The derived metrics are
/// exposed as methods ([`bmi`](Patient::bmi), [`verdict`](Patient::verdict))
/// and recomputed on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    id: String,
    name: String,
    city: String,
    age: u32,
    gender: Gender,
    height: f64,
    weight: f64,
}

impl Patient {
    /// Validates raw input fields and constructs a record.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidField` if:
    /// - `id` is empty or whitespace-only,
    /// - `age` is outside the exclusive bounds (0, 120),
    /// - `height` or `weight` is not greater than zero.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        city: impl Into<String>,
        age: i64,
        gender: Gender,
        height: f64,
        weight: f64,
    ) -> RegistryResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(RegistryError::InvalidField {
                field: "id",
                constraint: "cannot be empty".into(),
            });
        }

        if age <= 0 || age >= 120 {
            return Err(RegistryError::InvalidField {
                field: "age",
                constraint: "must be greater than 0 and less than 120".into(),
            });
        }

        if !(height > 0.0) {
            return Err(RegistryError::InvalidField {
                field: "height",
                constraint: "must be greater than 0".into(),
            });
        }

        if !(weight > 0.0) {
            return Err(RegistryError::InvalidField {
                field: "weight",
                constraint: "must be greater than 0".into(),
            });
        }

        Ok(Self {
            id,
            name: name.into(),
            city: city.into(),
            age: age as u32,
            gender,
            height,
            weight,
        })
    }

    /// Rebuilds a validated record from stored fields.
    ///
    /// Any derived snapshot on the stored record is ignored; callers observe
    /// freshly recomputed metrics.
    pub fn from_stored(id: impl Into<String>, stored: &StoredRecord) -> RegistryResult<Self> {
        Self::new(
            id,
            stored.name.clone(),
            stored.city.clone(),
            i64::from(stored.age),
            stored.gender,
            stored.height,
            stored.weight,
        )
    }

    /// Converts the record into its persisted shape.
    ///
    /// The derived metrics are included as a snapshot for human readers of
    /// the store file; read paths recompute them regardless.
    pub fn to_stored(&self) -> StoredRecord {
        StoredRecord {
            name: self.name.clone(),
            city: self.city.clone(),
            age: self.age,
            gender: self.gender,
            height: self.height,
            weight: self.weight,
            bmi: Some(self.bmi()),
            verdict: Some(self.verdict()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Body-mass index, recomputed from the current height and weight.
    pub fn bmi(&self) -> f64 {
        bmi(self.height, self.weight)
    }

    /// Health verdict, recomputed from the current BMI.
    pub fn verdict(&self) -> Verdict {
        Verdict::from_bmi(self.bmi())
    }
}

/// Persisted shape of a record: the non-id input fields plus an optional
/// derived snapshot.
///
/// The snapshot (`bmi`/`verdict`) may be absent in older store files and is
/// never trusted on read; [`Patient::from_stored`] recomputes both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub name: String,
    pub city: String,
    pub age: u32,
    pub gender: Gender,
    pub height: f64,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

/// Per-field wrapper for partial edits, tracking presence explicitly.
///
/// A field absent from an edit payload must leave the stored value untouched,
/// while an explicit null is an attempt to clear a required field and fails
/// validation on merge. `Option` alone cannot tell those apart.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> From<Option<Option<T>>> for Patch<T> {
    fn from(value: Option<Option<T>>) -> Self {
        match value {
            None => Patch::Absent,
            Some(None) => Patch::Null,
            Some(Some(v)) => Patch::Value(v),
        }
    }
}

/// A partial-field overlay over the non-id attributes.
///
/// Gender is carried as the raw literal so that enum validation happens in
/// one place, when the merged record is rebuilt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientPatch {
    pub name: Patch<String>,
    pub city: Patch<String>,
    pub age: Patch<i64>,
    pub gender: Patch<String>,
    pub height: Patch<f64>,
    pub weight: Patch<f64>,
}

fn overlay<T: Clone>(field: &'static str, patch: &Patch<T>, existing: &T) -> RegistryResult<T> {
    match patch {
        Patch::Absent => Ok(existing.clone()),
        Patch::Null => Err(RegistryError::InvalidField {
            field,
            constraint: "cannot be null".into(),
        }),
        Patch::Value(v) => Ok(v.clone()),
    }
}

impl PatientPatch {
    /// Overlays the supplied fields onto `stored` and rebuilds a full record.
    ///
    /// Only fields actually present in the patch are touched. The merged
    /// fields go through full [`Patient::new`] validation, so an edit can
    /// never persist an invalid record, and the derived metrics of the result
    /// reflect the merged height/weight.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidField` if a supplied field is null or
    /// the merged fields fail validation.
    pub fn apply(&self, id: &str, stored: &StoredRecord) -> RegistryResult<Patient> {
        let name = overlay("name", &self.name, &stored.name)?;
        let city = overlay("city", &self.city, &stored.city)?;
        let age = overlay("age", &self.age, &i64::from(stored.age))?;
        let gender = match &self.gender {
            Patch::Absent => stored.gender,
            Patch::Null => {
                return Err(RegistryError::InvalidField {
                    field: "gender",
                    constraint: "cannot be null".into(),
                })
            }
            Patch::Value(literal) => Gender::parse(literal)?,
        };
        let height = overlay("height", &self.height, &stored.height)?;
        let weight = overlay("weight", &self.weight, &stored.weight)?;

        Patient::new(id, name, city, age, gender, height, weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(age: u32, height: f64, weight: f64) -> StoredRecord {
        StoredRecord {
            name: "Asha Rai".into(),
            city: "Kathmandu".into(),
            age,
            gender: Gender::Female,
            height,
            weight,
            bmi: None,
            verdict: None,
        }
    }

    #[test]
    fn bmi_is_weight_over_height_squared_rounded_to_two_places() {
        assert_eq!(bmi(1.75, 70.0), 22.86);
        assert_eq!(bmi(1.8, 81.0), 25.0);
        assert_eq!(bmi(2.0, 100.0), 25.0);
    }

    #[test]
    fn verdict_bands_follow_the_four_band_rule() {
        assert_eq!(Verdict::from_bmi(18.49), Verdict::Underweight);
        assert_eq!(Verdict::from_bmi(18.5), Verdict::NormalWeight);
        assert_eq!(Verdict::from_bmi(24.89), Verdict::NormalWeight);
        assert_eq!(Verdict::from_bmi(25.0), Verdict::Overweight);
        assert_eq!(Verdict::from_bmi(29.89), Verdict::Overweight);
        assert_eq!(Verdict::from_bmi(29.9), Verdict::Obese);
        assert_eq!(Verdict::from_bmi(40.0), Verdict::Obese);
    }

    #[test]
    fn verdict_gap_between_normal_and_overweight_is_obese() {
        // [24.9, 25) matches no stated band and falls through.
        assert_eq!(Verdict::from_bmi(24.9), Verdict::Obese);
        assert_eq!(Verdict::from_bmi(24.95), Verdict::Obese);
        assert_eq!(Verdict::from_bmi(24.99), Verdict::Obese);
    }

    #[test]
    fn construction_validates_age_bounds() {
        for age in [0, 120, 500, -3] {
            let err = Patient::new("P001", "A", "B", age, Gender::Other, 1.7, 60.0)
                .expect_err("age outside (0, 120) should be rejected");
            assert!(matches!(
                err,
                RegistryError::InvalidField { field: "age", .. }
            ));
        }

        assert!(Patient::new("P001", "A", "B", 1, Gender::Other, 1.7, 60.0).is_ok());
        assert!(Patient::new("P001", "A", "B", 119, Gender::Other, 1.7, 60.0).is_ok());
    }

    #[test]
    fn construction_validates_positive_height_and_weight() {
        let err = Patient::new("P001", "A", "B", 30, Gender::Male, 0.0, 60.0)
            .expect_err("zero height should be rejected");
        assert!(matches!(
            err,
            RegistryError::InvalidField { field: "height", .. }
        ));

        let err = Patient::new("P001", "A", "B", 30, Gender::Male, 1.7, -2.0)
            .expect_err("negative weight should be rejected");
        assert!(matches!(
            err,
            RegistryError::InvalidField { field: "weight", .. }
        ));
    }

    #[test]
    fn construction_rejects_empty_id() {
        let err = Patient::new("  ", "A", "B", 30, Gender::Male, 1.7, 60.0)
            .expect_err("blank id should be rejected");
        assert!(matches!(
            err,
            RegistryError::InvalidField { field: "id", .. }
        ));
    }

    #[test]
    fn gender_parse_accepts_only_the_three_literals() {
        assert_eq!(Gender::parse("Male").unwrap(), Gender::Male);
        assert_eq!(Gender::parse("Female").unwrap(), Gender::Female);
        assert_eq!(Gender::parse("Other").unwrap(), Gender::Other);
        assert!(Gender::parse("male").is_err());
        assert!(Gender::parse("Unknown").is_err());
    }

    #[test]
    fn derived_metrics_recomputed_not_trusted_from_snapshot() {
        let mut record = stored(30, 1.75, 70.0);
        record.bmi = Some(99.0);
        record.verdict = Some(Verdict::Obese);

        let patient = Patient::from_stored("P001", &record).unwrap();
        assert_eq!(patient.bmi(), 22.86);
        assert_eq!(patient.verdict(), Verdict::NormalWeight);
    }

    #[test]
    fn stored_snapshot_round_trips_through_serde() {
        let patient = Patient::new("P001", "Asha Rai", "Kathmandu", 30, Gender::Female, 1.75, 70.0)
            .unwrap();
        let json = serde_json::to_value(patient.to_stored()).unwrap();

        assert_eq!(json["gender"], "Female");
        assert_eq!(json["bmi"], 22.86);
        assert_eq!(json["verdict"], "Normal weight");

        // Snapshot fields are optional on the way back in.
        let bare: StoredRecord = serde_json::from_value(serde_json::json!({
            "name": "Asha Rai",
            "city": "Kathmandu",
            "age": 30,
            "gender": "Female",
            "height": 1.75,
            "weight": 70.0
        }))
        .unwrap();
        assert_eq!(bare.bmi, None);
        assert_eq!(bare.verdict, None);
    }

    #[test]
    fn patch_with_only_age_leaves_other_fields_untouched() {
        let record = stored(30, 1.75, 70.0);
        let patch = PatientPatch {
            age: Patch::Value(31),
            ..PatientPatch::default()
        };

        let merged = patch.apply("P001", &record).unwrap();
        assert_eq!(merged.age(), 31);
        assert_eq!(merged.name(), "Asha Rai");
        assert_eq!(merged.city(), "Kathmandu");
        assert_eq!(merged.gender(), Gender::Female);
        assert_eq!(merged.height(), 1.75);
        assert_eq!(merged.weight(), 70.0);
    }

    #[test]
    fn patch_changing_weight_recomputes_derived_metrics() {
        let record = stored(30, 1.75, 70.0);
        let patch = PatientPatch {
            weight: Patch::Value(95.0),
            ..PatientPatch::default()
        };

        let merged = patch.apply("P001", &record).unwrap();
        assert_eq!(merged.bmi(), 31.02);
        assert_eq!(merged.verdict(), Verdict::Obese);
    }

    #[test]
    fn patch_null_is_a_validation_error_not_a_no_op() {
        let record = stored(30, 1.75, 70.0);
        let patch = PatientPatch {
            name: Patch::Null,
            ..PatientPatch::default()
        };

        let err = patch.apply("P001", &record).expect_err("null must not merge");
        assert!(matches!(
            err,
            RegistryError::InvalidField { field: "name", .. }
        ));
    }

    #[test]
    fn patch_merge_revalidates_the_merged_record() {
        let record = stored(30, 1.75, 70.0);
        let patch = PatientPatch {
            age: Patch::Value(500),
            ..PatientPatch::default()
        };

        assert!(patch.apply("P001", &record).is_err());

        let patch = PatientPatch {
            gender: Patch::Value("Robot".into()),
            ..PatientPatch::default()
        };
        assert!(matches!(
            patch.apply("P001", &record),
            Err(RegistryError::InvalidField { field: "gender", .. })
        ));
    }
}
