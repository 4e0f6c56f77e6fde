//! # API REST
//!
//! REST API implementation for the patient management system.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (wire DTOs, error-to-status mapping, CORS)
//!
//! Core data operations live in `pms-core`; this crate only translates
//! between HTTP and the registry.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use pms_core::{
    Gender, Patch, Patient, PatientPatch, RegistryError, RegistryService, SortKey, SortOrder,
    Store,
};

/// Application state for the REST API server
///
/// Holds the registry service shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    registry: RegistryService,
}

impl AppState {
    pub fn new(registry: RegistryService) -> Self {
        Self { registry }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        root,
        about,
        health,
        view_patients,
        view_patient,
        sort_patients,
        create_patient,
        update_patient,
        delete_patient,
    ),
    components(schemas(
        MessageRes,
        HealthRes,
        ErrorRes,
        PatientRes,
        CreatePatientReq,
        UpdatePatientReq,
    ))
)]
struct ApiDoc;

/// Builds the REST router over the given application state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/about", get(about))
        .route("/health", get(health))
        .route("/view", get(view_patients))
        .route("/patients/:id", get(view_patient))
        .route("/sort", get(sort_patients))
        .route("/create", post(create_patient))
        .route("/edit/:id", put(update_patient))
        .route("/delete/:id", delete(delete_patient))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// WIRE TYPES
// ============================================================================

/// Plain message response used by informational and mutation endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Structured error body: a status code on the response, a detail here.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorRes {
    pub detail: String,
}

/// A full patient record as served to clients, derived metrics included.
#[derive(Debug, Serialize, ToSchema)]
pub struct PatientRes {
    /// The unique ID of the patient
    pub id: String,
    /// Name of the patient
    pub name: String,
    /// City of the patient
    pub city: String,
    /// Age of the patient
    pub age: u32,
    /// Gender of the patient
    pub gender: String,
    /// Height of the patient in metres
    pub height: f64,
    /// Weight of the patient in kilograms
    pub weight: f64,
    /// Body-mass index, recomputed from height and weight
    pub bmi: f64,
    /// Health verdict derived from the BMI
    pub verdict: String,
}

impl From<&Patient> for PatientRes {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id().to_string(),
            name: patient.name().to_string(),
            city: patient.city().to_string(),
            age: patient.age(),
            gender: patient.gender().to_string(),
            height: patient.height(),
            weight: patient.weight(),
            bmi: patient.bmi(),
            verdict: patient.verdict().to_string(),
        }
    }
}

/// Request body for creating a patient: a full record including the id.
///
/// Gender is carried as its literal and numeric ranges are unchecked here;
/// the record model owns all field validation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePatientReq {
    pub id: String,
    pub name: String,
    pub city: String,
    pub age: i64,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
}

/// Request body for a partial update: any subset of the non-id fields.
///
/// Each field is wrapped twice so a field that is absent can be told apart
/// from one explicitly set to null; only supplied fields touch the record.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePatientReq {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub age: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub height: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub weight: Option<Option<f64>>,
}

impl From<UpdatePatientReq> for PatientPatch {
    fn from(req: UpdatePatientReq) -> Self {
        Self {
            name: Patch::from(req.name),
            city: Patch::from(req.city),
            age: Patch::from(req.age),
            gender: Patch::from(req.gender),
            height: Patch::from(req.height),
            weight: Patch::from(req.weight),
        }
    }
}

/// Deserialises a present field into `Some(inner)`, keeping explicit nulls
/// as `Some(None)`. Combined with `#[serde(default)]`, absent fields stay
/// `None`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Query parameters for the sorted listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct SortParams {
    /// Field to sort by: `gender` or `age`
    pub sort_by: String,
    /// Direction: `asc` (default) or `desc`
    pub order: Option<String>,
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

/// Registry error carried to the HTTP layer.
///
/// Every error surfaces directly to the caller as a status code plus a
/// `{"detail": …}` body; nothing is retried or recovered here. Store
/// failures are logged and masked behind a generic detail.
pub struct ApiError(RegistryError);

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = if self.0.is_store_failure() {
            tracing::error!("store failure: {}", self.0);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "patient store unavailable".to_string(),
            )
        } else {
            let status = match &self.0 {
                RegistryError::InvalidField { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
                RegistryError::DuplicateId(_) | RegistryError::InvalidQuery(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, self.0.to_string())
        };

        (status, Json(ErrorRes { detail })).into_response()
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Liveness message", body = MessageRes)
    )
)]
/// Liveness/info message for the service root.
#[axum::debug_handler]
async fn root() -> Json<MessageRes> {
    Json(MessageRes {
        message: "Patient Management System API".into(),
    })
}

#[utoipa::path(
    get,
    path = "/about",
    responses(
        (status = 200, description = "Static service description", body = MessageRes)
    )
)]
/// Static description of the service.
#[axum::debug_handler]
async fn about() -> Json<MessageRes> {
    Json(MessageRes {
        message: "A fully functional API to manage your patients records.".into(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancer probes.
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "PMS REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/view",
    responses(
        (status = 200, description = "Full mapping of patient id to stored fields"),
        (status = 500, description = "Store unavailable", body = ErrorRes)
    )
)]
/// Lists the full store as-is.
///
/// Stored fields are returned verbatim, including any persisted derived
/// snapshot. Use `GET /patients/{id}` for a record with freshly recomputed
/// metrics.
#[axum::debug_handler]
async fn view_patients(State(state): State<AppState>) -> Result<Json<Store>, ApiError> {
    Ok(Json(state.registry.list()?))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    responses(
        (status = 200, description = "The requested patient", body = PatientRes),
        (status = 404, description = "Unknown patient id", body = ErrorRes),
        (status = 500, description = "Store unavailable", body = ErrorRes)
    )
)]
/// Fetches one patient by exact id match, derived metrics recomputed.
#[axum::debug_handler]
async fn view_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<PatientRes>, ApiError> {
    let patient = state.registry.get(&id)?;
    Ok(Json(PatientRes::from(&patient)))
}

#[utoipa::path(
    get,
    path = "/sort",
    params(SortParams),
    responses(
        (status = 200, description = "Sorted patient listing", body = [PatientRes]),
        (status = 400, description = "Invalid sort field or order", body = ErrorRes),
        (status = 500, description = "Store unavailable", body = ErrorRes)
    )
)]
/// Lists patients sorted by `gender` or `age`, ascending or descending.
#[axum::debug_handler]
async fn sort_patients(
    State(state): State<AppState>,
    Query(params): Query<SortParams>,
) -> Result<Json<Vec<PatientRes>>, ApiError> {
    let key = SortKey::parse(&params.sort_by)?;
    let order = SortOrder::parse(params.order.as_deref().unwrap_or("asc"))?;

    let records = state.registry.sort(key, order)?;
    Ok(Json(records.iter().map(PatientRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/create",
    request_body = CreatePatientReq,
    responses(
        (status = 201, description = "Patient created", body = MessageRes),
        (status = 400, description = "Patient id already exists", body = ErrorRes),
        (status = 422, description = "Field validation failed", body = ErrorRes),
        (status = 500, description = "Store unavailable", body = ErrorRes)
    )
)]
/// Creates a new patient from a full record including its id.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<CreatePatientReq>,
) -> Result<(StatusCode, Json<MessageRes>), ApiError> {
    let gender = Gender::parse(&req.gender)?;
    let patient = Patient::new(
        req.id, req.name, req.city, req.age, gender, req.height, req.weight,
    )?;

    state.registry.create(&patient)?;

    Ok((
        StatusCode::CREATED,
        Json(MessageRes {
            message: "Patient created successfully!".into(),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/edit/{id}",
    request_body = UpdatePatientReq,
    responses(
        (status = 200, description = "Patient updated", body = MessageRes),
        (status = 404, description = "Unknown patient id", body = ErrorRes),
        (status = 422, description = "Merged fields failed validation", body = ErrorRes),
        (status = 500, description = "Store unavailable", body = ErrorRes)
    )
)]
/// Partially updates a patient: only fields present in the body are touched,
/// and the merged record is revalidated (recomputing BMI and verdict) before
/// anything is persisted.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdatePatientReq>,
) -> Result<Json<MessageRes>, ApiError> {
    let patch = PatientPatch::from(req);
    state.registry.update(&id, &patch)?;

    Ok(Json(MessageRes {
        message: "Patient details updated successfully!".into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/delete/{id}",
    responses(
        (status = 200, description = "Patient deleted", body = MessageRes),
        (status = 404, description = "Unknown patient id", body = ErrorRes),
        (status = 500, description = "Store unavailable", body = ErrorRes)
    )
)]
/// Deletes a patient by id.
#[axum::debug_handler]
async fn delete_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<MessageRes>, ApiError> {
    state.registry.delete(&id)?;

    Ok(Json(MessageRes {
        message: "Patient deleted successfully!".into(),
    }))
}
