use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::models::request::{ChangeRequest, RequestStatus};
use crate::utils::validation::{validate_not_empty, validate_request_status};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub request_type: String,

    #[serde(default)]
    #[validate(length(max = 5000))]
    pub details: String,

    #[serde(alias = "vehicle")]
    pub vehicle_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub request_type: Option<String>,

    #[validate(length(max = 5000))]
    pub details: Option<String>,

    /// Ausente: sin cambio; `null`: desvincula el vehículo
    #[serde(default, deserialize_with = "present_or_null")]
    pub vehicle_id: Option<Option<i64>>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestStatusRequest {
    #[validate(custom = "validate_request_status")]
    pub status: String,

    #[validate(length(max = 5000))]
    pub admin_response: Option<String>,
}

impl UpdateRequestStatusRequest {
    pub fn parsed_status(&self) -> Option<RequestStatus> {
        RequestStatus::parse(&self.status)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub request_type: String,
    pub details: String,
    pub vehicle_id: Option<i64>,
    pub status: RequestStatus,
    pub admin_response: Option<String>,
    pub resolved_by: Option<i64>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChangeRequest> for RequestResponse {
    fn from(request: ChangeRequest) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            request_type: request.request_type,
            details: request.details,
            vehicle_id: request.vehicle_id,
            status: request.status,
            admin_response: request.admin_response,
            resolved_by: request.resolved_by,
            resolved_at: request.resolved_at,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}
