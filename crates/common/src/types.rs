//! Entity shapes accepted by the harness
//!
//! `EntityData` is what tests send; `ExportData` is what the service returns.
//! Reading a payload into one of these types is the schema-validation step.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Nested addition as sent on create/update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addition {
    pub additional_info: String,
    pub additional_number: i64,
}

/// Nested addition as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionExport {
    pub id: i64,
    pub additional_info: String,
    pub additional_number: i64,
}

/// Entity payload for create and update requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityData {
    pub addition: Addition,
    pub important_numbers: Vec<i64>,
    pub title: String,
    pub verified: bool,
}

/// Entity as stored and returned by `GET /api/get/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportData {
    pub id: i64,
    pub title: String,
    pub verified: bool,
    pub addition: AdditionExport,
    pub important_numbers: Vec<i64>,
}

/// Body of `GET /api/getAll`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityResponse {
    pub entity: Vec<ExportData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, rename = "perPage", skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u64>,
}

/// Identity returned by `POST /api/create`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdPerson {
    pub id: i64,
}

/// Shapes that can be validated from a raw JSON payload
pub trait Schema: DeserializeOwned {
    const NAME: &'static str;
}

impl Schema for Addition {
    const NAME: &'static str = "Addition";
}

impl Schema for AdditionExport {
    const NAME: &'static str = "AdditionExport";
}

impl Schema for EntityData {
    const NAME: &'static str = "EntityData";
}

impl Schema for ExportData {
    const NAME: &'static str = "ExportData";
}

impl Schema for EntityResponse {
    const NAME: &'static str = "EntityResponse";
}

impl Schema for IdPerson {
    const NAME: &'static str = "IdPerson";
}

/// Validate a raw payload against `T`
///
/// Unknown fields are ignored; missing fields and type mismatches are
/// reported with the offending field path.
pub fn validate<T: Schema>(value: &serde_json::Value) -> Result<T, ValidationError> {
    T::deserialize(value).map_err(|e| ValidationError {
        schema: T::NAME,
        message: e.to_string(),
    })
}
