//! API payload and domain types
//!
//! Wire keys follow the backend (Spanish column names, mixed casing).
//! Several numeric fields are transmitted as strings; those are kept as text
//! and parsed explicitly by the accessor that needs the number.

use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use super::errors::{ApiError, ApiResult};

/// Display format for measurement timestamps (e.g. "15/10/2024 10:30")
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

// =============================================================================
// Wire Helpers
// =============================================================================

/// A numeric field that may arrive as a JSON number or as numeric text
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireNumber {
    Int(i64),
    Text(String),
}

impl WireNumber {
    pub fn into_text(self) -> String {
        match self {
            WireNumber::Int(n) => n.to_string(),
            WireNumber::Text(s) => s,
        }
    }
}

/// Booleans stored as TINYINT come back as 0/1
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum WireBool {
    Bool(bool),
    Int(i64),
}

impl From<WireBool> for bool {
    fn from(value: WireBool) -> Self {
        match value {
            WireBool::Bool(b) => b,
            WireBool::Int(n) => n != 0,
        }
    }
}

fn number_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    WireNumber::deserialize(deserializer).map(WireNumber::into_text)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a string-encoded non-negative integer field
pub fn parse_numeric(field: &'static str, value: &str) -> ApiResult<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ApiError::InvalidNumericFormat {
            field,
            value: value.to_string(),
        })
}

/// Reformat a server timestamp into [`DISPLAY_TIMESTAMP_FORMAT`]
///
/// Accepts RFC 2822 (Flask's default for datetimes), RFC 3339 and the two
/// common naive SQL layouts. The wall-clock time is kept as sent.
pub fn format_timestamp(raw: &str) -> ApiResult<String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Ok(dt.format(DISPLAY_TIMESTAMP_FORMAT).to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.format(DISPLAY_TIMESTAMP_FORMAT).to_string());
    }
    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Ok(naive.format(DISPLAY_TIMESTAMP_FORMAT).to_string());
        }
    }
    Err(ApiError::Decode {
        reason: "unrecognized timestamp".to_string(),
        snippet: raw.to_string(),
    })
}

// =============================================================================
// Server Messages
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawServerMessage {
    message: Option<String>,
    conflict: Option<String>,
    error: Option<String>,
}

/// Flat message object returned by mutation endpoints
///
/// `{"message": ..}`, `{"conflict": ..}` or `{"error": ..}`. When several
/// keys are present the most severe one wins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawServerMessage")]
pub enum ServerMessage {
    Success(String),
    Conflict(String),
    Error(String),
}

impl TryFrom<RawServerMessage> for ServerMessage {
    type Error = &'static str;

    fn try_from(raw: RawServerMessage) -> Result<Self, &'static str> {
        if let Some(error) = raw.error {
            Ok(ServerMessage::Error(error))
        } else if let Some(conflict) = raw.conflict {
            Ok(ServerMessage::Conflict(conflict))
        } else if let Some(message) = raw.message {
            Ok(ServerMessage::Success(message))
        } else {
            Err("expected one of `message`, `conflict` or `error`")
        }
    }
}

impl ServerMessage {
    /// The server text, unmodified
    pub fn text(&self) -> &str {
        match self {
            ServerMessage::Success(s) | ServerMessage::Conflict(s) | ServerMessage::Error(s) => s,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ServerMessage::Success(_))
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

// =============================================================================
// Points
// =============================================================================

/// Points balance response, both backend revisions
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PointsResponse {
    /// Later revision: `{"nombre": .., "puntos": ..}`
    Named { nombre: String, puntos: u32 },
    /// First revision: `{"puntos": ..}`
    Bare { puntos: u32 },
}

/// Snapshot of the user's loyalty balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointsBalance {
    /// Absent when the backend answers with the first response revision
    pub display_name: Option<String>,
    pub points: u32,
}

impl From<PointsResponse> for PointsBalance {
    fn from(response: PointsResponse) -> Self {
        match response {
            PointsResponse::Named { nombre, puntos } => Self {
                display_name: Some(nombre),
                points: puntos,
            },
            PointsResponse::Bare { puntos } => Self {
                display_name: None,
                points: puntos,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TransactionRecord {
    fecha: String,
    origen_nombre: String,
    #[serde(deserialize_with = "number_as_text")]
    puntos: String,
    tipo: WireBool,
}

/// One entry of the points history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Server-formatted date, shown as-is
    pub date: String,
    pub source_name: String,
    /// Magnitude only; the sign comes from `is_credit`
    pub points: u32,
    pub is_credit: bool,
}

impl Transaction {
    pub fn signed_points(&self) -> i64 {
        if self.is_credit {
            i64::from(self.points)
        } else {
            -i64::from(self.points)
        }
    }
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = ApiError;

    fn try_from(record: TransactionRecord) -> ApiResult<Self> {
        Ok(Self {
            points: parse_numeric("puntos", &record.puntos)?,
            date: record.fecha,
            source_name: record.origen_nombre,
            is_credit: record.tipo.into(),
        })
    }
}

// =============================================================================
// Store (Tienda)
// =============================================================================

/// A benefit offered in the points store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogItem {
    #[serde(rename = "ID_BENEFICIO", deserialize_with = "number_as_text")]
    pub id: String,
    #[serde(rename = "NOMBRE")]
    pub name: String,
    #[serde(rename = "DESCRIPCION")]
    pub description: String,
    /// Cost as transmitted; see [`CatalogItem::cost`]
    #[serde(rename = "PUNTOS", deserialize_with = "number_as_text")]
    pub points_cost: String,
}

impl CatalogItem {
    pub fn cost(&self) -> ApiResult<u32> {
        parse_numeric("PUNTOS", &self.points_cost)
    }
}

/// Redemption code of a purchased bono
///
/// Never printed by `Debug` or `Display`; call [`RedemptionCode::reveal`]
/// when the user taps to see it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RedemptionCode(String);

impl RedemptionCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RedemptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RedemptionCode(****)")
    }
}

impl fmt::Display for RedemptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// A redeemed benefit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Bono {
    #[serde(rename = "NOMBRE")]
    pub name: String,
    #[serde(rename = "DESCRIPCION")]
    pub description: String,
    #[serde(rename = "PUNTOS", deserialize_with = "number_as_text")]
    pub points_cost: String,
    #[serde(rename = "CODIGO")]
    pub redemption_code: RedemptionCode,
}

#[derive(Debug, Serialize)]
pub(crate) struct PurchaseRequest<'a> {
    pub id_beneficio: &'a str,
    pub puntos: u32,
}

// =============================================================================
// Profile
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ProfilePictureResponse {
    pub profile_picture: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfilePictureUpdate<'a> {
    pub profile_picture: &'a str,
}

// =============================================================================
// Events & Challenges
// =============================================================================

/// An event from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EventItem {
    #[serde(rename = "ID_EVENTO", deserialize_with = "number_as_text")]
    pub id: String,
    #[serde(rename = "NOMBRE")]
    pub title: String,
    #[serde(rename = "DESCRIPCION")]
    pub description: String,
    /// Remaining spots as transmitted; see [`EventItem::capacity`]
    #[serde(rename = "CUPO", deserialize_with = "number_as_text")]
    pub capacity: String,
    #[serde(rename = "PUNTAJE", deserialize_with = "number_as_text")]
    pub score_value: String,
    #[serde(rename = "FECHA")]
    pub date: String,
    #[serde(rename = "LUGAR")]
    pub location: String,
    #[serde(rename = "IMPARTIDO_POR")]
    pub organizer: String,
    /// Missing in the earlier backend revision
    #[serde(rename = "TAGS", default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

impl EventItem {
    pub fn capacity(&self) -> ApiResult<u32> {
        parse_numeric("CUPO", &self.capacity)
    }

    pub fn score(&self) -> ApiResult<u32> {
        parse_numeric("PUNTAJE", &self.score_value)
    }
}

/// A challenge (reto)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChallengeItem {
    #[serde(rename = "ID_RETO", deserialize_with = "number_as_text")]
    pub id: String,
    #[serde(rename = "NOMBRE")]
    pub title: String,
    #[serde(rename = "DESCRIPCION")]
    pub description: String,
    #[serde(rename = "CONTACTO")]
    pub contact: String,
    #[serde(rename = "FECHA_LIMITE")]
    pub deadline: String,
    #[serde(rename = "PUNTAJE", deserialize_with = "number_as_text")]
    pub score_value: String,
}

impl ChallengeItem {
    pub fn score(&self) -> ApiResult<u32> {
        parse_numeric("PUNTAJE", &self.score_value)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterEventRequest<'a> {
    pub id_evento: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterChallengeRequest {
    pub id_reto: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttendanceRequest {
    pub id_evento: i64,
}

// =============================================================================
// Health Measurements
// =============================================================================

#[derive(Debug, Deserialize)]
struct SingleReading {
    fecha: String,
    valor: f64,
}

#[derive(Debug, Deserialize)]
struct PressureReading {
    fecha: String,
    sistolica: f64,
    diastolica: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeasurementsResponse {
    #[serde(default)]
    glucosa: Vec<SingleReading>,
    #[serde(default)]
    presion_arterial: Vec<PressureReading>,
    #[serde(default)]
    ritmo_cardiaco: Vec<SingleReading>,
}

/// A single-valued reading (glucose, heart rate)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementPoint {
    /// Formatted with [`DISPLAY_TIMESTAMP_FORMAT`]
    pub timestamp: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BloodPressurePoint {
    pub timestamp: String,
    pub systolic: f64,
    pub diastolic: f64,
}

/// The three measurement series shown on the health screen
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthMeasurements {
    pub glucose: Vec<MeasurementPoint>,
    pub blood_pressure: Vec<BloodPressurePoint>,
    pub heart_rate: Vec<MeasurementPoint>,
}

fn single_series(readings: Vec<SingleReading>) -> ApiResult<Vec<MeasurementPoint>> {
    readings
        .into_iter()
        .map(|r| {
            Ok(MeasurementPoint {
                timestamp: format_timestamp(&r.fecha)?,
                value: r.valor,
            })
        })
        .collect()
}

impl TryFrom<MeasurementsResponse> for HealthMeasurements {
    type Error = ApiError;

    fn try_from(response: MeasurementsResponse) -> ApiResult<Self> {
        let blood_pressure = response
            .presion_arterial
            .into_iter()
            .map(|r| {
                Ok(BloodPressurePoint {
                    timestamp: format_timestamp(&r.fecha)?,
                    systolic: r.sistolica,
                    diastolic: r.diastolica,
                })
            })
            .collect::<ApiResult<Vec<_>>>()?;

        Ok(Self {
            glucose: single_series(response.glucosa)?,
            blood_pressure,
            heart_rate: single_series(response.ritmo_cardiaco)?,
        })
    }
}

// =============================================================================
// Login
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub correo: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagRecord {
    pub nombre: String,
    pub veces_usado: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub user_id: u64,
    pub key: String,
    #[serde(default)]
    pub tags: Vec<TagRecord>,
}

// =============================================================================
// Tests
// =============================================================================
