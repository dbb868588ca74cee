//! Mi Salud backend client
//!
//! One async method per backend capability. Every call is single-shot: no
//! retry, no cache, no batching. Dropping a returned future cancels the
//! request in flight.

use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::ApiConfig;
use crate::core::attendance::AttendanceScan;

use super::decode::{
    decode, decode_message, decode_or_rejection, message_from_body, snippet, text_from_body,
    Decoded,
};
use super::endpoints::Endpoint;
use super::errors::{ApiError, ApiResult, BonosError};
use super::request::RequestBuilder;
use super::session::{SessionContext, SessionStore, TagUsage, UserTagProfile};
use super::store::KeyValueStore;
use super::types::{
    AttendanceRequest, Bono, CatalogItem, ChallengeItem, EventItem, HealthMeasurements,
    LoginRequest, LoginResponse, MeasurementsResponse, PointsBalance, PointsResponse,
    ProfilePictureResponse, ProfilePictureUpdate, PurchaseRequest, RegisterChallengeRequest,
    RegisterEventRequest, ServerMessage, Transaction, TransactionRecord,
};

/// Shown when the attendance endpoint answers 2xx without a message object
pub const ATTENDANCE_CONFIRMED: &str = "Asistencia registrada exitosamente.";

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub session: SessionContext,
    pub tags: UserTagProfile,
}

/// Status and body of a completed HTTP exchange
#[derive(Debug)]
struct RawResponse {
    status: StatusCode,
    body: Bytes,
}

impl RawResponse {
    /// Body of a 2xx response; 401/403 and other statuses become errors
    fn into_success(self, endpoint: Endpoint) -> ApiResult<Bytes> {
        let status = self.status;
        if status.is_success() {
            return Ok(self.body);
        }
        let message = message_from_body(status.as_u16(), &self.body);
        warn!(
            endpoint = endpoint.name(),
            status = status.as_u16(),
            message = %message,
            "Request rejected"
        );
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(ApiError::Unauthorized(message))
        } else {
            Err(ApiError::HttpStatus {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Typed client for the Mi Salud REST backend
#[derive(Debug, Clone)]
pub struct MiSaludClient {
    http: reqwest::Client,
    requests: RequestBuilder,
}

impl MiSaludClient {
    /// Build a client with a pooled connection and the configured timeout
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .user_agent(format!("MiSalud/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::InvalidUrl(format!("Failed to create HTTP client: {}", e)))?;
        let requests = RequestBuilder::new(http.clone(), config)?;
        Ok(Self { http, requests })
    }

    pub fn request_builder(&self) -> &RequestBuilder {
        &self.requests
    }

    // =========================================================================
    // Transport
    // =========================================================================

    async fn send<B>(
        &self,
        endpoint: Endpoint,
        user_id: Option<u64>,
        body: Option<&B>,
        session: Option<&SessionContext>,
    ) -> ApiResult<RawResponse>
    where
        B: Serialize + ?Sized,
    {
        let request = self.requests.build(endpoint, user_id, body, session)?;
        debug!(endpoint = endpoint.name(), url = %request.url(), "Sending request");

        let response = self.http.execute(request).await.map_err(|e| {
            error!(endpoint = endpoint.name(), error = %e, "Transport failure");
            ApiError::Network(e)
        })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            error!(endpoint = endpoint.name(), error = %e, "Failed to read response body");
            ApiError::Network(e)
        })?;

        debug!(
            endpoint = endpoint.name(),
            status = status.as_u16(),
            bytes = body.len(),
            "Response received"
        );
        Ok(RawResponse { status, body })
    }

    /// GET-style data fetch: 2xx body decoded into `T`, rejections surfaced
    async fn fetch_data<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        user_id: Option<u64>,
        session: &SessionContext,
    ) -> ApiResult<T> {
        let body = self
            .send::<()>(endpoint, user_id, None, Some(session))
            .await?
            .into_success(endpoint)?;
        match decode_or_rejection::<T>(&body)? {
            Decoded::Data(value) => Ok(value),
            Decoded::Rejected(message) => {
                warn!(endpoint = endpoint.name(), message = %message, "Server rejected request");
                Err(ApiError::Rejected(message))
            }
        }
    }

    /// Mutation whose 2xx body is a flat message object
    async fn post_for_message<B: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        user_id: u64,
        body: &B,
        session: &SessionContext,
    ) -> ApiResult<ServerMessage> {
        let raw = self
            .send(endpoint, Some(user_id), Some(body), Some(session))
            .await?
            .into_success(endpoint)?;
        decode_message(&raw)
    }

    // =========================================================================
    // Points
    // =========================================================================

    pub async fn fetch_points_balance(
        &self,
        user_id: u64,
        session: &SessionContext,
    ) -> ApiResult<PointsBalance> {
        let response: PointsResponse = self
            .fetch_data(Endpoint::PointsBalance, Some(user_id), session)
            .await?;
        Ok(response.into())
    }

    /// Chronological order as sent by the server; empty history is `Ok`
    pub async fn fetch_points_history(
        &self,
        user_id: u64,
        session: &SessionContext,
    ) -> ApiResult<Vec<Transaction>> {
        let records: Vec<TransactionRecord> = self
            .fetch_data(Endpoint::PointsHistory, Some(user_id), session)
            .await?;
        records.into_iter().map(Transaction::try_from).collect()
    }

    // =========================================================================
    // Store (Tienda)
    // =========================================================================

    pub async fn fetch_catalog(&self, session: &SessionContext) -> ApiResult<Vec<CatalogItem>> {
        self.fetch_data(Endpoint::Catalog, None, session).await
    }

    /// Buy a benefit
    ///
    /// Success, conflict and error texts all come back as `Ok`, whatever the
    /// HTTP status; the caller inspects the message.
    pub async fn purchase_benefit(
        &self,
        user_id: u64,
        points: u32,
        benefit_id: &str,
        session: &SessionContext,
    ) -> ApiResult<ServerMessage> {
        let body = PurchaseRequest {
            id_beneficio: benefit_id,
            puntos: points,
        };
        let raw = self
            .send(Endpoint::PurchaseBenefit, Some(user_id), Some(&body), Some(session))
            .await?;
        let message = decode_message(&raw.body)?;
        info!(
            user_id,
            benefit_id,
            points,
            status = raw.status.as_u16(),
            outcome = %message,
            "Purchase answered"
        );
        Ok(message)
    }

    /// Bonos bought by the user
    pub async fn fetch_bonos_comprados(
        &self,
        user_id: u64,
        session: &SessionContext,
    ) -> Result<Vec<Bono>, BonosError> {
        let raw = self
            .send::<()>(Endpoint::PurchasedBonos, Some(user_id), None, Some(session))
            .await
            .map_err(|e| match e {
                ApiError::MissingSession => BonosError::InvalidSessionKey,
                other => BonosError::ServerError(other.to_string()),
            })?;

        let status = raw.status;
        if status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || status == StatusCode::BAD_REQUEST
        {
            return Err(BonosError::InvalidSessionKey);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(BonosError::NoBonosFound);
        }
        if !status.is_success() {
            return Err(BonosError::ServerError(message_from_body(
                status.as_u16(),
                &raw.body,
            )));
        }
        if std::str::from_utf8(&raw.body).is_err() {
            return Err(BonosError::InvalidResponse);
        }

        match decode_or_rejection::<Vec<Bono>>(&raw.body) {
            Ok(Decoded::Data(bonos)) => Ok(bonos),
            Ok(Decoded::Rejected(message)) => Err(BonosError::ServerError(message.text().to_string())),
            Err(ApiError::Decode { reason, .. }) => Err(BonosError::DecodingError(reason)),
            Err(other) => Err(BonosError::DecodingError(other.to_string())),
        }
    }

    // =========================================================================
    // Profile
    // =========================================================================

    pub async fn get_profile_picture(
        &self,
        user_id: u64,
        session: &SessionContext,
    ) -> ApiResult<String> {
        let response: ProfilePictureResponse = self
            .fetch_data(Endpoint::GetProfilePicture, Some(user_id), session)
            .await?;
        Ok(response.profile_picture)
    }

    /// Change the profile picture; the returned reference is what the server
    /// confirmed, falling back to `path` when it only sends a message
    pub async fn set_profile_picture(
        &self,
        user_id: u64,
        path: &str,
        session: &SessionContext,
    ) -> ApiResult<String> {
        let body = ProfilePictureUpdate {
            profile_picture: path,
        };
        let raw = self
            .send(Endpoint::SetProfilePicture, Some(user_id), Some(&body), Some(session))
            .await?
            .into_success(Endpoint::SetProfilePicture)?;

        if let Ok(response) = serde_json::from_slice::<ProfilePictureResponse>(&raw) {
            return Ok(response.profile_picture);
        }
        match decode_message(&raw)? {
            ServerMessage::Success(_) => Ok(path.to_string()),
            rejected => Err(ApiError::Rejected(rejected)),
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub async fn fetch_events(&self, session: &SessionContext) -> ApiResult<Vec<EventItem>> {
        self.fetch_data(Endpoint::Events, None, session).await
    }

    pub async fn fetch_my_events(
        &self,
        user_id: u64,
        session: &SessionContext,
    ) -> ApiResult<Vec<EventItem>> {
        self.fetch_data(Endpoint::MyEvents, Some(user_id), session).await
    }

    pub async fn register_for_event(
        &self,
        user_id: u64,
        event_id: &str,
        session: &SessionContext,
    ) -> ApiResult<ServerMessage> {
        let body = RegisterEventRequest { id_evento: event_id };
        self.post_for_message(Endpoint::RegisterEvent, user_id, &body, session)
            .await
    }

    // =========================================================================
    // Challenges (Retos)
    // =========================================================================

    pub async fn fetch_challenges(&self, session: &SessionContext) -> ApiResult<Vec<ChallengeItem>> {
        self.fetch_data(Endpoint::Challenges, None, session).await
    }

    pub async fn fetch_my_challenges(
        &self,
        user_id: u64,
        session: &SessionContext,
    ) -> ApiResult<Vec<ChallengeItem>> {
        self.fetch_data(Endpoint::MyChallenges, Some(user_id), session)
            .await
    }

    /// Register for a challenge; `challenge_id` must be an integer, checked
    /// before anything is sent
    pub async fn register_for_challenge(
        &self,
        user_id: u64,
        challenge_id: &str,
        session: &SessionContext,
    ) -> ApiResult<ServerMessage> {
        let id_reto = challenge_id
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::InvalidIdFormat(challenge_id.to_string()))?;
        let body = RegisterChallengeRequest { id_reto };
        self.post_for_message(Endpoint::RegisterChallenge, user_id, &body, session)
            .await
    }

    // =========================================================================
    // Health
    // =========================================================================

    pub async fn fetch_health_measurements(
        &self,
        user_id: u64,
        session: &SessionContext,
    ) -> ApiResult<HealthMeasurements> {
        let response: MeasurementsResponse = self
            .fetch_data(Endpoint::HealthMeasurements, Some(user_id), session)
            .await?;
        HealthMeasurements::try_from(response)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Sign in; server rejection text is passed through unmodified
    pub async fn login(&self, correo: &str, password: &str) -> ApiResult<LoginOutcome> {
        let body = LoginRequest { correo, password };
        let raw = self.send(Endpoint::Login, None, Some(&body), None).await?;

        let status = raw.status;
        if status.is_client_error() {
            let message = message_from_body(status.as_u16(), &raw.body);
            warn!(status = status.as_u16(), "Login rejected");
            return Err(ApiError::InvalidCredentials(message));
        }
        let body = raw.into_success(Endpoint::Login)?;

        let response = match decode_or_rejection::<LoginResponse>(&body)? {
            Decoded::Data(response) => response,
            Decoded::Rejected(message) => {
                warn!("Login rejected");
                return Err(ApiError::InvalidCredentials(message.text().to_string()));
            }
        };

        let session =
            SessionContext::new(response.key, response.user_id).map_err(|_| ApiError::Decode {
                reason: "login response without a usable key or user id".to_string(),
                snippet: snippet(&body),
            })?;
        let tags = UserTagProfile::new(
            response
                .tags
                .into_iter()
                .map(|t| TagUsage::new(t.nombre, t.veces_usado))
                .collect(),
        );
        info!(user_id = session.user_id(), tags = tags.len(), "Logged in");
        Ok(LoginOutcome { session, tags })
    }

    /// Sign in and persist the resulting session
    pub async fn login_and_store<S: KeyValueStore>(
        &self,
        correo: &str,
        password: &str,
        sessions: &mut SessionStore<S>,
    ) -> crate::Result<LoginOutcome> {
        let outcome = self.login(correo, password).await?;
        sessions.set_session(&outcome.session, &outcome.tags)?;
        Ok(outcome)
    }

    /// Tell the backend the session is over
    pub async fn sign_out(&self, session: &SessionContext) -> ApiResult<()> {
        self.send::<()>(Endpoint::SignOut, Some(session.user_id()), None, Some(session))
            .await?
            .into_success(Endpoint::SignOut)?;
        info!(user_id = session.user_id(), "Signed out");
        Ok(())
    }

    /// Sign out and clear the stored session
    ///
    /// The local session is cleared whatever the server answers; the server
    /// outcome is still returned.
    pub async fn sign_out_and_clear<S: KeyValueStore>(
        &self,
        sessions: &mut SessionStore<S>,
    ) -> crate::Result<()> {
        let session = sessions.get_session()?;
        let remote = self.sign_out(&session).await;
        sessions.clear()?;
        if let Err(e) = &remote {
            warn!(error = %e, "Server sign-out failed, local session cleared anyway");
        }
        remote.map_err(Into::into)
    }

    // =========================================================================
    // Attendance
    // =========================================================================

    /// Confirm a scanned attendee for an event (attendance kiosk flow)
    pub async fn confirm_attendance(&self, scan: &AttendanceScan) -> ApiResult<ServerMessage> {
        let body = AttendanceRequest {
            id_evento: scan.event_id,
        };
        let raw = self
            .send(Endpoint::ConfirmAttendance, Some(scan.user_id), Some(&body), None)
            .await?;
        if !raw.status.is_success() {
            // The kiosk shows the backend's error text as sent
            let message = text_from_body(raw.status.as_u16(), &raw.body);
            warn!(
                user_id = scan.user_id,
                event_id = scan.event_id,
                status = raw.status.as_u16(),
                "Attendance not confirmed"
            );
            return Err(ApiError::HttpStatus {
                status: raw.status.as_u16(),
                message,
            });
        }
        let message = decode::<ServerMessage>(&raw.body)
            .unwrap_or_else(|_| ServerMessage::Success(ATTENDANCE_CONFIRMED.to_string()));
        info!(
            user_id = scan.user_id,
            event_id = scan.event_id,
            "Attendance confirmed"
        );
        Ok(message)
    }
}
