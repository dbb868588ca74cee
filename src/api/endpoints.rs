//! Backend endpoint catalogue
//!
//! One variant per backend capability. The method, path and the default
//! place where the caller's user id travels are fixed here; the placement
//! can be overridden per endpoint from configuration because the backend
//! revisions disagree on it.

use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Where an endpoint expects the caller's user id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserIdPlacement {
    /// Appended as the last path segment (`/users/currentpoints/7`)
    Path,
    /// Merged into the JSON body as `user_id`
    Body,
    /// Sent in the `User-Id` header
    Header,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    PointsBalance,
    PointsHistory,
    Catalog,
    PurchaseBenefit,
    PurchasedBonos,
    GetProfilePicture,
    SetProfilePicture,
    Events,
    MyEvents,
    RegisterEvent,
    Challenges,
    MyChallenges,
    RegisterChallenge,
    HealthMeasurements,
    Login,
    SignOut,
    ConfirmAttendance,
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::PointsBalance
            | Endpoint::PointsHistory
            | Endpoint::Catalog
            | Endpoint::PurchasedBonos
            | Endpoint::GetProfilePicture
            | Endpoint::Events
            | Endpoint::MyEvents
            | Endpoint::Challenges
            | Endpoint::MyChallenges
            | Endpoint::HealthMeasurements => Method::GET,
            Endpoint::SetProfilePicture => Method::PATCH,
            Endpoint::PurchaseBenefit
            | Endpoint::RegisterEvent
            | Endpoint::RegisterChallenge
            | Endpoint::Login
            | Endpoint::SignOut
            | Endpoint::ConfirmAttendance => Method::POST,
        }
    }

    /// Path relative to the base URL, without the user id segment
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::PointsBalance => "/users/currentpoints",
            Endpoint::PointsHistory => "/users/historypoints",
            Endpoint::Catalog => "/tienda/catalogo",
            Endpoint::PurchaseBenefit => "/tienda/comprarBono",
            Endpoint::PurchasedBonos => "/tienda/bonosComprados",
            Endpoint::GetProfilePicture | Endpoint::SetProfilePicture => "/users/profilepicture",
            Endpoint::Events => "/eventos/getFuturosEventos",
            Endpoint::MyEvents => "/eventos/eventosUsuario",
            Endpoint::RegisterEvent => "/eventos/registrarParticipacion",
            Endpoint::Challenges => "/retos/getRetos",
            Endpoint::MyChallenges => "/retos/getMyRetos",
            Endpoint::RegisterChallenge => "/retos/registerReto",
            Endpoint::HealthMeasurements => "/mediciones/medicionesdatos",
            Endpoint::Login => "/users/login",
            Endpoint::SignOut => "/users/signOut",
            Endpoint::ConfirmAttendance => "/eventos/asistirEvento",
        }
    }

    /// Default user-id placement, `None` for endpoints that never carry one
    pub fn default_placement(&self) -> Option<UserIdPlacement> {
        match self {
            Endpoint::PointsBalance
            | Endpoint::PointsHistory
            | Endpoint::PurchasedBonos
            | Endpoint::GetProfilePicture
            | Endpoint::MyEvents
            | Endpoint::MyChallenges
            | Endpoint::HealthMeasurements => Some(UserIdPlacement::Path),
            Endpoint::PurchaseBenefit
            | Endpoint::SetProfilePicture
            | Endpoint::RegisterEvent
            | Endpoint::RegisterChallenge
            | Endpoint::ConfirmAttendance => Some(UserIdPlacement::Body),
            Endpoint::SignOut => Some(UserIdPlacement::Header),
            Endpoint::Catalog | Endpoint::Events | Endpoint::Challenges | Endpoint::Login => None,
        }
    }

    /// Login and the attendance kiosk call the backend without a session
    pub fn requires_session(&self) -> bool {
        !matches!(self, Endpoint::Login | Endpoint::ConfirmAttendance)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::PointsBalance => "points_balance",
            Endpoint::PointsHistory => "points_history",
            Endpoint::Catalog => "catalog",
            Endpoint::PurchaseBenefit => "purchase_benefit",
            Endpoint::PurchasedBonos => "purchased_bonos",
            Endpoint::GetProfilePicture => "get_profile_picture",
            Endpoint::SetProfilePicture => "set_profile_picture",
            Endpoint::Events => "events",
            Endpoint::MyEvents => "my_events",
            Endpoint::RegisterEvent => "register_event",
            Endpoint::Challenges => "challenges",
            Endpoint::MyChallenges => "my_challenges",
            Endpoint::RegisterChallenge => "register_challenge",
            Endpoint::HealthMeasurements => "health_measurements",
            Endpoint::Login => "login",
            Endpoint::SignOut => "sign_out",
            Endpoint::ConfirmAttendance => "confirm_attendance",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::Catalog.to_string(), "GET /tienda/catalogo");
        assert_eq!(
            Endpoint::SetProfilePicture.to_string(),
            "PATCH /users/profilepicture"
        );
    }

    #[test]
    fn test_session_free_endpoints() {
        assert!(!Endpoint::Login.requires_session());
        assert!(!Endpoint::ConfirmAttendance.requires_session());
        assert!(Endpoint::SignOut.requires_session());
        assert!(Endpoint::Catalog.requires_session());
    }

    #[test]
    fn test_endpoint_names_match_serde() {
        let endpoints = [
            Endpoint::PointsBalance,
            Endpoint::PurchaseBenefit,
            Endpoint::GetProfilePicture,
            Endpoint::ConfirmAttendance,
        ];
        for endpoint in endpoints {
            let json = serde_json::to_string(&endpoint).unwrap();
            assert_eq!(json, format!("\"{}\"", endpoint.name()));
        }
    }

    #[test]
    fn test_placement_parsing() {
        let placement: UserIdPlacement = serde_yaml::from_str("header").unwrap();
        assert_eq!(placement, UserIdPlacement::Header);
    }
}
