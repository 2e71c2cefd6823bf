//! Device authentication middleware.
//!
//! Devices identify themselves with an `X-Device-Id` header and, when the
//! server is configured with a secret, a Bearer token. Full authorization
//! (which device may sync which locations) is an upstream concern.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};

use crate::AppState;

/// Header carrying the requesting device's identifier.
pub const DEVICE_ID_HEADER: &str = "x-device-id";

/// Authenticated device extracted from request headers.
#[derive(Debug, Clone)]
pub struct DeviceAuth {
    /// The device identifier presented by the client
    #[allow(dead_code)]
    pub device_id: String,
}

impl FromRequestParts<AppState> for DeviceAuth {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let device_id = parts
            .headers
            .get(DEVICE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        // When a secret is configured, require a bearer token
        if state.config.auth_secret.is_some() {
            let auth_header = parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok());

            match auth_header {
                Some(header) if header.starts_with("Bearer ") => {
                    let token = header.trim_start_matches("Bearer ");
                    if token.is_empty() {
                        return Err((StatusCode::UNAUTHORIZED, "Empty bearer token"));
                    }
                    // TODO: validate the token against the configured secret
                    // once the device registry lands
                }
                Some(_) => {
                    return Err((
                        StatusCode::UNAUTHORIZED,
                        "Invalid authorization header format",
                    ));
                }
                None => {
                    return Err((StatusCode::UNAUTHORIZED, "Missing authorization header"));
                }
            }
        }

        match device_id {
            Some(device_id) if !device_id.is_empty() => Ok(DeviceAuth { device_id }),
            // No device header: requests still carry deviceId in the body;
            // accept in anonymous mode
            _ if state.config.auth_secret.is_none() => Ok(DeviceAuth {
                device_id: "anonymous".to_string(),
            }),
            _ => Err((StatusCode::UNAUTHORIZED, "Missing X-Device-Id header")),
        }
    }
}
