use axum::{
    extract::State,
    http::{header, HeaderName},
    response::IntoResponse,
};

use crate::{
    error::{AppError, AppResult},
    services::{
        captcha::{random_text, CAPTCHA_LENGTH},
        captcha_image::render_png,
    },
    AppState,
};

pub const CAPTCHA_ID_HEADER: HeaderName = HeaderName::from_static("x-captcha-id");

/// GET /api/v1/captcha
///
/// PNG body; the challenge id travels in `X-Captcha-ID` and is submitted
/// back alongside the answer.
pub async fn generate_captcha(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let text = random_text(CAPTCHA_LENGTH);
    let png = render_png(&text).map_err(|e| AppError::internal(format!("captcha render: {e}")))?;
    let id = state.captcha.issue(&text, state.captcha_ttl());

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
            (CAPTCHA_ID_HEADER, id),
        ],
        png,
    ))
}
