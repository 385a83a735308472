// Camera entities.
//
// Cameras live in the subscription's system data rather than the
// sensors payload. They are read-only here; the interesting operation
// is building the media-stream URL.

use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::error::CoreError;

/// Base URL for the media streaming service.
pub const MEDIA_URL_BASE: &str = "https://media.simplisafe.com/v1";

pub const DEFAULT_VIDEO_WIDTH: u32 = 1280;
pub const DEFAULT_AUDIO_ENCODING: &str = "AAC";

/// What kind of camera a record describes, derived from its model code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CameraKind {
    Camera,
    Doorbell,
    Unknown,
}

impl CameraKind {
    pub(crate) fn from_model(model: &str) -> Self {
        match model {
            "SS001" => Self::Camera,
            "SS002" => Self::Doorbell,
            other => {
                warn!(model = other, "unknown camera model");
                Self::Unknown
            }
        }
    }
}

/// A camera or video doorbell attached to a system.
#[derive(Debug, Clone)]
pub struct Camera {
    serial: String,
    data: Value,
}

impl Camera {
    pub(crate) fn from_raw(raw: Value) -> Option<Self> {
        let Some(serial) = raw.get("uuid").and_then(Value::as_str) else {
            warn!("skipping camera record without a uuid");
            return None;
        };
        Some(Self {
            serial: serial.to_owned(),
            data: raw,
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn kind(&self) -> CameraKind {
        self.data
            .get("model")
            .and_then(Value::as_str)
            .map_or(CameraKind::Unknown, CameraKind::from_model)
    }

    pub fn name(&self) -> Option<&str> {
        self.data
            .pointer("/cameraSettings/cameraName")
            .and_then(Value::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.data.get("status").and_then(Value::as_str)
    }

    pub fn subscription_enabled(&self) -> bool {
        self.data
            .pointer("/subscription/enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Whether the privacy shutter is open while armed in away mode.
    pub fn shutter_open_when_away(&self) -> bool {
        self.shutter_setting("shutterAway")
    }

    /// Whether the privacy shutter is open while armed in home mode.
    pub fn shutter_open_when_home(&self) -> bool {
        self.shutter_setting("shutterHome")
    }

    /// Whether the privacy shutter is open while the system is off.
    pub fn shutter_open_when_off(&self) -> bool {
        self.shutter_setting("shutterOff")
    }

    /// The camera's video stream URL with default parameters.
    pub fn video_url(&self) -> Result<Url, CoreError> {
        self.video_url_with(DEFAULT_VIDEO_WIDTH, DEFAULT_AUDIO_ENCODING, &[])
    }

    /// The camera's video stream URL with explicit width, audio
    /// encoding, and any extra query parameters.
    pub fn video_url_with(
        &self,
        width: u32,
        audio_encoding: &str,
        extra_params: &[(&str, String)],
    ) -> Result<Url, CoreError> {
        let mut url = Url::parse(&format!("{MEDIA_URL_BASE}/{}/flv", self.serial))
            .map_err(simplisafe_api::Error::InvalidUrl)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("x", &width.to_string());
            query.append_pair("audioEncoding", audio_encoding);
            for (key, value) in extra_params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// The raw camera payload, for fields this type doesn't surface.
    pub fn raw(&self) -> &Value {
        &self.data
    }

    fn shutter_setting(&self, name: &str) -> bool {
        self.data
            .pointer(&format!("/cameraSettings/{name}"))
            .and_then(Value::as_str)
            .is_some_and(|setting| setting == "open")
    }
}
