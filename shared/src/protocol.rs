//! JSON bodies exchanged with the IP-echo, geolocation and classifier
//! collaborators.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::model::{ContactDetails, LocationInfo};

/// `GET` IP-echo response: `{ "ip": "..." }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpEcho {
    pub ip: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeolocationRequest {
    pub ip: String,
    pub email: String,
    pub phone: String,
}

impl GeolocationRequest {
    pub fn new(ip: impl Into<String>, contact: ContactDetails) -> Self {
        Self {
            ip: ip.into(),
            email: contact.email,
            phone: contact.phone,
        }
    }
}

impl fmt::Debug for GeolocationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeolocationRequest")
            .field("ip", &self.ip)
            .field("email_present", &!self.email.is_empty())
            .field("phone_present", &!self.phone.is_empty())
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeolocationResponse {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country_name: String,
    #[serde(deserialize_with = "latitude")]
    pub latitude: f64,
    #[serde(deserialize_with = "longitude")]
    pub longitude: f64,
}

impl From<GeolocationResponse> for LocationInfo {
    fn from(response: GeolocationResponse) -> Self {
        Self {
            city: response.city,
            region: response.region,
            country: response.country_name,
            lat: response.latitude,
            lng: response.longitude,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpamCheckRequest {
    pub message: String,
    pub location: String,
}

// Geolocation services disagree on whether coordinates are numbers or
// numeric strings; accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

// Only unparseable or non-finite values are refused. Out-of-range numbers
// are passed through as the service reported them.
fn coordinate<'de, D>(deserializer: D, field: &str) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Coordinate::deserialize(deserializer)? {
        Coordinate::Number(n) => n,
        Coordinate::Text(s) => s.trim().parse::<f64>().map_err(|e| {
            serde::de::Error::custom(format!("{field} {s:?} is not a number: {e}"))
        })?,
    };

    if !value.is_finite() {
        return Err(serde::de::Error::custom(format!(
            "{field} {value} is not a finite number"
        )));
    }

    Ok(value)
}

fn latitude<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    coordinate(deserializer, "latitude")
}

fn longitude<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    coordinate(deserializer, "longitude")
}
