// ── Client-side input validation ──
//
// Field-scoped checks that run before anything reaches the network. Each
// field check returns the parsed value or a human-readable message; the
// form types collect every failing field at once so a shell can show them
// all inline.

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::model::{
    AdminUpdate, DeviceDraft, DeviceStatus, DeviceType, DeviceUpdate, MacAddress, TX_POWER_MAX,
    TX_POWER_MIN,
};

static MAC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})$").expect("MAC pattern compiles")
});

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"));

/// Minimum length for a new administrator password.
pub const MIN_PASSWORD_LEN: usize = 6;

// ── ValidationErrors ────────────────────────────────────────────────

/// Field name → message, in the order the fields were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(IndexMap<&'static str, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a failure. The first message for a field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Forget a field's error, e.g. once the user edits it.
    pub fn clear_field(&mut self, field: &str) {
        self.0.shift_remove(field);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }

    fn capture<T>(&mut self, field: &'static str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ── Field checks ────────────────────────────────────────────────────

pub fn name(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("name is required".into());
    }
    Ok(trimmed.to_owned())
}

pub fn mac(raw: &str) -> Result<MacAddress, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("MAC address is required".into());
    }
    if !MAC_RE.is_match(trimmed) {
        return Err("MAC address must be six hex pairs, e.g. 00:1A:2B:3C:4D:5E".into());
    }
    Ok(MacAddress::new(trimmed))
}

/// Any numeric spelling is accepted ("10", "10.0", "1e1"); the value must
/// be a whole number of dBm within range.
#[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
pub fn tx_power(raw: &str) -> Result<i32, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("TX power is required".into());
    }
    let value: f64 = trimmed
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| format!("TX power must be a number, got '{trimmed}'"))?;
    if value < f64::from(TX_POWER_MIN) || value > f64::from(TX_POWER_MAX) {
        return Err(format!(
            "TX power must be between {TX_POWER_MIN} and {TX_POWER_MAX} dBm"
        ));
    }
    if value.fract() != 0.0 {
        return Err(format!("TX power must be a whole number, got '{trimmed}'"));
    }
    // In range and integral, so the cast is exact.
    Ok(value as i32)
}

pub fn device_type(raw: &str) -> Result<DeviceType, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("device type is required".into());
    }
    trimmed
        .parse()
        .map_err(|_| format!("unknown device type '{trimmed}' (vehicle, test-equipment, other)"))
}

pub fn status(raw: &str) -> Result<DeviceStatus, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("status must be active or inactive, got '{}'", raw.trim()))
}

pub fn email(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("email is required".into());
    }
    if !EMAIL_RE.is_match(trimmed) {
        return Err("enter a valid email address".into());
    }
    Ok(trimmed.to_owned())
}

// ── Forms ───────────────────────────────────────────────────────────

/// Raw text input for registering a device.
#[derive(Debug, Clone, Default)]
pub struct DeviceForm {
    pub name: String,
    pub mac: String,
    pub tx_power: String,
    pub device_type: String,
    pub status: String,
}

impl DeviceForm {
    /// Check every field, collecting all failures.
    pub fn validate(&self) -> Result<DeviceDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = errors.capture("name", name(&self.name));
        let mac = errors.capture("mac", mac(&self.mac));
        let tx_power = errors.capture("tx_power", tx_power(&self.tx_power));
        let device_type = errors.capture("type", device_type(&self.device_type));
        let status = errors.capture("status", status(&self.status));

        match (name, mac, tx_power, device_type, status) {
            (Some(name), Some(mac), Some(tx_power), Some(device_type), Some(status)) => {
                Ok(DeviceDraft {
                    name,
                    mac,
                    tx_power,
                    device_type,
                    status,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Raw text input for a partial device update. Absent fields are skipped.
#[derive(Debug, Clone, Default)]
pub struct DeviceUpdateForm {
    pub name: Option<String>,
    pub mac: Option<String>,
    pub tx_power: Option<String>,
    pub device_type: Option<String>,
    pub status: Option<String>,
}

impl DeviceUpdateForm {
    pub fn validate(&self) -> Result<DeviceUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let update = DeviceUpdate {
            name: self
                .name
                .as_deref()
                .and_then(|v| errors.capture("name", name(v))),
            mac: self
                .mac
                .as_deref()
                .and_then(|v| errors.capture("mac", mac(v))),
            tx_power: self
                .tx_power
                .as_deref()
                .and_then(|v| errors.capture("tx_power", tx_power(v))),
            device_type: self
                .device_type
                .as_deref()
                .and_then(|v| errors.capture("type", device_type(v))),
            status: self
                .status
                .as_deref()
                .and_then(|v| errors.capture("status", status(v))),
        };

        errors.into_result(|| update)
    }
}

/// Profile edit: display name and email, each optional.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<AdminUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let update = AdminUpdate {
            name: self
                .name
                .as_deref()
                .and_then(|v| errors.capture("name", name(v))),
            email: self
                .email
                .as_deref()
                .and_then(|v| errors.capture("email", email(v))),
        };
        errors.into_result(|| update)
    }
}

/// Password change form as typed by the operator.
pub struct PasswordForm {
    pub current: SecretString,
    pub new: SecretString,
    pub confirm: SecretString,
}

impl PasswordForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let new = self.new.expose_secret();

        if self.current.expose_secret().is_empty() {
            errors.add("current_password", "current password is required");
        }
        if new.is_empty() {
            errors.add("new_password", "new password is required");
        } else if new.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "new_password",
                format!("password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
        if new != self.confirm.expose_secret() {
            errors.add("confirm_password", "passwords do not match");
        }

        errors.into_result(|| ())
    }
}
