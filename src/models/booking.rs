use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A row of the `budgets` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    #[serde(deserialize_with = "record_id")]
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub time: TimeSlot,
    #[serde(default, deserialize_with = "nullable_string")]
    pub vehicle_brand: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub vehicle_model: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub vehicle_year: String,
    pub service_type: ServiceType,
    #[serde(default, deserialize_with = "nullable_string")]
    pub message: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new booking; id and created_at come from storage.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewBooking {
    pub user_id: String,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub vehicle_brand: String,
    pub vehicle_model: String,
    pub vehicle_year: String,
    pub service_type: ServiceType,
    pub message: String,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Target statuses the admin interface offers for a record in this state.
    pub fn actions(&self) -> &'static [BookingStatus] {
        match self {
            BookingStatus::Pending => &[BookingStatus::Confirmed, BookingStatus::Cancelled],
            BookingStatus::Confirmed => &[BookingStatus::Cancelled],
            BookingStatus::Cancelled => &[],
        }
    }

    /// Only confirmed and cancelled can be set by an administrator.
    pub fn is_transition_target(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeSlot {
    #[serde(rename = "08:00")]
    H08,
    #[serde(rename = "09:00")]
    H09,
    #[serde(rename = "10:00")]
    H10,
    #[serde(rename = "11:00")]
    H11,
    #[serde(rename = "14:00")]
    H14,
    #[serde(rename = "15:00")]
    H15,
    #[serde(rename = "16:00")]
    H16,
    #[serde(rename = "17:00")]
    H17,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 8] = [
        TimeSlot::H08,
        TimeSlot::H09,
        TimeSlot::H10,
        TimeSlot::H11,
        TimeSlot::H14,
        TimeSlot::H15,
        TimeSlot::H16,
        TimeSlot::H17,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::H08 => "08:00",
            TimeSlot::H09 => "09:00",
            TimeSlot::H10 => "10:00",
            TimeSlot::H11 => "11:00",
            TimeSlot::H14 => "14:00",
            TimeSlot::H15 => "15:00",
            TimeSlot::H16 => "16:00",
            TimeSlot::H17 => "17:00",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.as_str() == s.trim())
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service category. Stored as its display label; labels outside the
/// fixed set are kept as free text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum ServiceType {
    SoundInstallation,
    AccessoriesAndModules,
    WindowFilm,
    CustomizationAndLed,
    Other,
    Custom(String),
}

impl ServiceType {
    pub const CATEGORIES: [ServiceType; 5] = [
        ServiceType::SoundInstallation,
        ServiceType::AccessoriesAndModules,
        ServiceType::WindowFilm,
        ServiceType::CustomizationAndLed,
        ServiceType::Other,
    ];

    pub fn label(&self) -> &str {
        match self {
            ServiceType::SoundInstallation => "Instalação de Som",
            ServiceType::AccessoriesAndModules => "Acessórios e Módulos",
            ServiceType::WindowFilm => "Insulfilm",
            ServiceType::CustomizationAndLed => "Personalização e LED",
            ServiceType::Other => "Outro",
            ServiceType::Custom(label) => label.as_str(),
        }
    }
}

impl From<String> for ServiceType {
    fn from(label: String) -> Self {
        Self::CATEGORIES
            .into_iter()
            .find(|c| c.label() == label)
            .unwrap_or(ServiceType::Custom(label))
    }
}

impl From<ServiceType> for String {
    fn from(service: ServiceType) -> Self {
        match service {
            ServiceType::Custom(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// The hosted table may use bigint or uuid keys.
fn record_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(d)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

fn nullable_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}
