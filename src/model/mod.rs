//! Data models for the blood bank.
//!
//! Four record types live in the store: [`Donor`], [`DonationDrive`],
//! [`BloodRequest`] and [`InventoryRecord`] (with its [`ExpiryBatch`]es).
//! Wire names are camelCase so the browser frontend can consume them as-is.
//!
//! Every closed set of labels (blood type, statuses, urgency, ...) is a Rust
//! enum whose serialized form is exactly the label the frontend shows.

use chrono::{DateTime, NaiveDate, NaiveTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer};

/// Declares a closed label enum.
///
/// Generates the enum (serialized as its label), `ALL`, `as_str`, `Display`
/// and a `FromStr` that fails with [`crate::Error::Validation`].
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($what:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire/storage label.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::Error;

            fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
                match value {
                    $( $label => Ok($name::$variant), )+
                    other => Err(crate::Error::Validation(format!(
                        "Invalid {} '{}': must be one of {}",
                        $what,
                        other,
                        [$($label),+].join(", ")
                    ))),
                }
            }
        }
    };
}

pub(crate) use labelled_enum;

mod donor;
mod drive;
mod inventory;
mod request;

pub use donor::{Availability, Donor, DonorPatch, DonorStatus, Gender, NewDonor};
pub(crate) use donor::normalize_email;
pub use drive::{DonationDrive, DriveStatus, DrivePatch, NewDrive};
pub use inventory::{
    ExpiringBatch, ExpiringQuery, ExpiryBatch, InventoryRecord, LowStockQuery, ReplenishRequest,
    SetUnitsRequest, UseRequest,
};
pub use request::{BloodRequest, NewBloodRequest, RequestPatch, RequestStatus, Urgency};

labelled_enum! {
    /// ABO/Rh blood type. Used as a foreign key by donors, requests and inventory.
    BloodType ("blood type") {
        APos => "A+",
        ANeg => "A-",
        BPos => "B+",
        BNeg => "B-",
        OPos => "O+",
        ONeg => "O-",
        AbPos => "AB+",
        AbNeg => "AB-",
    }
}

/// Current time at the millisecond precision the store keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Parse a client-supplied date.
///
/// Accepts an RFC 3339 timestamp or a plain `YYYY-MM-DD` calendar date
/// (taken as midnight UTC).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc).trunc_subsecs(3));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    Err(format!(
        "Invalid date '{value}': expected an RFC 3339 timestamp or YYYY-MM-DD"
    ))
}

/// `deserialize_with` helper for optional client dates, see [`parse_timestamp`].
pub(crate) fn deserialize_opt_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_timestamp(&raw))
        .transpose()
        .map_err(serde::de::Error::custom)
}
