use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Stored as TEXT in the users table; the `HOD` casing is part of the
/// wire format.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum Role {
    #[strum(serialize = "admin")]
    #[serde(rename = "admin")]
    Admin,
    #[strum(serialize = "HOD")]
    #[serde(rename = "HOD")]
    Hod,
    #[strum(serialize = "employee")]
    #[serde(rename = "employee")]
    Employee,
}
