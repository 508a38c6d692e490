//! Country code: maps a mobile country code to its dialling prefix.

use serde::{Deserialize, Serialize};

use crate::id::RecordId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCodeRecord {
    pub id: RecordId,
    /// Mobile country code (e.g. 260 for Poland).
    pub mcc: u32,
    /// ISO 3166 alpha-2 code.
    pub iso: String,
    pub country: String,
    /// International dialling prefix without the `+`.
    pub code: u32,
}
