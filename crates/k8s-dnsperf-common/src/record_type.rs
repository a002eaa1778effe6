//! DNS record type queried by dnsperf

use serde::{Deserialize, Serialize};

/// Record type written next to every name in the record list
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum RecordType {
    /// IPv4 address record
    #[default]
    #[strum(serialize = "A")]
    #[serde(rename = "A")]
    A,
    /// IPv6 address record
    #[strum(serialize = "AAAA")]
    #[serde(rename = "AAAA")]
    Aaaa,
}
