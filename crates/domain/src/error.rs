// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors raised while building domain values from external input.
///
/// These are configuration-level failures (a malformed registry, an unknown
/// enumeration value on a command line). Problems found inside an uploaded
/// results file are reported as [`crate::ImportError`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The status value is not one of `unknown`, `interim` or `final`.
    InvalidStatus(String),
    /// The ballot type is not one of `proposal`, `counter-proposal` or `tie-breaker`.
    InvalidBallotType(String),
    /// The domain of influence is not recognized.
    InvalidDomain(String),
    /// The election type is not one of `majorz` or `proporz`.
    InvalidElectionType(String),
    /// The entity registry document could not be parsed.
    RegistryParse(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidStatus(value) => write!(f, "Invalid status: {value}"),
            Self::InvalidBallotType(value) => write!(f, "Invalid ballot type: {value}"),
            Self::InvalidDomain(value) => write!(f, "Invalid domain: {value}"),
            Self::InvalidElectionType(value) => write!(f, "Invalid election type: {value}"),
            Self::RegistryParse(msg) => write!(f, "Failed to parse entity registry: {msg}"),
        }
    }
}

impl std::error::Error for DomainError {}
