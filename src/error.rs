// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Domain failures surfaced to the caller. Command plumbing wraps these in
/// `anyhow::Error`, so callers can `downcast_ref::<LedgerError>()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} {id} is {current}, expected {expected}")]
    InvalidState {
        entity: &'static str,
        id: i64,
        current: String,
        expected: String,
    },

    #[error("invalid input: {0}")]
    Validation(String),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn invalid_state(
        entity: &'static str,
        id: i64,
        current: impl ToString,
        expected: impl ToString,
    ) -> Self {
        LedgerError::InvalidState {
            entity,
            id,
            current: current.to_string(),
            expected: expected.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }
}
