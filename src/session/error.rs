// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

use super::Operation;
use crate::brush::EvaluationError;
use thiserror::Error;

/// Errors returned by the session state machine. None of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {0} without a current solid; add a mesh first")]
    InvalidRequestInEmptyState(Operation),
    #[error("cut mode only applies to subtract, not {0}")]
    InvalidCutRequest(Operation),
    #[error("geometry arrived with no pending request")]
    OrphanSubmission,
    #[error("boolean evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),
}
