// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Session state machine
//!
//! A session accumulates a current solid (the primary brush) from a sequence
//! of loaded meshes. Each mesh goes through two phases: the user first picks
//! an operation ([`Session::request_operation`]), then the parsed mesh
//! arrives ([`Session::submit_geometry`]). A cut request additionally keeps
//! the piece removed from the solid as a secondary brush until the next
//! operation or export.

mod error;
mod types;

pub use error::SessionError;
pub use types::{ControlSignal, Operation, Outcome, PendingRequest, SessionState};

use crate::brush::{BooleanEvaluator, Brush, BspEvaluator, Palette};
use crate::geometry::{BooleanOp, Mesh};
use tracing::{debug, info};

pub struct Session<E = BspEvaluator> {
    primary: Option<Brush>,
    secondary: Option<Brush>,
    pending: Option<PendingRequest>,
    evaluator: E,
    palette: Palette,
}

impl Session<BspEvaluator> {
    /// Empty session using the BSP evaluator and a random palette
    pub fn new() -> Self {
        Self::with_evaluator(BspEvaluator, Palette::from_entropy())
    }
}

impl Default for Session<BspEvaluator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BooleanEvaluator> Session<E> {
    pub fn with_evaluator(evaluator: E, palette: Palette) -> Self {
        Self {
            primary: None,
            secondary: None,
            pending: None,
            evaluator,
            palette,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.primary {
            None => SessionState::Empty,
            Some(_) => SessionState::Populated {
                cut_piece: self.secondary.is_some(),
            },
        }
    }

    pub fn is_populated(&self) -> bool {
        self.primary.is_some()
    }

    /// The accumulated solid
    pub fn primary(&self) -> Option<&Brush> {
        self.primary.as_ref()
    }

    /// The cut-off piece of the last cut, until consumed
    pub fn secondary(&self) -> Option<&Brush> {
        self.secondary.as_ref()
    }

    pub fn pending(&self) -> Option<PendingRequest> {
        self.pending
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Control state implied by the current solids, without a completion cue
    pub fn control_signal(&self) -> ControlSignal {
        ControlSignal {
            primary_enabled: self.is_populated(),
            notify_completion: false,
        }
    }

    /// Record the operation to apply to the next submitted mesh.
    ///
    /// A request made while another is pending replaces it; the replaced
    /// request is returned.
    pub fn request_operation(
        &mut self,
        operation: Operation,
        cut: bool,
    ) -> Result<Option<PendingRequest>, SessionError> {
        if !self.is_populated() && operation != Operation::Add {
            return Err(SessionError::InvalidRequestInEmptyState(operation));
        }
        if cut && operation != Operation::Subtract {
            return Err(SessionError::InvalidCutRequest(operation));
        }

        let superseded = self.pending.replace(PendingRequest { operation, cut });
        if let Some(previous) = superseded {
            debug!(?previous, "pending request superseded");
        }
        debug!(%operation, cut, "operation requested");

        Ok(superseded)
    }

    /// Drop the pending request, e.g. when the file dialog was dismissed
    pub fn cancel_request(&mut self) -> Option<PendingRequest> {
        let cancelled = self.pending.take();
        if let Some(request) = cancelled {
            debug!(?request, "pending request cancelled");
        }
        cancelled
    }

    /// Apply the pending request to a freshly loaded mesh.
    ///
    /// The first mesh of a session is adopted as is. Afterwards the pending
    /// operation combines the current solid with the mesh; a cut also keeps
    /// the intersection as the secondary brush. Every evaluation runs before
    /// anything is committed, so on error only the pending request is gone.
    pub fn submit_geometry(&mut self, mesh: Mesh) -> Result<Outcome, SessionError> {
        let request = self.pending.take().ok_or(SessionError::OrphanSubmission)?;
        let incoming = Brush::new(mesh, self.palette.next_material());

        let Some(primary) = self.primary.as_ref() else {
            info!(
                triangles = incoming.mesh().triangle_count(),
                material = %incoming.material(),
                "seeded session"
            );
            self.primary = Some(incoming);
            self.secondary = None;
            return Ok(Outcome::Seeded);
        };

        let result = self
            .evaluator
            .evaluate(primary, &incoming, request.operation.into())?;

        let secondary = if request.cut {
            // The cut-off piece gets its own color so the two halves differ
            let mut recolored = primary.clone();
            recolored.set_material(self.palette.next_material_excluding(primary.material()));
            Some(
                self.evaluator
                    .evaluate(&recolored, &incoming, BooleanOp::Intersection)?,
            )
        } else {
            None
        };

        let outcome = if request.cut {
            Outcome::Cut
        } else {
            Outcome::Applied(request.operation)
        };
        info!(
            ?outcome,
            triangles = result.mesh().triangle_count(),
            cut_piece_triangles = secondary.as_ref().map(|b| b.mesh().triangle_count()),
            "operation applied"
        );

        self.primary = Some(result);
        self.secondary = secondary;
        Ok(outcome)
    }

    /// Remove and return the cut-off piece
    pub(crate) fn take_secondary(&mut self) -> Option<Brush> {
        self.secondary.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{EvaluationError, Material};
    use crate::geometry::Primitive;
    use nalgebra::Vector3;
    use std::cell::RefCell;

    /// Evaluator that records every call and returns the left operand's mesh
    #[derive(Default)]
    struct RecordingEvaluator {
        calls: RefCell<Vec<(Material, Material, BooleanOp)>>,
        fail_on: Option<BooleanOp>,
    }

    impl BooleanEvaluator for RecordingEvaluator {
        fn evaluate(&self, a: &Brush, b: &Brush, op: BooleanOp) -> Result<Brush, EvaluationError> {
            self.calls
                .borrow_mut()
                .push((a.material(), b.material(), op));
            if self.fail_on == Some(op) {
                return Err(EvaluationError::NonFiniteInput { operand: "right" });
            }
            Ok(Brush::new(a.mesh().clone(), a.material()))
        }
    }

    fn cube(size: f64) -> Mesh {
        Primitive::cube(Vector3::new(size, size, size), true).to_mesh()
    }

    fn sphere(r: f64) -> Mesh {
        Primitive::sphere(r, 12).to_mesh()
    }

    fn recording_session() -> Session<RecordingEvaluator> {
        Session::with_evaluator(RecordingEvaluator::default(), Palette::seeded(42))
    }

    fn seeded_session() -> Session<BspEvaluator> {
        let mut session = Session::with_evaluator(BspEvaluator, Palette::seeded(3));
        session.request_operation(Operation::Add, false).unwrap();
        session.submit_geometry(cube(20.0)).unwrap();
        session
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.primary().is_none());
        assert!(session.secondary().is_none());
        assert!(!session.control_signal().primary_enabled);
    }

    #[test]
    fn test_seed_adopts_mesh_without_evaluation() {
        let mut session = recording_session();
        session.request_operation(Operation::Add, false).unwrap();

        let outcome = session.submit_geometry(cube(10.0)).unwrap();

        assert_eq!(outcome, Outcome::Seeded);
        assert!(!outcome.signal().notify_completion);
        assert!(outcome.signal().primary_enabled);
        assert_eq!(session.primary().unwrap().mesh(), &cube(10.0));
        assert!(session.secondary().is_none());
        assert!(session.evaluator().calls.borrow().is_empty());
        assert_eq!(session.state(), SessionState::Populated { cut_piece: false });
        assert!(session.pending().is_none());
    }

    #[test]
    fn test_non_add_rejected_while_empty() {
        let mut session = recording_session();

        for op in [Operation::Subtract, Operation::Intersect] {
            assert_eq!(
                session.request_operation(op, false),
                Err(SessionError::InvalidRequestInEmptyState(op))
            );
        }
        assert_eq!(
            session.request_operation(Operation::Subtract, true),
            Err(SessionError::InvalidRequestInEmptyState(Operation::Subtract))
        );

        assert!(session.pending().is_none());
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(
            session.submit_geometry(cube(1.0)),
            Err(SessionError::OrphanSubmission)
        );
        assert!(session.evaluator().calls.borrow().is_empty());
    }

    #[test]
    fn test_cut_flag_only_with_subtract() {
        let mut session = seeded_session();
        assert_eq!(
            session.request_operation(Operation::Intersect, true),
            Err(SessionError::InvalidCutRequest(Operation::Intersect))
        );
        assert_eq!(
            session.request_operation(Operation::Add, true),
            Err(SessionError::InvalidCutRequest(Operation::Add))
        );
        assert!(session.pending().is_none());
    }

    #[test]
    fn test_orphan_submission_is_dropped() {
        let mut session = seeded_session();
        let before = session.primary().cloned();

        assert_eq!(
            session.submit_geometry(sphere(5.0)),
            Err(SessionError::OrphanSubmission)
        );
        assert_eq!(session.primary().cloned(), before);
        assert!(session.secondary().is_none());
    }

    #[test]
    fn test_subtract_applies_operation() {
        let mut session = recording_session();
        session.request_operation(Operation::Add, false).unwrap();
        session.submit_geometry(cube(10.0)).unwrap();
        let seed_material = session.primary().unwrap().material();

        session.request_operation(Operation::Subtract, false).unwrap();
        let outcome = session.submit_geometry(sphere(4.0)).unwrap();

        assert_eq!(outcome, Outcome::Applied(Operation::Subtract));
        assert!(outcome.signal().notify_completion);
        let calls = session.evaluator().calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, seed_material);
        assert_eq!(calls[0].2, BooleanOp::Difference);
    }

    #[test]
    fn test_cut_keeps_both_pieces() {
        let mut session = seeded_session();
        let old_primary = session.primary().cloned().unwrap();
        let tool = sphere(13.0);

        session.request_operation(Operation::Subtract, true).unwrap();
        let outcome = session.submit_geometry(tool.clone()).unwrap();
        assert_eq!(outcome, Outcome::Cut);

        let expected_primary = old_primary.mesh().boolean_operation(&tool, BooleanOp::Difference);
        let expected_secondary = old_primary
            .mesh()
            .boolean_operation(&tool, BooleanOp::Intersection);

        assert_eq!(session.primary().unwrap().mesh(), &expected_primary);
        assert_eq!(session.secondary().unwrap().mesh(), &expected_secondary);
        assert_eq!(session.state(), SessionState::Populated { cut_piece: true });
    }

    #[test]
    fn test_cut_pieces_have_distinct_materials() {
        let mut session = recording_session();
        session.request_operation(Operation::Add, false).unwrap();
        session.submit_geometry(cube(10.0)).unwrap();
        let seed_material = session.primary().unwrap().material();

        session.request_operation(Operation::Subtract, true).unwrap();
        session.submit_geometry(sphere(6.0)).unwrap();

        let primary = session.primary().unwrap().material();
        let secondary = session.secondary().unwrap().material();
        assert_eq!(primary, seed_material);
        assert_ne!(primary, secondary);

        let calls = session.evaluator().calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].2, BooleanOp::Difference);
        assert_eq!(calls[1].2, BooleanOp::Intersection);
        assert_eq!(calls[1].0, secondary);
        // Both evaluations see the same incoming brush
        assert_eq!(calls[0].1, calls[1].1);
    }

    #[test]
    fn test_non_cut_clears_secondary() {
        for op in [Operation::Add, Operation::Subtract, Operation::Intersect] {
            let mut session = recording_session();
            session.request_operation(Operation::Add, false).unwrap();
            session.submit_geometry(cube(10.0)).unwrap();
            session.request_operation(Operation::Subtract, true).unwrap();
            session.submit_geometry(sphere(6.0)).unwrap();
            assert!(session.secondary().is_some());

            session.request_operation(op, false).unwrap();
            session.submit_geometry(sphere(2.0)).unwrap();

            assert!(session.secondary().is_none(), "{} kept the cut piece", op);
        }
    }

    #[test]
    fn test_cancelled_request_leaves_no_residue() {
        let mut session = recording_session();
        session.request_operation(Operation::Add, false).unwrap();
        assert!(session.cancel_request().is_some());
        assert_eq!(session.state(), SessionState::Empty);

        session.request_operation(Operation::Add, false).unwrap();
        assert_eq!(session.submit_geometry(cube(1.0)), Ok(Outcome::Seeded));
    }

    #[test]
    fn test_abandoned_request_is_superseded() {
        let mut session = seeded_session();
        session.request_operation(Operation::Subtract, true).unwrap();

        let superseded = session.request_operation(Operation::Add, false).unwrap();

        assert_eq!(
            superseded,
            Some(PendingRequest {
                operation: Operation::Subtract,
                cut: true
            })
        );
        let outcome = session.submit_geometry(sphere(2.0)).unwrap();
        assert_eq!(outcome, Outcome::Applied(Operation::Add));
        assert!(session.secondary().is_none());
    }

    #[test]
    fn test_failed_evaluation_keeps_solids() {
        let mut session = Session::with_evaluator(
            RecordingEvaluator {
                fail_on: Some(BooleanOp::Intersection),
                ..Default::default()
            },
            Palette::seeded(9),
        );
        session.request_operation(Operation::Add, false).unwrap();
        session.submit_geometry(cube(10.0)).unwrap();
        let before = session.primary().cloned();

        session.request_operation(Operation::Subtract, true).unwrap();
        let result = session.submit_geometry(sphere(3.0));

        assert!(matches!(result, Err(SessionError::Evaluation(_))));
        assert_eq!(session.primary().cloned(), before);
        assert!(session.secondary().is_none());
        assert!(session.pending().is_none());
    }

    #[test]
    fn test_take_secondary() {
        let mut session = seeded_session();
        session.request_operation(Operation::Subtract, true).unwrap();
        session.submit_geometry(sphere(13.0)).unwrap();

        assert!(session.take_secondary().is_some());
        assert_eq!(session.state(), SessionState::Populated { cut_piece: false });
    }
}
