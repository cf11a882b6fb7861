// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Export assembly: which solids of a session get written, in what order
//! and under which names.

use crate::brush::{BooleanEvaluator, Brush};
use crate::io::MeshSerializer;
use crate::session::Session;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialize {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// One named output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Chooses the outputs for the current session state.
///
/// With no cut-off piece a single `{stem}.{ext}` holds the current solid.
/// After a cut, `{stem}_part_2.{ext}` (the cut-off piece) is followed by
/// `{stem}_part_1.{ext}` (the remainder), and the cut-off piece is consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportAssembler {
    stem: String,
}

impl ExportAssembler {
    pub const DEFAULT_STEM: &'static str = "output";

    pub fn new(stem: impl Into<String>) -> Self {
        Self { stem: stem.into() }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Name of the only output when no cut-off piece is held
    pub fn single_name(&self, extension: &str) -> String {
        format!("{}.{}", self.stem, extension)
    }

    /// Name of cut piece `part` (1 = remainder, 2 = cut-off piece)
    pub fn part_name(&self, part: u8, extension: &str) -> String {
        format!("{}_part_{}.{}", self.stem, part, extension)
    }

    /// Serialize the session's solids. Empty sessions produce nothing.
    ///
    /// The cut-off piece is cleared only once every output is serialized.
    pub fn export_current<E: BooleanEvaluator>(
        &self,
        session: &mut Session<E>,
        serializer: &dyn MeshSerializer,
    ) -> Result<Vec<ExportedFile>, ExportError> {
        let Some(primary) = session.primary() else {
            return Ok(Vec::new());
        };
        let extension = serializer.extension();

        let files = match session.secondary() {
            None => vec![encode(serializer, self.single_name(extension), primary)?],
            Some(secondary) => vec![
                encode(serializer, self.part_name(2, extension), secondary)?,
                encode(serializer, self.part_name(1, extension), primary)?,
            ],
        };

        if files.len() == 2 {
            session.take_secondary();
        }

        info!(
            files = ?files.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            "export assembled"
        );
        Ok(files)
    }
}

impl Default for ExportAssembler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STEM)
    }
}

fn encode(
    serializer: &dyn MeshSerializer,
    name: String,
    brush: &Brush,
) -> Result<ExportedFile, ExportError> {
    match serializer.serialize(brush) {
        Ok(bytes) => Ok(ExportedFile { name, bytes }),
        Err(source) => Err(ExportError::Serialize { name, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{BspEvaluator, Palette};
    use crate::geometry::{Mesh, Primitive};
    use crate::io::StlSerializer;
    use crate::session::{Operation, SessionState};
    use nalgebra::Vector3;

    struct FailingSerializer;

    impl MeshSerializer for FailingSerializer {
        fn serialize(&self, _brush: &Brush) -> std::io::Result<Vec<u8>> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
    }

    fn cube() -> Mesh {
        Primitive::cube(Vector3::new(20.0, 20.0, 20.0), true).to_mesh()
    }

    fn session_after(cut: bool) -> Session {
        let mut session = Session::with_evaluator(BspEvaluator, Palette::seeded(11));
        session.request_operation(Operation::Add, false).unwrap();
        session.submit_geometry(cube()).unwrap();
        session.request_operation(Operation::Subtract, cut).unwrap();
        session
            .submit_geometry(Primitive::sphere(13.0, 12).to_mesh())
            .unwrap();
        session
    }

    #[test]
    fn test_empty_session_exports_nothing() {
        let mut session = Session::new();
        let files = ExportAssembler::default()
            .export_current(&mut session, &StlSerializer::binary())
            .unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_single_output_without_cut() {
        let mut session = session_after(false);
        let files = ExportAssembler::default()
            .export_current(&mut session, &StlSerializer::binary())
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "output.stl");
        let expected = StlSerializer::binary()
            .serialize(session.primary().unwrap())
            .unwrap();
        assert_eq!(files[0].bytes, expected);
    }

    #[test]
    fn test_cut_exports_two_then_one() {
        let mut session = session_after(true);
        let serializer = StlSerializer::binary();
        let secondary_bytes = serializer.serialize(session.secondary().unwrap()).unwrap();
        let primary_bytes = serializer.serialize(session.primary().unwrap()).unwrap();
        let assembler = ExportAssembler::default();

        let first = assembler.export_current(&mut session, &serializer).unwrap();
        assert_eq!(
            first,
            vec![
                ExportedFile {
                    name: "output_part_2.stl".into(),
                    bytes: secondary_bytes
                },
                ExportedFile {
                    name: "output_part_1.stl".into(),
                    bytes: primary_bytes.clone()
                },
            ]
        );
        assert_eq!(session.state(), SessionState::Populated { cut_piece: false });

        let second = assembler.export_current(&mut session, &serializer).unwrap();
        assert_eq!(
            second,
            vec![ExportedFile {
                name: "output.stl".into(),
                bytes: primary_bytes
            }]
        );
    }

    #[test]
    fn test_failed_serialization_keeps_cut_piece() {
        let mut session = session_after(true);
        let result = ExportAssembler::default().export_current(&mut session, &FailingSerializer);

        match result {
            Err(ExportError::Serialize { name, .. }) => assert_eq!(name, "output_part_2.stl"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(session.secondary().is_some());
    }

    #[test]
    fn test_custom_stem() {
        let assembler = ExportAssembler::new("bracket");
        assert_eq!(assembler.single_name("stl"), "bracket.stl");
        assert_eq!(assembler.part_name(2, "stl"), "bracket_part_2.stl");
    }
}
