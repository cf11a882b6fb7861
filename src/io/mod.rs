// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! I/O module - mesh ingestion, serialization and file sinks

mod sink;
mod stl;

pub use sink::{DirectorySink, FileSink, MemorySink};
pub use stl::{
    ingest, GeometryIngestion, IngestError, MeshSerializer, RawMesh, StlEncoding, StlIngestion,
    StlSerializer,
};
