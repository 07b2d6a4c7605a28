//! Multi-geometry model file writer.
//!
//! Routes decoded geometry values into a model container by kind and
//! persists the collected archives. The binary model format itself belongs
//! to the external geometry library; what matters here is the classification
//! contract: each object is filed under the first kind it matches, and
//! unrecognized objects are skipped rather than rejected.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use super::geometry::{Geometry, GeometryKind};
use crate::domains::tools::definitions::compute::DecodedValue;

/// Errors from reading or writing model files.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model file: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// An in-memory model being assembled for writing.
///
/// Objects are stored as opaque archives grouped by kind; the container
/// exposes one add-operation per kind, mirroring the external model API.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ModelWriter {
    objects: Vec<ModelObject>,
}

/// One filed object: its kind plus the untouched archive payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelObject {
    pub kind: GeometryKind,
    pub archive: serde_json::Value,
}

impl ModelWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_curve(&mut self, geometry: &Geometry) {
        self.file(GeometryKind::Curve, geometry);
    }

    pub fn add_point(&mut self, geometry: &Geometry) {
        self.file(GeometryKind::Point, geometry);
    }

    pub fn add_surface(&mut self, geometry: &Geometry) {
        self.file(GeometryKind::Surface, geometry);
    }

    pub fn add_mesh(&mut self, geometry: &Geometry) {
        self.file(GeometryKind::Mesh, geometry);
    }

    pub fn add_brep(&mut self, geometry: &Geometry) {
        self.file(GeometryKind::Brep, geometry);
    }

    fn file(&mut self, kind: GeometryKind, geometry: &Geometry) {
        self.objects.push(ModelObject {
            kind,
            archive: geometry.archive.clone(),
        });
    }

    /// Route one geometry object to the matching add-operation.
    ///
    /// Kinds are tried in the fixed classification order; an unknown kind
    /// is skipped and reported as `false`.
    pub fn add_geometry(&mut self, geometry: &Geometry) -> bool {
        match geometry.kind {
            GeometryKind::Curve => self.add_curve(geometry),
            GeometryKind::Point => self.add_point(geometry),
            GeometryKind::Surface => self.add_surface(geometry),
            GeometryKind::Mesh => self.add_mesh(geometry),
            GeometryKind::Brep => self.add_brep(geometry),
            GeometryKind::Unknown => {
                warn!("Skipping geometry of unrecognized kind");
                return false;
            }
        }
        true
    }

    /// Number of objects filed so far.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Count filed objects per kind.
    pub fn counts(&self) -> HashMap<GeometryKind, usize> {
        let mut counts = HashMap::new();
        for object in &self.objects {
            *counts.entry(object.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Persist the collected archives to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer(file, self)?;
        debug!("Wrote {} objects to {:?}", self.objects.len(), path.as_ref());
        Ok(())
    }
}

/// File the geometry objects from a decoded output sequence and write
/// the resulting model. Non-geometry values and unrecognized kinds are
/// skipped. Returns how many objects were written.
pub fn save_model(values: &[DecodedValue], path: impl AsRef<Path>) -> Result<usize, ModelError> {
    let mut model = ModelWriter::new();
    for value in values {
        if let DecodedValue::Geometry(geometry) = value {
            model.add_geometry(geometry);
        }
    }
    model.save(path)?;
    Ok(model.len())
}

/// Read a saved model back for inspection.
pub fn read_model(path: impl AsRef<Path>) -> Result<ModelWriter, ModelError> {
    let file = std::fs::File::open(path.as_ref())?;
    let model = serde_json::from_reader(file)?;
    Ok(model)
}
