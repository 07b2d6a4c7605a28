//! Opaque geometry payloads.
//!
//! Geometry travels through this server as encoded openNURBS archives
//! (JSON objects carrying a base64 `data` blob). The archive internals
//! belong to the external geometry library; this module only recognizes
//! such payloads and classifies them by kind for model routing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Concrete geometry kinds the model writer can file.
///
/// Classification tries the kinds in declaration order and accepts the
/// first match, so a payload hinting at several capabilities is filed
/// under the earliest-listed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Curve,
    Point,
    Surface,
    Mesh,
    Brep,
    Unknown,
}

impl GeometryKind {
    /// Kinds in classification order, `Unknown` excluded.
    pub const ALL: [GeometryKind; 5] = [
        Self::Curve,
        Self::Point,
        Self::Surface,
        Self::Mesh,
        Self::Brep,
    ];

    /// Classify a payload type hint, e.g. `Rhino.Geometry.NurbsCurve`.
    pub fn classify(hint: &str) -> Self {
        let hint = hint.to_ascii_lowercase();
        if hint.contains("curve") {
            Self::Curve
        } else if hint.contains("point") {
            Self::Point
        } else if hint.contains("surface") {
            Self::Surface
        } else if hint.contains("mesh") {
            Self::Mesh
        } else if hint.contains("brep") {
            Self::Brep
        } else {
            Self::Unknown
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Curve => "curve",
            Self::Point => "point",
            Self::Surface => "surface",
            Self::Mesh => "mesh",
            Self::Brep => "brep",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One opaque encoded geometry object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Kind derived from the payload's type hint.
    pub kind: GeometryKind,

    /// The full encoded archive, passed through unparsed.
    pub archive: Value,
}

impl Geometry {
    /// Try to interpret a JSON value as an encoded geometry archive.
    ///
    /// Accepts only objects carrying an encoded `data` string; anything
    /// else is not geometry and yields `None` so the caller can fall
    /// through to other decode rules.
    pub fn decode(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        object.get("data")?.as_str()?;

        let kind = object
            .get("type")
            .or_else(|| object.get("objectType"))
            .and_then(Value::as_str)
            .map(GeometryKind::classify)
            .unwrap_or(GeometryKind::Unknown);

        Some(Self {
            kind,
            archive: value.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_kinds() {
        assert_eq!(
            GeometryKind::classify("Rhino.Geometry.NurbsCurve"),
            GeometryKind::Curve
        );
        assert_eq!(GeometryKind::classify("Point3d"), GeometryKind::Point);
        assert_eq!(
            GeometryKind::classify("Rhino.Geometry.NurbsSurface"),
            GeometryKind::Surface
        );
        assert_eq!(GeometryKind::classify("Mesh"), GeometryKind::Mesh);
        assert_eq!(GeometryKind::classify("Rhino.Geometry.Brep"), GeometryKind::Brep);
        assert_eq!(GeometryKind::classify("Extrusion"), GeometryKind::Unknown);
    }

    #[test]
    fn test_classify_prefers_earliest_kind() {
        // A hint satisfying several capabilities files under the first match.
        assert_eq!(
            GeometryKind::classify("CurveOnSurface"),
            GeometryKind::Curve
        );
    }

    #[test]
    fn test_decode_requires_archive_data() {
        assert!(Geometry::decode(&serde_json::json!({"data": "AAECAw=="})).is_some());
        assert!(Geometry::decode(&serde_json::json!({"type": "Mesh"})).is_none());
        assert!(Geometry::decode(&serde_json::json!({"data": 42})).is_none());
        assert!(Geometry::decode(&serde_json::json!("AAECAw==")).is_none());
        assert!(Geometry::decode(&serde_json::json!(null)).is_none());
    }

    #[test]
    fn test_decode_reads_type_hint() {
        let payload = serde_json::json!({
            "type": "Rhino.Geometry.Mesh",
            "data": "AAECAw=="
        });
        let geometry = Geometry::decode(&payload).unwrap();
        assert_eq!(geometry.kind, GeometryKind::Mesh);
        assert_eq!(geometry.archive, payload);
    }

    #[test]
    fn test_decode_without_hint_is_unknown() {
        let payload = serde_json::json!({"archive3dm": 70, "data": "AAECAw=="});
        let geometry = Geometry::decode(&payload).unwrap();
        assert_eq!(geometry.kind, GeometryKind::Unknown);
    }
}
