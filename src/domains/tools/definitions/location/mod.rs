//! Location tools: Nominatim geocoding, the resolution pipeline, and the
//! location-to-coordinates tool.

pub mod nominatim;
pub mod pipeline;
pub mod resolve;

pub use nominatim::{GeocodeCandidate, GeocodeClient, GeocodeError};
pub use pipeline::{BoundingBox, LocationError, overpass_url, resolve_location};
pub use resolve::{LocationToCoordinatesParams, LocationToCoordinatesTool};
