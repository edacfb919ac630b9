pub mod config;
pub mod error;
pub mod geom;
pub mod id;
pub mod path_data;
pub mod scene;
pub mod shape;
pub mod svg;
pub mod transform;

pub use config::EditorConfig;
pub use error::PathError;
pub use geom::{CoordKey, PathPoint, PointKind, reflect};
pub use id::PrimitiveId;
pub use path_data::{PathCmd, emit_path_data, parse_path_data};
pub use scene::{Primitive, PrimitiveKind, PrimitiveStyle, Scene};
pub use shape::{SegmentGeometry, SegmentPoints, SegmentShape, decompose, generate_path};
pub use svg::render_svg;
pub use transform::{parse_transform, transform_path_data};

// Re-export kurbo geometry types so downstream crates share one version
pub use kurbo::{Affine, Point, Rect, Vec2};
