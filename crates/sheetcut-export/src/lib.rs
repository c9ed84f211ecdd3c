//! Cutting-diagram export to 2-D vector files (DXF/SVG) and supporting helpers.

pub mod config;
pub mod diagram;
pub mod document;
pub mod dxf;
pub mod error;
pub mod export;
pub mod render;
pub mod sanitize;
pub mod sheet;
pub mod svg;
pub mod units;

pub use config::{Color, FileFormat, LabelSource, Layer, LayerStyle, RenderConfig};
pub use diagram::{Cut, CuttingDiagram, Leftover, MaterialGroup, PlacedPart, SheetGroup};
pub use document::DiagramDocument;
pub use error::{ConfigError, DocumentError, ExportError, PreconditionError};
pub use export::{export, sheet_file_name, DirectoryChooser, ExportOutcome};
pub use render::render_sheet;
pub use units::{LengthUnit, UnitProvider, UnitTransform, PX_PER_INCH};
