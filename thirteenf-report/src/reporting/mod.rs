//! Rendering and artifact export.

pub mod artifacts;
pub mod export;
pub mod latex;
pub mod markdown;

pub use artifacts::{ArtifactManager, ArtifactPaths, ReportManifest};
pub use export::{build_and_export, export_report};
pub use latex::{markdown_to_latex, render_document, render_summary_table};
pub use markdown::{render_markdown_tables, render_summaries};
