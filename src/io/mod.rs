//! Import/Export I/O subsystem.
//!
//! Encodes graph snapshots into interchange formats and reads the structured
//! document back.
//!
//! # Supported Formats
//!
//! | Format | Import | Export | Notes |
//! |--------|--------|--------|-------|
//! | Document | ✓ | ✓ | Pretty JSON with an `exportInfo` block |
//! | Genealogy text | - | ✓ | GEDCOM 5.5.1 lineage-linked subset |
//! | Table | - | ✓ | CSV, one row per person |
//!
//! # Examples
//!
//! ```rust
//! use famgraph::io::{ExportFormat, ExportService};
//! use famgraph::models::GraphSnapshot;
//!
//! let csv = ExportService::new()
//!     .export(&GraphSnapshot::empty(), ExportFormat::Table)
//!     .unwrap();
//! assert_eq!(csv, "firstName,lastName,birthDate,deathDate,gender\n");
//! ```

pub mod formats;
pub mod services;
pub mod traits;
pub mod validation;

// Re-exports for convenience
pub use formats::{ExportFormat, create_encoder};
pub use services::export::{ExportResult, ExportService};
pub use services::import::ImportService;
pub use traits::SnapshotEncoder;
pub use validation::{ValidationIssue, ValidationSeverity, check_snapshot, validate_snapshot};
