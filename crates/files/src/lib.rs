//! File helpers for dispatch runs - picking input files and merging results.
//!
//! A typical run lists the input files of a folder, dispatches one task per
//! file, and every task writes a small tab-separated table. The tables are
//! merged into one afterwards with [`combine_tables`].

#![warn(missing_docs)]

pub mod error;
pub mod extensions;
pub mod listing;
pub mod table;

pub use error::{FilesError, Result};
pub use extensions::{Extensions, IMAGE_EXTENSIONS};
pub use listing::{list_files, make_folders};
pub use table::{combine_tables, combined_path, Table};
