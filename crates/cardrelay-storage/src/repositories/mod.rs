pub mod scan;

pub use scan::{ScanRepository, SqliteScanRepository};
