//! # Ferrite Catalog
//!
//! Loads switch and rectifier catalogues from spreadsheet exports and hands
//! the raw rows to [`ferrite_core`] for schema validation and unit scaling.
//!
//! | Kind | Columns | Record |
//! |------|---------|--------|
//! | Switch | 11 | [`SwitchDevice`] |
//! | Rectifier | 6 | [`RectifierDevice`] |
//!
//! Row errors are reported with the line number of the offending row in the
//! source file.

pub mod parsers;

use std::path::Path;

use ferrite_core::catalog::{Catalog, CatalogRecord};
use ferrite_core::devices::{RectifierDevice, SwitchDevice};
use ferrite_core::DesignError;
use thiserror::Error;

use parsers::csv::parse_csv;
use parsers::{CatalogRow, ParseError};

/// Errors while loading a catalogue.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid row at line {line}: {source}")]
    Row {
        line: usize,
        #[source]
        source: DesignError,
    },

    #[error(transparent)]
    Schema(#[from] DesignError),
}

impl From<ParseError> for CatalogError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::IoError(e) => CatalogError::Io(e),
            ParseError::FormatError { line, message } => CatalogError::Parse { line, message },
        }
    }
}

/// Build a validated catalogue from CSV text.
pub fn catalog_from_str<T: CatalogRecord>(content: &str) -> Result<Catalog<T>, CatalogError> {
    let rows = parse_csv(content)?;
    let records = rows
        .iter()
        .enumerate()
        .map(|(index, row)| T::from_row(index, row.as_ref()).map_err(|e| row_error(row, e)))
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("parsed {} {} rows", records.len(), T::KIND);
    Ok(Catalog::new(records)?)
}

/// Read and validate a catalogue file.
pub fn load_catalog<T: CatalogRecord>(path: &Path) -> Result<Catalog<T>, CatalogError> {
    let content = std::fs::read_to_string(path)?;
    let catalog = catalog_from_str(&content)?;
    log::info!("loaded {} {} entries from {}", catalog.len(), T::KIND, path.display());
    Ok(catalog)
}

/// Read the switch (MOSFET) catalogue at `path`.
pub fn load_switch_catalog(path: &Path) -> Result<Catalog<SwitchDevice>, CatalogError> {
    load_catalog(path)
}

/// Read the rectifier (diode) catalogue at `path`.
pub fn load_rectifier_catalog(path: &Path) -> Result<Catalog<RectifierDevice>, CatalogError> {
    load_catalog(path)
}

fn row_error(row: &CatalogRow, source: DesignError) -> CatalogError {
    CatalogError::Row {
        line: row.line,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SWITCHES: &str = "\
# Switch catalog
Name,Price,Manufacturer,Package,Rds_on_mOhm,Vsd_V,Vgs_max_V,tr_ns,tf_ns,Qg_nC,Qrr_nC
IRFB4110,3.10,Infineon,TO-220,3.7,1.3,20,67,88,150,110

EPC2045,2.20,EPC,BGA,7.0,0,6,2,2,5.2,0
";

    const RECTIFIERS: &str = "\
Name,Price,Manufacturer,Package,Vf_V,Cd_pF
SS34,0.20,Vishay,SMA,0.50,300
";

    #[test]
    fn test_switch_catalog_from_str() {
        let catalog: Catalog<SwitchDevice> = catalog_from_str(SWITCHES).unwrap();
        assert_eq!(catalog.len(), 2);
        let q = &catalog.records()[0];
        assert_eq!(q.name, "IRFB4110");
        assert_eq!(q.package, "TO-220");
        assert_relative_eq!(q.on_resistance, 3.7e-3, max_relative = 1e-12);
        assert_relative_eq!(q.gate_charge, 150e-9, max_relative = 1e-12);
    }

    #[test]
    fn test_rectifier_catalog_from_str() {
        let catalog: Catalog<RectifierDevice> = catalog_from_str(RECTIFIERS).unwrap();
        assert_eq!(catalog.records()[0].name, "SS34");
        assert_relative_eq!(catalog.records()[0].junction_capacitance, 300e-12, max_relative = 1e-12);
    }

    #[test]
    fn test_row_error_reports_line() {
        let content = "Name,Price,Manufacturer,Package,Vf_V,Cd_pF\nSS34,0.20,Vishay,SMA,0.50,300\nBAD,abc,,,0.5,10\n";
        let err = catalog_from_str::<RectifierDevice>(content).unwrap_err();
        match err {
            CatalogError::Row { line, source } => {
                assert_eq!(line, 3);
                assert!(matches!(source, DesignError::Data { index: 1, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_row_rejected() {
        let content = "Name,Price\nSS34,0.20,Vishay\n";
        let err = catalog_from_str::<RectifierDevice>(content).unwrap_err();
        assert!(matches!(err, CatalogError::Row { line: 2, .. }));
    }

    #[test]
    fn test_header_only_is_empty_catalog() {
        let err = catalog_from_str::<SwitchDevice>("Name,Price\n").unwrap_err();
        assert!(matches!(err, CatalogError::Schema(DesignError::Configuration(_))));
    }

    #[test]
    fn test_parse_error_mapped() {
        let err = catalog_from_str::<SwitchDevice>("Name\n\"open\n").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_switch_catalog(Path::new("/nonexistent/ferrite/switches.csv")).unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
