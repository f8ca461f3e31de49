use regex::Regex;

use crate::csvio::Row;
use crate::models::norm_space;

// Column-name variants seen across county export formats, in priority order.
// Address detection keeps property/situs columns first because that is the
// address that goes in the letter body; ZIP resolution is a separate,
// mailing-first strategy below.
const ADDR_COLS: &[&str] = &[
    "PropertyAddress",
    "PROPERTY ADDRESS",
    "PROPERTY_ADDRESS",
    "SITUS ADDRESS",
    "SITUS_ADDRESS",
    "SITUS",
    "MAILING ADDRESS",
    "MAILING_ADDRESS",
    "ADDRESS",
    "ADDRESS 1",
    "ADDRESS1",
    "STREET ADDRESS",
    "Situs Address",
    "Mailing Address",
    "Property Address",
];

const OWNER_COLS: &[&str] = &[
    "OwnerName",
    "OWNER NAME",
    "OWNER",
    "OWNER(S)",
    "OWNER 1",
    "OWNER1",
    "OWNER NAME 1",
    "Primary Name",
    "PRIMARY NAME",
    "Mail Owner",
    "OWNER NAME(S)",
];

const NAME_PAIR_COLS: &[(&str, &str)] = &[
    ("Primary First", "Primary Last"),
    ("PRIMARY FIRST", "PRIMARY LAST"),
    ("Owner First", "Owner Last"),
    ("OWNER FIRST", "OWNER LAST"),
    ("First Name", "Last Name"),
    ("FIRST NAME", "LAST NAME"),
];

const MAIL_ZIP_COLS: &[&str] = &[
    "Mail ZIP",
    "MAIL ZIP",
    "Mail Zip",
    "Mail Zip Code",
    "MAIL ZIP CODE",
    "MAIL ZIP5",
    "Mail ZIP5",
    "MAILING ZIP",
    "MAILING ZIP CODE",
    "MAILING ZIP5",
    "Owner ZIP",
    "OWNER ZIP",
    "Owner Zip",
    "OWNER ZIP5",
    "Owner ZIP5",
];

const MAIL_ADDR_COLS: &[&str] = &[
    "MAILING ADDRESS",
    "Mailing Address",
    "Mailing Address 1",
    "Mailing Address1",
    "OWNER ADDRESS",
    "Owner Address",
    "OWNER MAILING ADDRESS",
    "Owner Mailing Address",
];

const GENERIC_ZIP_COLS: &[&str] = &[
    "ZIP5", "Zip5", "ZIP", "Zip", "Zip Code", "ZIP CODE", "ZIP CODE 5",
];

const SITUS_ZIP_COLS: &[&str] = &[
    "SITUS ZIP",
    "SITUS ZIP CODE",
    "SITUS ZIP CODE 5-DIGIT",
    "SITUS ZIP5",
    "Situs ZIP",
    "Situs Zip Code",
];

const PROPERTY_ADDR_COLS: &[&str] = &[
    "property_address",
    "Property Address",
    "PROPERTY ADDRESS",
    "Address",
    "ADDRESS",
    "Situs Address",
    "SITUS ADDRESS",
    "PropertyAddress",
    "SITUS",
];

/// Extracts canonical (address, owner, ZIP5) values from rows with
/// unknown, inconsistent column naming.
pub struct FieldResolver {
    zip_tail: Regex,
    float_artifact: Regex,
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldResolver {
    pub fn new() -> Self {
        Self {
            // trailing 5-digit token, optional ZIP+4 suffix
            zip_tail: Regex::new(r"(\d{5})(?:-\d{4})?$").unwrap(),
            // spreadsheet exports turn "95835" into "95835.0"
            float_artifact: Regex::new(r"\.0$").unwrap(),
        }
    }

    /// Pull a ZIP5 off the end of any address-like string. Empty string if
    /// there is none.
    pub fn zip5_from_text(&self, s: &str) -> String {
        let s = s.trim();
        if s.is_empty() {
            return String::new();
        }
        let s = self.float_artifact.replace(s, "");
        match self.zip_tail.captures(&s) {
            Some(caps) => caps[1].to_string(),
            None => String::new(),
        }
    }

    fn first_nonempty(&self, row: &Row, cols: &[&str]) -> Option<String> {
        cols.iter()
            .filter_map(|c| row.get(*c))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn first_zip(&self, row: &Row, cols: &[&str]) -> Option<String> {
        for col in cols {
            if let Some(v) = row.get(*col) {
                let z = self.zip5_from_text(v);
                if !z.is_empty() {
                    return Some(z);
                }
            }
        }
        None
    }

    /// Last-resort scan: any header whose name contains `needle`
    /// (case-insensitive) with a non-empty cell.
    fn substring_fallback(&self, row: &Row, needle: &str) -> Option<String> {
        let mut keys: Vec<&String> = row.keys().collect();
        keys.sort();
        keys.into_iter()
            .filter(|k| k.to_lowercase().contains(needle))
            .map(|k| row[k].trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Resolve (address, owner) from an arbitrarily-shaped source row.
    /// Either half may come back empty; the caller decides how to count
    /// and drop such rows.
    pub fn address_owner(&self, row: &Row) -> (String, String) {
        let addr = self
            .first_nonempty(row, ADDR_COLS)
            .or_else(|| self.substring_fallback(row, "address"))
            .unwrap_or_default();

        let owner = self
            .first_nonempty(row, OWNER_COLS)
            .or_else(|| self.compose_owner_name(row))
            .or_else(|| self.substring_fallback(row, "owner"))
            .unwrap_or_default();

        (addr, owner)
    }

    fn compose_owner_name(&self, row: &Row) -> Option<String> {
        for (first_col, last_col) in NAME_PAIR_COLS {
            let first = row.get(*first_col).map(|v| v.trim()).unwrap_or("");
            let last = row.get(*last_col).map(|v| v.trim()).unwrap_or("");
            if !first.is_empty() || !last.is_empty() {
                return Some(norm_space(&format!("{} {}", first, last)));
            }
        }
        None
    }

    /// Resolve ZIP5 for presort purposes, MAILING-FIRST:
    /// 1) explicit mailing/owner ZIP columns
    /// 2) mailing/owner address strings
    /// 3) generic ZIP columns
    /// 4) situs/property ZIP columns
    /// 5) the property address string itself
    pub fn zip5(&self, row: &Row, property_addr: &str) -> String {
        if let Some(z) = self.zip5_generic(row) {
            return z;
        }
        self.zip5_from_text(property_addr)
    }

    /// The mailing-first column walk shared with finalize, which also scans
    /// property-address columns as its own last resort.
    fn zip5_generic(&self, row: &Row) -> Option<String> {
        self.first_zip(row, MAIL_ZIP_COLS)
            .or_else(|| self.first_zip(row, MAIL_ADDR_COLS))
            .or_else(|| self.first_zip(row, GENERIC_ZIP_COLS))
            .or_else(|| self.first_zip(row, SITUS_ZIP_COLS))
    }

    /// ZIP5 from a mapping/log/master row where no separate property
    /// address string is available.
    pub fn zip5_from_row(&self, row: &Row) -> String {
        self.zip5_generic(row)
            .or_else(|| self.first_zip(row, PROPERTY_ADDR_COLS))
            .unwrap_or_default()
    }

    /// Address/owner getters for already-built master rows (known schemas).
    pub fn master_address(&self, row: &Row) -> String {
        self.first_nonempty(row, PROPERTY_ADDR_COLS).unwrap_or_default()
    }

    pub fn master_owner(&self, row: &Row) -> String {
        self.first_nonempty(
            row,
            &["Primary Name", "PRIMARY NAME", "OwnerName", "OWNER NAME", "Owner", "OWNER"],
        )
        .or_else(|| self.compose_owner_name(row))
        .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn zip_from_text_handles_artifacts_and_plus4() {
        let r = FieldResolver::new();
        assert_eq!(r.zip5_from_text("95835"), "95835");
        assert_eq!(r.zip5_from_text("95835.0"), "95835");
        assert_eq!(r.zip5_from_text("123 Main St, Sacramento CA 95835-1234"), "95835");
        assert_eq!(r.zip5_from_text("no zip here"), "");
        assert_eq!(r.zip5_from_text(""), "");
    }

    #[test]
    fn address_prefers_property_columns() {
        let r = FieldResolver::new();
        let (addr, _) = r.address_owner(&row(&[
            ("MAILING ADDRESS", "PO Box 1"),
            ("SITUS ADDRESS", "1 Main St"),
        ]));
        assert_eq!(addr, "1 Main St");
    }

    #[test]
    fn owner_composes_first_last_when_no_single_column() {
        let r = FieldResolver::new();
        let (_, owner) = r.address_owner(&row(&[
            ("Address", "1 Main St"),
            ("Primary First", "Jane"),
            ("Primary Last", "Doe"),
        ]));
        assert_eq!(owner, "Jane Doe");
    }

    #[test]
    fn substring_fallback_catches_odd_headers() {
        let r = FieldResolver::new();
        let (addr, owner) = r.address_owner(&row(&[
            ("Parcel Street Address Line", "9 Elm Ave"),
            ("Deeded Owner Of Record", "Acme LLC"),
        ]));
        assert_eq!(addr, "9 Elm Ave");
        assert_eq!(owner, "Acme LLC");
    }

    #[test]
    fn zip_resolution_is_mailing_first() {
        let r = FieldResolver::new();
        let z = r.zip5(
            &row(&[
                ("SITUS ZIP", "95814"),
                ("Mail ZIP", "94203"),
                ("ZIP5", "90001"),
            ]),
            "1 Main St Sacramento CA 95835",
        );
        assert_eq!(z, "94203");
    }

    #[test]
    fn zip_falls_back_through_the_priority_order() {
        let r = FieldResolver::new();
        // no mail zip column -> mailing address string
        let z = r.zip5(
            &row(&[("Mailing Address", "PO Box 9, Reno NV 89501")]),
            "1 Main St",
        );
        assert_eq!(z, "89501");
        // nothing but the property address string
        let z = r.zip5(&row(&[]), "1 Main St Sacramento CA 95835");
        assert_eq!(z, "95835");
        // nothing at all -> empty bucket
        assert_eq!(r.zip5(&row(&[]), "1 Main St"), "");
    }

    #[test]
    fn mapping_rows_resolve_zip_without_separate_address() {
        let r = FieldResolver::new();
        let z = r.zip5_from_row(&row(&[("property_address", "4 Oak Ct, Davis CA 95616")]));
        assert_eq!(z, "95616");
    }
}
