//! Intrastat codes of Spanish provinces.
//!
//! Spain declares the province of the company-side warehouse with the two
//! digit code of its statistical office; this module loads those codes onto
//! the province subdivisions of a store.

use log::info;

use crate::core::{IntrastatError, Store};

/// ISO 3166-2 province code to Intrastat province code.
/// Sorted for binary search.
static ES_PROVINCES: &[(&str, &str)] = &[
    ("ES-A", "03"),
    ("ES-AB", "02"),
    ("ES-AL", "04"),
    ("ES-AV", "05"),
    ("ES-B", "08"),
    ("ES-BA", "06"),
    ("ES-BI", "48"),
    ("ES-BU", "09"),
    ("ES-C", "15"),
    ("ES-CA", "11"),
    ("ES-CC", "10"),
    ("ES-CE", "51"),
    ("ES-CO", "14"),
    ("ES-CR", "13"),
    ("ES-CS", "12"),
    ("ES-CU", "16"),
    ("ES-GC", "35"),
    ("ES-GI", "17"),
    ("ES-GR", "18"),
    ("ES-GU", "19"),
    ("ES-H", "21"),
    ("ES-HU", "22"),
    ("ES-J", "23"),
    ("ES-L", "25"),
    ("ES-LE", "24"),
    ("ES-LO", "26"),
    ("ES-LU", "27"),
    ("ES-M", "28"),
    ("ES-MA", "29"),
    ("ES-ML", "52"),
    ("ES-MU", "30"),
    ("ES-NA", "31"),
    ("ES-O", "33"),
    ("ES-OR", "32"),
    ("ES-P", "34"),
    ("ES-PM", "07"),
    ("ES-PO", "36"),
    ("ES-S", "39"),
    ("ES-SA", "37"),
    ("ES-SE", "41"),
    ("ES-SG", "40"),
    ("ES-SO", "42"),
    ("ES-SS", "20"),
    ("ES-T", "43"),
    ("ES-TE", "44"),
    ("ES-TF", "38"),
    ("ES-TO", "45"),
    ("ES-V", "46"),
    ("ES-VA", "47"),
    ("ES-VI", "01"),
    ("ES-Z", "50"),
    ("ES-ZA", "49"),
];

/// Subdivision kind the codes apply to.
const PROVINCE: &str = "province";

/// Intrastat code of a Spanish province.
pub fn es_province_code(iso: &str) -> Option<&'static str> {
    ES_PROVINCES
        .binary_search_by(|(code, _)| code.cmp(&iso))
        .ok()
        .map(|i| ES_PROVINCES[i].1)
}

/// Remove the Intrastat code of every province of `country`.
pub fn clean_subdivision_codes(store: &mut Store, country: &str) -> usize {
    let mut cleaned = 0;
    for subdivision in store.subdivisions.values_mut() {
        if subdivision.country_code == country && subdivision.kind == PROVINCE {
            subdivision.intrastat_code = None;
            cleaned += 1;
        }
    }
    cleaned
}

/// Replace the Intrastat codes of the provinces of `country` with the
/// official table.
///
/// Fails without touching the store when a province has no code.
pub fn import_subdivision_codes(store: &mut Store, country: &str) -> Result<usize, IntrastatError> {
    if country != "ES" {
        return Err(IntrastatError::Config(format!(
            "no subdivision code table for {country}"
        )));
    }
    let mut staged = store.clone();
    clean_subdivision_codes(&mut staged, country);
    let mut imported = 0;
    for subdivision in staged.subdivisions.values_mut() {
        if subdivision.country_code != country || subdivision.kind != PROVINCE {
            continue;
        }
        let code = es_province_code(&subdivision.code)
            .ok_or_else(|| IntrastatError::UnknownSubdivision(subdivision.code.clone()))?;
        subdivision.intrastat_code = Some(code.to_string());
        imported += 1;
    }
    *store = staged;
    info!("imported {imported} intrastat codes for {country}");
    Ok(imported)
}
