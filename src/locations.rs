//! Province and autonomous-community lookup.
//!
//! The DGT feed usually carries province names inline, but some records only
//! carry the two-digit INE province code and many omit the autonomous
//! community. [`LocationTable`] is built once at startup and handed to the
//! parser by reference; it is never mutated afterwards.
//!
//! An override file can extend or replace entries:
//! ```json
//! {
//!   "28": { "province": "Madrid", "region": "Comunidad de Madrid" }
//! }
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProvinceEntry {
    pub province: String,
    pub region: String,
}

static PROVINCES: &[(&str, &str, &str)] = &[
    ("01", "Araba/Álava", "País Vasco"),
    ("02", "Albacete", "Castilla-La Mancha"),
    ("03", "Alicante/Alacant", "Comunitat Valenciana"),
    ("04", "Almería", "Andalucía"),
    ("05", "Ávila", "Castilla y León"),
    ("06", "Badajoz", "Extremadura"),
    ("07", "Illes Balears", "Illes Balears"),
    ("08", "Barcelona", "Cataluña"),
    ("09", "Burgos", "Castilla y León"),
    ("10", "Cáceres", "Extremadura"),
    ("11", "Cádiz", "Andalucía"),
    ("12", "Castellón/Castelló", "Comunitat Valenciana"),
    ("13", "Ciudad Real", "Castilla-La Mancha"),
    ("14", "Córdoba", "Andalucía"),
    ("15", "A Coruña", "Galicia"),
    ("16", "Cuenca", "Castilla-La Mancha"),
    ("17", "Girona", "Cataluña"),
    ("18", "Granada", "Andalucía"),
    ("19", "Guadalajara", "Castilla-La Mancha"),
    ("20", "Gipuzkoa", "País Vasco"),
    ("21", "Huelva", "Andalucía"),
    ("22", "Huesca", "Aragón"),
    ("23", "Jaén", "Andalucía"),
    ("24", "León", "Castilla y León"),
    ("25", "Lleida", "Cataluña"),
    ("26", "La Rioja", "La Rioja"),
    ("27", "Lugo", "Galicia"),
    ("28", "Madrid", "Comunidad de Madrid"),
    ("29", "Málaga", "Andalucía"),
    ("30", "Murcia", "Región de Murcia"),
    ("31", "Navarra", "Comunidad Foral de Navarra"),
    ("32", "Ourense", "Galicia"),
    ("33", "Asturias", "Principado de Asturias"),
    ("34", "Palencia", "Castilla y León"),
    ("35", "Las Palmas", "Canarias"),
    ("36", "Pontevedra", "Galicia"),
    ("37", "Salamanca", "Castilla y León"),
    ("38", "Santa Cruz de Tenerife", "Canarias"),
    ("39", "Cantabria", "Cantabria"),
    ("40", "Segovia", "Castilla y León"),
    ("41", "Sevilla", "Andalucía"),
    ("42", "Soria", "Castilla y León"),
    ("43", "Tarragona", "Cataluña"),
    ("44", "Teruel", "Aragón"),
    ("45", "Toledo", "Castilla-La Mancha"),
    ("46", "Valencia/València", "Comunitat Valenciana"),
    ("47", "Valladolid", "Castilla y León"),
    ("48", "Bizkaia", "País Vasco"),
    ("49", "Zamora", "Castilla y León"),
    ("50", "Zaragoza", "Aragón"),
    ("51", "Ceuta", "Ceuta"),
    ("52", "Melilla", "Melilla"),
];

#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    by_code: HashMap<String, ProvinceEntry>,
    region_by_name: HashMap<String, String>,
}

impl LocationTable {
    /// Table of the 52 Spanish provinces keyed by INE code.
    pub fn builtin() -> Self {
        let entries = PROVINCES.iter().map(|(code, province, region)| {
            (
                code.to_string(),
                ProvinceEntry {
                    province: province.to_string(),
                    region: region.to_string(),
                },
            )
        });
        Self::from_entries(entries)
    }

    /// Built-in table with the entries of a JSON override file merged on top.
    pub fn with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: HashMap<String, ProvinceEntry> =
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let mut table = Self::builtin();
        for (code, entry) in overrides {
            table.insert(code, entry);
        }
        Ok(table)
    }

    fn from_entries(entries: impl IntoIterator<Item = (String, ProvinceEntry)>) -> Self {
        let mut table = Self::default();
        for (code, entry) in entries {
            table.insert(code, entry);
        }
        table
    }

    fn insert(&mut self, code: String, entry: ProvinceEntry) {
        // "Alicante/Alacant" is also reachable by either half.
        let names = std::iter::once(entry.province.as_str()).chain(entry.province.split('/'));
        for name in names {
            self.region_by_name
                .insert(normalize(name), entry.region.clone());
        }
        self.by_code.insert(code, entry);
    }

    /// Returns the province name for an INE code; names pass through.
    pub fn resolve_province(&self, raw: &str) -> String {
        let raw = raw.trim();
        let padded;
        let code = if raw.len() == 1 && raw.chars().all(|c| c.is_ascii_digit()) {
            padded = format!("0{raw}");
            padded.as_str()
        } else {
            raw
        };
        match self.by_code.get(code) {
            Some(entry) => entry.province.clone(),
            None => raw.to_string(),
        }
    }

    /// Autonomous community for a province name, case-insensitive.
    pub fn region_for(&self, province: &str) -> Option<&str> {
        self.region_by_name
            .get(&normalize(province))
            .map(String::as_str)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
