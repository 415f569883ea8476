//! Incident records produced by the parser.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt;

/// Coarse impact classification, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    #[default]
    Unspecified,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Unspecified,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::VeryHigh,
    ];

    /// Maps a DATEX II `SeverityEnum` value. Returns `None` for values
    /// outside the schema.
    pub fn from_datex(value: &str) -> Option<Self> {
        match value.trim() {
            "lowest" | "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "highest" | "veryHigh" => Some(Severity::VeryHigh),
            "none" | "unknown" => Some(Severity::Unspecified),
            _ => None,
        }
    }

    /// Marker colour name, as understood by the map page.
    pub fn color(self) -> &'static str {
        match self {
            Severity::Low => "green",
            Severity::Medium => "orange",
            Severity::High => "red",
            Severity::VeryHigh => "darkred",
            Severity::Unspecified => "blue",
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            Severity::Low => "#2e7d32",
            Severity::Medium => "#f57c00",
            Severity::High => "#d32f2f",
            Severity::VeryHigh => "#8b0000",
            Severity::Unspecified => "#1976d2",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "Baja",
            Severity::Medium => "Media",
            Severity::High => "Alta",
            Severity::VeryHigh => "Muy Alta",
            Severity::Unspecified => "Sin especificar",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Severity::Low => "ℹ",
            Severity::Medium => "⚠",
            Severity::High => "❗",
            Severity::VeryHigh => "⛔",
            Severity::Unspecified => "❔",
        }
    }

    /// Stable CSS-friendly identifier.
    pub fn slug(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::VeryHigh => "very-high",
            Severity::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Builds a coordinate pair, rejecting values outside WGS84 bounds.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Location {
    pub province: Option<String>,
    /// Autonomous community.
    pub region: Option<String>,
    pub municipality: Option<String>,
    pub road_name: Option<String>,
    pub km_point: Option<f64>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Validity {
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
}

/// One reported situation from the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Incident {
    pub id: String,
    pub severity: Severity,
    pub location: Location,
    /// Management type code, or the cause type when the feed has none.
    pub incident_type: Option<String>,
    pub cause_type: Option<String>,
    pub description: Option<String>,
    pub validity: Validity,
}

impl Incident {
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location.coordinates
    }
}

/// Human readable label for a DATEX II management or cause code.
pub fn type_label(code: &str) -> &str {
    match code {
        "laneClosures" => "Cierre de carril",
        "roadClosed" => "Carretera cerrada",
        "singleAlternateLineTraffic" => "Tráfico alterno",
        "other" => "Otro",
        "roadMaintenance" => "Mantenimiento de vía",
        "roadOrCarriagewayOrLaneManagement" => "Gestión de tráfico",
        _ => code,
    }
}
