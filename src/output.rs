//! Writing output artifacts to disk.
//!
//! Each artifact is written in one scoped call so a failure only affects that
//! file.

use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::error::OutputError;
use crate::model::Incident;

/// Writes `contents` to `path`, replacing any existing file.
#[tracing::instrument(skip(contents), fields(path = %path.display(), bytes = contents.len()))]
pub fn write_artifact(path: &Path, contents: &str) -> Result<(), OutputError> {
    let write = || -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(contents.as_bytes())?;
        file.flush()
    };
    write().map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Artifact written");
    Ok(())
}

/// One CSV row per incident.
#[derive(Serialize)]
struct IncidentRow<'a> {
    id: &'a str,
    severity: &'static str,
    province: Option<&'a str>,
    region: Option<&'a str>,
    municipality: Option<&'a str>,
    road_name: Option<&'a str>,
    km_point: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    incident_type: Option<&'a str>,
    cause_type: Option<&'a str>,
    description: Option<&'a str>,
    start: Option<String>,
    end: Option<String>,
}

impl<'a> From<&'a Incident> for IncidentRow<'a> {
    fn from(i: &'a Incident) -> Self {
        let loc = &i.location;
        IncidentRow {
            id: &i.id,
            severity: i.severity.slug(),
            province: loc.province.as_deref(),
            region: loc.region.as_deref(),
            municipality: loc.municipality.as_deref(),
            road_name: loc.road_name.as_deref(),
            km_point: loc.km_point,
            latitude: loc.coordinates.map(|c| c.latitude),
            longitude: loc.coordinates.map(|c| c.longitude),
            incident_type: i.incident_type.as_deref(),
            cause_type: i.cause_type.as_deref(),
            description: i.description.as_deref(),
            start: i.validity.start.map(|t| t.to_rfc3339()),
            end: i.validity.end.map(|t| t.to_rfc3339()),
        }
    }
}

/// Exports parsed incidents as CSV with a header row.
#[tracing::instrument(skip(incidents), fields(path = %path.display(), rows = incidents.len()))]
pub fn export_csv(path: &Path, incidents: &[Incident]) -> Result<(), OutputError> {
    let csv_err = |source| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(csv_err)?;
    for incident in incidents {
        writer.serialize(IncidentRow::from(incident)).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| csv_err(e.into()))?;

    debug!("CSV export complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, Location, Severity, Validity};
    use std::fs;

    fn sample() -> Incident {
        Incident {
            id: "GAL-1".to_string(),
            severity: Severity::High,
            location: Location {
                province: Some("Pontevedra".to_string()),
                coordinates: Coordinates::new(42.5, -8.6),
                ..Location::default()
            },
            incident_type: Some("laneClosures".to_string()),
            cause_type: None,
            description: Some("Obras, carril derecho".to_string()),
            validity: Validity::default(),
        }
    }

    #[test]
    fn test_write_artifact_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapa.html");

        write_artifact(&path, "<html></html>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<html></html>");
    }

    #[test]
    fn test_write_artifact_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("mapa.html");

        let err = write_artifact(&path, "x").unwrap_err();
        assert!(matches!(err, OutputError::Write { .. }));
    }

    #[test]
    fn test_export_csv_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("incidents.csv");

        export_csv(&path, &[sample(), sample()]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,severity,province"));
        assert!(lines[1].starts_with("GAL-1,high,Pontevedra,,,,,42.5,-8.6,laneClosures"));
        assert!(lines[1].contains("\"Obras, carril derecho\""));
    }
}
