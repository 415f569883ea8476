//! Leaflet map page with one marker per located incident.

use html_escape::encode_text;
use serde::Serialize;
use tracing::debug;

use crate::error::OutputError;
use crate::model::{Incident, Severity, type_label};

/// Approximate centre of peninsular Spain.
pub const SPAIN_CENTER: (f64, f64) = (40.4168, -3.7038);
pub const DEFAULT_ZOOM: u8 = 6;

const LEAFLET: &str = "https://unpkg.com/leaflet@1.9.4/dist";
const MARKERCLUSTER: &str = "https://unpkg.com/leaflet.markercluster@1.5.3/dist";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub color: &'static str,
    pub fill: &'static str,
    pub tooltip: String,
    pub popup: String,
}

#[derive(Debug, Clone)]
pub struct RenderedMap {
    pub html: String,
    pub placed: usize,
    /// Incidents without coordinates.
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct MapRenderer {
    pub clustering: bool,
    pub center: (f64, f64),
    pub zoom: u8,
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self {
            clustering: true,
            center: SPAIN_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapRenderer {
    pub fn new(clustering: bool) -> Self {
        Self {
            clustering,
            ..Self::default()
        }
    }

    pub fn markers(&self, incidents: &[Incident]) -> Vec<Marker> {
        incidents
            .iter()
            .filter_map(|incident| {
                let coords = incident.coordinates()?;
                Some(Marker {
                    lat: coords.latitude,
                    lon: coords.longitude,
                    color: incident.severity.color(),
                    fill: incident.severity.hex(),
                    tooltip: format!(
                        "{} - {}",
                        incident.location.road_name.as_deref().unwrap_or("Sin nombre"),
                        incident.severity.label()
                    ),
                    popup: popup_html(incident),
                })
            })
            .collect()
    }

    #[tracing::instrument(skip_all, fields(incidents = incidents.len(), clustering = self.clustering))]
    pub fn render(&self, incidents: &[Incident]) -> Result<RenderedMap, OutputError> {
        let markers = self.markers(incidents);
        let skipped = incidents.len() - markers.len();
        if skipped > 0 {
            debug!(skipped, "Incidents without coordinates left off the map");
        }

        // "</" inside a script block would end it early.
        let data = serde_json::to_string(&markers)?.replace("</", "<\\/");
        let html = self.page(&data);

        Ok(RenderedMap {
            html,
            placed: markers.len(),
            skipped,
        })
    }

    fn page(&self, data: &str) -> String {
        let (lat, lon) = self.center;
        let zoom = self.zoom;
        let cluster_assets = if self.clustering {
            format!(
                r#"<link rel="stylesheet" href="{MARKERCLUSTER}/MarkerCluster.css">
<link rel="stylesheet" href="{MARKERCLUSTER}/MarkerCluster.Default.css">
<script src="{MARKERCLUSTER}/leaflet.markercluster.js"></script>"#
            )
        } else {
            String::new()
        };
        let container = if self.clustering {
            "L.markerClusterGroup()"
        } else {
            "L.layerGroup()"
        };
        let legend = legend_html();

        format!(
            r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Mapa de incidencias DGT</title>
<link rel="stylesheet" href="{LEAFLET}/leaflet.css">
<script src="{LEAFLET}/leaflet.js"></script>
{cluster_assets}
<style>
html, body {{ height: 100%; margin: 0; }}
#map {{ height: 100%; }}
.legend {{ position: fixed; bottom: 50px; left: 50px; z-index: 1000; background: white; padding: 15px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.2); font: 13px Arial, sans-serif; }}
.legend h4 {{ margin: 0 0 10px 0; font-size: 14px; }}
.legend .dot {{ width: 15px; height: 15px; display: inline-block; border-radius: 50%; margin-right: 8px; vertical-align: middle; }}
</style>
</head>
<body>
<div id="map"></div>
{legend}
<script>
var markers = {data};
var map = L.map('map').setView([{lat}, {lon}], {zoom});
var osm = L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
  maxZoom: 19, attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);
var positron = L.tileLayer('https://{{s}}.basemaps.cartocdn.com/light_all/{{z}}/{{x}}/{{y}}{{r}}.png', {{
  maxZoom: 19, attribution: '&copy; OpenStreetMap contributors &copy; CARTO'
}});
var incidents = {container};
markers.forEach(function (m) {{
  L.circleMarker([m.lat, m.lon], {{
    radius: 8, color: m.fill, weight: 2, fillColor: m.fill, fillOpacity: 0.8
  }}).bindTooltip(m.tooltip).bindPopup(m.popup, {{ maxWidth: 350 }}).addTo(incidents);
}});
incidents.addTo(map);
L.control.layers({{ 'OpenStreetMap': osm, 'CartoDB Positron': positron }}, {{ 'Incidencias': incidents }}).addTo(map);
</script>
</body>
</html>
"#
        )
    }
}

fn popup_html(incident: &Incident) -> String {
    let na = |v: Option<&str>| encode_text(v.unwrap_or("N/A")).into_owned();
    let location = &incident.location;
    let kind = incident.incident_type.as_deref().map(type_label);
    let cause = incident.cause_type.as_deref().map(type_label);
    let km = location
        .km_point
        .map(|km| km.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let description = incident
        .description
        .as_deref()
        .map(|d| format!("<p style=\"margin: 8px 0 0 0;\">{}</p>", encode_text(d)))
        .unwrap_or_default();

    format!(
        "<div style=\"font-family: Arial, sans-serif; min-width: 250px;\">\
<h4 style=\"margin: 0 0 10px 0; border-bottom: 2px solid #007bff;\">{road}</h4>\
<table style=\"width: 100%; font-size: 13px;\">\
<tr><td><strong>Ubicación:</strong></td><td>{municipality}, {province}</td></tr>\
<tr><td><strong>CCAA:</strong></td><td>{region}</td></tr>\
<tr><td><strong>Severidad:</strong></td><td><span style=\"color: {color}; font-weight: bold;\">{icon} {severity}</span></td></tr>\
<tr><td><strong>Tipo:</strong></td><td>{kind}</td></tr>\
<tr><td><strong>Causa:</strong></td><td>{cause}</td></tr>\
<tr><td><strong>PK:</strong></td><td>{km}</td></tr>\
</table>{description}\
<div style=\"margin-top: 8px; font-size: 11px; color: #666;\">ID: {id}</div></div>",
        road = encode_text(location.road_name.as_deref().unwrap_or("Carretera sin nombre")),
        municipality = na(location.municipality.as_deref()),
        province = na(location.province.as_deref()),
        region = na(location.region.as_deref()),
        color = incident.severity.color(),
        icon = incident.severity.icon(),
        severity = incident.severity.label(),
        kind = na(kind),
        cause = na(cause),
        id = encode_text(&incident.id),
    )
}

fn legend_html() -> String {
    let rows: String = [Severity::Low, Severity::Medium, Severity::High, Severity::VeryHigh, Severity::Unspecified]
        .iter()
        .map(|s| {
            format!(
                "<div><span class=\"dot\" style=\"background-color: {};\"></span>{}</div>\n",
                s.hex(),
                s.label()
            )
        })
        .collect();
    format!("<div class=\"legend\">\n<h4>Severidad</h4>\n{rows}</div>")
}
