use chrono::{DateTime, Utc};
use html_escape::encode_text;

use crate::model::type_label;
use crate::stats::IncidentStats;

/// Default length of the province table in the HTML report.
pub const DEFAULT_TOP_N: usize = 15;

const STYLE: &str = r#"
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 0; padding: 20px;
       background: linear-gradient(135deg, #1a1a2e 0%, #16213e 100%); min-height: 100vh; color: #fff; }
.container { max-width: 1200px; margin: 0 auto; }
h1 { text-align: center; color: #00d4ff; margin-bottom: 30px; }
.generated { text-align: center; color: #888; margin-top: -20px; margin-bottom: 30px; font-size: 0.85em; }
.summary-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin-bottom: 40px; }
.summary-card { background: rgba(255, 255, 255, 0.1); border-radius: 15px; padding: 25px; text-align: center;
                border: 1px solid rgba(255, 255, 255, 0.2); }
.summary-card .number { font-size: 3em; font-weight: bold; color: #00d4ff; margin-bottom: 10px; }
.summary-card .label { color: #aaa; font-size: 0.9em; text-transform: uppercase; }
.section { background: rgba(255, 255, 255, 0.05); border-radius: 15px; padding: 25px; margin-bottom: 25px;
           border: 1px solid rgba(255, 255, 255, 0.1); }
.section h2 { color: #00d4ff; margin-top: 0; border-bottom: 2px solid rgba(0, 212, 255, 0.3); padding-bottom: 10px; }
table { width: 100%; border-collapse: collapse; }
th, td { padding: 12px 15px; text-align: left; border-bottom: 1px solid rgba(255, 255, 255, 0.1); }
th { background: rgba(0, 212, 255, 0.2); color: #00d4ff; font-weight: 600; }
.severity-low { color: #28a745; }
.severity-medium { color: #ffc107; }
.severity-high { color: #fd7e14; }
.severity-very-high { color: #dc3545; }
.severity-unspecified { color: #9ec5fe; }
"#;

/// Styled HTML report with the same figures as the console report, plus the
/// autonomous-community and incident-type tables.
pub fn render(stats: &IncidentStats, top_n: usize, generated_at: DateTime<Utc>) -> String {
    let summary = &stats.summary;

    let province_rows: String = stats
        .top_provinces(top_n)
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                i + 1,
                encode_text(&p.name),
                p.count,
                p.municipalities
            )
        })
        .collect();

    let severity_rows: String = stats
        .severity
        .iter()
        .map(|s| {
            format!(
                "<tr><td class=\"severity-{}\">{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
                s.severity.slug(),
                s.severity.label(),
                s.count,
                s.percentage
            )
        })
        .collect();

    let region_rows: String = stats
        .regions
        .iter()
        .map(|r| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                encode_text(&r.name),
                r.count,
                r.provinces
            )
        })
        .collect();

    let type_rows: String = stats
        .types
        .iter()
        .map(|t| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
                encode_text(type_label(&t.code)),
                t.count,
                t.percentage
            )
        })
        .collect();

    let generated = generated_at.format("%Y-%m-%d %H:%M UTC");
    let card = |number: usize, label: &str| {
        format!(
            "<div class=\"summary-card\"><div class=\"number\">{number}</div><div class=\"label\">{label}</div></div>"
        )
    };
    let cards = [
        card(summary.total, "Total Incidencias"),
        card(summary.provinces, "Provincias Afectadas"),
        card(summary.regions, "CCAA Afectadas"),
        card(summary.municipalities, "Municipios Afectados"),
    ]
    .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Estadísticas Balizas V16</title>
<style>{STYLE}</style>
</head>
<body>
<div class="container">
<h1>Estadísticas de Incidencias - Balizas V16</h1>
<p class="generated">Generado {generated}</p>
<div class="summary-grid">
{cards}
</div>
<div class="section">
<h2>Incidencias por Provincia</h2>
<table>
<thead><tr><th>#</th><th>Provincia</th><th>Total Incidencias</th><th>Municipios Afectados</th></tr></thead>
<tbody>
{province_rows}</tbody>
</table>
</div>
<div class="section">
<h2>Distribución por Severidad</h2>
<table>
<thead><tr><th>Severidad</th><th>Total</th><th>Porcentaje</th></tr></thead>
<tbody>
{severity_rows}</tbody>
</table>
</div>
<div class="section">
<h2>Incidencias por Comunidad Autónoma</h2>
<table>
<thead><tr><th>Comunidad Autónoma</th><th>Total Incidencias</th><th>Provincias Afectadas</th></tr></thead>
<tbody>
{region_rows}</tbody>
</table>
</div>
<div class="section">
<h2>Tipo de Incidencia</h2>
<table>
<thead><tr><th>Tipo</th><th>Total</th><th>Porcentaje</th></tr></thead>
<tbody>
{type_rows}</tbody>
</table>
</div>
</div>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Incident, Location, Severity, Validity};
    use chrono::TimeZone;

    fn incident(id: &str, severity: Severity, province: &str) -> Incident {
        Incident {
            id: id.to_string(),
            severity,
            location: Location {
                province: Some(province.to_string()),
                region: Some("Galicia".to_string()),
                ..Location::default()
            },
            incident_type: Some("singleAlternateLineTraffic".to_string()),
            cause_type: None,
            description: None,
            validity: Validity::default(),
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_html_contains_tables() {
        let stats = IncidentStats::from_incidents(&[
            incident("1", Severity::High, "Lugo"),
            incident("2", Severity::Low, "A Coruña"),
        ]);
        let html = render(&stats, 15, at());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<div class=\"number\">2</div><div class=\"label\">Total Incidencias</div>"));
        assert!(html.contains("<td>A Coruña</td><td>1</td>"));
        assert!(html.contains("<td class=\"severity-high\">Alta</td><td>1</td><td>50.0%</td>"));
        assert!(html.contains("<td>Galicia</td><td>2</td><td>2</td>"));
        assert!(html.contains("<td>Tráfico alterno</td><td>2</td><td>100.0%</td>"));
        assert!(html.contains("Generado 2024-01-10 08:00 UTC"));
    }

    #[test]
    fn test_html_top_n_limits_provinces() {
        let stats = IncidentStats::from_incidents(&[
            incident("1", Severity::High, "Lugo"),
            incident("2", Severity::High, "Lugo"),
            incident("3", Severity::Low, "Ourense"),
        ]);
        let html = render(&stats, 1, at());

        assert!(html.contains("<tr><td>1</td><td>Lugo</td><td>2</td>"));
        assert!(!html.contains("<td>Ourense</td>"));
    }

    #[test]
    fn test_html_escapes_names() {
        let stats = IncidentStats::from_incidents(&[incident("1", Severity::Low, "<Xss>")]);
        let html = render(&stats, 15, at());
        assert!(html.contains("&lt;Xss&gt;"));
        assert!(!html.contains("<Xss>"));
    }

    #[test]
    fn test_empty_html_report() {
        let html = render(&IncidentStats::from_incidents(&[]), 15, at());
        assert!(html.contains("<div class=\"number\">0</div>"));
        assert!(html.contains("<td>0</td><td>0.0%</td>"));
    }
}
