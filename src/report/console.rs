use crate::model::type_label;
use crate::stats::IncidentStats;

const RULE: &str = "============================================================";

/// Plain-text report: summary, severity distribution, top-N provinces and
/// incident types, in that order.
pub fn render(stats: &IncidentStats, top_n: usize) -> String {
    let summary = &stats.summary;
    let mut lines = vec![
        String::new(),
        RULE.to_string(),
        "REPORTE DE INCIDENCIAS DE TRÁFICO - BALIZAS V16".to_string(),
        RULE.to_string(),
        String::new(),
        "RESUMEN GENERAL".to_string(),
        format!("   • Total de incidencias: {}", summary.total),
        format!("   • Provincias afectadas: {}", summary.provinces),
        format!("   • CCAA afectadas: {}", summary.regions),
        format!("   • Municipios afectados: {}", summary.municipalities),
        String::new(),
        "DISTRIBUCIÓN POR SEVERIDAD".to_string(),
    ];

    lines.extend(stats.severity.iter().map(|share| {
        format!(
            "   • {}: {} ({:.1}%)",
            share.severity.label(),
            share.count,
            share.percentage
        )
    }));

    lines.push(String::new());
    lines.push(format!("TOP {top_n} PROVINCIAS CON MÁS INCIDENCIAS"));
    let top = stats.top_provinces(top_n);
    if top.is_empty() {
        lines.push("   (sin datos de provincia)".to_string());
    }
    lines.extend(top.iter().enumerate().map(|(i, p)| {
        format!(
            "   {:2}. {}: {} incidencias ({} municipios)",
            i + 1,
            p.name,
            p.count,
            p.municipalities
        )
    }));

    if !stats.types.is_empty() {
        lines.push(String::new());
        lines.push("TIPO DE INCIDENCIA".to_string());
        lines.extend(stats.types.iter().map(|t| {
            format!(
                "   • {}: {} ({:.1}%)",
                type_label(&t.code),
                t.count,
                t.percentage
            )
        }));
    }

    lines.push(String::new());
    lines.push(RULE.to_string());
    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Incident, Location, Severity, Validity};

    fn incidents(counts: &[(Severity, usize)], province: Option<&str>) -> Vec<Incident> {
        counts
            .iter()
            .flat_map(|&(severity, n)| {
                (0..n).map(move |i| Incident {
                    id: format!("{}-{i}", severity.slug()),
                    severity,
                    location: Location {
                        province: province.map(str::to_string),
                        ..Location::default()
                    },
                    incident_type: None,
                    cause_type: None,
                    description: None,
                    validity: Validity::default(),
                })
            })
            .collect()
    }

    #[test]
    fn test_report_scenario_totals_and_percentages() {
        let stats = IncidentStats::from_incidents(&incidents(
            &[
                (Severity::Unspecified, 531),
                (Severity::High, 68),
                (Severity::Medium, 43),
                (Severity::VeryHigh, 27),
                (Severity::Low, 5),
            ],
            Some("Madrid"),
        ));
        let report = render(&stats, 10);

        assert!(report.contains("Total de incidencias: 674"));
        assert!(report.contains("Sin especificar: 531 (78.8%)"));
        assert!(report.contains("Alta: 68 (10.1%)"));
        assert!(report.contains("Media: 43 (6.4%)"));
        assert!(report.contains("Muy Alta: 27 (4.0%)"));
        assert!(report.contains("Baja: 5 (0.7%)"));
        assert!(report.contains(" 1. Madrid: 674 incidencias (0 municipios)"));
    }

    #[test]
    fn test_section_order_is_fixed() {
        let stats = IncidentStats::from_incidents(&incidents(&[(Severity::Low, 3)], Some("Soria")));
        let report = render(&stats, 5);

        let summary = report.find("RESUMEN GENERAL").unwrap();
        let severity = report.find("DISTRIBUCIÓN POR SEVERIDAD").unwrap();
        let provinces = report.find("TOP 5 PROVINCIAS").unwrap();
        assert!(summary < severity && severity < provinces);
    }

    #[test]
    fn test_empty_stats_render_zeroes() {
        let report = render(&IncidentStats::from_incidents(&[]), 10);

        assert!(report.contains("Total de incidencias: 0"));
        assert!(report.contains("Baja: 0 (0.0%)"));
        assert!(report.contains("(sin datos de provincia)"));
        assert!(!report.contains("TIPO DE INCIDENCIA"));
    }
}
