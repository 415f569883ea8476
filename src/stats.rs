//! Aggregate counts and percentages over parsed incidents.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Incident, Severity};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub provinces: usize,
    pub regions: usize,
    pub municipalities: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityShare {
    pub severity: Severity,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceCount {
    pub name: String,
    pub count: usize,
    /// Distinct municipalities with at least one incident.
    pub municipalities: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCount {
    pub name: String,
    pub count: usize,
    pub provinces: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeShare {
    pub code: String,
    pub count: usize,
    pub percentage: f64,
}

/// Aggregates over one parsed feed. Rankings are sorted by count
/// descending, ties by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IncidentStats {
    pub summary: Summary,
    pub severity: Vec<SeverityShare>,
    pub provinces: Vec<ProvinceCount>,
    pub regions: Vec<RegionCount>,
    pub types: Vec<TypeShare>,
}

impl IncidentStats {
    pub fn from_incidents(incidents: &[Incident]) -> Self {
        let total = incidents.len();

        let mut severity_counts = [0usize; Severity::ALL.len()];
        for incident in incidents {
            severity_counts[incident.severity as usize] += 1;
        }
        let mut severity: Vec<SeverityShare> = Severity::ALL
            .iter()
            .map(|&s| SeverityShare {
                severity: s,
                count: severity_counts[s as usize],
                percentage: Self::pct(severity_counts[s as usize], total),
            })
            .collect();
        severity.sort_by(|a, b| b.count.cmp(&a.count).then(b.severity.cmp(&a.severity)));

        let provinces = ranked(group(
            incidents,
            |i| i.location.province.as_deref(),
            |i| i.location.municipality.as_deref(),
        ))
        .into_iter()
        .map(|(name, count, municipalities)| ProvinceCount {
            name,
            count,
            municipalities,
        })
        .collect();

        let regions = ranked(group(
            incidents,
            |i| i.location.region.as_deref(),
            |i| i.location.province.as_deref(),
        ))
        .into_iter()
        .map(|(name, count, provinces)| RegionCount {
            name,
            count,
            provinces,
        })
        .collect();

        let types = ranked(group(incidents, |i| i.incident_type.as_deref(), |_| None))
            .into_iter()
            .map(|(code, count, _)| TypeShare {
                code,
                count,
                percentage: Self::pct(count, total),
            })
            .collect();

        let distinct = |key: fn(&Incident) -> Option<&str>| {
            incidents
                .iter()
                .filter_map(key)
                .collect::<BTreeSet<_>>()
                .len()
        };

        IncidentStats {
            summary: Summary {
                total,
                provinces: distinct(|i| i.location.province.as_deref()),
                regions: distinct(|i| i.location.region.as_deref()),
                municipalities: distinct(|i| i.location.municipality.as_deref()),
            },
            severity,
            provinces,
            regions,
            types,
        }
    }

    /// Percentage of `part` in `total`, rounded to one decimal.
    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64 * 1000.0).round() / 10.0
        }
    }

    pub fn top_provinces(&self, n: usize) -> &[ProvinceCount] {
        &self.provinces[..n.min(self.provinces.len())]
    }
}

type Groups<'a> = BTreeMap<&'a str, (usize, BTreeSet<&'a str>)>;

/// Counts incidents per key, tracking distinct `sub` values per key.
/// Incidents without a key are left out.
fn group<'a>(
    incidents: &'a [Incident],
    key: impl Fn(&'a Incident) -> Option<&'a str>,
    sub: impl Fn(&'a Incident) -> Option<&'a str>,
) -> Groups<'a> {
    let mut groups = Groups::new();
    for incident in incidents {
        let Some(k) = key(incident) else { continue };
        let entry = groups.entry(k).or_default();
        entry.0 += 1;
        if let Some(s) = sub(incident) {
            entry.1.insert(s);
        }
    }
    groups
}

fn ranked(groups: Groups<'_>) -> Vec<(String, usize, usize)> {
    let mut rows: Vec<_> = groups
        .into_iter()
        .map(|(name, (count, subs))| (name.to_string(), count, subs.len()))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, Validity};

    fn incident(id: &str, severity: Severity, province: Option<&str>, municipality: Option<&str>) -> Incident {
        Incident {
            id: id.to_string(),
            severity,
            location: Location {
                province: province.map(str::to_string),
                municipality: municipality.map(str::to_string),
                region: province.map(|p| format!("CCAA {p}")),
                ..Location::default()
            },
            incident_type: Some("laneClosures".to_string()),
            cause_type: None,
            description: None,
            validity: Validity::default(),
        }
    }

    fn with_counts(counts: &[(Severity, usize)]) -> Vec<Incident> {
        let mut out = Vec::new();
        for &(severity, n) in counts {
            for i in 0..n {
                out.push(incident(&format!("{severity:?}-{i}"), severity, None, None));
            }
        }
        out
    }

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(IncidentStats::pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_rounds_to_one_decimal() {
        assert_eq!(IncidentStats::pct(531, 674), 78.8);
        assert_eq!(IncidentStats::pct(1, 3), 33.3);
        assert_eq!(IncidentStats::pct(2, 3), 66.7);
    }

    #[test]
    fn test_severity_distribution_scenario() {
        let incidents = with_counts(&[
            (Severity::Unspecified, 531),
            (Severity::High, 68),
            (Severity::Medium, 43),
            (Severity::VeryHigh, 27),
            (Severity::Low, 5),
        ]);
        let stats = IncidentStats::from_incidents(&incidents);

        assert_eq!(stats.summary.total, 674);
        let shares: Vec<_> = stats
            .severity
            .iter()
            .map(|s| (s.severity, s.count, s.percentage))
            .collect();
        assert_eq!(
            shares,
            vec![
                (Severity::Unspecified, 531, 78.8),
                (Severity::High, 68, 10.1),
                (Severity::Medium, 43, 6.4),
                (Severity::VeryHigh, 27, 4.0),
                (Severity::Low, 5, 0.7),
            ]
        );
        let sum: f64 = stats.severity.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() <= 0.1 * Severity::ALL.len() as f64);
    }

    #[test]
    fn test_severity_ties_prefer_higher_rank() {
        let incidents = with_counts(&[(Severity::Low, 2), (Severity::High, 2)]);
        let stats = IncidentStats::from_incidents(&incidents);
        let order: Vec<_> = stats.severity.iter().map(|s| s.severity).collect();
        assert_eq!(
            order,
            vec![
                Severity::High,
                Severity::Low,
                Severity::VeryHigh,
                Severity::Medium,
                Severity::Unspecified,
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        let stats = IncidentStats::from_incidents(&[]);
        assert_eq!(stats.summary, Summary::default());
        assert_eq!(stats.severity.len(), 5);
        assert!(stats.severity.iter().all(|s| s.count == 0 && s.percentage == 0.0));
        assert!(stats.provinces.is_empty());
        assert!(stats.top_provinces(10).is_empty());
    }

    #[test]
    fn test_province_ranking_and_tie_break() {
        let incidents = vec![
            incident("1", Severity::Low, Some("Lugo"), Some("Sarria")),
            incident("2", Severity::Low, Some("Lugo"), Some("Monforte")),
            incident("3", Severity::Low, Some("Lugo"), Some("Sarria")),
            incident("4", Severity::Low, Some("Zamora"), Some("Toro")),
            incident("5", Severity::Low, Some("Burgos"), None),
            incident("6", Severity::Low, None, Some("Nowhere")),
        ];
        let stats = IncidentStats::from_incidents(&incidents);

        // Burgos and Zamora tie on count, so name order decides.
        assert_eq!(
            stats.provinces,
            vec![
                ProvinceCount { name: "Lugo".into(), count: 3, municipalities: 2 },
                ProvinceCount { name: "Burgos".into(), count: 1, municipalities: 0 },
                ProvinceCount { name: "Zamora".into(), count: 1, municipalities: 1 },
            ]
        );
        let in_provinces: usize = stats.provinces.iter().map(|p| p.count).sum();
        let with_province = incidents.iter().filter(|i| i.location.province.is_some()).count();
        assert_eq!(in_provinces, with_province);
        assert!(in_provinces <= stats.summary.total);

        assert_eq!(stats.summary.total, 6);
        assert_eq!(stats.summary.provinces, 3);
        assert_eq!(stats.summary.municipalities, 4);
        assert_eq!(stats.top_provinces(2).len(), 2);
        assert_eq!(stats.top_provinces(2)[1].name, "Burgos");
    }

    #[test]
    fn test_region_and_type_breakdowns() {
        let mut incidents = vec![
            incident("1", Severity::Low, Some("Lugo"), None),
            incident("2", Severity::Low, Some("Lugo"), None),
            incident("3", Severity::Low, Some("Ourense"), None),
        ];
        incidents[2].incident_type = Some("roadClosed".to_string());
        incidents[1].incident_type = None;
        let stats = IncidentStats::from_incidents(&incidents);

        assert_eq!(stats.regions[0].name, "CCAA Lugo");
        assert_eq!(stats.regions[0].count, 2);
        assert_eq!(stats.regions[0].provinces, 1);
        assert_eq!(stats.summary.regions, 2);

        let types: Vec<_> = stats
            .types
            .iter()
            .map(|t| (t.code.as_str(), t.count, t.percentage))
            .collect();
        assert_eq!(types, vec![("laneClosures", 1, 33.3), ("roadClosed", 1, 33.3)]);
    }
}
