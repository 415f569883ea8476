//! DATEX II v3 SituationPublication parser.
//!
//! Elements are matched by local name so that prefix choices in the feed do
//! not matter. Faults inside a single situation are recovered locally; only
//! document-level problems produce a [`ParseError`].

use chrono::{DateTime, FixedOffset};
use roxmltree::{Document, Node};
use tracing::{info, warn};

use crate::error::ParseError;
use crate::locations::LocationTable;
use crate::model::{Coordinates, Incident, Location, Severity, Validity};

/// Root element names accepted as a DATEX II v3 document.
const ROOT_ELEMENTS: &[&str] = &["payload", "messageContainer"];

/// Point candidates inside a location reference, in priority order.
const POINT_ELEMENTS: &[&str] = &["from", "to", "point"];

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedFeed {
    pub incidents: Vec<Incident>,
    /// Situations dropped because they carried no identifier.
    pub skipped: usize,
    /// Number of `situation` elements seen.
    pub situations: usize,
}

pub struct Datex2Parser<'t> {
    locations: &'t LocationTable,
}

impl<'t> Datex2Parser<'t> {
    pub fn new(locations: &'t LocationTable) -> Self {
        Self { locations }
    }

    /// Parses a whole feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not UTF-8, not well-formed XML, or
    /// the root element is not a DATEX II payload.
    #[tracing::instrument(skip_all, fields(bytes = xml.len()))]
    pub fn parse(&self, xml: &[u8]) -> Result<ParsedFeed, ParseError> {
        let text = std::str::from_utf8(xml)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let doc = Document::parse(text)?;

        let root = doc.root_element();
        let root_name = root.tag_name().name();
        if !ROOT_ELEMENTS.contains(&root_name) {
            return Err(ParseError::UnexpectedRoot(root_name.to_string()));
        }

        let mut feed = ParsedFeed::default();
        for situation in root.descendants().filter(|n| is(n, "situation")) {
            feed.situations += 1;
            match self.parse_situation(situation) {
                Some(incident) => feed.incidents.push(incident),
                None => feed.skipped += 1,
            }
        }

        info!(
            situations = feed.situations,
            incidents = feed.incidents.len(),
            skipped = feed.skipped,
            "Feed parsed"
        );
        Ok(feed)
    }

    fn parse_situation(&self, node: Node<'_, '_>) -> Option<Incident> {
        let Some(id) = node
            .attribute("id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
        else {
            let pos = node.document().text_pos_at(node.range().start);
            warn!(line = pos.row, "Situation without id skipped");
            return None;
        };

        let severity = match child_text(node, "overallSeverity") {
            None => {
                warn!(situation_id = id, field = "overallSeverity", "Missing severity, using unspecified");
                Severity::Unspecified
            }
            Some(raw) => Severity::from_datex(&raw).unwrap_or_else(|| {
                warn!(situation_id = id, field = "overallSeverity", value = %raw, "Unrecognised severity, using unspecified");
                Severity::Unspecified
            }),
        };

        let records: Vec<Node> = node
            .descendants()
            .filter(|n| is(n, "situationRecord"))
            .collect();

        let located = records
            .iter()
            .find_map(|&record| child(record, "locationReference").map(|loc| (record, loc)));
        let primary = located.map(|(record, _)| record).or(records.first().copied());

        let location = match located {
            Some((record, reference)) => self.parse_location(id, record, reference),
            None => {
                let field = if records.is_empty() { "situationRecord" } else { "locationReference" };
                warn!(situation_id = id, field, "Missing location, using empty location");
                Location::default()
            }
        };

        let cause_type = primary.and_then(|r| descendant_text(r, "causeType"));
        let incident_type = primary
            .and_then(|r| descendant_text(r, "roadOrCarriagewayOrLaneManagementType"))
            .or_else(|| cause_type.clone());
        let description = primary
            .and_then(|r| descendant(r, "generalPublicComment"))
            .and_then(|c| descendant_text(c, "value"));
        let validity = primary
            .map(|r| parse_validity(id, r))
            .unwrap_or_default();

        Some(Incident {
            id: id.to_string(),
            severity,
            location,
            incident_type,
            cause_type,
            description,
            validity,
        })
    }

    fn parse_location(&self, id: &str, record: Node<'_, '_>, reference: Node<'_, '_>) -> Location {
        let mut location = Location {
            road_name: descendant_text(record, "roadName"),
            ..Location::default()
        };

        let Some(point) = POINT_ELEMENTS
            .iter()
            .find_map(|name| descendant(reference, name))
        else {
            warn!(situation_id = id, field = "point", "Location reference without point, using road name only");
            return location;
        };

        if let Some(coords) = descendant(point, "pointCoordinates") {
            let lat = child_text(coords, "latitude").and_then(|t| parse_number(id, "latitude", &t));
            let lon = child_text(coords, "longitude").and_then(|t| parse_number(id, "longitude", &t));
            location.coordinates = match (lat, lon) {
                (Some(lat), Some(lon)) => Coordinates::new(lat, lon).or_else(|| {
                    warn!(situation_id = id, lat, lon, "Coordinates out of range ignored");
                    None
                }),
                (None, None) => None,
                _ => {
                    warn!(situation_id = id, "Incomplete coordinate pair ignored");
                    None
                }
            };
        }

        if let Some(ext) = descendant(point, "extendedTpegNonJunctionPoint") {
            location.province =
                child_text(ext, "province").map(|p| self.locations.resolve_province(&p));
            location.municipality = child_text(ext, "municipality");
            location.region = child_text(ext, "autonomousCommunity");
            location.km_point =
                child_text(ext, "kilometerPoint").and_then(|t| parse_number(id, "kilometerPoint", &t));
        }

        if location.region.is_none() {
            location.region = location
                .province
                .as_deref()
                .and_then(|p| self.locations.region_for(p))
                .map(str::to_string);
        }

        location
    }
}

fn parse_validity(id: &str, record: Node<'_, '_>) -> Validity {
    Validity {
        start: descendant_text(record, "overallStartTime")
            .and_then(|t| parse_timestamp(id, "overallStartTime", &t)),
        end: descendant_text(record, "overallEndTime")
            .and_then(|t| parse_timestamp(id, "overallEndTime", &t)),
    }
}

fn parse_number(id: &str, field: &str, text: &str) -> Option<f64> {
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            warn!(situation_id = id, field, value = text, "Unparseable number ignored");
            None
        }
    }
}

fn parse_timestamp(id: &str, field: &str, text: &str) -> Option<DateTime<FixedOffset>> {
    match DateTime::parse_from_rfc3339(text) {
        Ok(ts) => Some(ts),
        Err(e) => {
            warn!(situation_id = id, field, value = text, error = %e, "Unparseable timestamp ignored");
            None
        }
    }
}

fn is(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| is(n, name))
}

fn descendant<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.descendants().skip(1).find(|n| is(n, name))
}

fn text(node: Node<'_, '_>) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name).and_then(text)
}

fn descendant_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    descendant(node, name).and_then(text)
}
