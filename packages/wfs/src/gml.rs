//! GML feature collection parsing.
//!
//! Elements are matched by local name so the parser does not depend on
//! the namespace prefixes a particular server picks.

use envmap_feature_models::{PointAttributes, RemotePoint};
use envmap_geometry_models::LonLat;
use roxmltree::{Document, Node};

use crate::{WfsError, WfsSource};

/// Parses a `GetFeature` response into remote points.
///
/// Members are read from `featureMember`, `featureMembers` and `member`
/// containers. Members without a parsable position are skipped and logged.
///
/// # Errors
///
/// Returns [`WfsError::Xml`] for malformed XML and
/// [`WfsError::ServiceException`] if the server returned an exception
/// report instead of a feature collection.
pub fn parse_feature_collection(
    xml: &str,
    source: &WfsSource,
) -> Result<Vec<RemotePoint>, WfsError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();

    if root.tag_name().name().ends_with("ExceptionReport") {
        let message = root
            .descendants()
            .filter(|n| {
                n.is_element()
                    && matches!(n.tag_name().name(), "ExceptionText" | "ServiceException")
            })
            .find_map(|n| element_text(&n))
            .unwrap_or("unknown exception")
            .to_string();
        return Err(WfsError::ServiceException { message });
    }

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for feature in feature_nodes(root) {
        match parse_member(&feature, source) {
            Some(point) => points.push(point),
            None => {
                skipped += 1;
                log::warn!(
                    "{}: skipping feature {:?} without a usable position",
                    source.id,
                    feature_id(&feature)
                );
            }
        }
    }

    log::debug!(
        "{}: parsed {} features ({skipped} skipped)",
        source.id,
        points.len()
    );

    Ok(points)
}

/// Yields the feature elements of every member container under `root`.
fn feature_nodes<'a, 'input>(
    root: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    root.descendants()
        .filter(|n| {
            n.is_element()
                && matches!(
                    n.tag_name().name(),
                    "featureMember" | "featureMembers" | "member"
                )
        })
        .flat_map(|container| container.children().filter(Node::is_element))
}

fn parse_member(feature: &Node<'_, '_>, source: &WfsSource) -> Option<RemotePoint> {
    let (first, second) = read_position(feature)?;
    let (lon, lat) = source.axis_order.to_lon_lat(first, second);

    Some(RemotePoint {
        id: feature_id(feature),
        position: LonLat::new(lon, lat),
        attributes: PointAttributes {
            name: child_text(feature, &source.fields.name),
            priority: child_text(feature, &source.fields.priority),
            urban_classification: child_text(feature, &source.fields.urban_classification),
        },
    })
}

/// Reads the first coordinate tuple from a GML 3 `pos` or GML 2
/// `coordinates` element.
fn read_position(feature: &Node<'_, '_>) -> Option<(f64, f64)> {
    if let Some(text) = find_element(feature, "pos").and_then(|n| element_text(&n)) {
        return parse_tuple(text.split_whitespace());
    }

    let text = find_element(feature, "coordinates").and_then(|n| element_text(&n))?;
    let first_tuple = text.split_whitespace().next()?;
    parse_tuple(first_tuple.split(','))
}

fn parse_tuple<'a>(mut parts: impl Iterator<Item = &'a str>) -> Option<(f64, f64)> {
    let first = parts.next()?.trim().parse::<f64>().ok()?;
    let second = parts.next()?.trim().parse::<f64>().ok()?;
    (first.is_finite() && second.is_finite()).then_some((first, second))
}

fn find_element<'a, 'input>(node: &Node<'a, 'input>, local_name: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == local_name)
}

fn element_text<'a>(node: &Node<'a, '_>) -> Option<&'a str> {
    node.text().map(str::trim).filter(|t| !t.is_empty())
}

fn child_text(feature: &Node<'_, '_>, local_name: &str) -> Option<String> {
    find_element(feature, local_name)
        .and_then(|n| element_text(&n))
        .map(str::to_string)
}

fn feature_id(feature: &Node<'_, '_>) -> Option<String> {
    feature
        .attributes()
        .find(|a| a.name() == "id" || a.name() == "fid")
        .map(|a| a.value().to_string())
}
