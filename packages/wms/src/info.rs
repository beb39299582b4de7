//! Parsing of `text/xml` feature-info answers.

use roxmltree::Document;

use crate::{FeatureInfo, WmsError};

/// Literal value ArcGIS servers report for an empty attribute.
const NULL_VALUE: &str = "Null";

/// Reads the attributes of the first `FIELDS` element.
///
/// Returns `Ok(None)` when the answer has no `FIELDS` element, which is how
/// servers report that nothing was hit.
///
/// # Errors
///
/// Returns [`WmsError::Xml`] for malformed XML and
/// [`WmsError::ServiceException`] for a service exception report.
pub fn parse_feature_info(xml: &str) -> Result<Option<FeatureInfo>, WmsError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();

    if root.tag_name().name() == "ServiceExceptionReport" {
        let message = root
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "ServiceException")
            .find_map(|n| n.text().map(str::trim).filter(|t| !t.is_empty()))
            .unwrap_or("unknown exception")
            .to_string();
        return Err(WmsError::ServiceException { message });
    }

    let Some(fields) = root
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "FIELDS")
    else {
        return Ok(None);
    };

    Ok(Some(
        fields
            .attributes()
            .map(|attr| {
                let value = (attr.value() != NULL_VALUE).then(|| attr.value().to_string());
                (attr.name().to_string(), value)
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_fields_element() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<FeatureInfoResponse xmlns:esri_wms="http://www.esri.com/wms" xmlns="http://www.esri.com/wms">
  <FIELDS OBJECTID="17" Lokalita="Banská Bystrica" Typvrtu-popis="jadrový" Hĺbkavrtu="Null"></FIELDS>
  <FIELDS OBJECTID="18" Lokalita="Zvolen"></FIELDS>
</FeatureInfoResponse>"#;
        let info = parse_feature_info(xml).unwrap().unwrap();
        assert_eq!(info.len(), 4);
        assert_eq!(info["Lokalita"].as_deref(), Some("Banská Bystrica"));
        assert_eq!(info["Typvrtu-popis"].as_deref(), Some("jadrový"));
        assert!(info.contains_key("Hĺbkavrtu"));
        assert_eq!(info["Hĺbkavrtu"], None);
    }

    #[test]
    fn no_fields_means_no_hit() {
        let xml = r#"<FeatureInfoResponse xmlns="http://www.esri.com/wms"></FeatureInfoResponse>"#;
        assert_eq!(parse_feature_info(xml).unwrap(), None);
    }

    #[test]
    fn service_exception_is_an_error() {
        let xml = r#"<ServiceExceptionReport version="1.3.0" xmlns="http://www.opengis.net/ogc">
  <ServiceException code="LayerNotQueryable">Layer not queryable</ServiceException>
</ServiceExceptionReport>"#;
        match parse_feature_info(xml) {
            Err(WmsError::ServiceException { message }) => {
                assert_eq!(message, "Layer not queryable");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn non_xml_is_a_parse_error() {
        assert!(matches!(
            parse_feature_info("not xml at all"),
            Err(WmsError::Xml(_))
        ));
    }
}
