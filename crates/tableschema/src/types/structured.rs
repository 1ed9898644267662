//! Array, object, geopoint and geojson casters.

use rust_decimal::Decimal;
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::{CastFailure, CastOptions, CastResult, Format};
use crate::value::{Value, decimal_from_json, parse_decimal};

pub(super) fn cast_array(_format: &Format, value: &Value, _options: &CastOptions) -> CastResult {
    match value {
        Value::Array(items) => Ok(Value::Array(items.clone())),
        Value::String(s) => match serde_json::from_str::<JsonValue>(s) {
            Ok(JsonValue::Array(items)) => Ok(Value::Array(items)),
            _ => Err(CastFailure),
        },
        _ => Err(CastFailure),
    }
}

pub(super) fn cast_object(_format: &Format, value: &Value, _options: &CastOptions) -> CastResult {
    parse_object(value).map(Value::Object).ok_or(CastFailure)
}

pub(super) fn cast_geopoint(format: &Format, value: &Value, _options: &CastOptions) -> CastResult {
    if let Value::GeoPoint { lon, lat } = value {
        return geopoint(*lon, *lat);
    }
    let (lon, lat) = match format {
        Format::Default => {
            let text = value.as_str().ok_or(CastFailure)?;
            let (lon, lat) = text.split_once(',').ok_or(CastFailure)?;
            (
                parse_decimal(lon.trim()).ok_or(CastFailure)?,
                parse_decimal(lat.trim()).ok_or(CastFailure)?,
            )
        }
        Format::Array => {
            let items = match value {
                Value::Array(items) => items.clone(),
                Value::String(s) => match serde_json::from_str::<JsonValue>(s) {
                    Ok(JsonValue::Array(items)) => items,
                    _ => return Err(CastFailure),
                },
                _ => return Err(CastFailure),
            };
            let [lon, lat] = items.as_slice() else {
                return Err(CastFailure);
            };
            (
                decimal_from_json(lon).ok_or(CastFailure)?,
                decimal_from_json(lat).ok_or(CastFailure)?,
            )
        }
        Format::Object => {
            let map = parse_object(value).ok_or(CastFailure)?;
            if map.len() != 2 {
                return Err(CastFailure);
            }
            (
                map.get("lon").and_then(decimal_from_json).ok_or(CastFailure)?,
                map.get("lat").and_then(decimal_from_json).ok_or(CastFailure)?,
            )
        }
        _ => return Err(CastFailure),
    };
    geopoint(lon, lat)
}

fn geopoint(lon: Decimal, lat: Decimal) -> CastResult {
    let lon_ok = (Decimal::from(-180)..=Decimal::from(180)).contains(&lon);
    let lat_ok = (Decimal::from(-90)..=Decimal::from(90)).contains(&lat);
    if lon_ok && lat_ok {
        Ok(Value::GeoPoint { lon, lat })
    } else {
        Err(CastFailure)
    }
}

pub(super) fn cast_geojson(format: &Format, value: &Value, _options: &CastOptions) -> CastResult {
    let map = parse_object(value).ok_or(CastFailure)?;
    let valid = match format {
        Format::Default => is_geojson_object(&map),
        Format::Topojson => true,
        _ => false,
    };
    if valid {
        Ok(Value::Object(map))
    } else {
        Err(CastFailure)
    }
}

fn parse_object(value: &Value) -> Option<JsonMap<String, JsonValue>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(s) => match serde_json::from_str::<JsonValue>(s) {
            Ok(JsonValue::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

// Structural RFC 7946 check: geometry types, coordinate nesting depth and
// feature members. Coordinate reference systems and winding order are not
// checked.
fn is_geojson_object(map: &JsonMap<String, JsonValue>) -> bool {
    match map.get("type").and_then(JsonValue::as_str) {
        Some("Feature") => is_feature(map),
        Some("FeatureCollection") => map
            .get("features")
            .and_then(JsonValue::as_array)
            .is_some_and(|features| {
                features
                    .iter()
                    .all(|f| f.as_object().is_some_and(is_feature))
            }),
        _ => is_geometry(map),
    }
}

fn is_feature(map: &JsonMap<String, JsonValue>) -> bool {
    if map.get("type").and_then(JsonValue::as_str) != Some("Feature") {
        return false;
    }
    let geometry_ok = match map.get("geometry") {
        Some(JsonValue::Null) => true,
        Some(JsonValue::Object(geometry)) => is_geometry(geometry),
        _ => false,
    };
    let properties_ok = matches!(
        map.get("properties"),
        Some(JsonValue::Null | JsonValue::Object(_))
    );
    geometry_ok && properties_ok
}

fn is_geometry(map: &JsonMap<String, JsonValue>) -> bool {
    let Some(kind) = map.get("type").and_then(JsonValue::as_str) else {
        return false;
    };
    if kind == "GeometryCollection" {
        return map
            .get("geometries")
            .and_then(JsonValue::as_array)
            .is_some_and(|items| {
                items
                    .iter()
                    .all(|g| g.as_object().is_some_and(is_geometry))
            });
    }
    let Some(coords) = map.get("coordinates") else {
        return false;
    };
    match kind {
        "Point" => is_position(coords),
        "MultiPoint" => every(coords, is_position),
        "LineString" => is_line_string(coords),
        "MultiLineString" => every(coords, is_line_string),
        "Polygon" => is_polygon(coords),
        "MultiPolygon" => every(coords, is_polygon),
        _ => false,
    }
}

fn every(json: &JsonValue, check: fn(&JsonValue) -> bool) -> bool {
    json.as_array().is_some_and(|items| items.iter().all(check))
}

fn is_position(json: &JsonValue) -> bool {
    json.as_array()
        .is_some_and(|items| items.len() >= 2 && items.iter().all(JsonValue::is_number))
}

fn is_line_string(json: &JsonValue) -> bool {
    json.as_array()
        .is_some_and(|items| items.len() >= 2 && items.iter().all(is_position))
}

fn is_linear_ring(json: &JsonValue) -> bool {
    json.as_array()
        .is_some_and(|items| items.len() >= 4 && items.iter().all(is_position))
}

fn is_polygon(json: &JsonValue) -> bool {
    every(json, is_linear_ring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts() -> CastOptions {
        CastOptions::default()
    }

    fn point(lon: i64, lat: i64) -> Value {
        Value::GeoPoint {
            lon: Decimal::from(lon),
            lat: Decimal::from(lat),
        }
    }

    #[test]
    fn test_array_and_object() {
        let f = Format::Default;
        assert_eq!(
            cast_array(&f, &Value::from("[1, 2]"), &opts()),
            Ok(Value::Array(vec![json!(1), json!(2)]))
        );
        assert_eq!(cast_array(&f, &Value::from("{}"), &opts()), Err(CastFailure));
        assert_eq!(cast_array(&f, &Value::from("[1,"), &opts()), Err(CastFailure));
        assert!(cast_object(&f, &Value::from(r#"{"a": 1}"#), &opts()).is_ok());
        assert_eq!(cast_object(&f, &Value::from("[1]"), &opts()), Err(CastFailure));
        assert_eq!(cast_object(&f, &Value::Integer(1), &opts()), Err(CastFailure));
    }

    #[test]
    fn test_geopoint_default() {
        let f = Format::Default;
        assert_eq!(cast_geopoint(&f, &Value::from("90, 45"), &opts()), Ok(point(90, 45)));
        assert_eq!(cast_geopoint(&f, &Value::from("-180,-90"), &opts()), Ok(point(-180, -90)));
        assert_eq!(cast_geopoint(&f, &Value::from("0,91"), &opts()), Err(CastFailure));
        assert_eq!(cast_geopoint(&f, &Value::from("1,2,3"), &opts()), Err(CastFailure));
        assert_eq!(cast_geopoint(&f, &Value::from("lon,lat"), &opts()), Err(CastFailure));
    }

    #[test]
    fn test_geopoint_array_and_object() {
        assert_eq!(
            cast_geopoint(&Format::Array, &Value::from("[90, 45]"), &opts()),
            Ok(point(90, 45))
        );
        assert_eq!(
            cast_geopoint(&Format::Array, &Value::from(json!([90, 45, 1])), &opts()),
            Err(CastFailure)
        );
        assert_eq!(
            cast_geopoint(&Format::Object, &Value::from(r#"{"lon": 90, "lat": 45}"#), &opts()),
            Ok(point(90, 45))
        );
        assert_eq!(
            cast_geopoint(
                &Format::Object,
                &Value::from(json!({"lon": 90, "lat": 45, "alt": 1})),
                &opts()
            ),
            Err(CastFailure)
        );
    }

    #[test]
    fn test_geojson() {
        let f = Format::Default;
        let point = json!({"type": "Point", "coordinates": [125.6, 10.1]});
        assert!(cast_geojson(&f, &Value::from(point), &opts()).is_ok());

        let feature = json!({
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
            "properties": {"name": "road"}
        });
        assert!(cast_geojson(&f, &Value::from(feature), &opts()).is_ok());

        let collection = json!({"type": "FeatureCollection", "features": []});
        assert!(cast_geojson(&f, &Value::from(collection), &opts()).is_ok());

        let bad = json!({"type": "Point", "coordinates": "here"});
        assert_eq!(cast_geojson(&f, &Value::from(bad), &opts()), Err(CastFailure));
        let untyped = json!({"coordinates": [0, 0]});
        assert_eq!(
            cast_geojson(&f, &Value::from(untyped.clone()), &opts()),
            Err(CastFailure)
        );
        assert!(cast_geojson(&Format::Topojson, &Value::from(untyped), &opts()).is_ok());
    }
}
