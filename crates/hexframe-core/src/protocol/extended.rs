use serde_json::{Map, Value, json};

use super::error::ProtocolError;
use super::model::{ChecksumAlgorithm, ChecksumPosition, FieldType};

/// Marker fields of the extended schema that duplicate `frame_header` /
/// `frame_tail` and are dropped during conversion.
const MARKER_FIELD_NAMES: [&str; 4] = ["帧开始符", "固定帧尾", "帧头", "帧尾"];

/// Shape of a protocol JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// Native schema (`name` / `byte_count` / `field_type` per field).
    Standard,
    /// Extended schema (`index` / `value` / `format` per field, type tags
    /// such as `fixed` or `command`).
    Extended,
    Unknown,
}

/// Detect the schema from the first entry of `fields`.
///
/// # Examples
/// ```
/// use hexframe_core::{SchemaFormat, detect_format};
/// use serde_json::json;
///
/// let doc = json!({"fields": [{"index": 0, "name": "addr", "field_type": "fixed"}]});
/// assert_eq!(detect_format(&doc), SchemaFormat::Extended);
/// assert_eq!(detect_format(&json!({"fields": []})), SchemaFormat::Unknown);
/// ```
pub fn detect_format(doc: &Value) -> SchemaFormat {
    let Some(first) = doc
        .get("fields")
        .and_then(Value::as_array)
        .and_then(|fields| fields.first())
        .and_then(Value::as_object)
    else {
        return SchemaFormat::Unknown;
    };

    if ["index", "value", "format"]
        .iter()
        .any(|key| first.contains_key(*key))
    {
        return SchemaFormat::Extended;
    }
    if ["name", "byte_count", "field_type"]
        .iter()
        .all(|key| first.contains_key(*key))
    {
        return SchemaFormat::Standard;
    }
    SchemaFormat::Unknown
}

/// Map an extended-schema document onto the standard schema.
///
/// Marker and checksum entries are removed from `fields` (they live in the
/// protocol header instead), extended type tags collapse onto the closed
/// field type set and every kept field is renumbered.
pub fn convert_extended(doc: &Value) -> Value {
    let mut standard = Map::new();
    standard.insert(
        "protocol_name".to_string(),
        string_or(doc, "protocol_name", "未命名协议"),
    );
    standard.insert("version".to_string(), string_or(doc, "version", "1.0"));
    standard.insert("description".to_string(), string_or(doc, "description", ""));
    standard.insert("frame_header".to_string(), string_or(doc, "frame_header", "68"));
    standard.insert("frame_tail".to_string(), string_or(doc, "frame_tail", "16"));
    standard.insert(
        "checksum_config".to_string(),
        convert_checksum(doc.get("checksum_config")),
    );

    let mut fields = Vec::new();
    let entries = doc
        .get("fields")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for (index, entry) in entries.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            continue;
        };
        let tag = entry
            .get("field_type")
            .and_then(Value::as_str)
            .unwrap_or("bytes");
        let name = entry.get("name").and_then(Value::as_str);

        if tag == "fixed" && name.is_some_and(|name| MARKER_FIELD_NAMES.contains(&name)) {
            continue;
        }
        if tag == "checksum" {
            continue;
        }

        let mut field = Map::new();
        field.insert(
            "name".to_string(),
            entry
                .get("name")
                .cloned()
                .unwrap_or_else(|| json!(format!("字段{}", index + 1))),
        );
        field.insert(
            "byte_count".to_string(),
            entry.get("byte_count").cloned().unwrap_or_else(|| json!(1)),
        );
        field.insert("field_type".to_string(), json!(field_type_from_tag(tag)));
        field.insert(
            "description".to_string(),
            entry
                .get("description")
                .cloned()
                .unwrap_or_else(|| json!("")),
        );
        field.insert("order".to_string(), json!(fields.len()));
        if let Some(length_field) = entry.get("length_field") {
            field.insert("length_field".to_string(), length_field.clone());
        }
        fields.push(Value::Object(field));
    }
    standard.insert("fields".to_string(), Value::Array(fields));

    Value::Object(standard)
}

/// Return a standard-schema document, converting extended documents.
///
/// # Errors
/// Returns `ProtocolError::UnknownFormat` when neither schema is recognized.
pub fn to_standard(doc: Value) -> Result<Value, ProtocolError> {
    match detect_format(&doc) {
        SchemaFormat::Standard => Ok(doc),
        SchemaFormat::Extended => Ok(convert_extended(&doc)),
        SchemaFormat::Unknown => Err(ProtocolError::UnknownFormat),
    }
}

fn string_or(doc: &Value, key: &str, default: &str) -> Value {
    doc.get(key).cloned().unwrap_or_else(|| json!(default))
}

fn convert_checksum(config: Option<&Value>) -> Value {
    let config = config.and_then(Value::as_object);
    let get = |key: &str, default: i64| {
        config
            .and_then(|config| config.get(key))
            .cloned()
            .unwrap_or_else(|| json!(default))
    };
    let algorithm = config
        .and_then(|config| config.get("checksum_type"))
        .and_then(Value::as_str)
        .map(algorithm_from_tag)
        .unwrap_or_default();

    json!({
        "checksum_type": algorithm,
        "position": ChecksumPosition::BeforeTail,
        "start_offset": get("start_offset", 0),
        "end_offset": get("end_offset", -1),
        "checksum_length": get("checksum_length", 1),
    })
}

fn algorithm_from_tag(tag: &str) -> ChecksumAlgorithm {
    match tag {
        "累加和" | "SUM" => ChecksumAlgorithm::Sum,
        "异或校验" | "XOR" => ChecksumAlgorithm::Xor,
        "CRC16" => ChecksumAlgorithm::Crc16,
        "CRC32" => ChecksumAlgorithm::Crc32,
        _ => ChecksumAlgorithm::None,
    }
}

fn field_type_from_tag(tag: &str) -> FieldType {
    match tag {
        "fixed" | "variable" | "array" => FieldType::Bytes,
        "command" | "checksum" => FieldType::UInt8,
        other => FieldType::from_tag(other).unwrap_or(FieldType::Bytes),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn extended_doc() -> Value {
        json!({
            "protocol_name": "工业协议",
            "frame_header": "68",
            "frame_tail": "16",
            "checksum_config": {"checksum_type": "SUM", "end_offset": -2},
            "fields": [
                {"index": 0, "name": "帧头", "byte_count": 1, "field_type": "fixed", "value": "68"},
                {"index": 1, "name": "设备地址", "byte_count": 1, "field_type": "fixed", "format": "HEX"},
                {"index": 2, "name": "命令码", "byte_count": 1, "field_type": "command"},
                {"index": 3, "name": "长度", "byte_count": 1, "field_type": "uint8"},
                {"index": "4-8", "byte_count": 0, "field_type": "variable", "length_field": "长度"},
                {"index": 9, "name": "校验", "byte_count": 1, "field_type": "checksum"},
                {"index": 10, "name": "帧尾", "byte_count": 1, "field_type": "fixed"}
            ]
        })
    }

    #[test]
    fn detects_standard_schema() {
        let doc = json!({"fields": [{"name": "a", "byte_count": 1, "field_type": "uint8"}]});
        assert_eq!(detect_format(&doc), SchemaFormat::Standard);
    }

    #[test]
    fn detects_unknown_schema() {
        assert_eq!(detect_format(&json!({})), SchemaFormat::Unknown);
        assert_eq!(
            detect_format(&json!({"fields": [{"name": "a"}]})),
            SchemaFormat::Unknown
        );
    }

    #[test]
    fn conversion_drops_markers_and_checksum_fields() {
        let standard = convert_extended(&extended_doc());
        let fields = standard["fields"].as_array().unwrap();
        let names: Vec<_> = fields.iter().map(|f| f["name"].clone()).collect();
        assert_eq!(
            names,
            vec![json!("设备地址"), json!("命令码"), json!("长度"), json!("字段5")]
        );
        assert_eq!(fields[0]["field_type"], json!("bytes"));
        assert_eq!(fields[1]["field_type"], json!("uint8"));
        assert_eq!(fields[3]["order"], json!(3));
        assert_eq!(fields[3]["length_field"], json!("长度"));
    }

    #[test]
    fn conversion_maps_checksum_config() {
        let standard = convert_extended(&extended_doc());
        let checksum = &standard["checksum_config"];
        assert_eq!(checksum["checksum_type"], json!("累加和"));
        assert_eq!(checksum["position"], json!("帧尾前"));
        assert_eq!(checksum["start_offset"], json!(0));
        assert_eq!(checksum["end_offset"], json!(-2));
        assert_eq!(checksum["checksum_length"], json!(1));
        assert_eq!(standard["version"], json!("1.0"));
    }

    #[test]
    fn unknown_checksum_tag_means_none() {
        let standard = convert_extended(&json!({
            "checksum_config": {"checksum_type": "LRC"},
            "fields": [{"index": 0, "name": "a", "field_type": "array"}]
        }));
        assert_eq!(standard["checksum_config"]["checksum_type"], json!("无校验"));
        assert_eq!(standard["protocol_name"], json!("未命名协议"));
        assert_eq!(standard["fields"][0]["byte_count"], json!(1));
    }

    #[test]
    fn to_standard_rejects_unknown() {
        let err = to_standard(json!({"fields": []})).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownFormat));
    }
}
