//! NGSI v2 bodies exchanged with Orion
//!
//! The relay writes the received identifier; the access gate reads it back
//! and answers with its verdict. Serialized with `serde_json`, so quotes,
//! backslashes and control characters are escaped and bodies are always
//! valid JSON.

use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// Name of the entity attribute the identifier is written to.
pub const ID_ATTRIBUTE: &str = "idRecebido";

/// NGSI attribute type for plain strings.
pub const TEXT_TYPE: &str = "Text";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextAttribute<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: &'a str,
}

/// `{"idRecebido":{"type":"Text","value":"<identifier>"}}`
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdUpdate<'a> {
    #[serde(rename = "idRecebido")]
    pub id: TextAttribute<'a>,
}

impl<'a> IdUpdate<'a> {
    pub const fn new(identifier: &'a str) -> Self {
        Self {
            id: TextAttribute {
                kind: TEXT_TYPE,
                value: identifier,
            },
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// `{"statusAcesso":..,"nomeUsuario":..,"departamento":..}`, the gate's
/// answer to a received identifier.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessReply<'a> {
    #[serde(rename = "statusAcesso")]
    pub status: TextAttribute<'a>,
    #[serde(rename = "nomeUsuario")]
    pub name: TextAttribute<'a>,
    #[serde(rename = "departamento")]
    pub department: TextAttribute<'a>,
}

impl<'a> AccessReply<'a> {
    pub const fn new(status: &'a str, name: &'a str, department: &'a str) -> Self {
        Self {
            status: TextAttribute {
                kind: TEXT_TYPE,
                value: status,
            },
            name: TextAttribute {
                kind: TEXT_TYPE,
                value: name,
            },
            department: TextAttribute {
                kind: TEXT_TYPE,
                value: department,
            },
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[derive(Deserialize)]
struct ReceivedAttribute {
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Deserialize)]
struct EntitySnapshot {
    #[serde(rename = "idRecebido")]
    id: Option<ReceivedAttribute>,
}

/// Extract the identifier from an entity as returned by
/// `GET /v2/entities/<id>`.
///
/// `None` when the attribute is missing, empty or not a string.
pub fn received_id(entity: &[u8]) -> Result<Option<String>, serde_json::Error> {
    let snapshot: EntitySnapshot = serde_json::from_slice(entity)?;
    Ok(snapshot
        .id
        .and_then(|attribute| attribute.value.as_str().map(String::from))
        .filter(|id| !id.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn decode(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn wire_shape() {
        let body = IdUpdate::new("12345").to_json().unwrap();
        assert_eq!(
            core::str::from_utf8(&body).unwrap(),
            r#"{"idRecebido":{"type":"Text","value":"12345"}}"#
        );
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        let nasty = r#"ab"c\d"#;
        let body = IdUpdate::new(nasty).to_json().unwrap();
        assert_eq!(
            decode(&body),
            json!({ "idRecebido": { "type": "Text", "value": nasty } })
        );
    }

    #[test]
    fn non_ascii_survives() {
        let body = IdUpdate::new("João-42").to_json().unwrap();
        assert_eq!(decode(&body)[ID_ATTRIBUTE]["value"], "João-42");
    }

    #[test]
    fn access_reply_shape() {
        let body = AccessReply::new("LIBERADO", "João Silva", "TI").to_json().unwrap();
        assert_eq!(
            decode(&body),
            json!({
                "statusAcesso": { "type": "Text", "value": "LIBERADO" },
                "nomeUsuario": { "type": "Text", "value": "João Silva" },
                "departamento": { "type": "Text", "value": "TI" }
            })
        );
    }

    #[test]
    fn received_id_from_entity() {
        let entity = br#"{"id":"TesteESP32","type":"Thing","idRecebido":{"type":"Text","value":"12345","metadata":{}}}"#;
        assert_eq!(received_id(entity).unwrap().as_deref(), Some("12345"));
    }

    #[test]
    fn missing_or_odd_attribute_is_none() {
        assert_eq!(received_id(br#"{"id":"TesteESP32"}"#).unwrap(), None);
        assert_eq!(received_id(br#"{"idRecebido":{"value":""}}"#).unwrap(), None);
        assert_eq!(received_id(br#"{"idRecebido":{"value":42}}"#).unwrap(), None);
        assert!(received_id(b"not json").is_err());
    }
}
