//! Resource and data-source spec schemas, and the change records deploy relies on.
//!
//! Mirrors spec §3 "Data model": a recursive tagged union over scalar primitives plus
//! array/map/object/union composites, and the field-change / changes / link-changes
//! records that flow from `stage_changes` into `deploy`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// A scalar primitive type a schema field may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    /// A UTF-8 string.
    String,
    /// A signed integer.
    Integer,
    /// A floating point number.
    Float,
    /// A boolean.
    Boolean,
}

/// A recursive resource specification schema node (spec §3).
///
/// Composites (`array`, `map`, `object`, `union`) nest further `SchemaNode`s; leaves hold
/// one of the four [`PrimitiveType`]s. Every node carries the descriptive and
/// provisioning metadata common to both leaves and composites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaNode {
    /// A scalar leaf.
    Scalar {
        /// Which primitive this leaf holds.
        primitive: PrimitiveType,
        /// Shared descriptive/provisioning metadata.
        #[serde(flatten)]
        meta: SchemaMeta,
    },
    /// A homogeneous list of `items`.
    Array {
        /// The schema every element must satisfy.
        items: Box<SchemaNode>,
        /// Shared descriptive/provisioning metadata.
        #[serde(flatten)]
        meta: SchemaMeta,
    },
    /// A homogeneous string-keyed map of `values`.
    Map {
        /// The schema every value must satisfy.
        values: Box<SchemaNode>,
        /// Shared descriptive/provisioning metadata.
        #[serde(flatten)]
        meta: SchemaMeta,
    },
    /// A fixed set of named attributes, some of which are `required`.
    Object {
        /// Attribute name to schema.
        attributes: HashMap<String, SchemaNode>,
        /// Names of attributes that must be present.
        required: Vec<String>,
        /// Shared descriptive/provisioning metadata.
        #[serde(flatten)]
        meta: SchemaMeta,
    },
    /// A value matching exactly one of `one_of`.
    Union {
        /// The alternative schemas; a value must match exactly one.
        one_of: Vec<SchemaNode>,
        /// Shared descriptive/provisioning metadata.
        #[serde(flatten)]
        meta: SchemaMeta,
    },
}

/// Descriptive and provisioning metadata shared by every [`SchemaNode`] variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaMeta {
    /// Short human-readable label.
    #[serde(default)]
    pub label: String,
    /// Plain-text description.
    #[serde(default)]
    pub description: String,
    /// Description with formatting markup (e.g. Markdown) applied.
    #[serde(default)]
    pub formatted_description: String,
    /// Whether `null` is a valid value for this field.
    #[serde(default)]
    pub nullable: bool,
    /// Default value applied only when the field is absent, never when explicitly set to
    /// `null` (spec §3 invariant).
    #[serde(default)]
    pub default: Option<Value>,
    /// Whether the field's value is produced by the provider, not supplied by the user.
    #[serde(default)]
    pub computed: bool,
}

impl SchemaNode {
    /// The metadata common to every node variant.
    #[must_use]
    pub fn meta(&self) -> &SchemaMeta {
        match self {
            Self::Scalar { meta, .. }
            | Self::Array { meta, .. }
            | Self::Map { meta, .. }
            | Self::Object { meta, .. }
            | Self::Union { meta, .. } => meta,
        }
    }

    /// Returns `true` if this node (transitively) only uses primitives or arrays of
    /// primitives, the restriction spec §3 places on data-source schemas.
    #[must_use]
    pub fn is_data_source_compatible(&self) -> bool {
        match self {
            Self::Scalar { .. } => true,
            Self::Array { items, .. } => matches!(items.as_ref(), Self::Scalar { .. }),
            Self::Map { .. } | Self::Object { .. } | Self::Union { .. } => false,
        }
    }

    /// Parses a schema node off the wire, where a plugin sends its `"type"` tag as a
    /// free-form string rather than a Rust enum discriminant. Unlike `serde`'s derived
    /// `Deserialize` (which would reject an unknown tag with a generic parse error), an
    /// unrecognized composite name here is reported as
    /// [`Error::InvalidResourceSpecDefinition`] (spec §4.2), the reason code higher
    /// layers dispatch on to distinguish a malformed plugin schema from any other
    /// transport failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResourceSpecDefinition`] if `value` is not a JSON object,
    /// has no `"type"` string field, or names a composite this schema does not know
    /// about.
    pub fn from_wire_json(value: &Value) -> Result<Self, Error> {
        let object = value.as_object().ok_or_else(|| {
            Error::InvalidResourceSpecDefinition("schema node must be a JSON object".to_string())
        })?;
        let type_tag = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::InvalidResourceSpecDefinition("schema node is missing a \"type\" string field".to_string())
            })?;

        let meta = serde_json::from_value(value.clone()).map_err(|err| {
            Error::InvalidResourceSpecDefinition(format!("schema node metadata is malformed: {err}"))
        })?;

        match type_tag {
            "string" => Ok(Self::Scalar { primitive: PrimitiveType::String, meta }),
            "integer" => Ok(Self::Scalar { primitive: PrimitiveType::Integer, meta }),
            "float" => Ok(Self::Scalar { primitive: PrimitiveType::Float, meta }),
            "boolean" => Ok(Self::Scalar { primitive: PrimitiveType::Boolean, meta }),
            "array" => {
                let items = object.get("items").ok_or_else(|| {
                    Error::InvalidResourceSpecDefinition("array schema node is missing \"items\"".to_string())
                })?;
                Ok(Self::Array { items: Box::new(Self::from_wire_json(items)?), meta })
            }
            "map" => {
                let values = object.get("values").ok_or_else(|| {
                    Error::InvalidResourceSpecDefinition("map schema node is missing \"values\"".to_string())
                })?;
                Ok(Self::Map { values: Box::new(Self::from_wire_json(values)?), meta })
            }
            "object" => {
                let raw_attributes = object
                    .get("attributes")
                    .and_then(Value::as_object)
                    .ok_or_else(|| {
                        Error::InvalidResourceSpecDefinition(
                            "object schema node is missing \"attributes\"".to_string(),
                        )
                    })?;
                let mut attributes = HashMap::with_capacity(raw_attributes.len());
                for (name, attribute) in raw_attributes {
                    attributes.insert(name.clone(), Self::from_wire_json(attribute)?);
                }
                let required = object
                    .get("required")
                    .and_then(Value::as_array)
                    .map(|values| {
                        values
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(Self::Object { attributes, required, meta })
            }
            "union" => {
                let raw_one_of = object.get("oneOf").and_then(Value::as_array).ok_or_else(|| {
                    Error::InvalidResourceSpecDefinition("union schema node is missing \"oneOf\"".to_string())
                })?;
                let one_of = raw_one_of
                    .iter()
                    .map(Self::from_wire_json)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Union { one_of, meta })
            }
            other => Err(Error::InvalidResourceSpecDefinition(format!(
                "unknown schema composite type {other:?}"
            ))),
        }
    }
}

/// One atomic diff between a field's prior and next value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldChange {
    /// Dotted path to the changed field.
    pub field_path: String,
    /// The value before the change, if known.
    pub prev_value: Option<Value>,
    /// The value after the change.
    pub new_value: Value,
    /// Whether this change forces resource recreation rather than an in-place update.
    pub must_recreate: bool,
}

/// The grouped diff `stage_changes` returns for a resource (spec §3 "Changes").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Changes {
    /// Fields whose value changed.
    pub modified_fields: Vec<FieldChange>,
    /// Fields newly present.
    pub new_fields: Vec<FieldChange>,
    /// Fields no longer present.
    pub removed_fields: Vec<FieldChange>,
    /// Fields present but unchanged.
    pub unchanged_fields: Vec<FieldChange>,
    /// Field paths whose final value can only be known once deploy has run. Kept as a
    /// plain field-path list, not derived from the other lists, to preserve the
    /// known/unknown distinction exactly as plugins report it (spec §9 Open Questions).
    pub field_changes_known_on_deploy: Vec<String>,
    /// Whether any change in this set forces resource recreation.
    pub must_recreate: bool,
    /// Outbound link changes keyed by `linkId = "<typeA>::<typeB>"`.
    pub outbound_link_changes: HashMap<String, LinkChanges>,
    /// The resolved resource snapshot (substitutions already applied), usable by deploy
    /// without re-resolving them.
    pub resolved_resource: Option<Value>,
}

/// The grouped diff a link's `stage_changes` returns (spec §3 "Link changes").
///
/// Same shape as [`Changes`], with an additional per-intermediary-resource change map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkChanges {
    /// Fields whose value changed.
    pub modified_fields: Vec<FieldChange>,
    /// Fields newly present.
    pub new_fields: Vec<FieldChange>,
    /// Fields no longer present.
    pub removed_fields: Vec<FieldChange>,
    /// Fields present but unchanged.
    pub unchanged_fields: Vec<FieldChange>,
    /// Field paths whose final value can only be known once deploy has run.
    pub field_changes_known_on_deploy: Vec<String>,
    /// Whether any change in this set forces resource recreation.
    pub must_recreate: bool,
    /// Changes scoped to each intermediary resource the link manages, keyed by the
    /// intermediary's logical name.
    pub intermediary_resource_changes: HashMap<String, Changes>,
}

/// A resolved data-source filter search value (spec §6 "Serialization of link `search`
/// values"). Marshals as a bare value when it holds exactly one element, or as a JSON
/// array otherwise; unmarshaling accepts either shape so older single-value payloads
/// stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchValue(pub Vec<Value>);

impl Serialize for SearchValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.0.as_slice() {
            [single] => single.serialize(serializer),
            _ => self.0.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SearchValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Array(values) => Ok(Self(values)),
            other => Ok(Self(vec![other])),
        }
    }
}

/// `{label, description, scalar value}` — one option of a custom variable type.
///
/// All options of a single custom variable type must share the same [`PrimitiveType`]
/// (spec §3 invariant); that invariant is enforced by the registry at resolution time,
/// not by this type itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomVariableOption {
    /// Human-readable label shown to the user.
    pub label: String,
    /// Human-readable description.
    pub description: String,
    /// The option's scalar value.
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(primitive: PrimitiveType) -> SchemaNode {
        SchemaNode::Scalar {
            primitive,
            meta: SchemaMeta::default(),
        }
    }

    #[test]
    fn scalar_is_data_source_compatible() {
        assert!(scalar(PrimitiveType::String).is_data_source_compatible());
    }

    #[test]
    fn array_of_scalars_is_data_source_compatible() {
        let array = SchemaNode::Array {
            items: Box::new(scalar(PrimitiveType::Integer)),
            meta: SchemaMeta::default(),
        };
        assert!(array.is_data_source_compatible());
    }

    #[test]
    fn nested_array_is_rejected_for_data_sources() {
        let nested_array = SchemaNode::Array {
            items: Box::new(SchemaNode::Array {
                items: Box::new(scalar(PrimitiveType::Integer)),
                meta: SchemaMeta::default(),
            }),
            meta: SchemaMeta::default(),
        };
        assert!(!nested_array.is_data_source_compatible());
    }

    #[test]
    fn object_is_not_data_source_compatible() {
        let object = SchemaNode::Object {
            attributes: HashMap::new(),
            required: vec![],
            meta: SchemaMeta::default(),
        };
        assert!(!object.is_data_source_compatible());
    }

    #[test]
    fn default_is_only_applied_when_field_absent() {
        let meta = SchemaMeta {
            default: Some(Value::String("fallback".to_string())),
            ..Default::default()
        };
        // Field explicitly set to null must not be treated as "use default" by callers;
        // this type only records the default, absence-vs-null handling lives with the
        // substitution resolver, an out-of-scope collaborator.
        assert_eq!(meta.default, Some(Value::String("fallback".to_string())));
    }

    #[test]
    fn single_element_search_value_marshals_as_a_bare_value() {
        let search = SearchValue(vec![Value::String("us-east-1".to_string())]);
        let json = serde_json::to_value(&search).unwrap();
        assert_eq!(json, Value::String("us-east-1".to_string()));
    }

    #[test]
    fn multi_element_search_value_marshals_as_an_array() {
        let search = SearchValue(vec![Value::from(1), Value::from(2)]);
        let json = serde_json::to_value(&search).unwrap();
        assert_eq!(json, serde_json::json!([1, 2]));
    }

    #[test]
    fn search_value_round_trips_through_both_shapes() {
        let single = SearchValue(vec![Value::from("only")]);
        let round_tripped: SearchValue =
            serde_json::from_value(serde_json::to_value(&single).unwrap()).unwrap();
        assert_eq!(round_tripped, single);

        let multi = SearchValue(vec![Value::from("a"), Value::from("b")]);
        let round_tripped: SearchValue =
            serde_json::from_value(serde_json::to_value(&multi).unwrap()).unwrap();
        assert_eq!(round_tripped, multi);
    }

    #[test]
    fn search_value_unmarshals_a_bare_scalar_as_single_element() {
        let value: SearchValue = serde_json::from_value(Value::String("solo".to_string())).unwrap();
        assert_eq!(value, SearchValue(vec![Value::String("solo".to_string())]));
    }

    #[test]
    fn from_wire_json_parses_nested_object_schema() {
        let raw = serde_json::json!({
            "type": "object",
            "label": "Lambda spec",
            "attributes": {
                "function_name": {"type": "string"},
                "memory_mb": {"type": "integer"},
                "tags": {"type": "array", "items": {"type": "string"}},
            },
            "required": ["function_name"],
        });

        let node = SchemaNode::from_wire_json(&raw).unwrap();
        match node {
            SchemaNode::Object { attributes, required, meta } => {
                assert_eq!(meta.label, "Lambda spec");
                assert_eq!(required, vec!["function_name".to_string()]);
                assert!(matches!(attributes["function_name"], SchemaNode::Scalar { primitive: PrimitiveType::String, .. }));
                assert!(matches!(attributes["memory_mb"], SchemaNode::Scalar { primitive: PrimitiveType::Integer, .. }));
                assert!(attributes["tags"].is_data_source_compatible());
            }
            other => panic!("expected an object node, got {other:?}"),
        }
    }

    #[test]
    fn from_wire_json_rejects_unknown_composite_type() {
        let raw = serde_json::json!({"type": "enum_set", "values": ["a", "b"]});
        let err = SchemaNode::from_wire_json(&raw).unwrap_err();
        assert!(matches!(err, Error::InvalidResourceSpecDefinition(_)));
        assert_eq!(err.reason_code(), crate::error::ReasonCode::InvalidResourceSpecDefinition);
    }

    #[test]
    fn from_wire_json_rejects_missing_type_tag() {
        let raw = serde_json::json!({"label": "no type here"});
        let err = SchemaNode::from_wire_json(&raw).unwrap_err();
        assert!(matches!(err, Error::InvalidResourceSpecDefinition(_)));
    }

    #[test]
    fn from_wire_json_rejects_non_object_input() {
        let err = SchemaNode::from_wire_json(&Value::String("nope".to_string())).unwrap_err();
        assert!(matches!(err, Error::InvalidResourceSpecDefinition(_)));
    }
}
