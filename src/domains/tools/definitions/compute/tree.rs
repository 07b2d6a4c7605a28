//! Grasshopper data-tree codec.
//!
//! Rhino.Compute exchanges parameters and results as "data trees": each named
//! parameter maps branch paths (e.g. `{0}`) to ordered lists of typed leaves.
//! This module encodes native scalar values into that shape and decodes the
//! response trees back into typed values (numbers, text, or opaque geometry).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use super::super::model::Geometry;

/// Branch path used for simple scalar input parameters.
pub const ROOT_BRANCH: &str = "{0}";

/// Default branch path for reading evaluation outputs.
pub const DEFAULT_OUTPUT_BRANCH: &str = "{0;0}";

/// A scalar parameter value accepted by the encoder.
///
/// Grasshopper infers parameter types from .NET type tags, so the caller
/// constructs a discriminated value here rather than relying on runtime
/// type inspection. Variant order matters for untagged deserialization:
/// booleans must be tried before numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl ParamValue {
    /// Map this value to its .NET type tag and wire representation.
    ///
    /// A real number with zero fractional part is normalized to the
    /// integral form, matching what Grasshopper expects for Int32 inputs.
    fn to_wire(&self) -> (&'static str, Value) {
        match self {
            Self::Str(s) => ("System.String", Value::from(s.clone())),
            Self::Bool(b) => ("System.Boolean", Value::from(*b)),
            Self::Int(i) => ("System.Int32", Value::from(*i)),
            Self::Real(r) if r.is_finite() && r.fract() == 0.0 => {
                ("System.Int32", Value::from(*r as i64))
            }
            Self::Real(r) => ("System.Double", Value::from(*r)),
        }
    }
}

/// One typed leaf within a data-tree branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeItem {
    /// Coarse semantic tag, e.g. `System.Int32` or `System.String`.
    #[serde(rename = "type")]
    pub item_type: String,

    /// Serialized leaf value.
    pub data: Value,
}

/// A named data tree: one parameter with its branch map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTree {
    /// Name of the Grasshopper parameter this tree feeds or was read from.
    #[serde(rename = "ParamName")]
    pub param_name: String,

    /// Branch path -> ordered leaves.
    #[serde(rename = "InnerTree")]
    pub inner_tree: HashMap<String, Vec<TreeItem>>,
}

/// Full response payload from a Grasshopper evaluation.
///
/// Extra fields (pointer, warnings, ...) are preserved untouched so the raw
/// response can be surfaced to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResponse {
    #[serde(default)]
    pub values: Vec<DataTree>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One decoded leaf value.
///
/// Decoded values are transient and owned by the caller; the codec holds no
/// state across calls.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    /// Opaque encoded geometry, passed through unparsed.
    Geometry(Geometry),
    Int(i64),
    Real(f64),
    Text(String),
}

impl std::fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Geometry(g) => write!(f, "<{} geometry>", g.kind),
            Self::Int(i) => write!(f, "{}", i),
            Self::Real(r) => write!(f, "{}", r),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Errors produced while reading a response tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// No output parameter with the given name exists in the response.
    #[error("No parameter with name '{0}' found in response")]
    OutputNotFound(String),

    /// No tree in the response contains the requested branch path.
    #[error("No branch '{0}' found in response")]
    BranchNotFound(String),

    /// The requested branch exists but holds no leaves.
    #[error("Branch '{0}' is empty")]
    EmptyBranch(String),
}

/// Encode a single named parameter as a data tree.
///
/// The leaf lands on the root branch `{0}` with its inferred type tag.
/// Total function: every value encodes.
pub fn encode_parameter(name: &str, value: &ParamValue) -> DataTree {
    let (type_tag, data) = value.to_wire();
    let mut inner_tree = HashMap::new();
    inner_tree.insert(
        ROOT_BRANCH.to_string(),
        vec![TreeItem {
            item_type: type_tag.to_string(),
            data,
        }],
    );
    DataTree {
        param_name: name.to_string(),
        inner_tree,
    }
}

/// Encode an ordered sequence of named parameters, preserving order.
pub fn encode_parameters(params: &[(String, ParamValue)]) -> Vec<DataTree> {
    params
        .iter()
        .map(|(name, value)| encode_parameter(name, value))
        .collect()
}

/// Find the output tree with the given parameter name.
pub fn find_output<'a>(response: &'a EvaluateResponse, param_name: &str) -> Option<&'a DataTree> {
    response.values.iter().find(|t| t.param_name == param_name)
}

/// Decode every leaf of the first branch matching `path`.
///
/// Scans the response's trees in order and picks the first one whose branch
/// map contains `path`. Fails when no tree carries the branch or the branch
/// is empty.
pub fn decode_branch(
    response: &EvaluateResponse,
    path: &str,
) -> Result<Vec<DecodedValue>, TreeError> {
    let tree = response
        .values
        .iter()
        .find(|t| t.inner_tree.contains_key(path))
        .ok_or_else(|| TreeError::BranchNotFound(path.to_string()))?;
    decode_tree_branch(tree, path)
}

/// Decode the leaves of `path` within the named output parameter.
pub fn decode_output(
    response: &EvaluateResponse,
    param_name: &str,
    path: &str,
) -> Result<Vec<DecodedValue>, TreeError> {
    let tree = find_output(response, param_name)
        .ok_or_else(|| TreeError::OutputNotFound(param_name.to_string()))?;
    decode_tree_branch(tree, path)
}

fn decode_tree_branch(tree: &DataTree, path: &str) -> Result<Vec<DecodedValue>, TreeError> {
    let items = tree
        .inner_tree
        .get(path)
        .ok_or_else(|| TreeError::BranchNotFound(path.to_string()))?;
    if items.is_empty() {
        return Err(TreeError::EmptyBranch(path.to_string()));
    }
    Ok(items.iter().map(decode_item).collect())
}

/// Decode one leaf with the ordered fallback chain:
/// geometry, then number, then plain text.
///
/// Failures of the geometry and numeric rules are swallowed; the text
/// fallback makes this total over string data.
pub fn decode_item(item: &TreeItem) -> DecodedValue {
    match &item.data {
        Value::String(raw) => {
            let text = strip_quotes(raw);

            // Geometry: the unquoted text must parse as JSON that the
            // geometry decoder accepts.
            if let Ok(json) = serde_json::from_str::<Value>(text) {
                if let Some(geometry) = Geometry::decode(&json) {
                    return DecodedValue::Geometry(geometry);
                }
            }

            // Numbers: a decimal point selects real, otherwise integer.
            if text.contains('.') {
                if let Ok(real) = text.parse::<f64>() {
                    return DecodedValue::Real(real);
                }
            } else if let Ok(int) = text.parse::<i64>() {
                return DecodedValue::Int(int);
            }

            DecodedValue::Text(text.to_string())
        }
        Value::Number(n) => {
            if let Some(int) = n.as_i64() {
                DecodedValue::Int(int)
            } else {
                DecodedValue::Real(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        other => match Geometry::decode(other) {
            Some(geometry) => DecodedValue::Geometry(geometry),
            None => DecodedValue::Text(other.to_string()),
        },
    }
}

/// Strip exactly one layer of symmetric double quotes, e.g. `"10"` -> `10`.
fn strip_quotes(raw: &str) -> &str {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(data: Value) -> TreeItem {
        TreeItem {
            item_type: "System.String".to_string(),
            data,
        }
    }

    fn response_with(trees: Vec<DataTree>) -> EvaluateResponse {
        EvaluateResponse {
            values: trees,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_encode_string() {
        let tree = encode_parameter("name", &ParamValue::from("hello"));
        assert_eq!(tree.param_name, "name");
        let items = &tree.inner_tree[ROOT_BRANCH];
        assert_eq!(items[0].item_type, "System.String");
        assert_eq!(items[0].data, Value::from("hello"));
    }

    #[test]
    fn test_encode_bool_is_never_integer() {
        for value in [true, false] {
            let tree = encode_parameter("flag", &ParamValue::Bool(value));
            let items = &tree.inner_tree[ROOT_BRANCH];
            assert_eq!(items[0].item_type, "System.Boolean");
            assert_eq!(items[0].data, Value::from(value));
        }
    }

    #[test]
    fn test_encode_whole_real_normalizes_to_integer() {
        let tree = encode_parameter("a", &ParamValue::Real(5.0));
        let items = &tree.inner_tree[ROOT_BRANCH];
        assert_eq!(items[0].item_type, "System.Int32");
        assert_eq!(items[0].data, Value::from(5));
    }

    #[test]
    fn test_encode_fractional_real() {
        let tree = encode_parameter("a", &ParamValue::Real(5.5));
        let items = &tree.inner_tree[ROOT_BRANCH];
        assert_eq!(items[0].item_type, "System.Double");
        assert_eq!(items[0].data, Value::from(5.5));
    }

    #[test]
    fn test_encode_parameters_preserves_order() {
        let params = vec![
            ("b".to_string(), ParamValue::Int(2)),
            ("a".to_string(), ParamValue::Int(1)),
            ("c".to_string(), ParamValue::Int(3)),
        ];
        let trees = encode_parameters(&params);
        let names: Vec<_> = trees.iter().map(|t| t.param_name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_param_value_untagged_deserialization() {
        let value: ParamValue = serde_json::from_str("true").unwrap();
        assert_eq!(value, ParamValue::Bool(true));

        let value: ParamValue = serde_json::from_str("7").unwrap();
        assert_eq!(value, ParamValue::Int(7));

        let value: ParamValue = serde_json::from_str("7.25").unwrap();
        assert_eq!(value, ParamValue::Real(7.25));

        let value: ParamValue = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(value, ParamValue::Str("7".to_string()));
    }

    #[test]
    fn test_decode_quoted_integer() {
        let decoded = decode_item(&leaf(Value::from("\"10\"")));
        assert_eq!(decoded, DecodedValue::Int(10));
    }

    #[test]
    fn test_decode_real() {
        let decoded = decode_item(&leaf(Value::from("2.5")));
        assert_eq!(decoded, DecodedValue::Real(2.5));
    }

    #[test]
    fn test_decode_plain_text_fallback() {
        let decoded = decode_item(&leaf(Value::from("hello")));
        assert_eq!(decoded, DecodedValue::Text("hello".to_string()));
    }

    #[test]
    fn test_decode_geometry_payload() {
        let archive = serde_json::json!({
            "version": 10,
            "archive3dm": 70,
            "opennurbs": -1_009_971_968i64,
            "type": "Rhino.Geometry.NurbsCurve",
            "data": "eJxLzs8rzs9JVQ=="
        });
        let decoded = decode_item(&leaf(Value::from(archive.to_string())));
        match decoded {
            DecodedValue::Geometry(g) => assert_eq!(g.archive, archive),
            other => panic!("expected geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_branch_picks_first_matching_tree() {
        let mut without = HashMap::new();
        without.insert("{1}".to_string(), vec![leaf(Value::from("99"))]);
        let mut with = HashMap::new();
        with.insert(DEFAULT_OUTPUT_BRANCH.to_string(), vec![leaf(Value::from("42"))]);

        let response = response_with(vec![
            DataTree {
                param_name: "skip".to_string(),
                inner_tree: without,
            },
            DataTree {
                param_name: "out".to_string(),
                inner_tree: with,
            },
        ]);

        let decoded = decode_branch(&response, DEFAULT_OUTPUT_BRANCH).unwrap();
        assert_eq!(decoded, vec![DecodedValue::Int(42)]);
    }

    #[test]
    fn test_decode_branch_missing_path() {
        let response = response_with(vec![]);
        let err = decode_branch(&response, DEFAULT_OUTPUT_BRANCH).unwrap_err();
        assert!(matches!(err, TreeError::BranchNotFound(_)));
    }

    #[test]
    fn test_decode_branch_empty() {
        let mut inner = HashMap::new();
        inner.insert(DEFAULT_OUTPUT_BRANCH.to_string(), vec![]);
        let response = response_with(vec![DataTree {
            param_name: "out".to_string(),
            inner_tree: inner,
        }]);
        let err = decode_branch(&response, DEFAULT_OUTPUT_BRANCH).unwrap_err();
        assert!(matches!(err, TreeError::EmptyBranch(_)));
    }

    #[test]
    fn test_decode_output_by_name() {
        let mut inner = HashMap::new();
        inner.insert("{0;0;0}".to_string(), vec![leaf(Value::from("3.5"))]);
        let response = response_with(vec![DataTree {
            param_name: "RH_OUT:result".to_string(),
            inner_tree: inner,
        }]);

        let decoded = decode_output(&response, "RH_OUT:result", "{0;0;0}").unwrap();
        assert_eq!(decoded, vec![DecodedValue::Real(3.5)]);

        let err = decode_output(&response, "RH_OUT:other", "{0;0;0}").unwrap_err();
        assert!(matches!(err, TreeError::OutputNotFound(_)));
    }

    #[test]
    fn test_round_trip_scalars() {
        // Responses carry leaf data as text, with strings quoted once.
        let cases: Vec<(ParamValue, DecodedValue)> = vec![
            (ParamValue::Int(10), DecodedValue::Int(10)),
            (ParamValue::Real(2.75), DecodedValue::Real(2.75)),
            (ParamValue::Real(5.0), DecodedValue::Int(5)),
            (
                ParamValue::Str("hello".to_string()),
                DecodedValue::Text("hello".to_string()),
            ),
        ];

        for (input, expected) in cases {
            let tree = encode_parameter("x", &input);
            let encoded = &tree.inner_tree[ROOT_BRANCH][0];
            let as_text = match &encoded.data {
                Value::String(s) => format!("\"{}\"", s),
                other => other.to_string(),
            };
            let decoded = decode_item(&leaf(Value::from(as_text)));
            assert_eq!(decoded, expected, "round trip failed for {:?}", input);
        }
    }

    #[test]
    fn test_response_preserves_extra_fields() {
        let raw = serde_json::json!({
            "pointer": "definitions/add.gh",
            "values": []
        });
        let response: EvaluateResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(
            response.extra.get("pointer"),
            Some(&Value::from("definitions/add.gh"))
        );
    }
}
