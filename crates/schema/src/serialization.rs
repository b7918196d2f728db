//! Loading schema documents
//!
//! A schema document is a JSON object. Objects carrying `__type__` are
//! leaves, every other object is a group whose plain keys are its children.
//! Reserved keys all start with a double underscore:
//!
//! | key            | where  | meaning                                   |
//! |----------------|--------|-------------------------------------------|
//! | `__type__`     | leaf   | semantic type tag                          |
//! | `__optional__` | leaf   | null is acceptable                         |
//! | `__minimum__`  | leaf   | lower bound                                |
//! | `__maximum__`  | leaf   | upper bound                                |
//! | `__options__`  | leaf   | acceptable values or `[value, label]` pairs |
//! | `__regex__`    | leaf   | pattern text values must match             |
//! | `__ui__`       | both   | display hints                              |
//! | `__name__`     | root   | schema name                                |

use crate::hints::DisplayHints;
use crate::leaf::{Bound, LeafNode, Pattern};
use crate::node::{GroupNode, SchemaNode, join_path};
use crate::tree::SchemaTree;
use crm_core::{ConsoleError, ConsoleResult, SelectOption, SemanticType, value_text};
use serde_json::{Map, Value};
use std::path::Path;

// ============================================================================
// Constants
// ============================================================================

pub const TYPE_KEY: &str = "__type__";
pub const OPTIONAL_KEY: &str = "__optional__";
pub const MINIMUM_KEY: &str = "__minimum__";
pub const MAXIMUM_KEY: &str = "__maximum__";
pub const OPTIONS_KEY: &str = "__options__";
pub const REGEX_KEY: &str = "__regex__";
pub const UI_KEY: &str = "__ui__";
pub const NAME_KEY: &str = "__name__";

/// Name given to a schema whose document has no `__name__`
pub const DEFAULT_SCHEMA_NAME: &str = "record";

// ============================================================================
// Load Functions
// ============================================================================

/// Load a schema tree from a file
///
/// # Example
///
/// ```rust,ignore
/// use crm_schema::load_tree;
///
/// let tree = load_tree("schemas/customer.json").unwrap();
/// println!("Loaded schema: {}", tree.title());
/// ```
pub fn load_tree(path: impl AsRef<Path>) -> ConsoleResult<SchemaTree> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| ConsoleError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    tree_from_str(&json).map_err(|e| match e {
        ConsoleError::Json(je) => ConsoleError::FileRead {
            path: path.to_path_buf(),
            message: format!("Invalid schema document: {}", je),
        },
        other => other,
    })
}

/// Load a schema tree from a JSON string
pub fn tree_from_str(json: &str) -> ConsoleResult<SchemaTree> {
    let value: Value = serde_json::from_str(json)?;
    tree_from_value(&value)
}

/// Build a schema tree from a parsed JSON document
pub fn tree_from_value(value: &Value) -> ConsoleResult<SchemaTree> {
    let object = value
        .as_object()
        .ok_or_else(|| ConsoleError::invalid_schema("<root>", "schema document must be an object"))?;

    let name = match object.get(NAME_KEY) {
        None => DEFAULT_SCHEMA_NAME.to_string(),
        Some(Value::String(name)) => name.clone(),
        Some(_) => {
            return Err(ConsoleError::invalid_schema(
                "<root>",
                "__name__ must be a string",
            ));
        }
    };

    if object.contains_key(TYPE_KEY) {
        return Err(ConsoleError::invalid_schema(
            "<root>",
            "the root of a schema must be a group",
        ));
    }

    let root = parse_group("", object, true)?;
    SchemaTree::new(name, root)
}

/// Parse a single node document
pub fn node_from_value(path: &str, value: &Value) -> ConsoleResult<SchemaNode> {
    let object = value
        .as_object()
        .ok_or_else(|| ConsoleError::invalid_schema(path, "node must be an object"))?;

    if object.contains_key(TYPE_KEY) {
        Ok(parse_leaf(path, object)?.into())
    } else {
        Ok(parse_group(path, object, false)?.into())
    }
}

fn parse_hints(path: &str, object: &Map<String, Value>) -> ConsoleResult<DisplayHints> {
    match object.get(UI_KEY) {
        None => Ok(DisplayHints::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| ConsoleError::invalid_schema(path, format!("bad __ui__: {}", e))),
    }
}

fn parse_group(path: &str, object: &Map<String, Value>, is_root: bool) -> ConsoleResult<GroupNode> {
    let mut group = GroupNode::new().with_hints(parse_hints(path, object)?);

    for (key, value) in object {
        match key.as_str() {
            UI_KEY => {}
            NAME_KEY if is_root => {}
            reserved if reserved.starts_with("__") => {
                return Err(ConsoleError::invalid_schema(
                    join_path(path, reserved),
                    "unexpected reserved key in group",
                ));
            }
            child => group.add_child(child, node_from_value(&join_path(path, child), value)?),
        }
    }

    Ok(group)
}

fn parse_leaf(path: &str, object: &Map<String, Value>) -> ConsoleResult<LeafNode> {
    let type_name = object
        .get(TYPE_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| ConsoleError::invalid_schema(path, "__type__ must be a string"))?;
    let semantic_type: SemanticType = type_name
        .parse()
        .map_err(|_| ConsoleError::unknown_type(path, type_name))?;

    let mut leaf = LeafNode::new(semantic_type).with_hints(parse_hints(path, object)?);

    for (key, value) in object {
        match key.as_str() {
            TYPE_KEY | UI_KEY => {}
            OPTIONAL_KEY => {
                leaf.optional = value.as_bool().ok_or_else(|| {
                    ConsoleError::invalid_schema(path, "__optional__ must be a boolean")
                })?;
            }
            MINIMUM_KEY => leaf.minimum = Some(Bound::from_json(path, semantic_type, value)?),
            MAXIMUM_KEY => leaf.maximum = Some(Bound::from_json(path, semantic_type, value)?),
            OPTIONS_KEY => {
                let options = value.as_array().ok_or_else(|| {
                    ConsoleError::invalid_schema(path, "__options__ must be a list")
                })?;
                let (values, labels) = parse_options(options);
                leaf.options = Some(values);
                leaf.option_labels = labels;
            }
            REGEX_KEY => {
                let source = value.as_str().ok_or_else(|| {
                    ConsoleError::invalid_schema(path, "__regex__ must be a string")
                })?;
                leaf.pattern = Some(Pattern::new(path, source)?);
            }
            other => {
                return Err(ConsoleError::invalid_schema(
                    path,
                    format!("unexpected key '{}' in leaf", other),
                ));
            }
        }
    }

    leaf.compile_hints(path)
}

/// Split an option list into values and, when any entry is a
/// `[value, label]` pair, the labelled select options
fn parse_options(options: &[Value]) -> (Vec<Value>, Option<Vec<SelectOption>>) {
    let mut labelled = false;
    let (values, labels): (Vec<Value>, Vec<SelectOption>) = options
        .iter()
        .map(|option| match option.as_array().map(Vec::as_slice) {
            Some([value, label]) => {
                labelled = true;
                (value.clone(), SelectOption::new(value_text(value), value_text(label)))
            }
            _ => (option.clone(), SelectOption::same(value_text(option))),
        })
        .unzip();
    (values, labelled.then_some(labels))
}

// ============================================================================
// Tests
// ============================================================================
