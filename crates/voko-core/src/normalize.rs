//! Normalization layer for tool-call payloads.
//!
//! The remote agent's tool-call arguments are loosely typed: they may arrive
//! as a JSON string instead of an object, and field names have drifted across
//! agent-prompt revisions (`item` vs `text`, `name` vs `label`, `target` vs
//! `value`). Every function here is pure and total - malformed input degrades
//! to defaults instead of failing the update, so a bad payload never breaks
//! the session.

use serde_json::{Map, Value};

use crate::session::model::{
    Impact, Initiative, KeyResult, Kpi, Okr, Output, SectionStatus, TodoItem, WorkspaceSection,
};

/// Result of normalizing an `update_todos` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoUpdate {
    pub todos: Vec<TodoItem>,
    /// `None` means the field was omitted (preserve the existing memo);
    /// `Some("")` means the agent explicitly cleared it.
    pub understanding: Option<String>,
}

/// Result of normalizing an `update_workspace` payload.
///
/// Each `Some` field replaces the corresponding view-model field wholesale;
/// `None` means the agent omitted it and the existing value is preserved.
/// Both the checklist-oriented variant (`impact`/`outcome`/`output`) and the
/// section-oriented variant (`sections`/`okr`) decode into this one shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkspaceUpdate {
    pub impact: Option<Impact>,
    pub outcome: Option<Okr>,
    pub output: Option<Output>,
    pub sections: Option<Vec<WorkspaceSection>>,
    pub understanding: Option<String>,
}

impl WorkspaceUpdate {
    pub fn is_empty(&self) -> bool {
        self.impact.is_none()
            && self.outcome.is_none()
            && self.output.is_none()
            && self.sections.is_none()
            && self.understanding.is_none()
    }
}

/// Coerces a raw tool-call argument payload into a JSON object map.
///
/// Payloads may arrive as an already-structured object or as a string that
/// still needs parsing. A string that fails to parse, or any non-object
/// value, yields an empty map (fail open, not closed).
pub fn coerce_args(raw: Value) -> Map<String, Value> {
    match raw {
        Value::Object(map) => map,
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

/// Normalizes one raw checklist entry.
///
/// Text is resolved from `text`, else `item`, else a synthesized
/// `"Step {i+1}"` placeholder; the id falls back to `"step-{i+1}"`.
/// `completed` is true only for the literal JSON boolean `true` - truthy
/// strings and numbers are deliberately treated as false.
pub fn normalize_todo(raw: &Value, index: usize) -> TodoItem {
    let fields = raw.as_object();

    let text = fields
        .and_then(|map| scalar_string(map.get("text")?))
        .or_else(|| fields.and_then(|map| scalar_string(map.get("item")?)))
        .unwrap_or_else(|| format!("Step {}", index + 1));

    let id = fields
        .and_then(|map| map.get("id")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| format!("step-{}", index + 1));

    let completed = matches!(
        fields.and_then(|map| map.get("completed")),
        Some(Value::Bool(true))
    );

    TodoItem {
        id,
        text,
        completed,
    }
}

/// Normalizes one raw KPI entry.
///
/// Accepts a bare string (becomes the label) or an object with alternate
/// key names (`name` for `label`, `target` for `value`). Anything else is
/// rejected and dropped from the list.
pub fn normalize_kpi(raw: &Value) -> Option<Kpi> {
    match raw {
        Value::String(label) => Some(Kpi {
            label: label.clone(),
            value: String::new(),
            description: String::new(),
        }),
        Value::Object(map) => Some(Kpi {
            label: first_string(map, &["label", "name"]),
            value: first_string(map, &["value", "target"]),
            description: first_string(map, &["description"]),
        }),
        _ => None,
    }
}

/// Normalizes one raw key result. A bare string becomes the result text;
/// progress is clamped to 0-100 and defaults to 0.
pub fn normalize_key_result(raw: &Value) -> Option<KeyResult> {
    match raw {
        Value::String(text) => Some(KeyResult {
            label: String::new(),
            text: text.clone(),
            progress: 0,
        }),
        Value::Object(map) => Some(KeyResult {
            label: first_string(map, &["label"]),
            text: first_string(map, &["text"]),
            progress: map
                .get("progress")
                .and_then(Value::as_f64)
                .map(|p| p.clamp(0.0, 100.0) as u8)
                .unwrap_or(0),
        }),
        _ => None,
    }
}

fn normalize_initiative(raw: &Value) -> Option<Initiative> {
    match raw {
        Value::String(text) => Some(Initiative {
            text: text.clone(),
            linked_kr: String::new(),
        }),
        Value::Object(map) => Some(Initiative {
            text: first_string(map, &["text"]),
            linked_kr: first_string(map, &["linked_kr"]),
        }),
        _ => None,
    }
}

fn normalize_okr(raw: &Map<String, Value>) -> Okr {
    Okr {
        objective: first_string(raw, &["objective"]),
        key_results: raw
            .get("key_results")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(normalize_key_result).collect())
            .unwrap_or_default(),
    }
}

fn normalize_section(raw: &Value, index: usize) -> WorkspaceSection {
    let fields = raw.as_object();

    WorkspaceSection {
        id: fields
            .and_then(|map| map.get("id")?.as_str().map(str::to_owned))
            .unwrap_or_else(|| format!("section-{}", index + 1)),
        title: fields
            .map(|map| first_string(map, &["title"]))
            .unwrap_or_default(),
        status: fields
            .and_then(|map| map.get("status")?.as_str().map(parse_section_status))
            .unwrap_or_default(),
        summary: fields
            .map(|map| first_string(map, &["summary"]))
            .unwrap_or_default(),
    }
}

fn parse_section_status(raw: &str) -> SectionStatus {
    match raw {
        "active" => SectionStatus::Active,
        "completed" => SectionStatus::Completed,
        _ => SectionStatus::Pending,
    }
}

/// Decodes an `update_todos` payload into a typed update.
pub fn parse_todo_update(raw: Value) -> TodoUpdate {
    let args = coerce_args(raw);

    let todos = args
        .get("todos")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| normalize_todo(item, index))
                .collect()
        })
        .unwrap_or_default();

    let understanding = args
        .get("understanding")
        .and_then(Value::as_str)
        .map(str::to_owned);

    TodoUpdate {
        todos,
        understanding,
    }
}

/// Decodes an `update_workspace` payload into a typed update.
///
/// Handles both schema variants in one pass: the checklist-oriented variant
/// sends `impact`/`outcome`/`output`, the section-oriented variant sends
/// `sections` plus `okr`. A top-level `strategy` string is accepted when no
/// `impact` object is present - some agent revisions put it there.
pub fn parse_workspace_update(raw: Value) -> WorkspaceUpdate {
    let args = coerce_args(raw);

    let mut impact = args.get("impact").and_then(Value::as_object).map(|map| {
        let kpis = map
            .get("kpis")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(normalize_kpi).collect())
            .unwrap_or_default();
        Impact {
            strategy: map.get("strategy").and_then(Value::as_str).map(str::to_owned),
            kpis,
        }
    });

    if impact.is_none() {
        if let Some(strategy) = args.get("strategy").and_then(Value::as_str) {
            impact = Some(Impact {
                strategy: Some(strategy.to_owned()),
                kpis: Vec::new(),
            });
        }
    }

    let outcome = args
        .get("outcome")
        .or_else(|| args.get("okr"))
        .and_then(Value::as_object)
        .map(normalize_okr);

    let output = args.get("output").and_then(Value::as_object).map(|map| Output {
        initiatives: map
            .get("initiatives")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(normalize_initiative).collect())
            .unwrap_or_default(),
    });

    let sections = args.get("sections").and_then(Value::as_array).map(|items| {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| normalize_section(item, index))
            .collect()
    });

    let understanding = args
        .get("understanding")
        .and_then(Value::as_str)
        .map(str::to_owned);

    WorkspaceUpdate {
        impact,
        outcome,
        output,
        sections,
        understanding,
    }
}

/// Renders a scalar JSON value as a string. Arrays, objects and null are
/// rejected so structural garbage never leaks into display text.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn first_string(map: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(scalar_string))
        .unwrap_or_default()
}
