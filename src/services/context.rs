//! Packs and unpacks the caller-held session, and folds the request's
//! optional input shapes into one canonical turn.

use serde_json::{Map, Value};

use crate::models::{BookingAnswers, BookingState, TenantConfig, Turn, TurnRequest};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("malformed answers blob: {0}")]
    MalformedAnswers(String),
    #[error("unknown booking state: {0}")]
    UnknownState(String),
}

/// Answers values are strings on the wire; scalars of other types are
/// stringified and nulls dropped.
fn coerce_strings(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(_) => Some((key, value)),
            Value::Number(n) => Some((key, Value::String(n.to_string()))),
            Value::Bool(b) => Some((key, Value::String(b.to_string()))),
            other => Some((key, Value::String(other.to_string()))),
        })
        .collect()
}

/// Accepts a JSON string, an object, or nothing.
pub fn unpack_answers(blob: Option<&Value>) -> Result<BookingAnswers, ContextError> {
    let object = match blob {
        None | Some(Value::Null) => return Ok(BookingAnswers::default()),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(BookingAnswers::default()),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => return Ok(BookingAnswers::default()),
            Ok(_) => return Err(ContextError::MalformedAnswers("expected an object".to_string())),
            Err(e) => return Err(ContextError::MalformedAnswers(e.to_string())),
        },
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(ContextError::MalformedAnswers("expected an object".to_string())),
    };
    serde_json::from_value(Value::Object(coerce_strings(object)))
        .map_err(|e| ContextError::MalformedAnswers(e.to_string()))
}

pub fn pack_answers(answers: &BookingAnswers) -> String {
    serde_json::to_string(answers).unwrap_or_else(|_| "{}".to_string())
}

/// A missing or blank state is the start of a conversation.
pub fn parse_state(raw: Option<&str>) -> Result<BookingState, ContextError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(BookingState::Initial),
        Some(s) => BookingState::parse(s).ok_or_else(|| ContextError::UnknownState(s.to_string())),
    }
}

fn parse_tenant(value: &Value) -> Option<TenantConfig> {
    let parsed = match value {
        Value::Null => return None,
        Value::String(s) => serde_json::from_str::<TenantConfig>(s),
        other => serde_json::from_value::<TenantConfig>(other.clone()),
    };
    match parsed {
        Ok(tenant) => Some(tenant),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unparsable tenant config");
            None
        }
    }
}

/// Everything the state machine needs for one turn.
#[derive(Debug, Clone)]
pub struct NormalizedTurn {
    pub state: BookingState,
    pub answers: BookingAnswers,
    pub turn: Turn,
    pub tenant: TenantConfig,
    /// Set when the incoming session could not be used and was reset.
    pub recovery: Option<ContextError>,
}

/// Top-level request keys win over the nested `context` wrapper.
fn flatten(mut request: TurnRequest) -> TurnRequest {
    let Some(nested) = request.context.take() else {
        return request;
    };
    let nested = flatten(*nested);
    TurnRequest {
        current_state: request.current_state.or(nested.current_state),
        answers: request.answers.or(nested.answers),
        raw_text: request.raw_text.or(nested.raw_text),
        action_token: request
            .action_token
            .filter(|t| !t.trim().is_empty())
            .or(nested.action_token),
        tenant_config: request.tenant_config.or(nested.tenant_config),
        context: None,
    }
}

pub fn normalize(request: TurnRequest, default_tenant: &TenantConfig) -> NormalizedTurn {
    let request = flatten(request);

    let tenant = request
        .tenant_config
        .as_ref()
        .and_then(parse_tenant)
        .unwrap_or_else(|| default_tenant.clone());
    let turn = Turn::new(request.raw_text, request.action_token.as_deref());

    let session = unpack_answers(request.answers.as_ref())
        .and_then(|answers| parse_state(request.current_state.as_deref()).map(|s| (s, answers)));

    match session {
        Ok((state, answers)) => NormalizedTurn {
            state,
            answers,
            turn,
            tenant,
            recovery: None,
        },
        Err(err) => {
            tracing::warn!(error = %err, "resetting booking session");
            NormalizedTurn {
                state: BookingState::Initial,
                answers: BookingAnswers::default(),
                turn,
                tenant,
                recovery: Some(err),
            }
        }
    }
}
