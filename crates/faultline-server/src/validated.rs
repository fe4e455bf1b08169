use std::any::TypeId;
use std::sync::{Arc, OnceLock};

use axum::Json;
use axum::extract::{FromRequest, Request, rejection::JsonRejection};
use dashmap::DashMap;
use faultline_core::{Failure, PathSegment, SchemaIssue, SchemaViolation, Unclassified};
use jsonschema::{ValidationError, Validator, error::ValidationErrorKind};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// JSON body checked against the schema derived for `T`
///
/// Violations are reported all at once as a schema failure. A body that is
/// not JSON at all is rejected with the status the JSON extractor chose.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + JsonSchema + 'static,
{
    type Rejection = Failure;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(request, state)
            .await
            .map_err(body_rejection)?;

        let compiled = compiled::<T>()?;
        let issues: Vec<SchemaIssue> = compiled
            .validator
            .iter_errors(&value)
            .map(|e| issue(&compiled.schema, &e))
            .collect();
        if !issues.is_empty() {
            return Err(SchemaViolation::new(issues).into());
        }

        serde_json::from_value(value).map(Self).map_err(|e| {
            Unclassified::from_error(&e)
                .with_status(422)
                .with_message(format!("Failed to deserialize the JSON body: {e}"))
                .into()
        })
    }
}

fn body_rejection(rejection: JsonRejection) -> Failure {
    Unclassified::from_error(&rejection)
        .with_status(rejection.status().as_u16())
        .with_message(rejection.body_text())
        .into()
}

/// Validator together with the schema it was compiled from
struct Compiled {
    validator: Validator,
    schema: Value,
}

/// Convert one validator error into an issue
///
/// A missing required property is reported at the property itself rather
/// than at the object that lacks it.
fn issue(schema: &Value, err: &ValidationError<'_>) -> SchemaIssue {
    let mut path = PathSegment::from_pointer(&err.instance_path.to_string());
    let keyword = schema_keyword(schema, &err.schema_path.to_string());

    let message = match &err.kind {
        ValidationErrorKind::Required { property } => {
            let name = property.as_str().map_or_else(|| property.to_string(), str::to_owned);
            let expected = keyword
                .and_then(|required| required.parent)
                .and_then(|object| object.get("properties"))
                .and_then(|properties| properties.get(&name))
                .and_then(|property| expected_type(schema, property));
            path.push(PathSegment::Key(name));

            expected.map_or_else(
                || "Required".to_owned(),
                |expected| format!("Invalid input: expected {expected}, received undefined"),
            )
        }
        ValidationErrorKind::Type { .. } => keyword
            .and_then(|k| k.value.as_str())
            .map_or_else(
                || err.to_string(),
                |expected| format!("Invalid input: expected {expected}, received {}", json_type(&err.instance)),
            ),
        _ => err.to_string(),
    };

    SchemaIssue::new(path, message)
}

/// Keyword reached by a validator schema path, with the schema object holding it
struct Keyword<'a> {
    parent: Option<&'a Value>,
    value: &'a Value,
}

/// Walk a schema path, following local `$ref`s the way the validator did
fn schema_keyword<'a>(root: &'a Value, pointer: &str) -> Option<Keyword<'a>> {
    let mut parent = None;
    let mut current = root;

    for raw in pointer.split('/').skip(1) {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        if segment == "$ref" {
            current = resolve_ref(root, current)?;
            continue;
        }

        if current.get(&segment).is_none() && current.get("$ref").is_some() {
            current = resolve_ref(root, current)?;
        }

        parent = Some(current);
        current = match current {
            Value::Object(map) => map.get(&segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(Keyword { parent, value: current })
}

fn resolve_ref<'a>(root: &'a Value, schema: &'a Value) -> Option<&'a Value> {
    let reference = schema.get("$ref")?.as_str()?;
    root.pointer(reference.strip_prefix('#')?)
}

fn expected_type<'a>(root: &'a Value, property: &'a Value) -> Option<&'a str> {
    let property = if property.get("$ref").is_some() {
        resolve_ref(root, property)?
    } else {
        property
    };
    property.get("type")?.as_str()
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn compiled<T: JsonSchema + 'static>() -> Result<Arc<Compiled>, Failure> {
    static VALIDATORS: OnceLock<DashMap<TypeId, Arc<Compiled>>> = OnceLock::new();
    let validators = VALIDATORS.get_or_init(DashMap::new);

    if let Some(compiled) = validators.get(&TypeId::of::<T>()) {
        return Ok(Arc::clone(&compiled));
    }

    let schema = schemars::schema_for!(T).as_value().clone();
    let validator = jsonschema::validator_for(&schema).map_err(|e| {
        tracing::error!(schema = %T::schema_name(), error = %e, "request schema does not compile");
        Failure::from(Unclassified::new().with_message("Invalid request schema"))
    })?;

    let compiled = Arc::new(Compiled { validator, schema });
    validators.insert(TypeId::of::<T>(), Arc::clone(&compiled));
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use faultline_core::classify;
    use http::StatusCode;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct Payload {
        user: User,
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct User {
        role: String,
        #[serde(default)]
        tags: Vec<String>,
    }

    fn request(body: &str, content_type: &str) -> Request {
        http::Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", content_type)
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn extract(body: &str) -> Result<ValidatedJson<Payload>, Failure> {
        ValidatedJson::<Payload>::from_request(request(body, "application/json"), &()).await
    }

    #[tokio::test]
    async fn valid_body_passes() {
        let ValidatedJson(body) = extract(r#"{"user":{"role":"admin"}}"#).await.unwrap();
        assert_eq!(body.user.role, "admin");
        assert!(body.user.tags.is_empty());
    }

    #[tokio::test]
    async fn missing_property_points_at_property() {
        let carrier = classify(extract(r#"{"user":{}}"#).await.unwrap_err());

        assert_eq!(carrier.status(), StatusCode::BAD_REQUEST);
        assert_eq!(carrier.message(), "Validation Error");
        assert_eq!(carrier.problems().len(), 1);
        assert_eq!(carrier.problems()[0].path, "role");
        assert_eq!(
            carrier.problems()[0].message,
            "Invalid input: expected string, received undefined"
        );
    }

    #[tokio::test]
    async fn unknown_key_points_at_container() {
        let carrier = classify(extract(r#"{"user":{"role":"admin","rolex":1}}"#).await.unwrap_err());
        assert_eq!(carrier.problems()[0].path, "user");
    }

    #[tokio::test]
    async fn every_violation_is_reported() {
        let carrier = classify(extract(r#"{"user":{"role":5,"tags":["a",7]}}"#).await.unwrap_err());

        let paths: Vec<_> = carrier.problems().iter().map(|p| p.path.as_str()).collect();
        assert!(paths.contains(&"role"));
        assert!(paths.contains(&"1"));

        let role = carrier.problems().iter().find(|p| p.path == "role").unwrap();
        assert_eq!(role.message, "Invalid input: expected string, received number");
    }

    #[tokio::test]
    async fn malformed_json_keeps_extractor_status() {
        let carrier = classify(extract(r#"{"user":"#).await.unwrap_err());
        assert_eq!(carrier.status(), StatusCode::BAD_REQUEST);
        assert!(carrier.problems().is_empty());
    }

    #[tokio::test]
    async fn body_rejection_keeps_source_in_trace() {
        let carrier = classify(extract(r#"{"user":"#).await.unwrap_err());
        assert!(carrier.message().starts_with("Failed to parse the request body as JSON"));
        assert!(carrier.trace().is_some_and(|t| !t.is_empty()));
    }

    #[tokio::test]
    async fn wrong_content_type_is_415() {
        let err = ValidatedJson::<Payload>::from_request(request("{}", "text/plain"), &())
            .await
            .unwrap_err();
        assert_eq!(classify(err).status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn validators_are_cached() {
        let first = compiled::<User>().unwrap();
        let second = compiled::<User>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
