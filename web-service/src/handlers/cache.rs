use crate::AppState;
use serde_json::Value;
use service_core::axum::extract::{Path, Query, State};
use service_core::error::AppError;
use service_core::json_api::{no_metadata, JsonApi};

/// Lifetime of values written through `POST /cache`.
pub const CACHE_ENTRY_EXPIRY_SECONDS: u64 = 600;

pub async fn get_cached(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<JsonApi<Value>, AppError> {
    let value = match state.cache.get(&key).await {
        // An absent key reads as JSON null.
        Ok(None) => Value::Null,
        Ok(Some(raw)) => serde_json::from_str::<Value>(&raw).map_err(|e| {
            tracing::warn!(key = %key, error = %e, "Cached value is not JSON");
            not_found()
        })?,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Cache read failed");
            return Err(not_found());
        }
    };

    Ok(JsonApi::success(value, "Data retrieved correctly.", no_metadata()))
}

fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Data not found."))
}

pub async fn cache_index() -> AppError {
    AppError::Forbidden(anyhow::anyhow!(
        "There is no data available at this endpoint."
    ))
}

/// Stores each query key as JSON: a single value as a string, a repeated key
/// as an array of its values in request order.
pub async fn store_cached(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<JsonApi<bool>, AppError> {
    let entries = group_by_key(pairs);
    let stored = entries.len();

    for (key, mut values) in entries {
        let value = if values.len() == 1 {
            Value::String(values.remove(0))
        } else {
            Value::Array(values.into_iter().map(Value::String).collect())
        };
        let encoded = serde_json::to_string(&value).map_err(anyhow::Error::new)?;
        state
            .cache
            .set(&key, &encoded, CACHE_ENTRY_EXPIRY_SECONDS)
            .await
            .map_err(|e| {
                tracing::error!(key = %key, error = %e, "Cache write failed");
                AppError::InternalError(e)
            })?;
    }

    tracing::debug!(stored, "Cache entries stored");
    Ok(JsonApi::success(
        true,
        "Input processed and stored correctly.",
        no_metadata(),
    ))
}

/// Keys in order of first appearance, each with all of its values.
fn group_by_key(pairs: Vec<(String, String)>) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in pairs {
        match grouped.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, values)) => values.push(value),
            None => grouped.push((key, vec![value])),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn repeated_keys_collect_their_values_in_order() {
        let grouped = group_by_key(vec![
            pair("tag", "a"),
            pair("city", "Lisbon"),
            pair("tag", "b"),
        ]);

        assert_eq!(
            grouped,
            vec![
                ("tag".to_string(), vec!["a".to_string(), "b".to_string()]),
                ("city".to_string(), vec!["Lisbon".to_string()]),
            ]
        );
    }
}
