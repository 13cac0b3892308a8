use {super::error::CoreError, serde_json::Value, uuid::Uuid};

/// Business identifiers live in provider-event metadata under names that
/// have drifted over time. Each lookup is an explicit ordered list of
/// candidate keys; the first present wins.
pub const BUYER_KEYS: &[&str] = &["buyer_id", "buyerId", "user_id", "customer_ref"];
pub const PROMPT_KEYS: &[&str] = &["prompt_id", "promptId", "item_id", "listing_id"];
pub const SELLER_KEYS: &[&str] = &["seller_id", "sellerId", "merchant_id", "account_ref"];

/// First-present string lookup over candidate keys.
pub fn first_present<'a>(metadata: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| metadata.get(k).and_then(Value::as_str))
}

/// A missing required key is a validation error (400, not retried),
/// never a database error.
pub fn required_uuid(metadata: &Value, keys: &[&str]) -> Result<Uuid, CoreError> {
    let raw = first_present(metadata, keys).ok_or_else(|| {
        CoreError::Validation(format!("missing required metadata key (any of {keys:?})"))
    })?;
    Uuid::parse_str(raw)
        .map_err(|_| CoreError::Validation(format!("metadata key {keys:?} is not a uuid: {raw}")))
}

pub fn optional_uuid(metadata: &Value, keys: &[&str]) -> Result<Option<Uuid>, CoreError> {
    match first_present(metadata, keys) {
        None => Ok(None),
        Some(raw) => Uuid::parse_str(raw).map(Some).map_err(|_| {
            CoreError::Validation(format!("metadata key {keys:?} is not a uuid: {raw}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_candidate_wins() {
        let id_a = Uuid::now_v7();
        let id_b = Uuid::now_v7();
        let meta = json!({ "buyer_id": id_a.to_string(), "user_id": id_b.to_string() });
        assert_eq!(required_uuid(&meta, BUYER_KEYS).unwrap(), id_a);
    }

    #[test]
    fn falls_back_to_later_candidates() {
        let id = Uuid::now_v7();
        let meta = json!({ "user_id": id.to_string() });
        assert_eq!(required_uuid(&meta, BUYER_KEYS).unwrap(), id);
    }

    #[test]
    fn missing_required_key_is_validation_error() {
        let meta = json!({ "unrelated": "x" });
        assert!(matches!(
            required_uuid(&meta, PROMPT_KEYS),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn malformed_uuid_is_validation_error() {
        let meta = json!({ "prompt_id": "not-a-uuid" });
        assert!(matches!(
            required_uuid(&meta, PROMPT_KEYS),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn optional_absent_is_none() {
        let meta = json!({});
        assert_eq!(optional_uuid(&meta, SELLER_KEYS).unwrap(), None);
    }

    #[test]
    fn non_string_values_are_skipped() {
        let id = Uuid::now_v7();
        let meta = json!({ "buyer_id": 42, "user_id": id.to_string() });
        assert_eq!(required_uuid(&meta, BUYER_KEYS).unwrap(), id);
    }
}
