use uuid::Uuid;

/// Fresh UUID v4 string for pre-filling the account id field.
pub fn new_opaque_id() -> String {
    Uuid::new_v4().to_string()
}
