use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Code {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// Accepts identifiers and schedule entries written either as JSON strings or
/// as bare numbers.
pub(super) fn deserialize_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Code::deserialize(deserializer)? {
        Code::Text(text) => text,
        Code::Integer(value) => value.to_string(),
        Code::Float(value) => value.to_string(),
    })
}
