//! Deserialization with JSON-path context in error messages.
//!
//! Manifests and fixtures nest descriptors several levels deep; a bare serde
//! error does not say which declaration or field went wrong.

use serde::de::DeserializeOwned;

pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(describe)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(describe)
}

fn describe(err: serde_path_to_error::Error<serde_json::Error>) -> String {
    let path = err.path().to_string();
    format!("at JSON path {path} → {}", err.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;

    #[derive(serde::Deserialize, Debug)]
    struct Holder {
        items: Vec<Descriptor>,
    }

    #[test]
    fn error_names_the_failing_path() {
        let src = r#"{"items": [{"kind": "any"}, {"kind": "date"}]}"#;
        let err = from_str_with_path::<Holder>(src).unwrap_err();
        assert!(err.contains("items[1]"), "{err}");
        assert!(err.contains("kind `date`"), "{err}");
    }

    #[test]
    fn slices_decode_too() {
        let h = from_slice_with_path::<Holder>(br#"{"items": []}"#).unwrap();
        assert!(h.items.is_empty());
    }
}
