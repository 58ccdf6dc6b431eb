use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetKeyError {
    #[error("asset key must not be empty")]
    Empty,
    #[error("asset key must not start with '/'")]
    LeadingSlash,
    #[error("asset key must not contain '\\\\'")]
    Backslash,
    #[error("asset key must not contain '..'")]
    ParentTraversal,
    #[error("asset key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
    #[error("path '{reference}' escapes the assets root when resolved from '{base}'")]
    EscapesRoot { base: String, reference: String },
}

/// Asset keys are `/`-separated paths relative to the assets root, file
/// extension included (`graphics/objects/tree.png`).
pub fn validate_asset_key(key: &str) -> Result<(), AssetKeyError> {
    if key.is_empty() {
        return Err(AssetKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(AssetKeyError::LeadingSlash);
    }
    if key.contains('\\') {
        return Err(AssetKeyError::Backslash);
    }
    if key.split('/').any(|segment| segment == "..") {
        return Err(AssetKeyError::ParentTraversal);
    }
    for ch in key.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '/' | '-' | '.' | ' ') {
            continue;
        }
        return Err(AssetKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

/// Resolves `reference` (as written inside a map or tileset) against the
/// directory key `base_dir`, folding `.` and `..` lexically.
pub fn resolve_relative_key(base_dir: &str, reference: &str) -> Result<String, AssetKeyError> {
    let reference = reference.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    let starting = if reference.starts_with('/') {
        ""
    } else {
        base_dir
    };
    for segment in starting.split('/').chain(reference.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(AssetKeyError::EscapesRoot {
                        base: base_dir.to_string(),
                        reference: reference.clone(),
                    });
                }
            }
            other => segments.push(other),
        }
    }
    let key = segments.join("/");
    validate_asset_key(&key)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_keys() {
        for key in [
            "graphics/player/down/0.png",
            "maps/Room_2.tmx",
            "graphics/stickers/sticker_1_64x64.png",
        ] {
            assert!(validate_asset_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_invalid_keys() {
        for key in ["", "/a.png", "..", "a/../b.png", r"a\b.png", "a?.png"] {
            assert!(validate_asset_key(key).is_err(), "key={key}");
        }
    }

    #[test]
    fn relative_reference_resolves_against_map_directory() {
        let key = resolve_relative_key("maps", "../graphics/tilesets/grass.png").expect("key");
        assert_eq!(key, "graphics/tilesets/grass.png");

        let same_dir = resolve_relative_key("maps", "./tiles.tsx").expect("key");
        assert_eq!(same_dir, "maps/tiles.tsx");
    }

    #[test]
    fn windows_separators_are_normalized() {
        let key = resolve_relative_key("maps", r"..\graphics\objects\tree.png").expect("key");
        assert_eq!(key, "graphics/objects/tree.png");
    }

    #[test]
    fn escaping_the_root_is_an_error() {
        let error = resolve_relative_key("maps", "../../secret.png").expect_err("escape");
        assert!(matches!(error, AssetKeyError::EscapesRoot { .. }));
    }
}
