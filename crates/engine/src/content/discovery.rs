use std::fs;
use std::io;
use std::path::Path;

/// Asset keys of every `.png` directly inside `dir_key`, sorted by name.
/// A missing directory yields no keys.
pub fn discover_png_keys(assets_dir: &Path, dir_key: &str) -> io::Result<Vec<String>> {
    let dir_key = dir_key.trim_end_matches('/');
    let entries = match fs::read_dir(assets_dir.join(dir_key)) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error),
    };

    let mut keys = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let is_png = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png {
            keys.push(format!("{dir_key}/{file_name}"));
        }
    }
    keys.sort();
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn lists_png_keys_in_lexicographic_order() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("images").join("player").join("down");
        fs::create_dir_all(dir.join("nested")).expect("mkdir");
        for name in ["walk_2.png", "walk_10.png", "walk_1.png", "notes.txt"] {
            fs::write(dir.join(name), b"x").expect("write");
        }

        let keys = discover_png_keys(temp.path(), "images/player/down").expect("keys");
        assert_eq!(
            keys,
            vec![
                "images/player/down/walk_1.png",
                "images/player/down/walk_10.png",
                "images/player/down/walk_2.png",
            ]
        );
    }

    #[test]
    fn missing_directory_is_empty() {
        let temp = TempDir::new().expect("tempdir");
        let keys = discover_png_keys(temp.path(), "graphics/stickers").expect("keys");
        assert!(keys.is_empty());
    }
}
