use std::{
    fs,
    path::{Path, PathBuf, MAIN_SEPARATOR},
};

use super::{entries::PresetData, BanlistError};

pub const PRESET_EXTENSION: &str = ".json";

const BUILTIN_PRESETS: &[(&str, &str)] = &[
    ("academic", include_str!("../../data/presets/academic.json")),
    ("fiction", include_str!("../../data/presets/fiction.json")),
    ("marketing", include_str!("../../data/presets/marketing.json")),
];

/// Names of the presets compiled into the binary, sorted.
pub fn list_presets() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = BUILTIN_PRESETS.iter().map(|(name, _)| *name).collect();
    names.sort_unstable();
    names
}

pub fn describe_preset(name: &str) -> Result<String, BanlistError> {
    let raw = builtin(name).ok_or_else(|| BanlistError::PresetNotFound {
        name: name.to_string(),
        searched: vec!["built-in presets".to_string()],
    })?;
    let preset = parse_preset(name, raw)?;
    Ok(preset.description)
}

/// Resolves a preset by, in order: explicit file path, `<dir>/<name>.json`,
/// built-in registry.
pub fn resolve_preset(name: &str, preset_dir: Option<&Path>) -> Result<PresetData, BanlistError> {
    if looks_like_path(name) {
        let path = PathBuf::from(name);
        let raw = fs::read_to_string(&path).map_err(|source| BanlistError::Read {
            path: path.clone(),
            source,
        })?;
        return parse_preset(name, &raw);
    }

    let mut searched = Vec::new();
    if let Some(dir) = preset_dir {
        let candidate = dir.join(format!("{name}{PRESET_EXTENSION}"));
        match fs::read_to_string(&candidate) {
            Ok(raw) => return parse_preset(name, &raw),
            Err(err) => {
                tracing::debug!(
                    target: "banlist",
                    path = %candidate.display(),
                    error = %err,
                    "preset not in external directory"
                );
                searched.push(candidate.display().to_string());
            }
        }
    }

    match builtin(name) {
        Some(raw) => parse_preset(name, raw),
        None => {
            searched.push("built-in presets".to_string());
            Err(BanlistError::PresetNotFound {
                name: name.to_string(),
                searched,
            })
        }
    }
}

fn looks_like_path(name: &str) -> bool {
    name.contains('/') || name.contains(MAIN_SEPARATOR) || name.ends_with(PRESET_EXTENSION)
}

fn builtin(name: &str) -> Option<&'static str> {
    BUILTIN_PRESETS
        .iter()
        .find(|(builtin_name, _)| *builtin_name == name)
        .map(|(_, raw)| *raw)
}

fn parse_preset(name: &str, raw: &str) -> Result<PresetData, BanlistError> {
    let mut preset: PresetData =
        serde_json::from_str(raw).map_err(|source| BanlistError::PresetParse {
            name: name.to_string(),
            source,
        })?;
    if preset.name.is_empty() {
        preset.name = name.to_string();
    }
    Ok(preset)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_presets_are_listed_and_described() {
        let names = list_presets();
        assert_eq!(names, vec!["academic", "fiction", "marketing"]);
        for name in names {
            let description = describe_preset(name).unwrap();
            assert!(!description.is_empty(), "{name} has no description");
        }
    }

    #[test]
    fn describe_unknown_preset_is_not_found() {
        let err = describe_preset("nope").unwrap_err();
        assert!(matches!(err, BanlistError::PresetNotFound { .. }));
    }

    #[test]
    fn external_directory_wins_over_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("academic.json")).unwrap();
        write!(
            file,
            r#"{{"description": "local override", "words": [{{"word": "zzz", "pct_models": 10, "severity": "low"}}]}}"#
        )
        .unwrap();

        let preset = resolve_preset("academic", Some(dir.path())).unwrap();
        assert_eq!(preset.description, "local override");
        assert_eq!(preset.name, "academic");
        assert_eq!(preset.words.len(), 1);
    }

    #[test]
    fn falls_back_to_builtin_when_directory_misses() {
        let dir = tempfile::tempdir().unwrap();
        let preset = resolve_preset("fiction", Some(dir.path())).unwrap();
        assert_eq!(preset.name, "fiction");
        assert!(!preset.trigrams.is_empty());
    }

    #[test]
    fn explicit_path_is_read_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("team.json");
        fs::write(&path, r#"{"name": "team", "description": "ours"}"#).unwrap();

        let preset = resolve_preset(path.to_str().unwrap(), None).unwrap();
        assert_eq!(preset.name, "team");
        assert!(preset.words.is_empty());
    }

    #[test]
    fn missing_explicit_path_is_a_read_error() {
        let err = resolve_preset("./does/not/exist.json", None).unwrap_err();
        assert!(matches!(err, BanlistError::Read { .. }));
    }

    #[test]
    fn unknown_name_reports_searched_locations() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_preset("legal", Some(dir.path())).unwrap_err();
        match err {
            BanlistError::PresetNotFound { name, searched } => {
                assert_eq!(name, "legal");
                assert_eq!(searched.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
