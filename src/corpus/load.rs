use super::Corpus;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid corpus: {0}")]
    Invalid(String),
}

/// Corpus file extensions we read.
pub const CORPUS_EXTENSIONS: &[&str] = &["json"];

/// Parse a corpus from its JSON form and validate it.
///
/// Accepts either `{"instruments": [...]}` or a bare array of instruments.
pub fn parse_corpus(json: &str) -> Result<Corpus, LoadError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let corpus = if value.is_array() {
        Corpus::new(serde_json::from_value(value)?)
    } else {
        serde_json::from_value(value)?
    };
    corpus.validate().map_err(LoadError::Invalid)?;
    Ok(corpus)
}

/// Read and parse a corpus file.
pub fn load_corpus(path: &Path) -> Result<Corpus, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    let corpus = parse_corpus(&contents)?;
    log::debug!(
        "Loaded {}: {} instruments, {} notes",
        path.display(),
        corpus.instruments.len(),
        corpus.total_notes()
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "instruments": [
            {"program": 0, "name": "Piano", "is_drum": false,
             "notes": [{"pitch": 60, "start": 0.0, "end": 0.5},
                       {"pitch": 64, "start": 0.5, "end": 1.0, "velocity": 80}]},
            {"program": 0, "is_drum": true, "notes": []}
        ]
    }"#;

    #[test]
    fn test_parse_object_form() {
        let corpus = parse_corpus(SAMPLE).unwrap();
        assert_eq!(corpus.instruments.len(), 2);
        assert_eq!(corpus.instruments[0].notes[1].velocity, 80);
        assert_eq!(corpus.instruments[1].name, "");
        assert!(corpus.instruments[1].is_drum);
    }

    #[test]
    fn test_parse_array_form() {
        let corpus = parse_corpus(r#"[{"program": 33, "notes": [{"pitch": 40, "start": 0, "end": 1}]}]"#).unwrap();
        assert_eq!(corpus.instruments[0].program, 33);
        assert_eq!(corpus.total_notes(), 1);
    }

    #[test]
    fn test_parse_rejects_invalid() {
        let err = parse_corpus(r#"[{"notes": [{"pitch": 60, "start": 2, "end": 3}, {"pitch": 60, "start": 1, "end": 2}]}]"#)
            .unwrap_err();
        assert!(matches!(err, LoadError::Invalid(_)));
        assert!(matches!(parse_corpus("not json"), Err(LoadError::Json(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let corpus = load_corpus(file.path()).unwrap();
        assert_eq!(corpus.total_notes(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_corpus(Path::new("/nonexistent/piece.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
