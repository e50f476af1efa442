use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Neither `;` nor `|` won delimiter detection. Parsing with a guessed
    /// delimiter would silently mis-parse, so the pipeline refuses to start.
    #[error(
        "could not determine the export delimiter ({semicolons} ';' vs {pipes} '|' in sample); \
         expected one of them to dominate"
    )]
    AmbiguousDelimiter { semicolons: usize, pipes: usize },

    /// The cleaned text contained no recognized section header at all.
    #[error("no recognized section headers found; input does not look like a PDMS export")]
    NoRecognizedSections,
}

pub type Result<T> = std::result::Result<T, IngestError>;
