use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpertError {
    #[error("No KEGG record for {0}")]
    NotFound(String),

    #[error("No KEGG compound hits for query: {0}")]
    NoCompoundHits(String),

    #[error("Product class not recognized: {0}")]
    UnknownProduct(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid KEGG URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {0} from {1}")]
    Status(u16, String),

    #[error("Cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ExpertError>;
