use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridspireError {
    #[error("Malformed dice notation: {0}")]
    BadDiceNotation(String),

    #[error("Unknown die type: d{0}")]
    UnknownDieType(u32),

    #[error("Dice count out of range: {0}")]
    BadDiceCount(u32),

    #[error("Ability score out of domain (1..=30): {0}")]
    BadAbilityScore(u8),

    #[error("Invalid entity data: {0}")]
    InvalidEntity(String),

    #[error("Profile error: {0}")]
    ProfileError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GridspireError>;
