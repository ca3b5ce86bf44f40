use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} = {value} is outside {min}..={max}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaletteError {
    #[error("a gradient needs at least {min} color nodes")]
    NodeFloor { min: usize },

    #[error("node index {index} out of range (have {len} nodes)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid color {0:?}, expected #rrggbb")]
    BadColor(String),
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("missing metadata key {0}")]
    MissingKey(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid palette: {0}")]
    Palette(#[from] PaletteError),

    #[error("PNG encoding error: {0}")]
    Encode(#[from] png::EncodingError),

    #[error("PNG decoding error: {0}")]
    Decode(#[from] png::DecodingError),
}
