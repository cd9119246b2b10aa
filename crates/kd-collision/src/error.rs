//! Error types.

use crate::format::Section;

/// Errors raised while parsing the text geometry format.
#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    /// A recognised directive whose operands could not be parsed
    #[error("line {line}: malformed `{directive}` directive")]
    Malformed { line: usize, directive: String },

    /// A face referencing a vertex or texture coordinate that does not exist
    #[error("line {line}: index {index} out of range (1..={count})")]
    IndexOutOfRange {
        line: usize,
        index: i64,
        count: usize,
    },
}

/// Errors raised while loading a compiled map. Any of them discards the map.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("decompression failed: {0}")]
    Decompress(#[from] std::io::Error),

    #[error("unexpected end of data at offset {offset} (needed {needed} bytes)")]
    Truncated { offset: usize, needed: usize },

    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),

    #[error("unsupported format version {0}")]
    BadVersion(u32),

    #[error("{section:?} section length {length} is not a multiple of {stride}")]
    SectionSize {
        section: Section,
        length: usize,
        stride: usize,
    },

    #[error("{section:?} section [{offset}, +{length}) exceeds {total} bytes")]
    SectionBounds {
        section: Section,
        offset: usize,
        length: usize,
        total: usize,
    },

    #[error("plane {index} has invalid axis tag {axis}")]
    BadPlaneAxis { index: usize, axis: u8 },

    #[error("node {node} references missing plane {plane}")]
    BadPlaneReference { node: usize, plane: u32 },

    #[error("node {node} has out-of-range child reference {reference}")]
    BadChildReference { node: usize, reference: i32 },

    #[error("triangle {triangle} references missing vertex {vertex}")]
    BadTriangleVertex { triangle: usize, vertex: u32 },

    #[error("triangle {triangle} references missing texture {texture}")]
    BadTriangleTexture { triangle: usize, texture: u32 },

    #[error("leaf {leaf} references missing triangle {triangle}")]
    BadLeafTriangle { leaf: usize, triangle: u32 },

    #[error("integrity check failed: trailing marker {0:#010x}")]
    IntegrityMarker(u32),
}

/// Errors raised while reading tunables.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}
