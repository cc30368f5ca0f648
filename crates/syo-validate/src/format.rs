//! Artifact formats and the content rule each one gets. The format is
//! decided once from the shared extension; the validator then dispatches
//! on it without further probing.

/// Content rule selected for a pair of artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Delimited text table with a header row.
    Delimited { delimiter: u8, label: &'static str },
    /// Parquet columnar table; field names come from the file footer.
    Parquet,
    /// JSON document.
    Json,
    /// YAML document.
    Yaml,
    /// No content rule; extension equality is sufficient.
    ///
    /// Pickled data frames (`.pkl`, `.pickle`) land here. Their column
    /// names live inside a serialized Python object graph that cannot be
    /// read without a Python runtime, so only the extension is compared.
    Opaque,
}

impl Format {
    /// Format for an extension without the leading dot, in any case.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Self::Delimited {
                delimiter: b',',
                label: "CSV",
            },
            "tsv" => Self::Delimited {
                delimiter: b'\t',
                label: "TSV",
            },
            "parquet" => Self::Parquet,
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            _ => Self::Opaque,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Delimited { label, .. } => label,
            Self::Parquet => "Parquet",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Opaque => "opaque",
        }
    }

    pub fn is_tabular(&self) -> bool {
        matches!(self, Self::Delimited { .. } | Self::Parquet)
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Json | Self::Yaml)
    }
}
