//! Rendering of manifest documents.

use super::ManifestDocument;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Conventional YAML multi-document separator.
pub const YAML_SEPARATOR: &str = "---\n";

/// Output format of the rendered manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One YAML document per manifest, separated by `---`.
    #[default]
    Yaml,
    /// A single Kubernetes `List` object holding every manifest.
    Json,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct List<'a> {
    api_version: &'static str,
    kind: &'static str,
    items: &'a [ManifestDocument],
}

/// Render documents as a YAML stream, keeping their order.
pub fn assemble(docs: &[ManifestDocument]) -> Result<String> {
    assemble_as(docs, OutputFormat::Yaml)
}

/// Render documents in the given format, keeping their order.
pub fn assemble_as(docs: &[ManifestDocument], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => {
            let rendered = docs
                .iter()
                .map(serde_yaml::to_string)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rendered.join(YAML_SEPARATOR))
        }
        OutputFormat::Json => {
            let list = List {
                api_version: "v1",
                kind: "List",
                items: docs,
            };
            let mut rendered = serde_json::to_string_pretty(&list)?;
            rendered.push('\n');
            Ok(rendered)
        }
    }
}
