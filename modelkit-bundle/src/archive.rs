//! Bundle packing, unpacking, and content hashing.

use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use modelkit_types::ColumnInformation;

use crate::manifest::BundleManifest;
use crate::BundleError;

const MANIFEST_ENTRY: &str = "manifest.json";
const PROPERTIES_ENTRY: &str = "properties.json";
const ENDPOINTS_PREFIX: &str = "endpoints/";

/// Serialized form of one endpoint: column declarations plus the names of
/// its routines. Names are resolved against the host's routine registry at
/// load time; no code is stored in the bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub name: String,
    /// Apply routine name.
    pub apply: String,
    /// Prepare routine name; `None` means the identity prepare.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepare: Option<String>,
    /// Declared columns; `None` means the endpoint is untyped and values
    /// pass through the coercion pipeline unconverted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<BTreeMap<String, ColumnInformation>>,
}

/// A single file entry inside a bundle.
#[derive(Debug, Clone)]
pub struct BundleEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// An opened bundle with parsed contents.
///
/// All entries are read into memory on open, so the backing file handle is
/// released before the constructor returns, on error paths as well.
#[derive(Debug)]
pub struct Bundle {
    pub manifest: BundleManifest,
    pub properties: BTreeMap<String, Value>,
    endpoints: BTreeMap<String, EndpointRecord>,
    /// Raw entries used for deterministic content hashing.
    entries: Vec<BundleEntry>,
}

impl Bundle {
    /// Opens a bundle file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BundleError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BundleError::NotFound(path.display().to_string()));
        }
        debug!(path = %path.display(), "opening bundle");
        let file = std::fs::File::open(path)?;
        Self::from_reader(file).map_err(|e| match e {
            BundleError::Zip(zip_err) => BundleError::Corrupt {
                path: path.display().to_string(),
                message: zip_err.to_string(),
            },
            other => other,
        })
    }

    /// Opens and parses a bundle from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, BundleError> {
        let mut archive = ZipArchive::new(reader)?;
        let mut manifest_bytes = None;
        let mut properties_bytes = None;
        let mut endpoint_entries = BTreeMap::new();
        let mut entries = Vec::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;

            entries.push(BundleEntry {
                name: name.clone(),
                data: data.clone(),
            });

            match name.as_str() {
                MANIFEST_ENTRY => manifest_bytes = Some(data),
                PROPERTIES_ENTRY => properties_bytes = Some(data),
                n if n.starts_with(ENDPOINTS_PREFIX) => {
                    let endpoint_name = n
                        .strip_prefix(ENDPOINTS_PREFIX)
                        .unwrap()
                        .trim_end_matches(".json")
                        .to_string();
                    if !endpoint_name.is_empty() {
                        endpoint_entries.insert(endpoint_name, data);
                    }
                }
                _ => {}
            }
        }

        let manifest_bytes =
            manifest_bytes.ok_or_else(|| BundleError::MissingEntry(MANIFEST_ENTRY.into()))?;
        let manifest: BundleManifest = serde_json::from_slice(&manifest_bytes)?;
        manifest.validate()?;

        let properties = match properties_bytes {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => BTreeMap::new(),
        };

        let mut endpoints = BTreeMap::new();
        for declared in &manifest.endpoints {
            let bytes = endpoint_entries.get(declared).ok_or_else(|| {
                BundleError::MissingEntry(format!("{ENDPOINTS_PREFIX}{declared}.json"))
            })?;
            let record: EndpointRecord = serde_json::from_slice(bytes)?;
            endpoints.insert(declared.clone(), record);
        }

        Ok(Self {
            manifest,
            properties,
            endpoints,
            entries,
        })
    }

    /// Dict-style metadata lookup (`model.id`, `model.version`, engine keys).
    pub fn metadata(&self, key: &str) -> Option<Value> {
        self.manifest.get(key)
    }

    /// The endpoint records stored in the bundle, keyed by name.
    pub fn endpoints(&self) -> &BTreeMap<String, EndpointRecord> {
        &self.endpoints
    }

    /// Computes a deterministic SHA-256 content hash over all entries,
    /// sorted by name.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        for entry in sorted {
            hasher.update(entry.name.as_bytes());
            hasher.update((entry.data.len() as u64).to_le_bytes());
            hasher.update(&entry.data);
        }

        hex::encode(hasher.finalize())
    }
}

/// Fluent builder for writing bundles.
pub struct BundleBuilder {
    manifest: BundleManifest,
    properties: BTreeMap<String, Value>,
    endpoints: BTreeMap<String, EndpointRecord>,
}

impl BundleBuilder {
    pub fn new(manifest: BundleManifest) -> Self {
        Self {
            manifest,
            properties: BTreeMap::new(),
            endpoints: BTreeMap::new(),
        }
    }

    pub fn properties(mut self, properties: BTreeMap<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    pub fn endpoint(mut self, record: EndpointRecord) -> Self {
        self.endpoints.insert(record.name.clone(), record);
        self
    }

    /// Builds the bundle archive and returns the raw bytes.
    ///
    /// The manifest's endpoint list is rewritten from the registered records
    /// so the two can never disagree; an endpointless bundle is rejected.
    pub fn build(mut self) -> Result<Vec<u8>, BundleError> {
        self.manifest.endpoints = self.endpoints.keys().cloned().collect();
        self.manifest.validate()?;

        let buf = std::io::Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(buf);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file(MANIFEST_ENTRY, options)?;
        zip.write_all(&serde_json::to_vec_pretty(&self.manifest)?)?;

        zip.start_file(PROPERTIES_ENTRY, options)?;
        zip.write_all(&serde_json::to_vec_pretty(&self.properties)?)?;

        for (name, record) in &self.endpoints {
            zip.start_file(format!("{ENDPOINTS_PREFIX}{name}.json"), options)?;
            zip.write_all(&serde_json::to_vec_pretty(record)?)?;
        }

        let finished = zip.finish()?;
        Ok(finished.into_inner())
    }

    /// Builds the bundle and writes it to `path`.
    pub fn write_to(self, path: impl AsRef<Path>) -> Result<(), BundleError> {
        let bytes = self.build()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
