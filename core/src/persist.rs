use crate::{Error, Result, SimilarityIndex};
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 8] = b"MOVIDX\0\0";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = MAGIC.len() + 4;

/// Human readable build information written next to the index blob.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_rows: usize,
    pub num_terms: usize,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn index(&self) -> PathBuf { self.root.join("index.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Encode the whole index as one self-describing blob.
pub fn to_bytes(index: &SimilarityIndex) -> Result<Vec<u8>> {
    let body = bincode::serialize(index).map_err(|e| Error::IndexSave(e.to_string()))?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Decode a blob produced by [`to_bytes`], rejecting foreign, truncated,
/// version-mismatched or internally inconsistent data.
pub fn from_bytes(bytes: &[u8]) -> Result<SimilarityIndex> {
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(Error::IndexLoad("not a similarity index artifact".into()));
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[MAGIC.len()..HEADER_LEN]);
    let version = u32::from_le_bytes(version);
    if version != FORMAT_VERSION {
        return Err(Error::IndexLoad(format!("format version {version}, expected {FORMAT_VERSION}")));
    }
    let index: SimilarityIndex = bincode::deserialize(&bytes[HEADER_LEN..])
        .map_err(|e| Error::IndexLoad(e.to_string()))?;
    index.validate().map_err(Error::IndexLoad)?;
    Ok(index)
}

/// Write the index blob. The previous artifact is replaced only once the new one is fully written.
pub fn save_index(paths: &IndexPaths, index: &SimilarityIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let bytes = to_bytes(index)?;
    let target = paths.index();
    let tmp = target.with_extension("bin.tmp");
    let mut f = File::create(&tmp)?;
    f.write_all(&bytes)?;
    f.sync_all()?;
    fs::rename(&tmp, &target)?;
    tracing::info!(path = %target.display(), bytes = bytes.len(), rows = index.len(), "saved similarity index");
    Ok(())
}

pub fn load_index(paths: &IndexPaths) -> Result<SimilarityIndex> {
    let path = paths.index();
    let mut buf = Vec::new();
    File::open(&path)
        .and_then(|mut f| f.read_to_end(&mut buf))
        .map_err(|e| Error::IndexLoad(format!("{}: {e}", path.display())))?;
    let index = from_bytes(&buf)?;
    tracing::info!(path = %path.display(), rows = index.len(), terms = index.dimension(), "loaded similarity index");
    Ok(index)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> anyhow::Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> anyhow::Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}
