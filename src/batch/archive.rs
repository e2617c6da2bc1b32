//! Output manifest and zip packaging.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::job::JobId;
use crate::documents::naming::numbered;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to add {name} to archive: {source}")]
    Entry {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("failed to write {name} into archive: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to finalize archive: {0}")]
    Finish(#[source] zip::result::ZipError),
}

#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub job: JobId,
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Ordered file name → bytes mapping with unique names.
#[derive(Debug, Default)]
pub struct ArchiveManifest {
    entries: Vec<ManifestEntry>,
    names: HashSet<String>,
}

impl ArchiveManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; a taken name gets ` (2)`, ` (3)`, … before its extension.
    /// Returns the name actually used.
    pub fn insert(&mut self, job: JobId, name: String, bytes: Vec<u8>) -> String {
        let name = self.unique_name(name);
        self.names.insert(name.clone());
        self.entries.push(ManifestEntry {
            job,
            name: name.clone(),
            bytes,
        });
        name
    }

    fn unique_name(&self, name: String) -> String {
        if !self.names.contains(&name) {
            return name;
        }
        let mut n = 2;
        loop {
            let candidate = numbered(&name, n);
            if !self.names.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Compress every entry, in insertion order, into one zip file called `name`.
    pub fn package(&self, name: impl Into<String>) -> Result<PackagedArchive, ArchiveError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|source| ArchiveError::Entry {
                    name: entry.name.clone(),
                    source,
                })?;
            writer.write_all(&entry.bytes).map_err(|source| ArchiveError::Write {
                name: entry.name.clone(),
                source,
            })?;
        }

        let cursor = writer.finish().map_err(ArchiveError::Finish)?;
        Ok(PackagedArchive {
            name: name.into(),
            bytes: cursor.into_inner(),
            files: self.names().map(str::to_string).collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PackagedArchive {
    pub name: String,
    pub bytes: Vec<u8>,
    pub files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_colliding_names_are_numbered() {
        let mut manifest = ArchiveManifest::new();
        let a = manifest.insert(JobId(0), "Alfa Yapi - Calisma Izni.pdf".into(), vec![1]);
        let b = manifest.insert(JobId(1), "Alfa Yapi - Calisma Izni.pdf".into(), vec![2]);
        let c = manifest.insert(JobId(2), "Alfa Yapi - Calisma Izni.pdf".into(), vec![3]);
        assert_eq!(a, "Alfa Yapi - Calisma Izni.pdf");
        assert_eq!(b, "Alfa Yapi - Calisma Izni (2).pdf");
        assert_eq!(c, "Alfa Yapi - Calisma Izni (3).pdf");
        assert_eq!(manifest.len(), 3);
    }

    #[test]
    fn test_package_keeps_bytes_and_order() {
        let mut manifest = ArchiveManifest::new();
        manifest.insert(JobId(0), "b.pdf".into(), b"%PDF-1.5 first".to_vec());
        manifest.insert(JobId(1), "a.docx".into(), b"PK second".to_vec());
        let archive = manifest.package("ISG_Belgeleri_01.01.2026.zip").unwrap();
        assert_eq!(archive.name, "ISG_Belgeleri_01.01.2026.zip");
        assert_eq!(archive.files, vec!["b.pdf", "a.docx"]);

        let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
        assert_eq!(zip.len(), 2);
        let mut content = Vec::new();
        zip.by_index(0).unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"%PDF-1.5 first");
        assert_eq!(zip.by_index(1).unwrap().name(), "a.docx");
    }

    #[test]
    fn test_empty_manifest_packages_empty_archive() {
        let archive = ArchiveManifest::new().package("bos.zip").unwrap();
        let zip = zip::ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
        assert_eq!(zip.len(), 0);
    }
}
