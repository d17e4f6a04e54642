use crate::extractor::{LopdfExtractor, PdfExtractor};
use crate::{build_chunks, Chunk, IngestError, IngestionOptions};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct IngestionReport {
    pub doc_name: String,
    pub chunks: Vec<Chunk>,
    pub pages: u32,
}

pub fn ingest_pdf(path: &Path, options: &IngestionOptions) -> Result<IngestionReport, IngestError> {
    ingest_pdf_with(&LopdfExtractor, path, options)
}

pub fn ingest_pdf_with<E: PdfExtractor>(
    extractor: &E,
    path: &Path,
    options: &IngestionOptions,
) -> Result<IngestionReport, IngestError> {
    let doc_name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?
        .to_string();

    let mut chunks = Vec::new();
    for page in extractor.extract_pages(path)? {
        if page.text.trim().is_empty() {
            continue;
        }
        chunks.extend(build_chunks(&doc_name, page.number, &page.text, options)?);
    }

    if chunks.is_empty() {
        return Err(IngestError::NoText(path.display().to_string()));
    }

    let pages = chunks.iter().map(|chunk| chunk.page_num).max().unwrap_or(1);

    Ok(IngestionReport {
        doc_name,
        chunks,
        pages,
    })
}

/// Line-delimited JSON record of the chunks behind the current index.
#[derive(Debug, Clone)]
pub struct ChunkLog {
    path: PathBuf,
}

impl ChunkLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the log with `chunks`.
    pub fn write(&self, chunks: &[Chunk]) -> Result<(), IngestError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&self.path)?);
        for chunk in chunks {
            serde_json::to_writer(&mut writer, chunk)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn load(&self) -> Result<Vec<Chunk>, IngestError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut chunks = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            chunks.push(serde_json::from_str(&line)?);
        }
        Ok(chunks)
    }
}
