/*!
 * EPUB container access.
 *
 * An EPUB is a zip archive with a `mimetype` entry that must come first and
 * be stored uncompressed. Loading keeps every item byte-for-byte in archive
 * order; chapters are discovered through the OPF spine (the declared reading
 * order), with an extension heuristic as fallback for books whose package
 * document cannot be resolved. Saving substitutes rewritten chapter bytes
 * and passes everything else through untouched.
 */

use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::errors::AppError;

/// Chapter content types recognized in the manifest
const CHAPTER_MEDIA_TYPES: &[&str] = &["application/xhtml+xml", "text/html"];

/// A chapter entry in declared reading order
#[derive(Debug, Clone)]
pub struct ChapterRef {
    /// Full archive path of the chapter item
    pub path: String,
    /// Position in the reading order
    pub spine_index: usize,
}

/// In-memory EPUB: every archive item plus the resolved chapter list.
#[derive(Debug)]
pub struct EpubBook {
    /// All items in archive order, byte-for-byte
    pub items: Vec<(String, Vec<u8>)>,
    /// Chapters in declared reading order
    pub chapters: Vec<ChapterRef>,
}

impl EpubBook {
    /// Bytes of an item by archive path
    pub fn item(&self, path: &str) -> Option<&[u8]> {
        self.items
            .iter()
            .find(|(name, _)| name == path)
            .map(|(_, bytes)| bytes.as_slice())
    }
}

/// Load an EPUB from disk.
pub fn load(path: &Path) -> Result<EpubBook, AppError> {
    let file = std::fs::File::open(path).map_err(|e| AppError::EpubRead(e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| AppError::EpubRead(e.to_string()))?;

    let mut items: Vec<(String, Vec<u8>)> = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| AppError::EpubRead(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| AppError::EpubRead(e.to_string()))?;
        items.push((name, bytes));
    }

    let chapters = resolve_chapters(&items);
    if chapters.is_empty() {
        warn!("No chapters found in EPUB | path={}", path.display());
    }

    debug!(
        "EPUB loaded | items={} chapters={}",
        items.len(),
        chapters.len()
    );

    Ok(EpubBook { items, chapters })
}

/// Save the book, substituting `updated` chapter bytes by archive path.
///
/// Failure here is a persistence error and fatal to the run.
pub fn save(
    book: &EpubBook,
    updated: &HashMap<String, Vec<u8>>,
    output: &Path,
) -> Result<(), AppError> {
    let persistence = |e: String| AppError::Persistence {
        target: format!("EPUB {}", output.display()),
        detail: e,
    };

    let file = std::fs::File::create(output).map_err(|e| persistence(e.to_string()))?;
    let mut zip = ZipWriter::new(file);

    let options_stored =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let options_deflate =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    // The mimetype entry must be first and stored uncompressed.
    let mimetype = book
        .item("mimetype")
        .unwrap_or(b"application/epub+zip".as_slice());
    zip.start_file("mimetype", options_stored)
        .map_err(|e| persistence(e.to_string()))?;
    zip.write_all(mimetype).map_err(|e| persistence(e.to_string()))?;

    for (name, bytes) in &book.items {
        if name == "mimetype" {
            continue;
        }
        let content = updated.get(name).map(|b| b.as_slice()).unwrap_or(bytes);
        zip.start_file(name, options_deflate)
            .map_err(|e| persistence(e.to_string()))?;
        zip.write_all(content)
            .map_err(|e| persistence(e.to_string()))?;
    }

    zip.finish().map_err(|e| persistence(e.to_string()))?;

    debug!(
        "EPUB written | items={} path={}",
        book.items.len(),
        output.display()
    );
    Ok(())
}

/// Resolve chapters in declared reading order via the OPF spine, falling
/// back to an extension heuristic over archive order.
fn resolve_chapters(items: &[(String, Vec<u8>)]) -> Vec<ChapterRef> {
    if let Some(spine_paths) = spine_chapter_paths(items) {
        if !spine_paths.is_empty() {
            return spine_paths
                .into_iter()
                .enumerate()
                .map(|(spine_index, path)| ChapterRef { path, spine_index })
                .collect();
        }
    }

    items
        .iter()
        .filter(|(name, _)| {
            let lowered = name.to_lowercase();
            lowered.ends_with(".xhtml") || lowered.ends_with(".html") || lowered.ends_with(".htm")
        })
        .enumerate()
        .map(|(spine_index, (name, _))| ChapterRef {
            path: name.clone(),
            spine_index,
        })
        .collect()
}

fn item_bytes<'a>(items: &'a [(String, Vec<u8>)], path: &str) -> Option<&'a [u8]> {
    items
        .iter()
        .find(|(name, _)| name == path)
        .map(|(_, bytes)| bytes.as_slice())
}

/// Chapter archive paths in spine order, or None when the package document
/// cannot be found or parsed.
fn spine_chapter_paths(items: &[(String, Vec<u8>)]) -> Option<Vec<String>> {
    let container = item_bytes(items, "META-INF/container.xml")?;
    let opf_path = find_opf_path(container)?;
    let opf_dir = Path::new(&opf_path)
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();

    let opf = item_bytes(items, &opf_path)?;
    let (manifest, spine_ids) = parse_opf(opf)?;

    let mut paths = Vec::new();
    for id in spine_ids {
        if let Some((href, media_type)) = manifest.get(&id) {
            if CHAPTER_MEDIA_TYPES.contains(&media_type.as_str()) {
                paths.push(resolve_path(&opf_dir, href));
            }
        }
    }
    Some(paths)
}

/// Find the OPF package path from META-INF/container.xml
fn find_opf_path(container: &[u8]) -> Option<String> {
    let source = String::from_utf8_lossy(container);
    let mut reader = Reader::from_str(&source);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        return Some(String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
            }
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}

/// Parse the OPF into (manifest id -> (href, media_type), spine idrefs)
#[allow(clippy::type_complexity)]
fn parse_opf(opf: &[u8]) -> Option<(HashMap<String, (String, String)>, Vec<String>)> {
    let source = String::from_utf8_lossy(opf);
    let mut reader = Reader::from_str(&source);
    reader.config_mut().trim_text(true);

    let mut manifest: HashMap<String, (String, String)> = HashMap::new();
    let mut spine_ids: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"item" => {
                    let mut id = String::new();
                    let mut href = String::new();
                    let mut media_type = String::new();
                    for attr in e.attributes().flatten() {
                        let value = String::from_utf8_lossy(&attr.value).to_string();
                        match attr.key.as_ref() {
                            b"id" => id = value,
                            b"href" => href = value,
                            b"media-type" => media_type = value,
                            _ => {}
                        }
                    }
                    if !id.is_empty() && !href.is_empty() {
                        manifest.insert(id, (href, media_type));
                    }
                }
                b"itemref" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"idref" {
                            spine_ids.push(String::from_utf8_lossy(&attr.value).to_string());
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
    }

    Some((manifest, spine_ids))
}

/// Join an OPF-relative href onto the package directory
fn resolve_path(base_dir: &str, href: &str) -> String {
    let mut parts: Vec<&str> = if base_dir.is_empty() {
        Vec::new()
    } else {
        base_dir.split('/').collect()
    };

    for segment in href.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            other => parts.push(other),
        }
    }

    parts.join("/")
}

fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}
