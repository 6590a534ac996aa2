use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

pub const MIMETYPE: &str = "application/epub+zip";
pub const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/package.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Entries of the test publication, with whether they are compressed.
pub fn entries() -> Vec<(&'static str, Vec<u8>, bool)> {
    vec![
        ("mimetype", MIMETYPE.as_bytes().to_vec(), false),
        ("META-INF/container.xml", CONTAINER_XML.as_bytes().to_vec(), true),
        ("OEBPS/c1.xhtml", chapter(1, 40_000), true),
        ("OEBPS/c2.xhtml", chapter(2, 3_000), true),
        ("OEBPS/images/cover.png", (0..5_000u32).map(|i| (i * 7 % 256) as u8).collect(), false),
    ]
}

/// An XHTML chapter of roughly `length` bytes.
pub fn chapter(number: usize, length: usize) -> Vec<u8> {
    let mut xhtml = format!("<html><body><h1>Chapter {number}</h1>");
    let mut paragraph = 0;

    while xhtml.len() < length {
        paragraph += 1;
        xhtml.push_str(&format!("<p id=\"p{paragraph}\">Paragraph {paragraph} of {number}.</p>"));
    }
    xhtml.push_str("</body></html>");
    xhtml.into_bytes()
}

pub fn epub_bytes() -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));

    for (name, content, compressed) in entries() {
        let method = if compressed {
            CompressionMethod::Deflated
        } else {
            CompressionMethod::Stored
        };
        let options = SimpleFileOptions::default().compression_method(method);
        zip.start_file(name, options).unwrap();
        zip.write_all(&content).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Writes the publication as `book.epub` within `dir`.
pub fn write_epub(dir: &Path) -> PathBuf {
    let path = dir.join("book.epub");
    fs::write(&path, epub_bytes()).unwrap();
    path
}

/// Writes the publication unpacked within `dir/book`.
pub fn write_directory(dir: &Path) -> PathBuf {
    let root = dir.join("book");

    for (name, content, _) in entries() {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    root
}
