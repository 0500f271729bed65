//! Office document formats for the read and write tools.
//!
//! `.docx` and `.xlsx` are zip packages of XML parts and are handled with the
//! `zip` crate directly. PDF text comes from `pdf-extract`; written PDFs are
//! plain single-font documents built by hand.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::constants::TEXT_EXTENSIONS;

/// File formats the document tools understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Docx,
    Xlsx,
    Pdf,
}

impl DocumentFormat {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name)
            .extension()?
            .to_string_lossy()
            .to_lowercase();
        match ext.as_str() {
            "docx" => Some(Self::Docx),
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            "pdf" => Some(Self::Pdf),
            e if TEXT_EXTENSIONS.contains(&e) => Some(Self::Text),
            _ => None,
        }
    }
}

/// Comma-separated list of every extension the document tools accept.
pub fn supported_extensions() -> String {
    let mut all: Vec<&str> = TEXT_EXTENSIONS.to_vec();
    all.extend(["docx", "xlsx", "xlsm", "pdf"]);
    all.join(", ")
}

// --- XML helpers ---

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn escape_xml_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Strips tags from a WordprocessingML part, keeping paragraph breaks.
fn xml_to_text(xml: &str) -> String {
    let with_breaks = xml
        .replace("</w:p>", "\n")
        .replace("<w:tab/>", "\t")
        .replace("<w:br/>", "\n");

    let mut result = String::with_capacity(with_breaks.len());
    let mut in_tag = false;
    for ch in with_breaks.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    decode_xml_entities(&result)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn open_package(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    ZipArchive::new(file).with_context(|| format!("{} is not a valid document", path.display()))
}

fn entry_names(archive: &mut ZipArchive<File>) -> Vec<String> {
    (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|e| e.name().to_string()))
        .collect()
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<String> {
    let mut entry = archive
        .by_name(name)
        .with_context(|| format!("Failed to open entry {}", name))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .with_context(|| format!("Failed to read entry {}", name))?;
    Ok(xml)
}

fn write_package(path: &Path, parts: &[(&str, String)]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, body) in parts {
        writer.start_file(*name, options)?;
        writer.write_all(body.as_bytes())?;
    }
    writer.finish()?;
    Ok(())
}

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="{target}"/></Relationships>"#;

// --- docx ---

/// Body text of a Word document, one paragraph per line.
pub fn read_docx(path: &Path) -> Result<String> {
    let mut archive = open_package(path)?;
    let mut targets: Vec<String> = entry_names(&mut archive)
        .into_iter()
        .filter(|name| {
            name == "word/document.xml"
                || name.starts_with("word/header")
                || name.starts_with("word/footer")
        })
        .collect();
    if targets.is_empty() {
        bail!("{} has no document body", path.display());
    }
    // body first, then headers and footers
    targets.sort_by_key(|name| (name != "word/document.xml", name.clone()));

    let mut chunks = Vec::new();
    for name in targets {
        let text = xml_to_text(&read_entry(&mut archive, &name)?);
        if !text.is_empty() {
            chunks.push(text);
        }
    }
    Ok(chunks.join("\n\n"))
}

/// Writes `content` as a Word document, one paragraph per line.
pub fn write_docx(path: &Path, content: &str) -> Result<()> {
    let paragraphs: String = content
        .lines()
        .map(|line| {
            format!(
                r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                escape_xml_text(line)
            )
        })
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        paragraphs
    );
    let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

    write_package(
        path,
        &[
            ("[Content_Types].xml", content_types.to_string()),
            ("_rels/.rels", PACKAGE_RELS.replace("{target}", "word/document.xml")),
            ("word/document.xml", document),
        ],
    )
}

// --- xlsx ---

static SHARED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<si>(.*?)</si>").unwrap_or_else(|_| unreachable!("shared string pattern"))
});
static TEXT_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<t(?:\s[^>]*)?>(.*?)</t>").unwrap_or_else(|_| unreachable!("text run pattern"))
});
static ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<row\b[^>]*?(?:/>|>(.*?)</row>)").unwrap_or_else(|_| unreachable!("row pattern"))
});
static CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<c\b([^>]*?)(?:/>|>(.*?)</c>)"#).unwrap_or_else(|_| unreachable!("cell pattern"))
});
static CELL_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bt="(\w+)""#).unwrap_or_else(|_| unreachable!("cell type pattern"))
});
static CELL_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<v>(.*?)</v>").unwrap_or_else(|_| unreachable!("cell value pattern"))
});

fn text_runs(xml: &str) -> String {
    TEXT_RUN
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| decode_xml_entities(m.as_str()))
        .collect()
}

fn cell_text(attrs: &str, body: &str, shared: &[String]) -> String {
    let kind = CELL_TYPE
        .captures(attrs)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str());
    let value = CELL_VALUE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| decode_xml_entities(m.as_str()));
    match kind {
        Some("s") => value
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|i| shared.get(i).cloned())
            .unwrap_or_default(),
        Some("inlineStr") => text_runs(body),
        _ => value.unwrap_or_default(),
    }
}

fn sheet_to_text(xml: &str, shared: &[String]) -> String {
    ROW.captures_iter(xml)
        .filter_map(|row| row.get(1))
        .map(|row| {
            CELL.captures_iter(row.as_str())
                .map(|cell| {
                    let attrs = cell.get(1).map_or("", |m| m.as_str());
                    let body = cell.get(2).map_or("", |m| m.as_str());
                    cell_text(attrs, body, shared)
                })
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cell values of every worksheet, tab-separated, one row per line.
pub fn read_xlsx(path: &Path) -> Result<String> {
    let mut archive = open_package(path)?;
    let names = entry_names(&mut archive);

    let shared: Vec<String> = if names.iter().any(|n| n == "xl/sharedStrings.xml") {
        let xml = read_entry(&mut archive, "xl/sharedStrings.xml")?;
        SHARED_ITEM
            .captures_iter(&xml)
            .filter_map(|c| c.get(1))
            .map(|m| text_runs(m.as_str()))
            .collect()
    } else {
        Vec::new()
    };

    let mut sheets: Vec<String> = names
        .into_iter()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .collect();
    if sheets.is_empty() {
        bail!("{} has no worksheets", path.display());
    }
    sheets.sort();

    let mut chunks = Vec::new();
    for name in sheets {
        let text = sheet_to_text(&read_entry(&mut archive, &name)?, &shared);
        if !text.is_empty() {
            chunks.push(text);
        }
    }
    Ok(chunks.join("\n\n"))
}

/// Spreadsheet column letters for a zero-based index: 0 → A, 26 → AA.
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Writes `content` as a one-sheet workbook: lines become rows and tabs
/// separate columns.
pub fn write_xlsx(path: &Path, content: &str) -> Result<()> {
    let rows: String = content
        .lines()
        .enumerate()
        .map(|(r, line)| {
            let cells: String = line
                .split('\t')
                .enumerate()
                .map(|(c, value)| {
                    format!(
                        r#"<c r="{}{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                        column_name(c),
                        r + 1,
                        escape_xml_text(value)
                    )
                })
                .collect();
            format!(r#"<row r="{}">{}</row>"#, r + 1, cells)
        })
        .collect();

    let sheet = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        rows
    );
    let workbook = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
    let workbook_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;
    let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

    write_package(
        path,
        &[
            ("[Content_Types].xml", content_types.to_string()),
            ("_rels/.rels", PACKAGE_RELS.replace("{target}", "xl/workbook.xml")),
            ("xl/workbook.xml", workbook.to_string()),
            ("xl/_rels/workbook.xml.rels", workbook_rels.to_string()),
            ("xl/worksheets/sheet1.xml", sheet),
        ],
    )
}

// --- pdf ---

const PDF_LINES_PER_PAGE: usize = 52;
const PDF_LINE_CHARS: usize = 90;

/// Text of every page of a PDF.
pub fn read_pdf(path: &Path) -> Result<String> {
    let text = pdf_extract::extract_text(path)
        .map_err(|e| anyhow::anyhow!("Failed to read PDF {}: {}", path.display(), e))?;
    Ok(text.trim().to_string())
}

/// Encodes one line as a PDF literal string in WinAnsi bytes.
fn pdf_string(line: &str) -> Vec<u8> {
    let mut out = vec![b'('];
    for ch in line.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            c if (c as u32) < 0x20 => out.push(b' '),
            c if (c as u32) <= 0xFF => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out.push(b')');
    out
}

/// Splits `content` into lines no longer than the page width.
fn wrap_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for line in content.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in chars.chunks(PDF_LINE_CHARS) {
            lines.push(chunk.iter().collect());
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Renders `content` as an A4 PDF in 11pt Helvetica.
pub fn render_pdf(content: &str) -> Vec<u8> {
    let lines = wrap_lines(content);
    let pages: Vec<&[String]> = lines.chunks(PDF_LINES_PER_PAGE).collect();

    // objects: 1 catalog, 2 page tree, 3 font, then a page and its content per page
    let mut objects: Vec<Vec<u8>> = Vec::new();
    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", 4 + i * 2))
        .collect();
    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .into_bytes(),
    );
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );

    for (i, page) in pages.iter().enumerate() {
        let content_id = 5 + i * 2;
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                content_id
            )
            .into_bytes(),
        );

        let mut stream = b"BT /F1 11 Tf 14 TL 50 792 Td\n".to_vec();
        for line in page.iter() {
            stream.extend(pdf_string(line));
            stream.extend(b" Tj T*\n");
        }
        stream.extend(b"ET");

        let mut object = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        object.extend(stream);
        object.extend(b"\nendstream");
        objects.push(object);
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend(format!("{} 0 obj\n", i + 1).into_bytes());
        out.extend(body);
        out.extend(b"\nendobj\n");
    }

    let xref = out.len();
    out.extend(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).into_bytes());
    for offset in offsets {
        out.extend(format!("{:010} 00000 n \n", offset).into_bytes());
    }
    out.extend(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .into_bytes(),
    );
    out
}

pub fn write_pdf(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, render_pdf(content))
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_file_name("a.TXT"), Some(DocumentFormat::Text));
        assert_eq!(DocumentFormat::from_file_name("b.docx"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_file_name("c.xlsm"), Some(DocumentFormat::Xlsx));
        assert_eq!(DocumentFormat::from_file_name("d.pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_file_name("e.pptx"), None);
        assert_eq!(DocumentFormat::from_file_name("noext"), None);
    }

    #[test]
    fn test_xml_to_text_keeps_paragraphs() {
        let xml = r#"<w:body><w:p><w:r><w:t>Fish &amp; chips</w:t></w:r></w:p><w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r></w:p></w:body>"#;
        assert_eq!(xml_to_text(xml), "Fish & chips\na\tb");
    }

    #[test]
    fn test_entities_decode_once() {
        assert_eq!(decode_xml_entities("&amp;lt;"), "&lt;");
        assert_eq!(escape_xml_text("<a & b>"), "&lt;a &amp; b&gt;");
    }

    #[test]
    fn test_sheet_resolves_shared_and_inline_cells() {
        let shared = vec!["Name".to_string(), "Qty".to_string()];
        let xml = r#"<sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>bolts</t></is></c><c r="B2"><v>40</v></c></row></sheetData>"#;
        assert_eq!(sheet_to_text(xml, &shared), "Name\tQty\nbolts\t40");
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_pdf_escapes_and_wraps() {
        assert_eq!(pdf_string(r"a(b)\c"), br"(a\(b\)\\c)".to_vec());
        assert_eq!(pdf_string("café €"), b"(caf\xe9 ?)".to_vec());
        let long = "x".repeat(PDF_LINE_CHARS + 5);
        assert_eq!(wrap_lines(&long).len(), 2);
        assert_eq!(wrap_lines("").len(), 1);
    }

    #[test]
    fn test_pdf_cross_reference_points_at_objects() {
        let content = (0..60).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let pdf = render_pdf(&content);
        let text = String::from_utf8_lossy(&pdf).into_owned();

        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("/Count 2"));
        assert!(text.contains("(line 0) Tj T*"));

        let start: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert!(text[start..].starts_with("xref\n0 8\n"));

        // every in-use entry must land on "<n> 0 obj"
        let entries: Vec<&str> = text[start..].lines().skip(3).take(7).collect();
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(text[offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }
}
