//! Office container extraction
//!
//! Format-specific structural readers for the three OOXML container
//! subtypes. Each reads the in-memory archive directly; a container that
//! fails to open or is missing its required part is corrupt input, no
//! matter what the filename claimed.

use std::io::{Cursor, Read};

use calamine::{Data, Reader as SpreadsheetReader, Xlsx};
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;

use crate::error::{Error, Result};

/// Word-processing subtype: paragraph text in document order, one
/// paragraph per line, whitespace-only paragraphs skipped.
pub fn extract_docx(data: &[u8]) -> Result<String> {
    let xml = read_archive_part(data, "word/document.xml")?;
    let paragraphs = wordml_paragraphs(&xml)?;
    Ok(paragraphs.join("\n").trim().to_string())
}

/// Spreadsheet subtype: cell values sheet-by-sheet in stored workbook
/// order, row-by-row, one non-empty cell per line.
pub fn extract_xlsx(data: &[u8]) -> Result<String> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data))
        .map_err(|e| Error::corrupt(format!("failed to open workbook: {e}")))?;

    let sheet_names = workbook.sheet_names().to_owned();
    let mut cells: Vec<String> = Vec::new();

    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| Error::corrupt(format!("failed to read sheet {name:?}: {e}")))?;
        for row in range.rows() {
            for cell in row {
                if matches!(cell, Data::Empty) {
                    continue;
                }
                let value = cell.to_string();
                if !value.is_empty() {
                    cells.push(value);
                }
            }
        }
    }

    Ok(cells.join("\n").trim().to_string())
}

/// Presentation subtype: text-bearing shape content slide-by-slide in
/// numeric slide order, one shape per line.
pub fn extract_pptx(data: &[u8]) -> Result<String> {
    let mut archive = open_archive(data)?;

    // Slide parts are named slide1.xml, slide2.xml, ... - lexicographic
    // order would put slide10 before slide2
    let mut slide_parts: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slide_parts.sort_by_key(|(number, _)| *number);

    let mut shapes: Vec<String> = Vec::new();
    for (_, part) in slide_parts {
        let mut xml = Vec::new();
        archive
            .by_name(&part)
            .map_err(|e| Error::corrupt(format!("failed to read {part}: {e}")))?
            .read_to_end(&mut xml)
            .map_err(|e| Error::corrupt(format!("failed to read {part}: {e}")))?;
        shapes.extend(drawingml_shape_texts(&xml)?);
    }

    Ok(shapes.join("\n").trim().to_string())
}

fn open_archive(data: &[u8]) -> Result<zip::ZipArchive<Cursor<&[u8]>>> {
    zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| Error::corrupt(format!("failed to open container: {e}")))
}

fn read_archive_part(data: &[u8], part: &str) -> Result<Vec<u8>> {
    let mut archive = open_archive(data)?;
    let mut content = Vec::new();
    archive
        .by_name(part)
        .map_err(|e| Error::corrupt(format!("container is missing {part}: {e}")))?
        .read_to_end(&mut content)
        .map_err(|e| Error::corrupt(format!("failed to read {part}: {e}")))?;
    Ok(content)
}

/// Collect paragraph texts from WordprocessingML.
///
/// Text runs live in `<w:t>` elements; a paragraph closes at `</w:p>`.
fn wordml_paragraphs(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = XmlReader::from_reader(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => {
                    if !current.trim().is_empty() {
                        paragraphs.push(std::mem::take(&mut current));
                    } else {
                        current.clear();
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::corrupt(format!("malformed document.xml: {e}")))?;
                current.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(Error::corrupt(format!("malformed document.xml: {e}"))),
        }
        buf.clear();
    }

    Ok(paragraphs)
}

/// Collect per-shape texts from a DrawingML slide part.
///
/// Shape text sits in `<p:txBody>`; runs are `<a:t>`, paragraphs inside a
/// shape are separated by `</a:p>`.
fn drawingml_shape_texts(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = XmlReader::from_reader(xml);
    let mut buf = Vec::new();
    let mut shapes = Vec::new();
    let mut shape_text = String::new();
    let mut in_tx_body = false;
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"txBody" => {
                    in_tx_body = true;
                    shape_text.clear();
                }
                b"t" if in_tx_body => in_text_run = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"txBody" => {
                    in_tx_body = false;
                    let text = shape_text.trim_end_matches('\n');
                    if !text.trim().is_empty() {
                        shapes.push(text.to_string());
                    }
                }
                b"t" => in_text_run = false,
                b"p" if in_tx_body => shape_text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::corrupt(format!("malformed slide part: {e}")))?;
                shape_text.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(Error::corrupt(format!("malformed slide part: {e}"))),
        }
        buf.clear();
    }

    Ok(shapes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_archive(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut cursor);
        for (name, content) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        cursor.into_inner()
    }

    fn docx_with_body(body: &str) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>{body}</w:body>
</w:document>"#
        );
        build_archive(&[("word/document.xml", &document)])
    }

    #[test]
    fn docx_paragraphs_in_document_order() {
        let data = docx_with_body(
            "<w:p><w:r><w:t>First paragraph</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Second</w:t></w:r><w:r><w:t> paragraph</w:t></w:r></w:p>",
        );
        assert_eq!(
            extract_docx(&data).unwrap(),
            "First paragraph\nSecond paragraph"
        );
    }

    #[test]
    fn docx_skips_whitespace_only_paragraphs() {
        let data = docx_with_body(
            "<w:p><w:r><w:t>Before</w:t></w:r></w:p>\
             <w:p><w:r><w:t>   </w:t></w:r></w:p>\
             <w:p/>\
             <w:p><w:r><w:t>After</w:t></w:r></w:p>",
        );
        assert_eq!(extract_docx(&data).unwrap(), "Before\nAfter");
    }

    #[test]
    fn docx_unescapes_xml_entities() {
        let data = docx_with_body("<w:p><w:r><w:t>Fish &amp; chips &lt;today&gt;</w:t></w:r></w:p>");
        assert_eq!(extract_docx(&data).unwrap(), "Fish & chips <today>");
    }

    #[test]
    fn docx_without_document_part_is_corrupt() {
        let data = build_archive(&[("word/styles.xml", "<w:styles/>")]);
        let err = extract_docx(&data).unwrap_err();
        assert!(matches!(err, Error::CorruptInput { .. }), "{err:?}");
    }

    #[test]
    fn non_zip_bytes_are_corrupt() {
        let extractors: [fn(&[u8]) -> Result<String>; 2] = [extract_docx, extract_pptx];
        for extractor in extractors {
            let err = extractor(b"plain text, wrong magic").unwrap_err();
            assert!(matches!(err, Error::CorruptInput { .. }), "{err:?}");
        }
        let err = extract_xlsx(b"plain text, wrong magic").unwrap_err();
        assert!(matches!(err, Error::CorruptInput { .. }), "{err:?}");
    }

    #[test]
    fn truncated_archive_is_corrupt() {
        let mut data = docx_with_body("<w:p><w:r><w:t>x</w:t></w:r></w:p>");
        data.truncate(data.len() / 2);
        let err = extract_docx(&data).unwrap_err();
        assert!(matches!(err, Error::CorruptInput { .. }), "{err:?}");
    }

    fn slide_with_shapes(shapes: &[&str]) -> String {
        let bodies: String = shapes
            .iter()
            .map(|text| {
                format!(
                    "<p:sp><p:txBody><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
       xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:spTree>{bodies}</p:spTree></p:cSld>
</p:sld>"#
        )
    }

    #[test]
    fn pptx_slides_in_numeric_order() {
        // slide10 must come after slide2, not between slide1 and slide2
        let data = build_archive(&[
            ("ppt/slides/slide10.xml", &slide_with_shapes(&["Ten"])[..]),
            ("ppt/slides/slide1.xml", &slide_with_shapes(&["One"])[..]),
            ("ppt/slides/slide2.xml", &slide_with_shapes(&["Two"])[..]),
        ]);
        assert_eq!(extract_pptx(&data).unwrap(), "One\nTwo\nTen");
    }

    #[test]
    fn pptx_skips_empty_shapes() {
        let slide = slide_with_shapes(&["Title", "", "Body"]);
        let data = build_archive(&[("ppt/slides/slide1.xml", &slide[..])]);
        assert_eq!(extract_pptx(&data).unwrap(), "Title\nBody");
    }

    #[test]
    fn pptx_joins_paragraphs_within_a_shape() {
        let slide = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
 xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:spTree><p:sp><p:txBody>
<a:p><a:r><a:t>Line one</a:t></a:r></a:p>
<a:p><a:r><a:t>Line two</a:t></a:r></a:p>
</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;
        let data = build_archive(&[("ppt/slides/slide1.xml", slide)]);
        assert_eq!(extract_pptx(&data).unwrap(), "Line one\nLine two");
    }

    fn minimal_xlsx(sheets: &[(&str, &str)]) -> Vec<u8> {
        let sheet_entries: String = sheets
            .iter()
            .enumerate()
            .map(|(i, (name, _))| {
                format!(
                    r#"<sheet name="{name}" sheetId="{id}" r:id="rId{id}"/>"#,
                    id = i + 1
                )
            })
            .collect();
        let rel_entries: String = sheets
            .iter()
            .enumerate()
            .map(|(i, _)| {
                format!(
                    r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#,
                    id = i + 1
                )
            })
            .collect();

        let workbook = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>{sheet_entries}</sheets>
</workbook>"#
        );
        let workbook_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rel_entries}</Relationships>"#
        );
        let content_types = {
            let overrides: String = sheets
                .iter()
                .enumerate()
                .map(|(i, _)| {
                    format!(
                        r#"<Override PartName="/xl/worksheets/sheet{id}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                        id = i + 1
                    )
                })
                .collect();
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
{overrides}</Types>"#
            )
        };
        let root_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

        let mut parts: Vec<(String, String)> = vec![
            ("[Content_Types].xml".into(), content_types),
            ("_rels/.rels".into(), root_rels.into()),
            ("xl/workbook.xml".into(), workbook),
            ("xl/_rels/workbook.xml.rels".into(), workbook_rels),
        ];
        for (i, (_, rows)) in sheets.iter().enumerate() {
            parts.push((
                format!("xl/worksheets/sheet{}.xml", i + 1),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>{rows}</sheetData>
</worksheet>"#
                ),
            ));
        }

        let borrowed: Vec<(&str, &str)> = parts
            .iter()
            .map(|(name, content)| (name.as_str(), content.as_str()))
            .collect();
        build_archive(&borrowed)
    }

    #[test]
    fn xlsx_sheets_in_workbook_order_rows_in_row_order() {
        let data = minimal_xlsx(&[
            (
                "Sheet1",
                r#"<row r="1"><c r="A1" t="inlineStr"><is><t>alpha</t></is></c><c r="B1" t="inlineStr"><is><t>beta</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>gamma</t></is></c></row>"#,
            ),
            (
                "Sheet2",
                r#"<row r="1"><c r="A1" t="inlineStr"><is><t>delta</t></is></c></row>"#,
            ),
        ]);
        assert_eq!(extract_xlsx(&data).unwrap(), "alpha\nbeta\ngamma\ndelta");
    }

    #[test]
    fn xlsx_empty_cells_produce_no_separators() {
        let data = minimal_xlsx(&[(
            "Sheet1",
            r#"<row r="1"><c r="A1" t="inlineStr"><is><t>left</t></is></c><c r="B1"/><c r="C1" t="inlineStr"><is><t>right</t></is></c></row>"#,
        )]);
        assert_eq!(extract_xlsx(&data).unwrap(), "left\nright");
    }

    #[test]
    fn xlsx_numeric_cells_render_as_values() {
        let data = minimal_xlsx(&[(
            "Sheet1",
            r#"<row r="1"><c r="A1"><v>42</v></c><c r="B1" t="inlineStr"><is><t>answer</t></is></c></row>"#,
        )]);
        assert_eq!(extract_xlsx(&data).unwrap(), "42\nanswer");
    }

    #[test]
    fn extraction_is_deterministic() {
        let data = docx_with_body("<w:p><w:r><w:t>same input</w:t></w:r></w:p>");
        let first = extract_docx(&data).unwrap();
        let second = extract_docx(&data).unwrap();
        assert_eq!(first, second);
    }
}
