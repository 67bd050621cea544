//! Office Open XML presentation writer.
//!
//! Builds a minimal but complete `.pptx` package in memory: one slide master,
//! one blank layout, one theme, and one slide part per deck slide, each
//! with its own text boxes and at most one picture. The package is a zip
//! archive written with `zip`; all text goes through [`xml_text`].
//!
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! docProps/{core,app}.xml
//! ppt/presentation.xml            ppt/_rels/presentation.xml.rels
//! ppt/slideMasters/slideMaster1.xml (+ rels)
//! ppt/slideLayouts/slideLayout1.xml (+ rels)
//! ppt/theme/theme1.xml
//! ppt/slides/slideN.xml (+ rels)
//! ppt/media/imageN.<ext>
//! ```

mod parts;
mod slide;

use crate::config::Settings;
use crate::error::SlidesError;
use crate::output::Deck;
use crate::pipeline::encode;
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::borrow::Cow;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// 10in × 7.5in (4:3).
pub const SLIDE_WIDTH_EMU: i64 = 10 * EMU_PER_INCH;
pub const SLIDE_HEIGHT_EMU: i64 = 7 * EMU_PER_INCH + EMU_PER_INCH / 2;

/// Serialises a [`Deck`] to PPTX bytes.
#[derive(Debug, Clone)]
pub struct PptxWriter {
    font_pt: u32,
    title: String,
    created: DateTime<Utc>,
}

impl PptxWriter {
    /// Writer using the effective font size from `settings` and the current
    /// time as creation timestamp.
    pub fn new(settings: &Settings) -> Self {
        Self {
            font_pt: settings.effective_font_size(),
            title: String::new(),
            created: Utc::now(),
        }
    }

    /// Document title stored in the package properties.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Fix the creation timestamp.
    pub fn created_at(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    pub fn write(&self, deck: &Deck) -> Result<Vec<u8>, SlidesError> {
        let mut package = Package::new(self.created);
        let count = deck.len();

        let mut media_types: Vec<(String, String)> = Vec::new();
        let mut media_count = 0usize;

        for (i, slide) in deck.slides.iter().enumerate() {
            let n = i + 1;
            let media = slide.image.as_ref().map(|image| {
                media_count += 1;
                let ext = image.extension().to_string();
                if !media_types.iter().any(|(e, _)| *e == ext) {
                    media_types.push((ext.clone(), image.mime_type()));
                }
                (format!("image{media_count}.{ext}"), image)
            });

            let (xml, rels) = match &media {
                Some((name, image)) => {
                    let frame = slide::picture_frame(encode::dimensions(image));
                    let target = format!("../media/{name}");
                    (
                        slide::slide_xml(slide, self.font_pt, Some(("rId2", frame))),
                        slide::slide_relationships(Some(target.as_str())),
                    )
                }
                None => (
                    slide::slide_xml(slide, self.font_pt, None),
                    slide::slide_relationships(None),
                ),
            };

            package.add(&format!("ppt/slides/slide{n}.xml"), xml.as_bytes())?;
            package.add(&format!("ppt/slides/_rels/slide{n}.xml.rels"), rels.as_bytes())?;
            if let Some((name, image)) = media {
                package.add_stored(&format!("ppt/media/{name}"), &image.bytes)?;
            }
        }

        package.add("[Content_Types].xml", parts::content_types(count, &media_types).as_bytes())?;
        package.add("_rels/.rels", parts::root_relationships().as_bytes())?;
        package.add(
            "docProps/core.xml",
            parts::core_properties(&self.title, self.created).as_bytes(),
        )?;
        package.add("docProps/app.xml", parts::app_properties(count).as_bytes())?;
        package.add(
            "ppt/presentation.xml",
            parts::presentation(count, SLIDE_WIDTH_EMU, SLIDE_HEIGHT_EMU).as_bytes(),
        )?;
        package.add(
            "ppt/_rels/presentation.xml.rels",
            parts::presentation_relationships(count).as_bytes(),
        )?;
        package.add("ppt/slideMasters/slideMaster1.xml", parts::slide_master().as_bytes())?;
        package.add(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            parts::slide_master_relationships().as_bytes(),
        )?;
        package.add("ppt/slideLayouts/slideLayout1.xml", parts::slide_layout().as_bytes())?;
        package.add(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            parts::slide_layout_relationships().as_bytes(),
        )?;
        package.add("ppt/theme/theme1.xml", parts::theme().as_bytes())?;

        let bytes = package.finish()?;
        debug!(
            "PPTX: {} slides, {} pictures, {} bytes",
            count,
            media_count,
            bytes.len()
        );
        Ok(bytes)
    }
}

/// Serialise `deck` with the font size from `settings`.
pub fn write_deck(deck: &Deck, settings: &Settings) -> Result<Vec<u8>, SlidesError> {
    PptxWriter::new(settings).write(deck)
}

struct Package {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    modified: zip::DateTime,
}

impl Package {
    fn new(created: DateTime<Utc>) -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            modified: zip_timestamp(created),
        }
    }

    fn add(&mut self, name: &str, data: &[u8]) -> Result<(), SlidesError> {
        self.put(name, data, CompressionMethod::Deflated)
    }

    /// Media is already compressed.
    fn add_stored(&mut self, name: &str, data: &[u8]) -> Result<(), SlidesError> {
        self.put(name, data, CompressionMethod::Stored)
    }

    fn put(&mut self, name: &str, data: &[u8], method: CompressionMethod) -> Result<(), SlidesError> {
        let options = FileOptions::default()
            .compression_method(method)
            .last_modified_time(self.modified);
        self.zip
            .start_file(name, options)
            .map_err(|e| SlidesError::SerializationFailed(format!("{name}: {e}")))?;
        self.zip
            .write_all(data)
            .map_err(|e| SlidesError::SerializationFailed(format!("{name}: {e}")))
    }

    fn finish(mut self) -> Result<Vec<u8>, SlidesError> {
        self.zip
            .finish()
            .map(Cursor::into_inner)
            .map_err(|e| SlidesError::SerializationFailed(e.to_string()))
    }
}

/// Zip entries carry the package creation time; dates zip cannot encode
/// (before 1980) fall back to its epoch.
fn zip_timestamp(created: DateTime<Utc>) -> zip::DateTime {
    zip::DateTime::from_date_and_time(
        u16::try_from(created.year()).unwrap_or(0),
        created.month() as u8,
        created.day() as u8,
        created.hour() as u8,
        created.minute() as u8,
        created.second() as u8,
    )
    .unwrap_or_default()
}

/// Escape text for an XML text node, dropping characters XML 1.0 forbids
/// and folding line breaks to spaces.
pub(crate) fn xml_text(text: &str) -> Cow<'_, str> {
    let clean = text.chars().all(|c| !c.is_control() || c == '\t');
    if clean {
        return quick_xml::escape::escape(text);
    }
    let folded: String = text
        .chars()
        .filter_map(|c| match c {
            '\n' | '\r' => Some(' '),
            '\t' => Some('\t'),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    Cow::Owned(quick_xml::escape::escape(&folded).into_owned())
}

/// Number of slide parts in a serialised deck.
pub fn count_slides(bytes: &[u8]) -> Result<usize, SlidesError> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| SlidesError::SerializationFailed(format!("Failed to open ZIP: {e}")))?;
    Ok(archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{PageImage, SlideContent};
    use image::{DynamicImage, Rgba, RgbaImage};
    use quick_xml::events::Event;
    use quick_xml::Reader;
    use std::io::Read;

    fn png(w: u32, h: u32) -> PageImage {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([0, 0, 255, 255])));
        encode::encode_png(&img).unwrap()
    }

    fn slide(title: &str, bullets: usize, image: Option<PageImage>) -> SlideContent {
        SlideContent {
            group_index: 0,
            title: title.into(),
            bullets: (0..bullets).map(|i| format!("point {i}")).collect(),
            image,
            continuation: false,
        }
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut s = String::new();
        file.read_to_string(&mut s).unwrap();
        s
    }

    fn assert_well_formed(xml: &str) {
        let mut reader = Reader::from_str(xml);
        let mut depth = 0i32;
        loop {
            match reader.read_event() {
                Ok(Event::Start(_)) => depth += 1,
                Ok(Event::End(_)) => depth -= 1,
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!("malformed XML: {e}"),
            }
        }
        assert_eq!(depth, 0);
    }

    #[test]
    fn one_slide_part_per_slide() {
        let deck = Deck {
            slides: vec![slide("A", 3, None), slide("B", 0, None), slide("C", 5, None)],
        };
        let bytes = write_deck(&deck, &Settings::default()).unwrap();
        assert_eq!(count_slides(&bytes).unwrap(), 3);
        let pres = read_part(&bytes, "ppt/presentation.xml");
        assert_eq!(pres.matches("<p:sldId ").count(), 3);
        assert!(pres.contains(r#"cx="9144000" cy="6858000""#));
    }

    #[test]
    fn every_xml_part_is_well_formed() {
        let deck = Deck {
            slides: vec![slide("Tom & Jerry <1>", 2, Some(png(4, 3))), slide("", 0, None)],
        };
        let bytes = write_deck(&deck, &Settings::default()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<String> = archive.file_names().map(String::from).collect();
        for name in names.iter().filter(|n| n.ends_with(".xml") || n.ends_with(".rels")) {
            let mut s = String::new();
            archive.by_name(name).unwrap().read_to_string(&mut s).unwrap();
            assert_well_formed(&s);
        }
    }

    #[test]
    fn pictures_are_stored_as_media() {
        let deck = Deck {
            slides: vec![slide("A", 1, Some(png(8, 4))), slide("B", 1, None), slide("C", 1, Some(png(2, 2)))],
        };
        let bytes = write_deck(&deck, &Settings::default()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let media: Vec<&str> = archive
            .file_names()
            .filter(|n| n.starts_with("ppt/media/"))
            .collect();
        assert_eq!(media.len(), 2);

        let rels = read_part(&bytes, "ppt/slides/_rels/slide3.xml.rels");
        assert!(rels.contains("../media/image2.png"));
        assert!(read_part(&bytes, "[Content_Types].xml").contains(r#"Extension="png""#));
        assert!(!read_part(&bytes, "ppt/slides/slide2.xml").contains("<p:pic>"));
    }

    #[test]
    fn font_size_is_capped() {
        let settings = Settings {
            font_size: 60,
            ..Settings::default()
        };
        let deck = Deck {
            slides: vec![slide("A", 1, None)],
        };
        let bytes = write_deck(&deck, &settings).unwrap();
        let xml = read_part(&bytes, "ppt/slides/slide1.xml");
        assert!(xml.contains(r#"sz="3200""#));
        assert!(!xml.contains(r#"sz="6000""#));
    }

    #[test]
    fn fixed_timestamp_gives_identical_bytes() {
        let ts = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let deck = Deck {
            slides: vec![slide("A", 2, Some(png(3, 3)))],
        };
        let writer = PptxWriter::new(&Settings::default()).created_at(ts);
        assert_eq!(writer.write(&deck).unwrap(), writer.write(&deck).unwrap());
    }

    #[test]
    fn empty_deck_is_a_valid_package() {
        let bytes = write_deck(&Deck::default(), &Settings::default()).unwrap();
        assert_eq!(count_slides(&bytes).unwrap(), 0);
        assert_well_formed(&read_part(&bytes, "ppt/presentation.xml"));
    }

    #[test]
    fn control_characters_are_dropped() {
        assert_eq!(xml_text("a\u{b}b\nc & d"), "ab c &amp; d");
        assert_eq!(xml_text("plain"), "plain");
    }
}
