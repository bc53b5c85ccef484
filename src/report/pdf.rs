/// PDF document assembly with lopdf
use super::fonts::{FontProgram, ReportFont};
use super::layout::{Frame, PageOps, FONT_RESOURCE, LOGO_RESOURCE};
use super::{ReportError, ReportResult};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum LogoError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoded logo stored as zlib-compressed RGB samples
#[derive(Debug, Clone)]
pub struct Logo {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl Logo {
    pub fn load(path: &Path) -> Result<Self, LogoError> {
        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(rgb.as_raw())?;
        let data = encoder.finish()?;

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Missing or unreadable logos are skipped
    pub fn load_optional(path: Option<&Path>) -> Option<Self> {
        let path = path?;
        match Self::load(path) {
            Ok(logo) => Some(logo),
            Err(e) => {
                log::debug!("Logo {} skipped: {}", path.display(), e);
                None
            }
        }
    }

    /// Size in points for a given display height
    pub fn scaled(&self, height: f32) -> (f32, f32) {
        if self.height == 0 {
            return (0.0, 0.0);
        }
        (self.width as f32 * height / self.height as f32, height)
    }
}

pub struct PdfMetadata<'a> {
    pub title: &'a str,
}

/// Serialize laid-out pages into a complete PDF file
pub fn write_document(
    pages: Vec<PageOps>,
    frame: Frame,
    font: &ReportFont,
    logo: Option<&Logo>,
    metadata: PdfMetadata<'_>,
) -> ReportResult<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = add_font(&mut doc, font);
    let mut resources = dictionary! {
        "Font" => dictionary! { FONT_RESOURCE => font_id },
    };
    if let Some(logo) = logo {
        let image_id = add_logo(&mut doc, logo);
        resources.set("XObject", dictionary! { LOGO_RESOURCE => image_id });
    }
    let resources_id = doc.add_object(resources);

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| ReportError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            frame.page_width.into(),
            frame.page_height.into(),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(super::fonts::encode_win_ansi(metadata.title)),
        "Producer" => Object::string_literal(concat!("election-results ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ReportError::Pdf(e.to_string()))?;

    Ok(buffer)
}

fn add_font(doc: &mut Document, font: &ReportFont) -> ObjectId {
    match font.program() {
        FontProgram::Helvetica => doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        }),
        FontProgram::TrueType(embedded) => {
            let length = embedded.data.len() as i64;
            let file_id = doc.add_object(Stream::new(
                dictionary! { "Length1" => length },
                embedded.data.clone(),
            ));

            let descriptor_id = doc.add_object(dictionary! {
                "Type" => "FontDescriptor",
                "FontName" => Object::Name(embedded.base_name.clone().into_bytes()),
                "Flags" => 32_i64,
                "FontBBox" => embedded.bbox.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
                "ItalicAngle" => 0_i64,
                "Ascent" => embedded.ascent,
                "Descent" => embedded.descent,
                "CapHeight" => embedded.cap_height,
                "StemV" => 80_i64,
                "FontFile2" => file_id,
            });

            let widths: Vec<Object> = font.widths()[32..]
                .iter()
                .map(|w| Object::Integer(i64::from(*w)))
                .collect();

            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "TrueType",
                "BaseFont" => Object::Name(embedded.base_name.clone().into_bytes()),
                "FirstChar" => 32_i64,
                "LastChar" => 255_i64,
                "Widths" => widths,
                "FontDescriptor" => descriptor_id,
                "Encoding" => "WinAnsiEncoding",
            })
        }
    }
}

fn add_logo(doc: &mut Document, logo: &Logo) -> ObjectId {
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(logo.width),
            "Height" => i64::from(logo.height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
            "Filter" => "FlateDecode",
        },
        logo.data.clone(),
    )
    .with_compression(false);

    doc.add_object(stream)
}
