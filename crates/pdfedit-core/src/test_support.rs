//! In-memory PDF and image fixtures for unit tests

use std::io::{Cursor, Write};

use flate2::{write::ZlibEncoder, Compression};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::structure::{xobject_entries, ContentLayout, ContentPart, StreamPayload, XObjectEntry};
use crate::text::{split_lines, ContentText};

pub(crate) struct PageFixture {
    layers: Vec<String>,
    images: usize,
    compressed: bool,
    broken: bool,
}

impl PageFixture {
    pub fn text(line: &str) -> Self {
        Self::layers(&[line])
    }

    pub fn layers(lines: &[&str]) -> Self {
        Self {
            layers: lines.iter().map(|l| l.to_string()).collect(),
            images: 0,
            compressed: false,
            broken: false,
        }
    }

    /// A page whose `/Contents` is an integer
    pub fn broken_contents() -> Self {
        Self {
            broken: true,
            ..Self::layers(&[])
        }
    }

    pub fn with_image(mut self) -> Self {
        self.images += 1;
        self
    }

    pub fn compressed(mut self) -> Self {
        self.compressed = true;
        self
    }
}

fn content_stream(line: &str, compressed: bool) -> Stream {
    let content = format!("BT\n{}\nET", line).into_bytes();
    if !compressed {
        return Stream::new(Dictionary::new(), content);
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&content).unwrap();
    Stream::new(
        dictionary! { "Filter" => "FlateDecode" },
        encoder.finish().unwrap(),
    )
}

fn placeholder_image() -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        vec![0, 0, 255],
    )
}

fn finish(mut doc: Document, pages_id: ObjectId, page_ids: Vec<ObjectId>) -> Vec<u8> {
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => page_ids.len() as i64,
            "Kids" => page_ids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

pub(crate) fn pdf_with_pages(pages: Vec<PageFixture>) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut page_ids = Vec::new();
    for page in pages {
        let mut xobjects = Dictionary::new();
        for i in 0..page.images {
            let image_id = doc.add_object(placeholder_image());
            xobjects.set(format!("Im{}", i + 1), Object::Reference(image_id));
        }

        let contents: Object = if page.broken {
            Object::Integer(42)
        } else if page.layers.len() == 1 {
            doc.add_object(content_stream(&page.layers[0], page.compressed))
                .into()
        } else {
            page.layers
                .iter()
                .map(|line| Object::Reference(doc.add_object(content_stream(line, page.compressed))))
                .collect::<Vec<_>>()
                .into()
        };

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => contents,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        });
        page_ids.push(page_id);
    }

    finish(doc, pages_id, page_ids)
}

/// Two pages drawing the same content stream object
pub(crate) fn shared_content_pdf(line: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(content_stream(line, false));
    let page_ids = (0..2)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            })
        })
        .collect();
    finish(doc, pages_id, page_ids)
}

/// Two pages referencing one `/Resources` dictionary holding a single image
pub(crate) fn shared_resources_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(placeholder_image());
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im1" => image_id },
    });
    let page_ids = ["(One) Tj", "(Two) Tj"]
        .iter()
        .map(|line| {
            let content_id = doc.add_object(content_stream(line, false));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            })
        })
        .collect();
    finish(doc, pages_id, page_ids)
}

pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([255, 0, 0]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .unwrap();
    buffer.into_inner()
}

/// Decoded lines of every content stream on a page (1-indexed)
pub(crate) fn page_lines(pdf: &[u8], page: u32) -> Vec<String> {
    let doc = Document::load_mem(pdf).unwrap();
    let page_id = doc.get_pages()[&page];

    let ids = match ContentLayout::of_page(&doc, page_id) {
        Ok(ContentLayout::Single(id)) => vec![id],
        Ok(ContentLayout::Layered(parts)) => parts
            .into_iter()
            .filter_map(|part| match part {
                ContentPart::Stream(id) => Some(id),
                ContentPart::Unsupported(_) => None,
            })
            .collect(),
        Ok(ContentLayout::Empty) | Err(_) => Vec::new(),
    };

    ids.into_iter()
        .flat_map(|id| {
            let stream = doc.get_object(id).and_then(Object::as_stream).unwrap();
            let bytes = StreamPayload::of(stream).unwrap().read(stream).unwrap();
            let text = ContentText::decode(&bytes).text;
            split_lines(&text)
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Dictionary and raw payload of the first image XObject on a page
pub(crate) fn first_image(pdf: &[u8], page: u32) -> Option<(Dictionary, Vec<u8>)> {
    let doc = Document::load_mem(pdf).unwrap();
    let page_id = doc.get_pages()[&page];
    xobject_entries(&doc, page_id)
        .unwrap()
        .into_iter()
        .find_map(|entry| match entry {
            XObjectEntry::Image { id, .. } => {
                let stream = doc.get_object(id).and_then(Object::as_stream).unwrap();
                Some((stream.dict.clone(), stream.content.clone()))
            }
            _ => None,
        })
}
