//! Shared fixtures: small PDFs generated with `lopdf`.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Builder for text-only test PDFs. Each page is a list of lines placed top-down.
#[derive(Default)]
pub struct PdfBuilder {
    pages: Vec<Vec<String>>,
    padding: usize,
    compress: bool,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, lines: &[&str]) -> Self {
        self.pages.push(lines.iter().map(|l| (*l).to_string()).collect());
        self
    }

    /// Insert an opaque object of `bytes` length before the page content,
    /// pushing every content stream past the sampler's window.
    pub fn padded(mut self, bytes: usize) -> Self {
        self.padding = bytes;
        self
    }

    pub fn compressed(mut self) -> Self {
        self.compress = true;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        if self.padding > 0 {
            doc.add_object(Object::string_literal("x".repeat(self.padding)));
        }

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let kids: Vec<Object> = self
            .pages
            .iter()
            .map(|lines| add_page(&mut doc, pages_id, lines).into())
            .collect();
        let count = kids.len() as i64;

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if self.compress {
            doc.compress();
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("serialize test PDF");
        bytes
    }
}

fn add_page(doc: &mut Document, pages_id: ObjectId, lines: &[String]) -> ObjectId {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("TL", vec![16.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
    ];
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let encoded = content.encode().expect("encode content");
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    })
}

/// A one-page document with readable prose.
pub fn prose_pdf() -> Vec<u8> {
    PdfBuilder::new()
        .page(&[
            "The quick brown fox jumps over the lazy dog.",
            "Reading aloud helps with long papers.",
        ])
        .build()
}
