//! PDF serialization of laid-out pages

use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};

use crate::pdf::layout::{Page, PAGE_HEIGHT, PAGE_WIDTH};
use crate::pdf::metrics::Font;

const CATALOG_ID: i32 = 1;
const PAGE_TREE_ID: i32 = 2;
const FIRST_FONT_ID: i32 = 3;
const FIRST_PAGE_ID: i32 = 5;

const FONTS: [Font; 2] = [Font::Regular, Font::Bold];

fn font_ref(font: Font) -> Ref {
    match font {
        Font::Regular => Ref::new(FIRST_FONT_ID),
        Font::Bold => Ref::new(FIRST_FONT_ID + 1),
    }
}

/// Serialize pages into a complete PDF file.
///
/// Object ids are assigned in page order, so output depends only on input.
pub fn write_pdf(pages: &[Page]) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let catalog_id = Ref::new(CATALOG_ID);
    let page_tree_id = Ref::new(PAGE_TREE_ID);

    // Each page takes two ids: the page object and its content stream.
    let ids: Vec<(Ref, Ref)> = (0..pages.len() as i32)
        .map(|i| {
            let page_id = FIRST_PAGE_ID + 2 * i;
            (Ref::new(page_id), Ref::new(page_id + 1))
        })
        .collect();

    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(ids.iter().map(|(page_id, _)| *page_id))
        .count(pages.len() as i32);

    for (page, (page_id, content_id)) in pages.iter().zip(&ids) {
        let mut page_writer = pdf.page(*page_id);
        page_writer.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        page_writer.parent(page_tree_id);
        page_writer.contents(*content_id);
        {
            let mut resources = page_writer.resources();
            let mut fonts = resources.fonts();
            for font in FONTS {
                fonts.pair(Name(font.resource_name()), font_ref(font));
            }
        }
        drop(page_writer);

        pdf.stream(*content_id, &page_content(page));
    }

    for font in FONTS {
        pdf.type1_font(font_ref(font))
            .base_font(Name(font.base_name()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    pdf.finish()
}

fn page_content(page: &Page) -> Vec<u8> {
    let mut content = Content::new();
    for text in &page.texts {
        content.begin_text();
        content.set_font(Name(text.font.resource_name()), text.size);
        content.next_line(text.x, text.y);
        content.show(Str(&text.text));
        content.end_text();
    }
    content.finish()
}
