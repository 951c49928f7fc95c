//! PDF rendering for the card deck and the boards document.
//!
//! Pages are built by hand with lopdf: images become RGB XObject streams,
//! drawing is a list of content-stream operations encoded manually, and the
//! page tree and document catalog are wired up at the end. Captions and
//! titles use the built-in Type1 Helvetica fonts with WinAnsi encoding so
//! accented card names render without embedding a font.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use thiserror::Error as ThisError;

use crate::boards::{Board, BoardSet};
use crate::catalog::{CardId, Catalog, CardRecord};

// Letter page, portrait, in points
const PAGE_W: f32 = 612.0;
const PAGE_H: f32 = 792.0;
const PT_PER_IN: f32 = 72.0;
const MARGIN: f32 = 0.5 * PT_PER_IN;

// Cards sheet: 16 cards per page in a 4x4 grid
pub const CARDS_PER_PAGE: usize = 16;
const CARDS_GRID_ROWS: usize = 4;
const CARDS_GRID_COLS: usize = 4;
const GRID_GAP: f32 = 0.22 * PT_PER_IN;
const CARD_CELL_W: f32 = (PAGE_W - 2.0 * MARGIN - 3.0 * GRID_GAP) / 4.0;
const CARD_CELL_H: f32 = (PAGE_H - 2.0 * MARGIN - 3.0 * GRID_GAP) / 4.0;
const CARD_CAPTION_H: f32 = 0.34 * PT_PER_IN;
const CARD_FRAME_INSET: f32 = 2.0;
const CARD_IMG_PAD: f32 = 0.06 * PT_PER_IN;

// Boards: one board per page
const BOARD_TITLE_H: f32 = 0.6 * PT_PER_IN;
const BOARD_TITLE_SIZE: f32 = 22.0;
const BOARD_CELL_GAP: f32 = 0.18 * PT_PER_IN;
const BOARD_CAPTION_H: f32 = 0.30 * PT_PER_IN;
const BOARD_IMG_PAD: f32 = 0.06 * PT_PER_IN;
const BOARD_INNER_MARGIN: f32 = 0.10 * PT_PER_IN;

const CAPTION_SIZE: f32 = 10.5;
const CROP_MARK: f32 = 0.15 * PT_PER_IN;

// Helvetica average glyph width as a fraction of the font size, used for
// centering and truncation without real font metrics.
const APPROX_CHAR_WIDTH: f32 = 0.52;

///
/// RenderError
///

#[derive(Debug, ThisError)]
pub enum RenderError {
    #[error("cannot decode image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("board references unknown card id {id}")]
    UnknownCard { id: CardId },

    #[error("cannot write document {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

type Ops = Vec<(String, Vec<Object>)>;

/// Render the full catalog as a cut-out card deck, 16 cards per page.
pub fn render_cards_pdf(catalog: &Catalog, out_path: &Path) -> Result<(), RenderError> {
    let mut doc = Document::with_version("1.5");

    let img_w = CARD_CELL_W - 2.0 * CARD_IMG_PAD;
    let img_h = CARD_CELL_H - CARD_CAPTION_H - 2.0 * CARD_IMG_PAD;
    let images = embed_catalog_images(&mut doc, catalog, img_w / img_h)?;
    let resources_id = build_resources(&mut doc, &images);

    let mut page_ids = Vec::new();
    for chunk in catalog.records().chunks(CARDS_PER_PAGE) {
        let ops = cards_page_ops(chunk, &images);
        push_page(&mut doc, &mut page_ids, resources_id, ops);
    }

    finish_document(&mut doc, &page_ids, out_path)
}

/// Render one page per generated board.
pub fn render_boards_pdf(
    catalog: &Catalog,
    board_set: &BoardSet,
    out_path: &Path,
) -> Result<(), RenderError> {
    let mut doc = Document::with_version("1.5");

    let (cell_w, cell_h) = board_cell_size();
    let img_w = cell_w - 2.0 * BOARD_IMG_PAD;
    let img_h = cell_h - BOARD_CAPTION_H - 2.0 * BOARD_IMG_PAD;
    let images = embed_catalog_images(&mut doc, catalog, img_w / img_h)?;
    let resources_id = build_resources(&mut doc, &images);

    let mut page_ids = Vec::new();
    for (index, board) in board_set.iter().enumerate() {
        let ops = board_page_ops(index, board, catalog, &images)?;
        push_page(&mut doc, &mut page_ids, resources_id, ops);
    }

    finish_document(&mut doc, &page_ids, out_path)
}

// ------------------- image embedding -------------------

/// Decode every catalog image, cover-crop it to `box_aspect`, and add it to
/// the document as an RGB XObject. Returns the resource name per card id.
fn embed_catalog_images(
    doc: &mut Document,
    catalog: &Catalog,
    box_aspect: f32,
) -> Result<HashMap<CardId, (String, ObjectId)>, RenderError> {
    let mut images = HashMap::new();
    for record in catalog.records() {
        let rgb = cover_crop(&record.image_path, box_aspect)?;
        let (width, height) = rgb.dimensions();

        let mut image_dict = Dictionary::new();
        image_dict.set("Type", Object::Name(b"XObject".to_vec()));
        image_dict.set("Subtype", Object::Name(b"Image".to_vec()));
        image_dict.set("Width", Object::Integer(i64::from(width)));
        image_dict.set("Height", Object::Integer(i64::from(height)));
        image_dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        image_dict.set("BitsPerComponent", Object::Integer(8));

        let image_id = doc.add_object(Stream::new(image_dict, rgb.into_raw()));
        images.insert(record.id, (format!("Im{}", image_id.0), image_id));
    }
    Ok(images)
}

/// Center-crop the image to the destination aspect ratio so it fills its
/// box exactly when scaled (no letterboxing, no distortion).
fn cover_crop(path: &Path, box_aspect: f32) -> Result<image::RgbImage, RenderError> {
    let img = image::open(path).map_err(|source| RenderError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let rgb = img.to_rgb8();
    let (iw, ih) = rgb.dimensions();
    let img_aspect = iw as f32 / ih as f32;

    let (x, y, w, h) = if img_aspect > box_aspect {
        // Image is wider than the box: trim left and right.
        let new_w = ((ih as f32 * box_aspect) as u32).clamp(1, iw);
        ((iw - new_w) / 2, 0, new_w, ih)
    } else {
        // Image is taller: trim top and bottom.
        let new_h = ((iw as f32 / box_aspect) as u32).clamp(1, ih);
        (0, (ih - new_h) / 2, iw, new_h)
    };

    Ok(image::imageops::crop_imm(&rgb, x, y, w, h).to_image())
}

// ------------------- page content -------------------

/// One deck sheet: up to 16 cards with frames, captions, and cut lines.
fn cards_page_ops(chunk: &[CardRecord], images: &HashMap<CardId, (String, ObjectId)>) -> Ops {
    let mut ops = Ops::new();
    draw_parchment_background(&mut ops);

    let origin_x = MARGIN;
    let origin_y = PAGE_H - MARGIN;
    draw_cut_lines(
        &mut ops,
        origin_x,
        origin_y,
        CARD_CELL_W,
        CARD_CELL_H,
        CARDS_GRID_ROWS,
        CARDS_GRID_COLS,
        GRID_GAP,
    );

    let mut idx = 0;
    let mut cur_y_top = origin_y;
    for _row in 0..CARDS_GRID_ROWS {
        let mut cur_x_left = origin_x;
        for _col in 0..CARDS_GRID_COLS {
            if let Some(record) = chunk.get(idx) {
                let cell_x = cur_x_left;
                let cell_y = cur_y_top - CARD_CELL_H;

                // Decorative card frame
                set_stroke_color(&mut ops, DARK_GOLDENROD);
                set_line_width(&mut ops, 1.4);
                stroke_rect(
                    &mut ops,
                    cell_x + CARD_FRAME_INSET,
                    cell_y + CARD_FRAME_INSET,
                    CARD_CELL_W - 2.0 * CARD_FRAME_INSET,
                    CARD_CELL_H - 2.0 * CARD_FRAME_INSET,
                );

                // Caption above, image below (cover)
                let caption_y = cell_y + CARD_CELL_H - CARD_CAPTION_H + 0.06 * PT_PER_IN;
                draw_centered_text(
                    &mut ops,
                    cell_x,
                    caption_y,
                    CARD_CELL_W,
                    &record.name,
                    "F1",
                    CAPTION_SIZE,
                );

                if let Some((name, _)) = images.get(&record.id) {
                    draw_image(
                        &mut ops,
                        name,
                        cell_x + CARD_IMG_PAD,
                        cell_y + CARD_IMG_PAD,
                        CARD_CELL_W - 2.0 * CARD_IMG_PAD,
                        CARD_CELL_H - CARD_CAPTION_H - 2.0 * CARD_IMG_PAD,
                    );
                }
            }
            cur_x_left += CARD_CELL_W + GRID_GAP;
            idx += 1;
        }
        cur_y_top -= CARD_CELL_H + GRID_GAP;
    }

    ops
}

/// Cell size of the board grid, derived from the page and title geometry.
fn board_cell_size() -> (f32, f32) {
    let top_y = PAGE_H - MARGIN - BOARD_TITLE_H - 0.10 * PT_PER_IN;
    let avail_w = PAGE_W - 2.0 * MARGIN;
    let avail_h = top_y - MARGIN;
    let grid_w = avail_w - 2.0 * BOARD_INNER_MARGIN;
    let grid_h = avail_h - 2.0 * BOARD_INNER_MARGIN;
    let cell_w = (grid_w - 3.0 * BOARD_CELL_GAP) / 4.0;
    let cell_h = (grid_h - 3.0 * BOARD_CELL_GAP) / 4.0;
    (cell_w, cell_h)
}

/// One full-page board: title band, outer frame, 4x4 grid of cells.
fn board_page_ops(
    index: usize,
    board: &Board,
    catalog: &Catalog,
    images: &HashMap<CardId, (String, ObjectId)>,
) -> Result<Ops, RenderError> {
    let mut ops = Ops::new();
    draw_parchment_background(&mut ops);

    let title = format!("Tablero {}", index + 1);
    let title_y = PAGE_H - MARGIN - BOARD_TITLE_H + 0.10 * PT_PER_IN;
    draw_centered_text(
        &mut ops,
        MARGIN,
        title_y,
        PAGE_W - 2.0 * MARGIN,
        &title,
        "F2",
        BOARD_TITLE_SIZE,
    );

    let top_y = PAGE_H - MARGIN - BOARD_TITLE_H - 0.10 * PT_PER_IN;
    let avail_w = PAGE_W - 2.0 * MARGIN;
    let avail_h = top_y - MARGIN;

    // Outer board frame
    set_stroke_color(&mut ops, DARK_GOLDENROD);
    set_line_width(&mut ops, 2.0);
    stroke_rect(&mut ops, MARGIN, MARGIN, avail_w, avail_h);

    let grid_x_left = MARGIN + BOARD_INNER_MARGIN;
    let grid_y_top = top_y - BOARD_INNER_MARGIN;
    let (cell_w, cell_h) = board_cell_size();

    let mut cur_y_top = grid_y_top;
    for row in 0..board.rows() {
        let mut cur_x_left = grid_x_left;
        for col in 0..board.cols() {
            let id = board.cell(row, col);
            let record = catalog
                .get(id)
                .ok_or(RenderError::UnknownCard { id })?;

            let cell_x = cur_x_left;
            let cell_y = cur_y_top - cell_h;

            set_stroke_color(&mut ops, BLACK);
            set_line_width(&mut ops, 1.0);
            stroke_rect(&mut ops, cell_x, cell_y, cell_w, cell_h);

            let caption_y = cell_y + cell_h - BOARD_CAPTION_H + 0.06 * PT_PER_IN;
            draw_centered_text(
                &mut ops,
                cell_x,
                caption_y,
                cell_w,
                &record.name,
                "F1",
                CAPTION_SIZE,
            );

            if let Some((name, _)) = images.get(&id) {
                draw_image(
                    &mut ops,
                    name,
                    cell_x + BOARD_IMG_PAD,
                    cell_y + BOARD_IMG_PAD,
                    cell_w - 2.0 * BOARD_IMG_PAD,
                    cell_h - BOARD_CAPTION_H - 2.0 * BOARD_IMG_PAD,
                );
            }

            cur_x_left += cell_w + BOARD_CELL_GAP;
        }
        cur_y_top -= cell_h + BOARD_CELL_GAP;
    }

    Ok(ops)
}

// ------------------- drawing primitives -------------------

const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
const DARK_GOLDENROD: (f32, f32, f32) = (0.72, 0.53, 0.04);
const GREY: (f32, f32, f32) = (0.5, 0.5, 0.5);
const PARCHMENT: (f32, f32, f32) = (0.98, 0.95, 0.88);
const PARCHMENT_BORDER: (f32, f32, f32) = (0.5, 0.35, 0.15);

fn op(ops: &mut Ops, operator: &str, operands: Vec<Object>) {
    ops.push((operator.to_string(), operands));
}

fn set_stroke_color(ops: &mut Ops, (r, g, b): (f32, f32, f32)) {
    op(ops, "RG", vec![r.into(), g.into(), b.into()]);
}

fn set_fill_color(ops: &mut Ops, (r, g, b): (f32, f32, f32)) {
    op(ops, "rg", vec![r.into(), g.into(), b.into()]);
}

fn set_line_width(ops: &mut Ops, width: f32) {
    op(ops, "w", vec![width.into()]);
}

fn stroke_rect(ops: &mut Ops, x: f32, y: f32, w: f32, h: f32) {
    op(ops, "re", vec![x.into(), y.into(), w.into(), h.into()]);
    op(ops, "S", vec![]);
}

fn fill_rect(ops: &mut Ops, x: f32, y: f32, w: f32, h: f32) {
    op(ops, "re", vec![x.into(), y.into(), w.into(), h.into()]);
    op(ops, "f", vec![]);
}

fn line(ops: &mut Ops, x1: f32, y1: f32, x2: f32, y2: f32) {
    op(ops, "m", vec![x1.into(), y1.into()]);
    op(ops, "l", vec![x2.into(), y2.into()]);
    op(ops, "S", vec![]);
}

/// Page-filling parchment tone with a darker border near the page edge.
fn draw_parchment_background(ops: &mut Ops) {
    set_fill_color(ops, PARCHMENT);
    fill_rect(ops, 0.0, 0.0, PAGE_W, PAGE_H);

    let inset = 0.25 * PT_PER_IN;
    set_stroke_color(ops, PARCHMENT_BORDER);
    set_line_width(ops, 3.0);
    stroke_rect(ops, inset, inset, PAGE_W - 2.0 * inset, PAGE_H - 2.0 * inset);
}

/// Internal cut lines between cells plus perimeter crop marks.
///
/// `origin_y` is the top edge of the grid; lines stay in the gaps so they
/// never cross the card images.
#[allow(clippy::too_many_arguments)]
fn draw_cut_lines(
    ops: &mut Ops,
    origin_x: f32,
    origin_y: f32,
    cell_w: f32,
    cell_h: f32,
    rows: usize,
    cols: usize,
    gap: f32,
) {
    set_stroke_color(ops, GREY);
    set_line_width(ops, 0.5);

    let total_w = cols as f32 * cell_w + (cols as f32 - 1.0) * gap;
    let total_h = rows as f32 * cell_h + (rows as f32 - 1.0) * gap;

    for i in 1..cols {
        let x = origin_x + i as f32 * cell_w + (i as f32 - 1.0) * gap + gap / 2.0;
        line(ops, x, origin_y - total_h, x, origin_y);
    }
    for j in 1..rows {
        let y = origin_y - j as f32 * cell_h - (j as f32 - 1.0) * gap - gap / 2.0;
        line(ops, origin_x, y, origin_x + total_w, y);
    }

    // Crop marks at the four corners of the grid
    let mark = CROP_MARK;
    line(ops, origin_x, origin_y + mark / 2.0, origin_x, origin_y - mark / 2.0);
    line(
        ops,
        origin_x + total_w,
        origin_y + mark / 2.0,
        origin_x + total_w,
        origin_y - mark / 2.0,
    );
    line(
        ops,
        origin_x,
        origin_y - total_h + mark / 2.0,
        origin_x,
        origin_y - total_h - mark / 2.0,
    );
    line(
        ops,
        origin_x + total_w,
        origin_y - total_h + mark / 2.0,
        origin_x + total_w,
        origin_y - total_h - mark / 2.0,
    );
    line(ops, origin_x - mark / 2.0, origin_y, origin_x + mark / 2.0, origin_y);
    line(
        ops,
        origin_x - mark / 2.0,
        origin_y - total_h,
        origin_x + mark / 2.0,
        origin_y - total_h,
    );
    line(
        ops,
        origin_x + total_w - mark / 2.0,
        origin_y,
        origin_x + total_w + mark / 2.0,
        origin_y,
    );
    line(
        ops,
        origin_x + total_w - mark / 2.0,
        origin_y - total_h,
        origin_x + total_w + mark / 2.0,
        origin_y - total_h,
    );
}

/// Horizontally centered text at baseline `y`, truncated to fit `w`.
fn draw_centered_text(ops: &mut Ops, x: f32, y: f32, w: f32, text: &str, font: &str, size: f32) {
    let fitted = truncate_to_width(text, w - 10.0, size);
    let text_w = text_width(&fitted, size);
    let tx = x + (w - text_w) / 2.0;

    set_fill_color(ops, BLACK);
    op(ops, "BT", vec![]);
    op(
        ops,
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), size.into()],
    );
    op(ops, "Td", vec![tx.into(), y.into()]);
    op(
        ops,
        "Tj",
        vec![Object::String(encode_winansi(&fitted), StringFormat::Literal)],
    );
    op(ops, "ET", vec![]);
}

fn draw_image(ops: &mut Ops, name: &str, x: f32, y: f32, w: f32, h: f32) {
    op(ops, "q", vec![]);
    op(
        ops,
        "cm",
        vec![w.into(), 0.0.into(), 0.0.into(), h.into(), x.into(), y.into()],
    );
    op(ops, "Do", vec![Object::Name(name.as_bytes().to_vec())]);
    op(ops, "Q", vec![]);
}

/// Estimated width of `text`, without real font metrics.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * APPROX_CHAR_WIDTH
}

/// Drop trailing characters until the text fits `max_w`, keeping at least 3.
fn truncate_to_width(text: &str, max_w: f32, size: f32) -> String {
    let mut fitted: String = text.to_string();
    while text_width(&fitted, size) > max_w && fitted.chars().count() > 3 {
        fitted.pop();
    }
    fitted
}

/// Map text to WinAnsi bytes, escaping PDF string delimiters. Characters
/// outside Latin-1 become '?'.
fn encode_winansi(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let code = ch as u32;
        let byte = if code <= 0xFF { code as u8 } else { b'?' };
        match byte {
            b'(' | b')' | b'\\' => {
                bytes.push(b'\\');
                bytes.push(byte);
            }
            _ => bytes.push(byte),
        }
    }
    bytes
}

// ------------------- document assembly -------------------

/// Shared page resources: the two caption/title fonts plus every embedded
/// card image.
fn build_resources(doc: &mut Document, images: &HashMap<CardId, (String, ObjectId)>) -> ObjectId {
    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Dictionary(type1_font("Helvetica")));
    fonts.set("F2", Object::Dictionary(type1_font("Helvetica-Bold")));

    let mut xobjects = Dictionary::new();
    for (name, id) in images.values() {
        xobjects.set(name.clone(), Object::Reference(*id));
    }

    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));
    resources.set("XObject", Object::Dictionary(xobjects));
    doc.add_object(resources)
}

fn type1_font(base_font: &str) -> Dictionary {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(base_font.as_bytes().to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    font
}

/// Encode drawing operations into a raw content stream.
fn encode_operations(operations: &Ops) -> Vec<u8> {
    let mut content_data = Vec::new();
    for (operator, operands) in operations {
        for operand in operands {
            match operand {
                Object::Integer(i) => content_data.extend_from_slice(i.to_string().as_bytes()),
                Object::Real(f) => content_data.extend_from_slice(f.to_string().as_bytes()),
                Object::Name(n) => {
                    content_data.push(b'/');
                    content_data.extend_from_slice(n);
                }
                Object::String(s, _) => {
                    content_data.push(b'(');
                    content_data.extend_from_slice(s);
                    content_data.push(b')');
                }
                Object::Reference(r) => {
                    content_data.extend_from_slice(r.0.to_string().as_bytes());
                    content_data.push(b' ');
                    content_data.extend_from_slice(r.1.to_string().as_bytes());
                    content_data.push(b' ');
                    content_data.push(b'R');
                }
                _ => {}
            }
            content_data.push(b' ');
        }
        content_data.extend_from_slice(operator.as_bytes());
        content_data.push(b'\n');
    }
    content_data
}

fn push_page(doc: &mut Document, page_ids: &mut Vec<ObjectId>, resources_id: ObjectId, ops: Ops) {
    let content_id = doc.add_object(Stream::new(Dictionary::new(), encode_operations(&ops)));

    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set(
        "MediaBox",
        vec![0.into(), 0.into(), PAGE_W.into(), PAGE_H.into()],
    );
    page_dict.set("Contents", Object::Reference(content_id));
    page_dict.set("Resources", Object::Reference(resources_id));

    page_ids.push(doc.add_object(page_dict));
}

/// Build the page tree and document catalog, then write the file.
fn finish_document(
    doc: &mut Document,
    page_ids: &[ObjectId],
    out_path: &Path,
) -> Result<(), RenderError> {
    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set(
        "Kids",
        Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
    );
    pages_dict.set("Count", Object::Integer(page_ids.len() as i64));
    let pages_id = doc.add_object(pages_dict);

    for page_id in page_ids {
        if let Ok(Object::Dictionary(page_dict)) = doc.get_object_mut(*page_id) {
            page_dict.set("Parent", Object::Reference(pages_id));
        }
    }

    let mut catalog_dict = Dictionary::new();
    catalog_dict.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog_dict.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog_dict);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(out_path).map_err(|source| RenderError::Write {
        path: out_path.to_path_buf(),
        source,
    })?;

    Ok(())
}
