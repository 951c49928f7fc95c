use std::fs;
use std::path::PathBuf;

use loteria_pdf::boards::generate_boards;
use loteria_pdf::catalog::load_catalog;
use loteria_pdf::render::{render_boards_pdf, render_cards_pdf, RenderError};

/// Build a loadable fixture with real (tiny) PNG images.
fn fixture_with_pngs(name: &str, count: u16) -> (PathBuf, PathBuf) {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("loteria_render_{name}_{ts}"));
    let images = dir.join("images");
    fs::create_dir_all(&images).unwrap();

    let mut csv = String::from("id,name,filename\n");
    for id in 1..=count {
        let filename = format!("card_{id}.png");
        // Distinct solid color per card so the files differ
        let pixel = image::Rgb([(id * 4) as u8, 64, 128]);
        let img = image::RgbImage::from_pixel(6, 9, pixel);
        img.save(images.join(&filename)).unwrap();
        csv.push_str(&format!("{id},Carta {id},{filename}\n"));
    }
    let csv_path = dir.join("cards.csv");
    fs::write(&csv_path, csv).unwrap();
    (dir, csv_path)
}

#[test]
fn renders_deck_and_boards_documents() {
    let (dir, csv) = fixture_with_pngs("full", 20);
    let catalog = load_catalog(&csv, &dir.join("images")).unwrap();

    let cards_out = dir.join("cartas.pdf");
    render_cards_pdf(&catalog, &cards_out).unwrap();
    let cards_bytes = fs::read(&cards_out).unwrap();
    assert!(cards_bytes.starts_with(b"%PDF-"), "not a PDF header");

    let set = generate_boards(&catalog, 3, 4, 4, 42).unwrap();
    let boards_out = dir.join("tableros.pdf");
    render_boards_pdf(&catalog, &set, &boards_out).unwrap();
    let board_bytes = fs::read(&boards_out).unwrap();
    assert!(board_bytes.starts_with(b"%PDF-"));

    // One page per board, and 20 cards fit on two 16-per-page deck sheets.
    let boards_doc = lopdf::Document::load(&boards_out).unwrap();
    assert_eq!(boards_doc.get_pages().len(), 3);
    let cards_doc = lopdf::Document::load(&cards_out).unwrap();
    assert_eq!(cards_doc.get_pages().len(), 2);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn unwritable_output_path_is_a_write_error() {
    let (dir, csv) = fixture_with_pngs("unwritable", 16);
    let catalog = load_catalog(&csv, &dir.join("images")).unwrap();

    // Target directory does not exist, so saving the document fails.
    let out = dir.join("no_such_dir").join("cartas.pdf");
    let err = render_cards_pdf(&catalog, &out).unwrap_err();
    match err {
        RenderError::Write { path, .. } => assert!(path.ends_with("cartas.pdf")),
        other => panic!("expected Write error, got {other}"),
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn undecodable_image_is_a_render_error() {
    let (dir, csv) = fixture_with_pngs("bad", 16);
    // Corrupt one image after the loader's existence check would pass.
    fs::write(dir.join("images").join("card_3.png"), b"not a png").unwrap();

    let catalog = load_catalog(&csv, &dir.join("images")).unwrap();
    let err = render_cards_pdf(&catalog, &dir.join("cartas.pdf")).unwrap_err();
    match err {
        RenderError::Image { path, .. } => assert!(path.ends_with("card_3.png")),
        other => panic!("expected Image error, got {other}"),
    }
    // Fail-fast: no partial document left behind.
    assert!(!dir.join("cartas.pdf").exists());

    fs::remove_dir_all(&dir).ok();
}
