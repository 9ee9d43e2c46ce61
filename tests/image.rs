mod common;

use std::fs;

use common::{mounted, Scratch};
use flatfs::*;

#[test]
fn saved_image_survives_close_and_open() {
    let scratch = Scratch::new("persist");
    let image = scratch.path("disk.img");
    let name = scratch.write("a.txt", b"hello");
    let out = scratch.path("b.txt");

    let mut fs = FileSystem::new();
    fs.createfs(&image).unwrap();
    assert_eq!(fs::metadata(&image).unwrap().len(), IMAGE_SIZE as u64);
    assert!(!fs.is_open());

    fs.openfs(&image).unwrap();
    fs.insert(&name).unwrap();
    fs.attrib(AttribChange::Set(Attributes::READONLY), &name).unwrap();
    fs.savefs().unwrap();
    fs.closefs().unwrap();
    log!("saved and closed {}", image);

    fs.openfs(&image).unwrap();
    fs.retrieve(&name, Some(&out)).unwrap();
    assert_eq!(fs::read(&out).unwrap(), b"hello");

    let rows = fs.list(ListFilter::default()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].size, 5);
    assert_eq!(rows[0].attribute, Attributes::READONLY);
    assert_eq!(fs.df().unwrap(), (NUM_BLOCKS - FIRST_DATA_BLOCK - 1) * BLOCK_SIZE);
}

#[test]
fn close_discards_unsaved_changes() {
    let scratch = Scratch::new("discard");
    let image = scratch.path("disk.img");
    let name = scratch.write("lost", b"never saved");
    let mut fs = mounted(&scratch);

    fs.insert(&name).unwrap();
    fs.closefs().unwrap();

    fs.openfs(&image).unwrap();
    assert!(matches!(fs.list(ListFilter::default()), Err(Error::NoFilesFound)));
    assert!(matches!(fs.read_all(&name), Err(Error::NotFound)));
}

#[test]
fn image_lifecycle_errors() {
    let scratch = Scratch::new("lifecycle");
    let image = scratch.path("disk.img");
    let mut fs = mounted(&scratch);

    assert_eq!(fs.image_name().map(|p| p.to_string_lossy().into_owned()), Some(image.clone()));
    assert!(matches!(fs.openfs(&image), Err(Error::AlreadyOpen)));
    assert!(matches!(fs.createfs(&scratch.path("other.img")), Err(Error::AlreadyOpen)));

    fs.closefs().unwrap();
    assert!(matches!(fs.closefs(), Err(Error::NotOpen)));
    assert!(matches!(fs.savefs(), Err(Error::NotOpen)));
    assert!(matches!(fs.df(), Err(Error::NotOpen)));
    assert!(matches!(fs.insert(&image), Err(Error::NotOpen)));
    assert!(matches!(fs.undelete("x"), Err(Error::NotOpen)));
    assert_eq!(fs.read_all("x").unwrap_err().kind(), ErrorKind::NotOpen);

    let err = fs.openfs(&scratch.path("missing.img")).unwrap_err();
    assert!(matches!(err, Error::ImageNotFound));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let long = "i".repeat(MAX_FILE_NAME_LEN + 1);
    assert!(matches!(fs.createfs(&long), Err(Error::NameTooLong)));
    assert!(matches!(fs.createfs(""), Err(Error::EmptyName)));
}

#[test]
fn rejects_foreign_images() {
    let scratch = Scratch::new("foreign");
    let mut fs = FileSystem::new();

    let short = scratch.write("short.img", b"not an image");
    let err = fs.openfs(&short).unwrap_err();
    assert!(matches!(err, Error::InvalidImage(_)), "{:?}", err);
    assert_eq!(err.kind(), ErrorKind::InvalidImage);
    assert!(!fs.is_open());

    let blank = scratch.write("blank.img", &vec![0u8; IMAGE_SIZE]);
    assert!(matches!(fs.openfs(&blank), Err(Error::InvalidImage(_))));
    assert!(!fs.is_open());
}
