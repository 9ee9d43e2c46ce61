mod common;

use common::Scratch;
use flatfs::*;

fn run(fs: &mut FileSystem, line: &str) -> String {
    match execute(fs, line) {
        Ok(Some(output)) => output,
        other => panic!("{:?} -> {:?}", line, other),
    }
}

#[test]
fn shell_session() {
    let scratch = Scratch::new("session");
    let image = scratch.path("disk.img");
    let name = scratch.write("hello.txt", b"hello");
    let copy = scratch.path("copy.txt");
    let mut fs = FileSystem::new();

    assert!(matches!(execute(&mut fs, "df"), Err(Error::NotOpen)));
    assert_eq!(run(&mut fs, &format!("createfs {}", image)), "");
    assert_eq!(run(&mut fs, &format!("open {}", image)), "");
    assert_eq!(run(&mut fs, &format!("insert {}", name)), "");

    let listing = run(&mut fs, "list");
    log!("list -> {:?}", listing);
    assert!(listing.starts_with("5 "));
    assert!(listing.ends_with(&format!(" {}\n", name)));

    let free = (NUM_BLOCKS - FIRST_DATA_BLOCK - 1) * BLOCK_SIZE;
    assert_eq!(run(&mut fs, "df"), format!("{} bytes free.\n", free));
    assert_eq!(run(&mut fs, &format!("read {} 0 5", name)), "68 65 6c 6c 6f\n");
    assert_eq!(run(&mut fs, &format!("read {} 1 2", name)), "65 6c\n");

    run(&mut fs, &format!("attrib +h {}", name));
    assert!(matches!(execute(&mut fs, "list"), Err(Error::NoFilesFound)));
    assert!(run(&mut fs, "list -a").ends_with(" 00000010\n"));
    assert!(run(&mut fs, "list -h").ends_with(&format!(" {}\n", name)));

    run(&mut fs, &format!("encrypt {} 0f", name));
    assert_eq!(run(&mut fs, &format!("read {} 0 1", name)), "67\n");
    run(&mut fs, &format!("decrypt {} 0F", name));
    run(&mut fs, &format!("retrieve {} {}", name, copy));
    assert_eq!(scratch.read("copy.txt"), b"hello");

    run(&mut fs, &format!("delete {}", name));
    run(&mut fs, &format!("undelete {}", name));
    run(&mut fs, "savefs");
    run(&mut fs, "close");
    assert!(!fs.is_open());
}

#[test]
fn command_errors() {
    let scratch = Scratch::new("cmd_errors");
    let image = scratch.path("disk.img");
    let mut fs = FileSystem::new();
    run(&mut fs, &format!("createfs {}", image));
    run(&mut fs, &format!("open {}", image));

    assert!(matches!(execute(&mut fs, "pwd"), Ok(None)));
    assert!(matches!(execute(&mut fs, "insert"), Err(Error::MissingArgument("filename"))));
    assert!(matches!(execute(&mut fs, "read x 0"), Err(Error::MissingArgument("byte count"))));
    assert!(matches!(execute(&mut fs, "read x zero 1"), Err(Error::InvalidParameter(_))));
    assert!(matches!(execute(&mut fs, "attrib +q x"), Err(Error::InvalidAttribute(_))));
    assert!(matches!(execute(&mut fs, "encrypt x 123"), Err(Error::InvalidKey(_))));
    assert!(matches!(execute(&mut fs, "list -z"), Err(Error::InvalidParameter(_))));
    assert!(matches!(execute(&mut fs, "delete missing"), Err(Error::NotFound)));
    assert!(matches!(execute(&mut fs, "open other.img"), Err(Error::AlreadyOpen)));

    let err = execute(&mut fs, "undelete missing").unwrap_err();
    assert_eq!(err.to_string(), Error::NotFound.to_string());
}
