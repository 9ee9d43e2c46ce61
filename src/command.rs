//! The command surface the shell drives: one tokenized line in, the text to
//! print (or a typed error) out.

use crate::cipher::parse_key;
use crate::error::{FsError, Result};
use crate::fs::{AttribChange, FileSystem};
use crate::list::{hex_dump, ListFilter};

/// The shell splits a line into at most this many tokens; the rest is dropped.
pub const MAX_NUM_ARGUMENTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateFs(String),
    SaveFs,
    Open(String),
    Close,
    List(ListFilter),
    Df,
    Insert(String),
    Attrib(AttribChange, String),
    Delete(String),
    Undelete(String),
    Read { name: String, start: usize, count: usize },
    Retrieve { name: String, new_name: Option<String> },
    Encrypt { name: String, key: u8 },
    Decrypt { name: String, key: u8 },
}

fn required(tokens: &[&str], index: usize, what: &'static str) -> Result<String> {
    tokens
        .get(index)
        .map(|s| s.to_string())
        .ok_or(FsError::MissingArgument(what))
}

fn number(tokens: &[&str], index: usize, what: &'static str) -> Result<usize> {
    let text = required(tokens, index, what)?;
    text.parse().map_err(|_| FsError::InvalidParameter(text))
}

impl Command {
    /// Parses a tokenized line. Returns `Ok(None)` when the first token is not
    /// a filesystem command.
    pub fn parse(tokens: &[&str]) -> Result<Option<Self>> {
        let Some(&name) = tokens.first() else {
            return Ok(None);
        };

        let command = match name {
            "createfs" => Command::CreateFs(required(tokens, 1, "filename")?),
            "savefs" => Command::SaveFs,
            "open" => Command::Open(required(tokens, 1, "filename")?),
            "close" => Command::Close,
            "list" => Command::List(ListFilter::parse(tokens.get(1).copied(), tokens.get(2).copied())?),
            "df" => Command::Df,
            "insert" => Command::Insert(required(tokens, 1, "filename")?),
            "attrib" => {
                let change = AttribChange::parse(&required(tokens, 1, "attribute")?)?;
                Command::Attrib(change, required(tokens, 2, "filename")?)
            }
            "delete" => Command::Delete(required(tokens, 1, "filename")?),
            "undelete" => Command::Undelete(required(tokens, 1, "filename")?),
            "read" => Command::Read {
                name: required(tokens, 1, "filename")?,
                start: number(tokens, 2, "starting byte")?,
                count: number(tokens, 3, "byte count")?,
            },
            "retrieve" => Command::Retrieve {
                name: required(tokens, 1, "filename")?,
                new_name: tokens.get(2).map(|s| s.to_string()),
            },
            "encrypt" => Command::Encrypt {
                name: required(tokens, 1, "filename")?,
                key: parse_key(&required(tokens, 2, "cipher")?)?,
            },
            "decrypt" => Command::Decrypt {
                name: required(tokens, 1, "filename")?,
                key: parse_key(&required(tokens, 2, "cipher")?)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    /// Runs the command and returns what the shell should print.
    pub fn run(&self, fs: &mut FileSystem) -> Result<String> {
        match self {
            Command::CreateFs(name) => fs.createfs(name)?,
            Command::SaveFs => fs.savefs()?,
            Command::Open(name) => fs.openfs(name)?,
            Command::Close => fs.closefs()?,
            Command::List(filter) => {
                let rows = fs.list(*filter)?;
                return Ok(rows.iter().map(|row| format!("{}\n", row)).collect());
            }
            Command::Df => return Ok(format!("{} bytes free.\n", fs.df()?)),
            Command::Insert(name) => fs.insert(name)?,
            Command::Attrib(change, name) => fs.attrib(*change, name)?,
            Command::Delete(name) => fs.delete(name)?,
            Command::Undelete(name) => fs.undelete(name)?,
            Command::Read { name, start, count } => return Ok(hex_dump(&fs.read(name, *start, *count)?)),
            Command::Retrieve { name, new_name } => fs.retrieve(name, new_name.as_deref())?,
            Command::Encrypt { name, key } => fs.encrypt(name, *key)?,
            Command::Decrypt { name, key } => fs.decrypt(name, *key)?,
        }
        Ok(String::new())
    }
}

/// Parses and runs one line. `Ok(None)` means the line was not a filesystem command.
pub fn execute(fs: &mut FileSystem, line: &str) -> Result<Option<String>> {
    let tokens: Vec<&str> = line.split_whitespace().take(MAX_NUM_ARGUMENTS).collect();
    match Command::parse(&tokens)? {
        Some(command) => command.run(fs).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Attributes;

    #[test]
    fn parses_every_command() {
        assert_eq!(Command::parse(&["savefs"]).unwrap(), Some(Command::SaveFs));
        assert_eq!(
            Command::parse(&["attrib", "+r", "a.txt"]).unwrap(),
            Some(Command::Attrib(AttribChange::Set(Attributes::READONLY), "a.txt".into()))
        );
        assert_eq!(
            Command::parse(&["read", "a.txt", "4", "10"]).unwrap(),
            Some(Command::Read { name: "a.txt".into(), start: 4, count: 10 })
        );
        assert_eq!(
            Command::parse(&["retrieve", "a.txt"]).unwrap(),
            Some(Command::Retrieve { name: "a.txt".into(), new_name: None })
        );
        assert_eq!(
            Command::parse(&["decrypt", "a.txt", "Fe"]).unwrap(),
            Some(Command::Decrypt { name: "a.txt".into(), key: 0xfe })
        );
        assert_eq!(Command::parse(&["ls", "-l"]).unwrap(), None);
        assert_eq!(Command::parse(&[]).unwrap(), None);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(matches!(Command::parse(&["insert"]), Err(FsError::MissingArgument("filename"))));
        assert!(matches!(Command::parse(&["attrib", "+x", "a"]), Err(FsError::InvalidAttribute(_))));
        assert!(matches!(Command::parse(&["attrib", "+h"]), Err(FsError::MissingArgument(_))));
        assert!(matches!(Command::parse(&["read", "a", "x", "1"]), Err(FsError::InvalidParameter(_))));
        assert!(matches!(Command::parse(&["encrypt", "a", "123"]), Err(FsError::InvalidKey(_))));
        assert!(matches!(Command::parse(&["list", "-z"]), Err(FsError::InvalidParameter(_))));
    }

    #[test]
    fn commands_need_an_open_image() {
        let mut fs = FileSystem::new();
        for line in ["savefs", "close", "df", "list", "delete a", "read a 0 1"] {
            assert!(matches!(execute(&mut fs, line), Err(FsError::NotOpen)), "{}", line);
        }
        assert!(matches!(execute(&mut fs, "   "), Ok(None)));
    }
}
