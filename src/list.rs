//! Directory listing and the text renderings the shell prints.

use std::fmt;

use chrono::{DateTime, Local};

use crate::config::NEVER;
use crate::error::{FsError, Result};
use crate::Attributes;

/// Which entries `list` shows and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListFilter {
    /// Include files carrying the HIDDEN attribute.
    pub show_hidden: bool,
    /// Append the attribute byte as eight binary digits.
    pub show_attributes: bool,
}

impl ListFilter {
    /// Builds a filter from up to two flags, each `-h` or `-a`, in either order.
    /// `-h` includes hidden files; `-a` includes hidden files and shows attributes.
    pub fn parse(first: Option<&str>, second: Option<&str>) -> Result<Self> {
        let mut filter = Self::default();
        for flag in [first, second].into_iter().flatten() {
            match flag {
                "-h" => filter.show_hidden = true,
                "-a" => {
                    filter.show_hidden = true;
                    filter.show_attributes = true;
                }
                other => return Err(FsError::InvalidParameter(other.to_string())),
            }
        }
        Ok(filter)
    }
}

/// One row of `list` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub name: String,
    pub size: u32,
    pub date: i64,
    pub attribute: Attributes,
    pub show_attributes: bool,
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.size, format_date(self.date), self.name)?;
        if self.show_attributes {
            write!(f, " {:08b}", self.attribute.bits())?;
        }
        Ok(())
    }
}

/// Renders a unix timestamp the way C `ctime` does, in local time.
pub fn format_date(date: i64) -> String {
    if date == NEVER {
        return "-".to_string();
    }
    match DateTime::from_timestamp(date, 0) {
        Some(utc) => utc.with_timezone(&Local).format("%a %b %e %H:%M:%S %Y").to_string(),
        None => "-".to_string(),
    }
}

/// Space separated two-digit hex bytes, newline terminated.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = bytes.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(" ");
    out.push('\n');
    out
}
