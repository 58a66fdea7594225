use chrono::{DateTime, Local};
use std::io::Write;

const RULE: &str = "===============================================";
const CLEAR: &str = "\x1B[2J\x1B[1;1H";

#[derive(Debug, Clone)]
pub struct Screen {
    library_name: String,
    clear_screen: bool,
}

impl Screen {
    pub fn new(library_name: impl Into<String>, clear_screen: bool) -> Self {
        Self {
            library_name: library_name.into(),
            clear_screen,
        }
    }

    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    pub fn title(&self) -> String {
        format!("{} Library Management System", self.library_name)
    }

    pub fn clear<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if self.clear_screen {
            write!(out, "{}", CLEAR)?;
        }
        Ok(())
    }

    pub fn banner_at(&self, now: DateTime<Local>) -> String {
        format!(
            "{RULE}\n{:^47}\n{RULE}\nDate: {}   Time: {}\n\n",
            self.title(),
            now.format("%Y-%m-%d"),
            now.format("%I:%M %p")
        )
    }

    pub fn banner<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "{}", self.banner_at(Local::now()))
    }
}
