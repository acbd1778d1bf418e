//! Where the line being worked on comes from and goes back to.

use std::{
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
};

pub trait LineSource {
    fn get_line(&mut self) -> io::Result<String>;
    fn set_line(&mut self, line: &str) -> io::Result<()>;
}

/// One line of a text file, counted from 1.
pub struct FileLine {
    pub path: PathBuf,
    pub line: usize,
}

/// Reads the line from stdin and writes the result to stdout.
pub struct StdioLine;

impl FileLine {
    fn out_of_range(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no line {}", self.path.display(), self.line),
        )
    }
}

impl LineSource for FileLine {
    fn get_line(&mut self) -> io::Result<String> {
        let content = fs::read_to_string(&self.path)?;

        content
            .split('\n')
            .nth(self.line.wrapping_sub(1))
            .map(|l| l.trim_end_matches('\r').to_owned())
            .ok_or_else(|| self.out_of_range())
    }

    fn set_line(&mut self, line: &str) -> io::Result<()> {
        let content = fs::read_to_string(&self.path)?;
        let mut lines: Vec<&str> = content.split('\n').collect();

        let slot = lines
            .get_mut(self.line.wrapping_sub(1))
            .ok_or_else(|| self.out_of_range())?;
        // Keep the line ending the slot had.
        let replacement = if slot.ends_with('\r') {
            format!("{line}\r")
        } else {
            line.to_owned()
        };
        *slot = &replacement;

        fs::write(&self.path, lines.join("\n"))
    }
}

impl LineSource for StdioLine {
    fn get_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;

        Ok(line.trim_end_matches(['\r', '\n']).to_owned())
    }

    fn set_line(&mut self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_one_line_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.md");
        fs::write(&path, "# title\r\nsee https://a/notes/1\nend\n").unwrap();

        let mut source = FileLine {
            path: path.clone(),
            line: 2,
        };
        assert_eq!(source.get_line().unwrap(), "see https://a/notes/1");

        source.set_line("see\n> quoted\n").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# title\r\nsee\n> quoted\n\nend\n"
        );
    }

    #[test]
    fn crlf_line_endings_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.md");
        fs::write(&path, "a\r\nb\r\nc\r\n").unwrap();

        let mut source = FileLine {
            path: path.clone(),
            line: 2,
        };
        let line = source.get_line().unwrap();
        assert_eq!(line, "b");
        source.set_line(&line).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\r\nb\r\nc\r\n");
    }

    #[test]
    fn line_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.md");
        fs::write(&path, "only\n").unwrap();

        for line in [0, 3] {
            let mut source = FileLine {
                path: path.clone(),
                line,
            };
            let err = source.get_line().unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        }
    }
}
