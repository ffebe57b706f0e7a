use std::io::{self, BufRead, Write};

/// Line-oriented terminal input. `None` from any read means input ended.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            self.output.write_all(b"\n")?;
        }
        self.output.flush()
    }

    pub fn line(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}> ")?;
        self.output.flush()?;

        let mut buffer = String::new();
        if self.input.read_line(&mut buffer)? == 0 {
            return Ok(None);
        }
        Ok(Some(buffer.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Asks for a field value; an empty answer keeps `current`.
    pub fn field(&mut self, label: &str, current: &str) -> io::Result<Option<String>> {
        let label = if current.is_empty() {
            label.to_string()
        } else {
            format!("{label} [{current}]")
        };
        Ok(self.line(&label)?.map(|answer| {
            if answer.trim().is_empty() {
                current.to_string()
            } else {
                answer.trim().to_string()
            }
        }))
    }

    pub fn confirm(&mut self, label: &str, current: bool) -> io::Result<Option<bool>> {
        let hint = if current { "Y/n" } else { "y/N" };
        Ok(self.line(&format!("{label} ({hint})"))?.map(|answer| {
            match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => true,
                "n" | "no" => false,
                _ => current,
            }
        }))
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}
