//! Plain-text tables sized to the terminal.

/// Width of the terminal attached to stdout, if there is one.
#[cfg(unix)]
pub fn console_width() -> Option<usize> {
    // SAFETY: TIOCGWINSZ only writes into the zeroed winsize we pass.
    unsafe {
        let mut ws: libc::winsize = std::mem::zeroed();
        if libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) == 0 && ws.ws_col > 0 {
            Some(ws.ws_col as usize)
        } else {
            None
        }
    }
}

#[cfg(not(unix))]
pub fn console_width() -> Option<usize> {
    None
}

/// A table with a header row, rendered with `|` separators.
///
/// Columns grow to fit their widest cell unless a limit is set, in which case longer cells
/// wrap onto continuation lines.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    limits: Vec<Option<usize>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let limits = vec![None; headers.len()];
        Self {
            headers,
            rows: Vec::new(),
            limits,
        }
    }

    /// Cap the width of `column` at `width` characters (at least 1).
    pub fn limit(&mut self, column: usize, width: usize) -> &mut Self {
        if let Some(limit) = self.limits.get_mut(column) {
            *limit = Some(width.max(1));
        }
        self
    }

    /// Append a row; missing cells are empty and extra cells are dropped.
    pub fn add_row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) -> &mut Self {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
        self
    }

    pub fn render(&self) -> String {
        let widths: Vec<usize> = (0..self.headers.len())
            .map(|column| {
                let natural = std::iter::once(&self.headers[column])
                    .chain(self.rows.iter().map(|row| &row[column]))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0);
                match self.limits[column] {
                    Some(limit) => natural.min(limit),
                    None => natural,
                }
            })
            .collect();

        let mut out = String::new();
        self.render_row(&self.headers, &widths, &mut out);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("-+-"));
        out.push('\n');
        for row in &self.rows {
            self.render_row(row, &widths, &mut out);
        }
        out
    }

    fn render_row(&self, row: &[String], widths: &[usize], out: &mut String) {
        let wrapped: Vec<Vec<String>> = row
            .iter()
            .zip(widths)
            .map(|(cell, &width)| wrap(cell, width))
            .collect();
        let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);

        for line in 0..height {
            let cells: Vec<String> = wrapped
                .iter()
                .zip(widths)
                .map(|(chunks, &width)| {
                    let chunk = chunks.get(line).map(String::as_str).unwrap_or("");
                    format!("{:<width$}", chunk, width = width)
                })
                .collect();
            out.push_str(cells.join(" | ").trim_end());
            out.push('\n');
        }
    }
}

fn wrap(cell: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = cell.chars().collect();
    if chars.is_empty() || width == 0 {
        return vec![String::new()];
    }
    chars.chunks(width).map(|chunk| chunk.iter().collect()).collect()
}
