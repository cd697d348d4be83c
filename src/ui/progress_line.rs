use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Terminal progress line for a running mirror operation.
pub struct ProgressLine<'a> {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
    pub status: &'a str,
    pub elapsed_secs: u64,
}

impl ProgressLine<'_> {
    /// Render into at most `width` terminal columns.
    pub fn render(&self, width: usize) -> String {
        let bar_width = 20;
        let filled = bar_width * self.percentage.min(100) as usize / 100;
        let stats = format!(
            "[{}{}] {:>3}% {}/{} {}s ",
            "#".repeat(filled),
            "-".repeat(bar_width - filled),
            self.percentage,
            format_number(self.completed),
            format_number(self.total),
            self.elapsed_secs,
        );

        if stats.width() >= width {
            return truncate_middle(&stats, width);
        }
        let room = width - stats.width();
        format!("{}{}", stats, truncate_middle(self.status, room))
    }
}

/// Shorten `text` to `max_width` columns, keeping its start and end.
pub fn truncate_middle(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width < 6 {
        return ".".repeat(max_width.min(3));
    }
    let keep = max_width - 3;
    let tail_len = keep / 2;
    let head_len = keep - tail_len;

    let mut w = 0;
    let head_end = text
        .char_indices()
        .find(|&(_, c)| {
            w += c.width().unwrap_or(0);
            w > head_len
        })
        .map(|(i, _)| i)
        .unwrap_or(text.len());

    w = 0;
    let tail_start = text
        .char_indices()
        .rev()
        .find(|&(_, c)| {
            w += c.width().unwrap_or(0);
            w > tail_len
        })
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);

    format!("{}...{}", &text[..head_end], &text[tail_start..])
}

pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_thousands() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn truncation_respects_display_width() {
        let s = "/home/user/documents/very/deep/path/file.txt";
        let t = truncate_middle(s, 20);
        assert_eq!(t.width(), 20);
        assert!(t.starts_with("/home/us"));
        assert!(t.ends_with("file.txt"));

        // Wide characters count as two columns
        let wide = "目录/目录/目录/目录/文件.txt";
        assert!(truncate_middle(wide, 12).width() <= 12);
    }

    #[test]
    fn line_fits_width() {
        let line = ProgressLine {
            completed: 1500,
            total: 3000,
            percentage: 50,
            status: "Creating files...",
            elapsed_secs: 3,
        };
        let out = line.render(80);
        assert!(out.starts_with("[##########----------]  50% 1,500/3,000 3s "));
        assert!(out.ends_with("Creating files..."));
        assert!(line.render(30).width() <= 30);
    }
}
