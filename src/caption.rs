use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write the caption for ffmpeg's drawtext filter. Handing the text over as a
/// file sidesteps the filter-graph escaping rules for colons, quotes and
/// percent signs in the script.
pub fn write_caption_file(path: &Path, text: &str, width: usize) -> std::io::Result<()> {
    let mut f = File::create(path)?;
    for line in wrap_text(text, width) {
        writeln!(f, "{}", line)?;
    }
    Ok(())
}

pub fn wrap_text(s: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in s.split_whitespace() {
        if current.len() + word.len() + 1 > width && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
            current.push_str(word);
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
