/// Terminal rendering of sizes and counts. The core hands out raw `u64`
/// byte counts only.

/// Units above bytes, with the number of decimals shown for each.
const UNITS: [(&str, usize); 4] = [("KB", 1), ("MB", 1), ("GB", 2), ("TB", 2)];

/// `bytes` scaled to the largest unit (1 KB = 1024 B) it reaches, up to TB.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    let (label, decimals) = UNITS[unit];
    format!("{value:.decimals$} {label}")
}

/// Group the digits of `count` in threes: `1234567` becomes `1,234,567`.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// One result line: size right-aligned, then the file count, then the path.
pub fn format_match(path: &std::path::Path, file_count: u64, total_size: u64) -> String {
    let files = if file_count == 1 { "file" } else { "files" };
    format!(
        "{:>10}  {:>8} {files:<5}  {}",
        format_size(total_size),
        format_count(file_count),
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(format_size(1_073_741_824), "1.00 GB");
        assert_eq!(format_size(1_099_511_627_776), "1.00 TB");
        assert_eq!(format_size(u64::MAX), "16777216.00 TB");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(100_000), "100,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_match_pluralises() {
        let one = format_match(Path::new("/data/a"), 1, 20 * 1024 * 1024);
        assert!(one.contains("20.0 MB"));
        assert!(one.contains("1 file "));
        assert!(one.ends_with("/data/a"));

        let many = format_match(Path::new("/data/b"), 1_500, 2048);
        assert!(many.contains("1,500 files"));
    }
}
