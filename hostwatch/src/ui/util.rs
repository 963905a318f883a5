//! Small UI helpers: human-readable sizes, truncation, icons.

pub fn human(b: u64) -> String {
    const K: f64 = 1024.0;
    let b = b as f64;
    if b < K {
        return format!("{b:.0}B");
    }
    let kb = b / K;
    if kb < K {
        return format!("{kb:.1}KB");
    }
    let mb = kb / K;
    if mb < K {
        return format!("{mb:.1}MB");
    }
    let gb = mb / K;
    if gb < K {
        return format!("{gb:.1}GB");
    }
    let tb = gb / K;
    format!("{tb:.2}TB")
}

/// Bytes per second as KB/s with one decimal.
pub fn kb_per_sec(bps: f64) -> String {
    format!("{:.1}", bps.max(0.0) / 1024.0)
}

// Char-aware so multi-byte labels never split mid-codepoint
pub fn truncate_middle(s: &str, max: usize) -> String {
    let n = s.chars().count();
    if n <= max {
        return s.to_string();
    }
    if max <= 3 {
        return "...".into();
    }
    let keep = max - 3;
    let left = keep / 2;
    let right = keep - left;
    let head: String = s.chars().take(left).collect();
    let tail: String = s.chars().skip(n - right).collect();
    format!("{head}...{tail}")
}

pub fn disk_icon(name: &str) -> &'static str {
    let n = name.to_ascii_lowercase();
    if n.contains(':') {
        "🗄️"
    } else if n.contains("nvme") {
        "⚡"
    } else if n.starts_with("/dev/sd") || n.starts_with("sd") {
        "💽"
    } else if n.contains("overlay") {
        "📦"
    } else {
        "🖴"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_sizes() {
        assert_eq!(human(512), "512B");
        assert_eq!(human(2048), "2.0KB");
        assert_eq!(human(5 * 1024 * 1024 * 1024), "5.0GB");
    }

    #[test]
    fn truncates_in_the_middle() {
        assert_eq!(truncate_middle("short", 10), "short");
        assert_eq!(truncate_middle("/mnt/very/long/path", 9), "/mn...ath");
        assert_eq!(truncate_middle("äöüäöüäöü", 5), "ä...ü");
    }

    #[test]
    fn rates_never_negative() {
        assert_eq!(kb_per_sec(2048.0), "2.0");
        assert_eq!(kb_per_sec(-5.0), "0.0");
    }
}
