use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::script::{Script, parse_script};

/// Loads and parses a scenario script.
pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Script> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to open script {}", path.display()))?;
    parse_script(&text).with_context(|| format!("Failed to parse script {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_names_the_path() {
        let err = load_script("/nonexistent/irq.script").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/irq.script"));
    }

    #[test]
    fn loads_script_from_disk() {
        let path = std::env::temp_dir().join(format!("hartirq-io-{}.script", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "board tick_freq=100").unwrap();
        writeln!(file, "advance 1000").unwrap();
        drop(file);

        let script = load_script(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(script.board.tick_freq, 100);
        assert_eq!(script.events.len(), 1);
    }
}
