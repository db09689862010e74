use crate::config::{default_logging_config, LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use file_rotate::{
    compression::Compression,
    suffix::AppendCount,
    ContentLimit, FileRotate,
};

// -------- level helpers --------
fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// Returns true if target == crate_name or target starts with "crate_name::"
fn matches_crate_prefix(target: &str, crate_name: &str) -> bool {
    target == crate_name
        || (target.starts_with(crate_name) && target[crate_name.len()..].starts_with("::"))
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Filter for the "default" section: everything that no explicit subsystem claims.
fn default_filter(
    crate_names: Vec<String>,
    max_level: Level,
) -> FilterFn<impl Fn(&tracing::Metadata<'_>) -> bool> {
    FilterFn::new(move |meta: &tracing::Metadata<'_>| {
        let t = meta.target();
        if crate_names.iter().any(|c| matches_crate_prefix(t, c)) {
            return false;
        }
        meta.level() <= &max_level
    })
}

// -------- rotating writer for files --------
#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendCount>>>);

impl<'a> fmt::MakeWriter<'a> for RotWriter {
    type Writer = RotWriterHandle;
    fn make_writer(&'a self) -> Self::Writer {
        RotWriterHandle(self.0.clone())
    }
}

struct RotWriterHandle(Arc<Mutex<FileRotate<AppendCount>>>);

impl Write for RotWriterHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.0.lock() {
            Ok(mut w) => w.write(buf),
            // a poisoned writer drops the record
            Err(_) => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.0.lock() {
            Ok(mut w) => w.flush(),
            Err(_) => Ok(()),
        }
    }
}

/// Resolve a log file path against `base_dir`.
/// Absolute paths are kept as-is; relative paths are joined with `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

/// Rotation threshold in bytes; oversized settings clamp instead of overflowing.
fn rotation_limit_bytes(section: &Section) -> usize {
    let bytes = section
        .max_size_mb
        .unwrap_or(100)
        .saturating_mul(1024 * 1024);
    usize::try_from(bytes).unwrap_or(usize::MAX)
}

/// Create a size-rotated writer, ensuring the parent directory exists.
fn create_rotating_writer_at_path(
    log_path: &Path,
    section: &Section,
) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rot = FileRotate::new(
        log_path,
        AppendCount::new(section.max_backups.unwrap_or(3)),
        ContentLimit::BytesSurpassed(rotation_limit_bytes(section)),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

fn file_writer_for(name: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }
    let log_path = resolve_log_path(&section.file, base_dir);
    match create_rotating_writer_at_path(&log_path, section) {
        Ok(writer) => Some(writer),
        Err(e) => {
            eprintln!(
                "Failed to init log file for subsystem '{}': {} ({})",
                name,
                log_path.to_string_lossy(),
                e
            );
            None
        }
    }
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: LoggingConfig containing the logging sections
/// - `base_dir`: base directory used to resolve relative log file paths
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` *before* installing the subscriber
    let _ = tracing_log::LogTracer::init();

    let fallback;
    let cfg = if cfg.is_empty() {
        fallback = default_logging_config();
        &fallback
    } else {
        cfg
    };

    let _ = Registry::default()
        .with(build_layers(cfg, base_dir))
        .try_init();
}

fn build_layers(cfg: &LoggingConfig, base_dir: &Path) -> Vec<BoxedLayer> {
    let ansi = std::io::stdout().is_terminal();
    let crate_sections: HashMap<&str, &Section> = cfg
        .iter()
        .filter(|(k, _)| k.as_str() != "default")
        .map(|(k, v)| (k.as_str(), v))
        .collect();
    let crate_names: Vec<String> = crate_sections.keys().map(|k| k.to_string()).collect();

    let mut layers: Vec<BoxedLayer> = Vec::new();

    // Explicit subsystems: one console layer filtered by targets, one JSON file each.
    let mut console_targets = Targets::new().with_default(LevelFilter::OFF);
    for (name, section) in &crate_sections {
        if let Some(level) = parse_tracing_level(&section.console_level) {
            console_targets = console_targets.with_target(*name, LevelFilter::from_level(level));
        }
        if let (Some(writer), Some(level)) = (
            file_writer_for(name, section, base_dir),
            parse_tracing_level(&section.file_level),
        ) {
            layers.push(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_writer(writer)
                    .with_filter(Targets::new().with_target(*name, LevelFilter::from_level(level)))
                    .boxed(),
            );
        }
    }
    if !crate_sections.is_empty() {
        layers.push(
            fmt::layer()
                .with_ansi(ansi)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_filter(console_targets)
                .boxed(),
        );
    }

    // Catch-all "default" section.
    if let Some(section) = cfg.get("default") {
        if let Some(level) = parse_tracing_level(&section.console_level) {
            layers.push(
                fmt::layer()
                    .with_ansi(ansi)
                    .with_target(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_filter(default_filter(crate_names.clone(), level))
                    .boxed(),
            );
        }
        if let (Some(writer), Some(level)) = (
            file_writer_for("default", section, base_dir),
            parse_tracing_level(&section.file_level),
        ) {
            layers.push(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_writer(writer)
                    .with_filter(default_filter(crate_names, level))
                    .boxed(),
            );
        }
    }

    layers
}

// =================== tests ===================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn section(console: &str, file: &str, file_level: &str) -> Section {
        Section {
            console_level: console.into(),
            file: file.into(),
            file_level: file_level.into(),
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn test_logging_level_parsing() {
        assert_eq!(parse_tracing_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_tracing_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_tracing_level("Info"), Some(Level::INFO));
        assert_eq!(parse_tracing_level("warn"), Some(Level::WARN));
        assert_eq!(parse_tracing_level("ERROR"), Some(Level::ERROR));
        assert_eq!(parse_tracing_level("off"), None);
        assert_eq!(parse_tracing_level("none"), None);
        assert_eq!(parse_tracing_level("invalid"), Some(Level::INFO));
    }

    #[test]
    fn test_crate_prefix_matching() {
        assert!(matches_crate_prefix("users_info", "users_info"));
        assert!(matches_crate_prefix("users_info::domain::service", "users_info"));
        assert!(!matches_crate_prefix("users_info_extra", "users_info"));
        assert!(!matches_crate_prefix("api_ingress", "users_info"));
    }

    #[test]
    fn test_file_paths_resolved_against_base_dir() {
        let tmp = tempdir().unwrap();
        let base_dir = tmp.path();

        let resolved = resolve_log_path("logs/test.log", base_dir);
        assert!(resolved.starts_with(base_dir));
        assert!(resolved.ends_with("logs/test.log"));

        let abs = base_dir.join("abs.log");
        assert_eq!(resolve_log_path(abs.to_str().unwrap(), Path::new("/elsewhere")), abs);
    }

    #[test]
    fn test_create_rotating_writer_at_path_creates_parent() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("nested/dir/app.log");

        let res = create_rotating_writer_at_path(&p, &section("info", "x", "debug"));
        assert!(res.is_ok(), "writer should be created");
        assert!(p.parent().unwrap().exists(), "parent dir must be created");
    }

    #[test]
    fn test_rotation_limit_saturates() {
        let mut s = section("info", "x", "debug");
        assert_eq!(rotation_limit_bytes(&s), 1024 * 1024);

        s.max_size_mb = None;
        assert_eq!(rotation_limit_bytes(&s), 100 * 1024 * 1024);

        s.max_size_mb = Some(u64::MAX);
        assert_eq!(rotation_limit_bytes(&s), usize::MAX);

        let tmp = tempdir().unwrap();
        assert!(create_rotating_writer_at_path(&tmp.path().join("huge.log"), &s).is_ok());
    }

    #[test]
    fn test_empty_file_disables_file_sink() {
        let tmp = tempdir().unwrap();
        assert!(file_writer_for("default", &section("info", "  ", "debug"), tmp.path()).is_none());
    }

    #[test]
    fn test_layer_count_follows_sections() {
        let tmp = tempdir().unwrap();
        let mut cfg = LoggingConfig::new();
        cfg.insert("default".into(), section("info", "logs/all.log", "debug"));
        cfg.insert("users_info".into(), section("debug", "logs/users.log", "off"));

        // users_info: console only (file level off); default: console + file
        let layers = build_layers(&cfg, tmp.path());
        assert_eq!(layers.len(), 3);
    }
}
