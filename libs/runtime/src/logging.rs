use crate::config::{LoggingConfig, Section};
use file_rotate::{
    compression::Compression,
    suffix::AppendCount,
    ContentLimit, FileRotate,
};
use parking_lot::Mutex;
use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{Level, Metadata};
use tracing_subscriber::{
    filter::FilterFn,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

/// `None` means the output is switched off.
fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" | "" => None,
        _ => Some(Level::INFO),
    }
}

/// `target == subsystem` or `target` starts with `subsystem::`.
fn belongs_to(target: &str, subsystem: &str) -> bool {
    target
        .strip_prefix(subsystem)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

fn enabled(meta: &Metadata<'_>, level: Option<Level>) -> bool {
    level.is_some_and(|max| meta.level() <= &max)
}

// -------- rotating file writer --------

#[derive(Clone)]
struct RotatingFile(Arc<Mutex<FileRotate<AppendCount>>>);

impl RotatingFile {
    fn open(path: &Path, section: &Section) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
        let rot = FileRotate::new(
            path,
            AppendCount::new(section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS)),
            ContentLimit::BytesSurpassed(max_bytes as usize),
            Compression::None,
            #[cfg(unix)]
            None,
        );
        Ok(Self(Arc::new(Mutex::new(rot))))
    }
}

/// Writer handed to the fmt layer; `None` swallows the record.
struct FileHandle(Option<RotatingFile>);

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &self.0 {
            Some(file) => file.0.lock().write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &self.0 {
            Some(file) => file.0.lock().flush(),
            None => Ok(()),
        }
    }
}

// -------- routing plan --------

/// Resolved per-subsystem routing: console level, file level and file.
#[derive(Clone)]
struct Route {
    subsystem: String,
    console: Option<Level>,
    file_level: Option<Level>,
    file: Option<RotatingFile>,
}

/// Routes log records by target to console/file outputs.
#[derive(Clone)]
struct RoutingPlan {
    routes: Arc<Vec<Route>>,
    fallback: Route,
}

impl RoutingPlan {
    fn build(cfg: &LoggingConfig, base_dir: &Path) -> Self {
        let fallback = cfg
            .get(DEFAULT_SECTION)
            .map(|s| route_for(DEFAULT_SECTION, s, base_dir))
            .unwrap_or_else(|| Route {
                subsystem: DEFAULT_SECTION.to_string(),
                console: Some(Level::INFO),
                file_level: None,
                file: None,
            });

        // Longest prefix first so "a::b" wins over "a".
        let mut routes: Vec<Route> = cfg
            .iter()
            .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
            .map(|(name, s)| route_for(name, s, base_dir))
            .collect();
        routes.sort_by(|a, b| b.subsystem.len().cmp(&a.subsystem.len()));

        Self {
            routes: Arc::new(routes),
            fallback,
        }
    }

    fn route(&self, target: &str) -> &Route {
        self.routes
            .iter()
            .find(|r| belongs_to(target, &r.subsystem))
            .unwrap_or(&self.fallback)
    }

    fn has_files(&self) -> bool {
        self.fallback.file.is_some() || self.routes.iter().any(|r| r.file.is_some())
    }
}

impl<'a> MakeWriter<'a> for RoutingPlan {
    type Writer = FileHandle;

    fn make_writer(&'a self) -> Self::Writer {
        FileHandle(self.fallback.file.clone())
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        FileHandle(self.route(meta.target()).file.clone())
    }
}

fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn route_for(subsystem: &str, section: &Section, base_dir: &Path) -> Route {
    let file = if section.file.trim().is_empty() {
        None
    } else {
        let path = resolve_log_path(&section.file, base_dir);
        match RotatingFile::open(&path, section) {
            Ok(f) => Some(f),
            Err(e) => {
                // The subscriber is not installed yet.
                eprintln!(
                    "Failed to open log file for '{}': {} ({})",
                    subsystem,
                    path.display(),
                    e
                );
                None
            }
        }
    };

    Route {
        subsystem: subsystem.to_string(),
        console: parse_level(&section.console_level),
        file_level: file.as_ref().and_then(|_| parse_level(&section.file_level)),
        file,
    }
}

// -------- public init --------

/// Install the global subscriber.
///
/// Console output is human readable; file output is JSON, one file per
/// subsystem with a fallback to the "default" section. Relative file paths
/// are resolved against `base_dir` (normally `server.home_dir`).
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` records before the subscriber is installed.
    let _ = tracing_log::LogTracer::init();

    let plan = RoutingPlan::build(cfg, base_dir);
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console_plan = plan.clone();
    layers.push(
        fmt::layer()
            .with_ansi(std::io::stdout().is_terminal())
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_filter(FilterFn::new(move |meta| {
                enabled(meta, console_plan.route(meta.target()).console)
            }))
            .boxed(),
    );

    if plan.has_files() {
        let file_plan = plan.clone();
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(plan)
                .with_filter(FilterFn::new(move |meta| {
                    enabled(meta, file_plan.route(meta.target()).file_level)
                }))
                .boxed(),
        );
    }

    let _ = tracing_subscriber::registry().with(layers).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
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
    fn level_parsing() {
        assert_eq!(parse_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level(" Warn "), Some(Level::WARN));
        assert_eq!(parse_level("off"), None);
        assert_eq!(parse_level(""), None);
        assert_eq!(parse_level("bogus"), Some(Level::INFO));
    }

    #[test]
    fn subsystem_prefix_matching() {
        assert!(belongs_to("workboard", "workboard"));
        assert!(belongs_to("workboard::mail", "workboard"));
        assert!(!belongs_to("workboard_extra", "workboard"));
        assert!(!belongs_to("api", "api_ingress"));
    }

    #[test]
    fn routes_prefer_longest_subsystem() {
        let tmp = tempdir().unwrap();
        let mut cfg = default_logging_config();
        cfg.insert("workboard".into(), section("info", "", ""));
        cfg.insert("workboard::mail".into(), section("error", "logs/mail.log", "warn"));

        let plan = RoutingPlan::build(&cfg, tmp.path());

        let mail = plan.route("workboard::mail");
        assert_eq!(mail.subsystem, "workboard::mail");
        assert_eq!(mail.console, Some(Level::ERROR));
        assert_eq!(mail.file_level, Some(Level::WARN));
        assert!(tmp.path().join("logs").is_dir());

        let service = plan.route("workboard::domain::service");
        assert_eq!(service.subsystem, "workboard");
        assert!(service.file.is_none());
        assert_eq!(service.file_level, None);

        assert_eq!(plan.route("sea_orm::driver").subsystem, "default");
    }

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let tmp = tempdir().unwrap();
        let resolved = resolve_log_path("logs/test.log", tmp.path());
        assert!(resolved.starts_with(tmp.path()));
        assert!(resolved.ends_with("logs/test.log"));

        let abs = tmp.path().join("abs.log");
        assert_eq!(resolve_log_path(&abs.to_string_lossy(), Path::new("/x")), abs);
    }

    #[test]
    fn rotating_file_creates_parent_dirs() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("nested/dir/app.log");
        let file = RotatingFile::open(&p, &section("info", "x", "debug")).unwrap();
        FileHandle(Some(file)).write_all(b"line\n").unwrap();
        assert!(p.parent().unwrap().is_dir());
    }

    #[test]
    fn empty_config_falls_back_to_console_info() {
        let plan = RoutingPlan::build(&LoggingConfig::new(), Path::new("."));
        assert_eq!(plan.fallback.console, Some(Level::INFO));
        assert!(!plan.has_files());
    }
}
