pub mod definition;

use crate::errors::{LoadError, ProbeError};
use crate::logger::Logger;
use crate::registry::RegistryContext;
use definition::RequestSource;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SOURCE_SUFFIX: &str = ".requests.json";

/// Derives a module identity from a source path: directory and the
/// `.requests.json` suffix stripped.
pub fn extract_logical_name(path: &Path) -> String {
    let file = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    file.strip_suffix(SOURCE_SUFFIX)
        .unwrap_or(file)
        .to_string()
}

/// Request-definition sources in the working directory, sorted for a
/// stable registration order.
pub fn discover_sources(dir: &Path) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| name.ends_with(SOURCE_SUFFIX))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();
    sources.sort();
    sources
}

fn parse_source(path: &Path) -> Result<RequestSource, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Populates the registry from every source under `dir`. Two phases:
/// collect parses all sources without touching shared state, commit
/// compiles and registers. Each source unit fails independently — a broken
/// definition is logged and skipped, the rest of the load continues.
pub fn load_all(registry: &RegistryContext, dir: &Path, logger: &Logger) -> Result<(), ProbeError> {
    let logger = logger.child("loader");

    // collect
    let mut collected = Vec::new();
    for path in discover_sources(dir) {
        let module = extract_logical_name(&path);
        match parse_source(&path) {
            Ok(source) => collected.push((module, source)),
            Err(err) => logger.error(&err.to_string()),
        }
    }

    // commit
    for (module, source) in collected {
        let mut registered = 0usize;
        for request_definition in source.requests {
            let compiled = match request_definition.compile(&module) {
                Ok(request) => request,
                Err(err) => {
                    logger.error(&format!("{}: {}", module, err));
                    continue;
                }
            };
            match registry.register(compiled) {
                Ok(()) => registered += 1,
                Err(err) => logger.error(&err.to_string()),
            }
        }
        logger.debug(&format!("{}: {} request(s)", module, registered));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_source(dir: &Path, file: &str, content: &str) {
        std::fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn logical_name_strips_directory_and_suffix() {
        assert_eq!(
            extract_logical_name(Path::new("/work/blog.requests.json")),
            "blog"
        );
        assert_eq!(extract_logical_name(Path::new("plain.json")), "plain.json");
    }

    #[test]
    fn discovery_only_picks_request_sources() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "blog.requests.json", r#"{"requests": []}"#);
        write_source(dir.path(), "default.env.json", "{}");
        write_source(dir.path(), "notes.json", "{}");

        let sources = discover_sources(dir.path());
        assert_eq!(sources.len(), 1);
        assert_eq!(extract_logical_name(&sources[0]), "blog");
    }

    #[test]
    fn load_all_registers_requests_per_module() {
        let dir = tempfile::tempdir().unwrap();
        write_source(
            dir.path(),
            "blog.requests.json",
            r#"{"requests": [
                {"name": "post", "method": "GET", "url": "{base_url}/posts/{post_id}",
                 "args": [{"name": "post_id", "type": "int", "default": 1}]}
            ]}"#,
        );
        write_source(
            dir.path(),
            "auth.requests.json",
            r#"{"requests": [
                {"name": "login", "method": "POST", "url": "{base_url}/login", "cache": "session"}
            ]}"#,
        );

        let logger = Logger::new("test");
        let registry = RegistryContext::new(logger.clone());
        load_all(&registry, dir.path(), &logger).unwrap();

        assert!(registry.find("blog:post").is_ok());
        assert!(registry.find("auth:login").is_ok());
        assert_eq!(registry.module_names(), vec!["auth", "blog"]);
    }

    #[test]
    fn broken_source_does_not_stop_the_load() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "broken.requests.json", "{not json");
        write_source(
            dir.path(),
            "ok.requests.json",
            r#"{"requests": [{"name": "ping", "method": "GET", "url": "u"}]}"#,
        );

        let logger = Logger::new("test");
        let registry = RegistryContext::new(logger.clone());
        load_all(&registry, dir.path(), &logger).unwrap();

        assert!(registry.find("ok:ping").is_ok());
        assert_eq!(registry.module_names(), vec!["ok"]);
    }

    #[test]
    fn broken_definition_skips_only_itself() {
        let dir = tempfile::tempdir().unwrap();
        write_source(
            dir.path(),
            "mixed.requests.json",
            r#"{"requests": [
                {"name": "bad name", "method": "GET", "url": "u"},
                {"name": "typo", "method": "GET", "url": "u", "cache": "forever"},
                {"name": "good", "method": "GET", "url": "u"}
            ]}"#,
        );

        let logger = Logger::new("test");
        let registry = RegistryContext::new(logger.clone());
        load_all(&registry, dir.path(), &logger).unwrap();

        assert!(registry.find("mixed:good").is_ok());
        assert!(registry.find("mixed:typo").is_err());
        let snapshot = registry.snapshot();
        assert_eq!(snapshot["mixed"].len(), 1);
    }
}
