//! End-to-end command tests against a stand-in renderer

#![allow(clippy::unwrap_used, clippy::expect_used)]

use clap::Parser;
use pagecast::cli::{Cli, CliError, EXIT_CLI, EXIT_RENDER, exit_code_for};
use pagecast::cli::RenderSettings;
use pagecast::commands::{self, Context, cache::page_key};
use pagecast::config::Config;
use pagecast_render::RenderConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    temp: TempDir,
}

impl Fixture {
    fn new(program: &str) -> Self {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("doc.pdf"), b"%PDF-1.7\n").unwrap();
        let config = format!(
            "[cache.options]\ndirectory = {:?}\n\n[renderer]\nprogram = {:?}\n",
            temp.path().join("cache").to_string_lossy(),
            program,
        );
        fs::write(temp.path().join("pagecast.toml"), config).unwrap();
        Self { temp }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Result<(), CliError> {
        let config = self.path("pagecast.toml");
        let mut argv = vec![
            "pagecast".to_string(),
            "--config".to_string(),
            config.to_string_lossy().into_owned(),
        ];
        argv.extend(args.iter().map(|a| (*a).to_string()));
        commands::execute(Cli::try_parse_from(argv).unwrap())
    }
}

#[cfg(unix)]
fn fake_magick(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let program = dir.join("fake-magick");
    let log = dir.join("invocations");
    fs::write(
        &program,
        format!(
            "#!/bin/sh\nfor last; do :; done\necho \"$@\" > \"$last\"\necho run >> '{}'\n",
            log.display()
        ),
    )
    .unwrap();
    fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();
    program
}

fn invocations(dir: &Path) -> usize {
    fs::read_to_string(dir.join("invocations"))
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

#[cfg(unix)]
#[test]
fn render_populates_and_reuses_cache() {
    let bin = TempDir::new().unwrap();
    let program = fake_magick(bin.path());
    let fixture = Fixture::new(&program.to_string_lossy());
    let doc = fixture.path("doc.pdf");
    let out = fixture.path("out");
    let doc = doc.to_string_lossy();
    let out = out.to_string_lossy();

    fixture
        .run(&["render", &doc, "--pages", "1-2", "-o", &out])
        .unwrap();
    assert_eq!(invocations(bin.path()), 2);
    assert!(fixture.path("out/doc.1.png").is_file());
    assert!(fixture.path("out/doc.2.png").is_file());

    // Second run is served from the cache
    fixture
        .run(&["render", &doc, "--pages", "1-2", "-o", &out])
        .unwrap();
    assert_eq!(invocations(bin.path()), 2);

    // Different settings are a different key
    fixture
        .run(&["render", &doc, "--pages", "1", "--dpi", "300", "-o", &out])
        .unwrap();
    assert_eq!(invocations(bin.path()), 3);

    fixture.run(&["cache", "clear"]).unwrap();
    fixture
        .run(&["render", &doc, "--pages", "1-2", "-o", &out])
        .unwrap();
    assert_eq!(invocations(bin.path()), 5);
}

#[cfg(unix)]
#[test]
fn no_cache_always_renders() {
    let bin = TempDir::new().unwrap();
    let program = fake_magick(bin.path());
    let fixture = Fixture::new(&program.to_string_lossy());
    let doc = fixture.path("doc.pdf");
    let doc = doc.to_string_lossy();

    for _ in 0..2 {
        fixture
            .run(&["render", &doc, "--pages", "1", "--data-uri", "--no-cache"])
            .unwrap();
    }
    assert_eq!(invocations(bin.path()), 2);
    assert!(!fixture.path("cache").exists());
}

#[test]
fn missing_renderer_is_render_error() {
    let fixture = Fixture::new("pagecast-test-no-such-magick");
    let doc = fixture.path("doc.pdf");

    let err = fixture
        .run(&["render", &doc.to_string_lossy(), "--pages", "1", "--no-cache"])
        .unwrap_err();
    assert_eq!(exit_code_for(&err), EXIT_RENDER);
}

#[test]
fn missing_document_is_config_error() {
    let fixture = Fixture::new("magick");
    let doc = fixture.path("absent.pdf");

    let err = fixture
        .run(&["render", &doc.to_string_lossy(), "--pages", "1"])
        .unwrap_err();
    assert_eq!(exit_code_for(&err), EXIT_CLI);
}

#[test]
fn invalid_settings_are_config_errors() {
    let fixture = Fixture::new("magick");
    let doc = fixture.path("doc.pdf");

    let err = fixture
        .run(&["render", &doc.to_string_lossy(), "--quality", "0"])
        .unwrap_err();
    assert_eq!(exit_code_for(&err), EXIT_CLI);
}

#[test]
fn cache_key_matches_library_derivation() {
    let fixture = Fixture::new("magick");
    let doc = fixture.path("doc.pdf");
    let config = Config::load(Some(&fixture.path("pagecast.toml"))).unwrap();
    let ctx = Context::new(config, false);

    let expected = pagecast_render::cache_key(&doc, 3, &RenderConfig::default()).unwrap();
    let key = page_key(&ctx, &doc, 3, &RenderSettings::default()).unwrap();
    assert_eq!(key, expected);
    assert_eq!(key.len(), pagecast_cache::KEY_LEN);

    let settings = RenderSettings {
        rotation: Some(90),
        ..RenderSettings::default()
    };
    let rotated = RenderConfig {
        rotation: Some(90),
        ..RenderConfig::default()
    };
    let key = page_key(&ctx, &doc, 3, &settings).unwrap();
    assert_eq!(key, pagecast_render::cache_key(&doc, 3, &rotated).unwrap());
    assert_ne!(key, expected);

    fixture
        .run(&["cache", "key", &doc.to_string_lossy(), "--page", "3"])
        .unwrap();
}

#[cfg(unix)]
#[test]
fn rendered_page_is_stored_under_derived_key() {
    let bin = TempDir::new().unwrap();
    let program = fake_magick(bin.path());
    let fixture = Fixture::new(&program.to_string_lossy());
    let doc = fixture.path("doc.pdf");
    let out = fixture.path("out");

    fixture
        .run(&[
            "render",
            &doc.to_string_lossy(),
            "--pages",
            "2",
            "-o",
            &out.to_string_lossy(),
        ])
        .unwrap();

    let key = pagecast_render::cache_key(&doc, 2, &RenderConfig::default()).unwrap();
    assert!(fixture.path("cache").join(&key).join("doc.2.png").is_file());
}

#[test]
fn oversized_page_range_is_config_error() {
    let fixture = Fixture::new("pagecast-test-no-such-magick");
    let doc = fixture.path("doc.pdf");

    let err = fixture
        .run(&["render", &doc.to_string_lossy(), "--pages", "1-4000000000"])
        .unwrap_err();
    assert_eq!(exit_code_for(&err), EXIT_CLI);
}
