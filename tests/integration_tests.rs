//! Integration tests for the retext crate.

use retext::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, path: &str, body: &str) {
    let full = dir.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(full).unwrap().write_all(body.as_bytes()).unwrap();
}

fn read(dir: &Path, path: &str) -> String {
    fs::read_to_string(dir.join(path)).unwrap()
}

fn create_web_project(dir: &Path) {
    write(
        dir,
        "src/index.html",
        "<link href=\"styles/app.css\">\n<script src=\"js/app.js\"></script>\n<title>VisionKrono</title>\n",
    );
    write(dir, "src/about.html", "<link href=\"/styles/app.css\">\n");
    write(dir, "src/pages/deep.html", "<link href=\"styles/deep.css\">\n");
    write(dir, "src/app.js", "const NAME = 'VisionKrono'; // VisionKrono\n");
    write(dir, "src/data.txt", "VisionKrono\n");
    write(dir, "README.md", "# VisionKrono\n");
    write(dir, "docs/notes.md", "VisionKrono\n");
}

#[test]
fn test_literal_scenarios() {
    let css = RuleSet::builder()
        .pattern(r#"href="(?!https?://|/|#)([^"]+\.css[^"]*)""#, r#"href="/\1""#)
        .build()
        .unwrap();
    assert_eq!(
        css.apply(r#"href="styles/app.css""#).text,
        r#"href="/styles/app.css""#
    );
    // Already absolute: nothing to do.
    let applied = css.apply(r#"href="/styles/app.css""#);
    assert_eq!(applied.text, r#"href="/styles/app.css""#);
    assert_eq!(applied.total(), 0);

    let brand = RuleSet::builder()
        .literal("VisionKrono", "Kromi.online")
        .build()
        .unwrap();
    let applied = brand.apply("Welcome to VisionKrono today");
    assert_eq!(applied.text, "Welcome to Kromi.online today");
    assert_eq!(applied.total(), 1);

    let applied = brand.apply("VisionKrono, VisionKrono!");
    assert_eq!(applied.text, "Kromi.online, Kromi.online!");
    assert_eq!(applied.total(), 2);

    let md = RuleSet::builder()
        .pattern(r"\((\./)?([A-Za-z0-9_\-/]+\.md)\)", r"(docs/\2)")
        .build()
        .unwrap();
    assert_eq!(md.apply("[see](./notes.md)").text, "[see](docs/notes.md)");
}

#[test]
fn test_html_paths_preset() {
    let dir = TempDir::new().unwrap();
    create_web_project(dir.path());

    let report = presets::html_paths()
        .to_rewrite(dir.path())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.files_changed, 1);
    assert_eq!(report.files_unchanged, 1);
    assert_eq!(
        read(dir.path(), "src/index.html"),
        "<link href=\"/styles/app.css\">\n<script src=\"/js/app.js\"></script>\n<title>VisionKrono</title>\n"
    );
    // Single-level scope: nested pages are left alone.
    assert_eq!(
        read(dir.path(), "src/pages/deep.html"),
        "<link href=\"styles/deep.css\">\n"
    );
}

#[test]
fn test_brand_preset_counts_occurrences() {
    let dir = TempDir::new().unwrap();
    create_web_project(dir.path());

    let report = presets::brand().to_rewrite(dir.path()).unwrap().run().unwrap();

    // index.html, about.html, deep.html, app.js under src; README.md at the root.
    assert_eq!(report.files_scanned, 5);
    assert_eq!(report.files_changed, 3);
    assert_eq!(report.total_occurrences(), 4);

    let app = report
        .changed
        .iter()
        .find(|c| c.path.ends_with("app.js"))
        .unwrap();
    assert_eq!(app.occurrences, 2);
    assert_eq!((app.insertions, app.deletions), (1, 1));

    assert_eq!(read(dir.path(), "README.md"), "# Kromi.online\n");
    // Outside the allow-list and outside both scopes.
    assert_eq!(read(dir.path(), "src/data.txt"), "VisionKrono\n");
    assert_eq!(read(dir.path(), "docs/notes.md"), "VisionKrono\n");
}

#[test]
fn test_relocate_preset_skips_excluded_dirs() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "app/db.py",
        "open(\"queries/report.sql\")\nopen('seed.sql')\n",
    );
    write(dir.path(), "README.md", "See [setup](./setup.md).\n");
    write(
        dir.path(),
        "node_modules/pkg/index.js",
        "require(\"sql/x.sql\")\n",
    );

    let report = presets::relocate().to_rewrite(dir.path()).unwrap().run().unwrap();

    assert_eq!(report.files_changed, 2);
    assert_eq!(
        read(dir.path(), "app/db.py"),
        "open(\"../sql/report.sql\")\nopen('../sql/seed.sql')\n"
    );
    assert_eq!(read(dir.path(), "README.md"), "See [setup](docs/setup.md).\n");
    assert_eq!(
        read(dir.path(), "node_modules/pkg/index.js"),
        "require(\"sql/x.sql\")\n"
    );
}

#[test]
fn test_second_run_changes_nothing() {
    let dir = TempDir::new().unwrap();
    create_web_project(dir.path());
    write(dir.path(), "src/q.js", "load(\"sql/a.sql\"); // [x](./x.md)\n");

    for job in presets::all() {
        let first = job.to_rewrite(dir.path()).unwrap().run().unwrap();
        assert!(!first.has_errors(), "{}: {:?}", job.name, first.errors);

        let second = job.to_rewrite(dir.path()).unwrap().run().unwrap();
        assert_eq!(second.files_changed, 0, "{} is not idempotent", job.name);
        assert_eq!(second.files_scanned, first.files_scanned);
    }
}

#[test]
fn test_non_matching_file_is_not_rewritten() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "plain.md", "nothing here\n");
    let before = fs::metadata(dir.path().join("plain.md"))
        .unwrap()
        .modified()
        .unwrap();

    let report = Rewrite::in_dir(dir.path())
        .select(".", |s| s.extension("md"))
        .rules(
            RuleSet::builder()
                .literal("VisionKrono", "Kromi.online")
                .build()
                .unwrap(),
        )
        .run()
        .unwrap();

    assert_eq!(report.files_unchanged, 1);
    assert_eq!(report.files_changed, 0);
    let after = fs::metadata(dir.path().join("plain.md"))
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_undecodable_file_does_not_stop_the_pass() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.md", "VisionKrono\n");
    fs::write(dir.path().join("b.md"), [0xc3, 0x28, 0xff]).unwrap();
    write(dir.path(), "c.md", "VisionKrono\n");

    let report = Rewrite::in_dir(dir.path())
        .select(".", |s| s.extension("md"))
        .rules(
            RuleSet::builder()
                .literal("VisionKrono", "Kromi.online")
                .build()
                .unwrap(),
        )
        .run()
        .unwrap();

    assert_eq!(report.files_scanned, 3);
    assert_eq!(report.files_changed, 2);
    assert_eq!(report.files_errored(), 1);
    assert_eq!(
        report.errors[0].path.as_deref(),
        Some(Path::new("b.md"))
    );
    assert_eq!(read(dir.path(), "c.md"), "Kromi.online\n");
}

#[test]
fn test_missing_root_is_a_top_level_error() {
    let dir = TempDir::new().unwrap();

    let result = presets::html_paths()
        .to_rewrite(dir.path().join("nowhere"))
        .unwrap()
        .run();

    let err = result.unwrap_err();
    assert!(matches!(err, RewriteError::RootNotFound(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_job_from_yaml_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "site/page.html", "<script src=\"main.js\"></script>\n");
    write(
        dir.path(),
        "job.yaml",
        r#"name: scripts
scopes:
  - root: site
    glob: "**/*.html"
rules:
  - type: pattern
    pattern: 'src="(?!https?://|/)([^"]+\.js)"'
    replacement: 'src="/static/\1"'
"#,
    );

    let job = JobConfig::from_path(dir.path().join("job.yaml")).unwrap();
    let report = job.to_rewrite(dir.path()).unwrap().run().unwrap();

    assert_eq!(report.files_changed, 1);
    assert_eq!(
        read(dir.path(), "site/page.html"),
        "<script src=\"/static/main.js\"></script>\n"
    );
}
