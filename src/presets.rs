//! Built-in jobs.

use crate::config::JobConfig;
use crate::select::SelectionPolicy;

/// Directories the relocation job never enters.
pub const RELOCATE_EXCLUDE_DIRS: &[&str] = &[
    "venv",
    ".venv",
    "node_modules",
    ".git",
    "dist",
    "build",
    "out",
    ".idea",
    ".vscode",
    ".pytest_cache",
    "__pycache__",
];

/// File types the relocation job rewrites.
pub const RELOCATE_EXTENSIONS: &[&str] = &[
    "py", "ts", "tsx", "js", "jsx", "cs", "java", "go", "rs", "sql", "md", "yml", "yaml", "json",
    "toml",
];

/// Makes relative asset paths in top-level HTML pages absolute.
pub fn html_paths() -> JobConfig {
    JobConfig::new(
        "html-paths",
        "Make relative CSS, JS, manifest and favicon paths in src/*.html absolute",
    )
    .with_scope(SelectionPolicy::new("src").single_level().glob("*.html"))
    .with_pattern(r#"href="(?!https?://|/|#)([^"]+\.css[^"]*)""#, r#"href="/\1""#)
    .with_pattern(r#"src="(?!https?://|/|#)([^"]+\.js[^"]*)""#, r#"src="/\1""#)
    .with_pattern(r#"href="(?!https?://|/)manifest\.json""#, r#"href="/manifest.json""#)
    .with_pattern(r#"href="(?!https?://|/)favicon\.ico""#, r#"href="/favicon.ico""#)
}

/// Renames the product across sources and top-level docs.
pub fn brand() -> JobConfig {
    JobConfig::new("brand", "Replace VisionKrono with Kromi.online")
        .with_scope(
            SelectionPolicy::new("src").extensions(["html", "js", "css", "md", "json", "sql"]),
        )
        .with_scope(SelectionPolicy::new(".").single_level().glob("*.md"))
        .with_literal("VisionKrono", "Kromi.online")
}

/// Points SQL references at `sql/` and Markdown links at `docs/`.
///
/// The directory-prefix rule runs before the per-file SQL rules. Once a
/// reference starts with `../sql/` none of the SQL rules match it again, so
/// `"sql/a.sql"` becomes `"../sql/a.sql"` and never `"../sql/sql/a.sql"`.
/// Markdown links already under `docs/` are left alone.
pub fn relocate() -> JobConfig {
    let mut job = JobConfig::new(
        "relocate",
        "Rewrite relative SQL references to ../sql/ and Markdown links to docs/",
    )
    .with_scope(
        SelectionPolicy::new(".")
            .extensions(RELOCATE_EXTENSIONS.iter().copied())
            .exclude_dirs(RELOCATE_EXCLUDE_DIRS.iter().copied()),
    )
    .with_pattern(r#"(["'`])(\./)?(queries|sql)/"#, r"\1../sql/");

    for quote in ['"', '\'', '`'] {
        job = job.with_pattern(
            &format!(r"{quote}(\./)?([A-Za-z0-9_\-/]+\.sql){quote}"),
            &format!(r"{quote}../sql/\2{quote}"),
        );
    }

    job.with_pattern(
        r"\((?!(?:\./)?docs/)(\./)?([A-Za-z0-9_\-/]+\.md)\)",
        r"(docs/\2)",
    )
}

/// All built-in jobs.
pub fn all() -> Vec<JobConfig> {
    vec![html_paths(), brand(), relocate()]
}

/// Looks a built-in job up by name.
pub fn find(name: &str) -> Option<JobConfig> {
    all().into_iter().find(|job| job.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;

    fn rules(job: JobConfig) -> RuleSet {
        job.rule_set().unwrap()
    }

    fn assert_idempotent(rules: &RuleSet, input: &str) {
        let once = rules.apply(input).text;
        let twice = rules.apply(&once).text;
        assert_eq!(once, twice, "not idempotent for {input:?}");
    }

    #[test]
    fn test_all_presets_compile() {
        for job in all() {
            assert!(job.rule_set().is_ok(), "preset {} failed to compile", job.name);
            assert!(!job.scopes.is_empty());
        }
    }

    #[test]
    fn test_find_by_name() {
        assert_eq!(find("brand").unwrap().name, "brand");
        assert!(find("nope").is_none());
    }

    #[test]
    fn test_html_paths() {
        let rules = rules(html_paths());
        let input = concat!(
            r#"<link rel="stylesheet" href="styles/app.css?v=2">"#,
            r#"<script src="js/app.js"></script>"#,
            r#"<link rel="manifest" href="manifest.json">"#,
            r#"<link rel="icon" href="favicon.ico">"#,
            r#"<script src="https://cdn.example.com/lib.js"></script>"#,
            r##"<a href="#top.css">"##,
        );
        let expected = concat!(
            r#"<link rel="stylesheet" href="/styles/app.css?v=2">"#,
            r#"<script src="/js/app.js"></script>"#,
            r#"<link rel="manifest" href="/manifest.json">"#,
            r#"<link rel="icon" href="/favicon.ico">"#,
            r#"<script src="https://cdn.example.com/lib.js"></script>"#,
            r##"<a href="#top.css">"##,
        );

        let applied = rules.apply(input);
        assert_eq!(applied.text, expected);
        assert_eq!(applied.occurrences, vec![1, 1, 1, 1]);
        assert_idempotent(&rules, input);
    }

    #[test]
    fn test_brand() {
        let rules = rules(brand());
        let applied = rules.apply("VisionKrono by VisionKrono");
        assert_eq!(applied.text, "Kromi.online by Kromi.online");
        assert_eq!(applied.total(), 2);
        assert_idempotent(&rules, "VisionKrono by VisionKrono");
    }

    #[test]
    fn test_relocate_sql_references() {
        let rules = rules(relocate());
        let input = r#"load("sql/schema.sql"); run('./queries/report.sql'); read(`seed.sql`); open("db/init.sql")"#;
        let expected = r#"load("../sql/schema.sql"); run('../sql/report.sql'); read(`../sql/seed.sql`); open("../sql/db/init.sql")"#;

        assert_eq!(rules.apply(input).text, expected);
        assert_idempotent(&rules, input);
    }

    #[test]
    fn test_relocate_markdown_links() {
        let rules = rules(relocate());
        let input = "[see](./notes.md) [guide](guide/setup.md) [moved](docs/a.md) [web](https://x.io/b.md)";
        let expected = "[see](docs/notes.md) [guide](docs/guide/setup.md) [moved](docs/a.md) [web](https://x.io/b.md)";

        assert_eq!(rules.apply(input).text, expected);
        assert_idempotent(&rules, input);
    }

    #[test]
    fn test_sql_rule_order_matters() {
        let prefix = (r#"(["'`])(\./)?(queries|sql)/"#, r"\1../sql/");
        let file = (r#""(\./)?([A-Za-z0-9_\-/]+\.sql)""#, r#""../sql/\2""#);

        let forward = RuleSet::builder()
            .pattern(prefix.0, prefix.1)
            .pattern(file.0, file.1)
            .build()
            .unwrap();
        let swapped = RuleSet::builder()
            .pattern(file.0, file.1)
            .pattern(prefix.0, prefix.1)
            .build()
            .unwrap();

        let input = r#"read("sql/x.sql")"#;
        assert_eq!(forward.apply(input).text, r#"read("../sql/x.sql")"#);
        assert_eq!(swapped.apply(input).text, r#"read("../sql/sql/x.sql")"#);
    }
}
