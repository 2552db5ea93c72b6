//! Content classification — pure path → priority tier mapping.
//!
//! Classification decides processing order and truncation policy during
//! budget allocation, and which directories the scanner prunes before
//! descending. It is a pure function of the (forward-slash normalized,
//! relative) path: no I/O, no state, same answer every time.
//!
//! Precedence, first match wins: Excluded → Critical → Structural →
//! Code. A file outside both the allow-set and the deny-set is Excluded;
//! absence of a deny entry does not imply inclusion.

use serde::{Deserialize, Serialize};

/// Priority bucket for a file. Controls processing order and truncation
/// policy in the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    /// Manifest/config files attempted first regardless of size.
    Critical,
    /// Schema, routing, env-example, and build-descriptor files.
    Structural,
    /// Ordinary source/text files — the default bucket.
    Code,
    /// Never read, never listed.
    Excluded,
}

/// Directory segments the walk never descends into.
const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    ".next",
    ".nuxt",
    "vendor",
    "__pycache__",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
    ".cache",
    "coverage",
    ".terraform",
];

/// Extensions that are binary, archive, or media artifacts.
const EXCLUDED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "ico", "svg", "pdf", "zip", "tar", "gz", "tgz", "bz2",
    "7z", "rar", "exe", "dll", "so", "dylib", "a", "o", "class", "jar", "war", "pyc", "wasm",
    "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "mov", "avi", "webm", "db", "sqlite",
    "bin", "dat",
];

/// Generated lockfiles, matched by exact base name.
const LOCKFILE_NAMES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "cargo.lock",
    "poetry.lock",
    "composer.lock",
    "gemfile.lock",
    "go.sum",
];

/// Minified/bundled artifact suffixes.
const MINIFIED_SUFFIXES: &[&str] = &[".min.js", ".min.css", ".bundle.js", ".chunk.js"];

/// Manifest/config base names attempted first regardless of size.
const CRITICAL_NAMES: &[&str] = &[
    "package.json",
    "cargo.toml",
    "pyproject.toml",
    "go.mod",
    "composer.json",
    "gemfile",
    "tsconfig.json",
    "readme.md",
];

/// Structural base names: schema definitions, env examples,
/// container/build descriptors.
const STRUCTURAL_NAMES: &[&str] = &[
    "schema.prisma",
    "schema.rb",
    "dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "makefile",
    "jenkinsfile",
    "procfile",
    ".env.example",
    ".env.sample",
    ".env.template",
];

/// Structural extensions: schema/contract definition languages.
const STRUCTURAL_EXTENSIONS: &[&str] = &["sql", "graphql", "gql", "proto"];

/// A path segment naming a routed-handler directory.
const ROUTE_SEGMENTS: &[&str] = &["routes", "controllers", "handlers", "api", "middleware"];

/// Ordinary source/text extensions — the Code allow-set.
const CODE_EXTENSIONS: &[&str] = &[
    "rs", "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "rb", "go", "java", "kt", "c", "h", "cpp",
    "hpp", "cc", "cs", "php", "swift", "scala", "sh", "bash", "toml", "yaml", "yml", "json", "md",
    "markdown", "html", "css", "scss", "less", "vue", "svelte", "txt", "xml", "ini", "cfg", "conf",
];

/// Whether a directory name is denylisted. The scanner consults this
/// before descending so excluded trees are pruned, not filtered after a
/// full walk.
pub fn is_excluded_dir(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    EXCLUDED_DIRS.contains(&lower.as_str())
}

/// Classify a relative, forward-slash normalized path into its tier.
pub fn classify(path: &str) -> PriorityTier {
    let lower = path.to_ascii_lowercase();
    let base = lower.rsplit('/').next().unwrap_or(&lower);
    let ext = base.rsplit_once('.').map(|(_, e)| e).unwrap_or("");

    // 1. Excluded: denylisted directory segments or artifact files.
    if lower
        .split('/')
        .any(|segment| EXCLUDED_DIRS.contains(&segment))
    {
        return PriorityTier::Excluded;
    }
    if EXCLUDED_EXTENSIONS.contains(&ext)
        || LOCKFILE_NAMES.contains(&base)
        || MINIFIED_SUFFIXES.iter().any(|s| base.ends_with(s))
    {
        return PriorityTier::Excluded;
    }

    // 2. Critical: exact manifest/config names.
    if CRITICAL_NAMES.contains(&base) {
        return PriorityTier::Critical;
    }

    // 3. Structural: schema, routing, env-example, build descriptors.
    if STRUCTURAL_NAMES.contains(&base)
        || STRUCTURAL_EXTENSIONS.contains(&ext)
        || lower.contains(".github/workflows/")
        || lower
            .split('/')
            .rev()
            .skip(1) // the base name itself is not a directory
            .any(|segment| ROUTE_SEGMENTS.contains(&segment))
    {
        return PriorityTier::Structural;
    }

    // 4. Code: the allow-set. Everything else falls through to Excluded.
    if CODE_EXTENSIONS.contains(&ext) {
        return PriorityTier::Code;
    }

    PriorityTier::Excluded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denylisted_dir_wins_regardless_of_extension() {
        assert_eq!(classify("node_modules/lodash/index.js"), PriorityTier::Excluded);
        assert_eq!(classify("target/debug/build.rs"), PriorityTier::Excluded);
        assert_eq!(classify(".git/config"), PriorityTier::Excluded);
        // Even a Critical name inside a denylisted tree is excluded
        assert_eq!(classify("node_modules/pkg/package.json"), PriorityTier::Excluded);
    }

    #[test]
    fn binary_and_archive_extensions_excluded() {
        assert_eq!(classify("assets/logo.png"), PriorityTier::Excluded);
        assert_eq!(classify("release.tar.gz"), PriorityTier::Excluded);
        assert_eq!(classify("lib/native.so"), PriorityTier::Excluded);
    }

    #[test]
    fn lockfiles_and_minified_excluded() {
        assert_eq!(classify("package-lock.json"), PriorityTier::Excluded);
        assert_eq!(classify("Cargo.lock"), PriorityTier::Excluded);
        assert_eq!(classify("static/app.min.js"), PriorityTier::Excluded);
    }

    #[test]
    fn manifest_names_are_critical() {
        assert_eq!(classify("package.json"), PriorityTier::Critical);
        assert_eq!(classify("backend/Cargo.toml"), PriorityTier::Critical);
        assert_eq!(classify("README.md"), PriorityTier::Critical);
        assert_eq!(classify("docs/readme.md"), PriorityTier::Critical);
    }

    #[test]
    fn structural_patterns() {
        assert_eq!(classify("prisma/schema.prisma"), PriorityTier::Structural);
        assert_eq!(classify("migrations/001_init.sql"), PriorityTier::Structural);
        assert_eq!(classify("src/routes/projects.ts"), PriorityTier::Structural);
        assert_eq!(classify("app/controllers/users_controller.rb"), PriorityTier::Structural);
        assert_eq!(classify(".env.example"), PriorityTier::Structural);
        assert_eq!(classify("Dockerfile"), PriorityTier::Structural);
        assert_eq!(classify(".github/workflows/ci.yml"), PriorityTier::Structural);
    }

    #[test]
    fn route_segment_must_be_a_directory() {
        // A file merely named "api.rs" at the root is ordinary code
        assert_eq!(classify("api.rs"), PriorityTier::Code);
        assert_eq!(classify("src/api/client.rs"), PriorityTier::Structural);
    }

    #[test]
    fn ordinary_source_is_code() {
        assert_eq!(classify("src/main.rs"), PriorityTier::Code);
        assert_eq!(classify("web/components/Button.tsx"), PriorityTier::Code);
        assert_eq!(classify("scripts/deploy.sh"), PriorityTier::Code);
        assert_eq!(classify("notes.txt"), PriorityTier::Code);
    }

    #[test]
    fn unknown_extensions_fall_through_to_excluded() {
        assert_eq!(classify("data/dump.xyz"), PriorityTier::Excluded);
        assert_eq!(classify(".gitignore"), PriorityTier::Excluded);
        assert_eq!(classify("no_extension"), PriorityTier::Excluded);
    }

    #[test]
    fn classify_is_pure_and_idempotent() {
        for path in ["src/main.rs", "node_modules/x.js", "package.json"] {
            assert_eq!(classify(path), classify(path));
        }
    }

    #[test]
    fn case_insensitive_matching() {
        assert_eq!(classify("PACKAGE.JSON"), PriorityTier::Critical);
        assert_eq!(classify("NODE_MODULES/x.js"), PriorityTier::Excluded);
        assert_eq!(classify("Makefile"), PriorityTier::Structural);
    }
}
