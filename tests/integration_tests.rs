//! Integration tests for media type resolution
//!
//! These tests drive the public API end to end against the fixtures in
//! `tests/data`: sample media headers, an Apache `mime.types` table, a
//! freedesktop `globs2` file and a freedesktop binary `magic` file.

use mimetype::{
    Dialect, GlobConfig, GlobDatabase, MagicConfig, MimeError, Registry, RegistryConfig,
    ResolvedType, Source, Strategy,
};
use proptest::prelude::*;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn read(name: &str) -> Vec<u8> {
    std::fs::read(data(name)).unwrap()
}

/// Registry with the built-in magic table and the freedesktop glob fixture
fn registry() -> Registry {
    Registry::from_config(
        RegistryConfig::default()
            .with_magic(MagicConfig::builtin())
            .with_glob(GlobConfig::freedesktop(data("globs2")).required()),
    )
    .unwrap()
}

#[test]
fn test_binary_signatures_report_binary_charset() {
    let registry = registry();
    let cases = [
        ("image.gif", "image/gif"),
        ("image.png", "image/png"),
        ("image.jpg", "image/jpeg"),
        ("document.pdf", "application/pdf"),
        ("video.ogv", "video/ogg"),
        ("audio.ogg", "audio/ogg"),
        ("clip.webm", "video/webm"),
    ];
    for (file, expected) in cases {
        let content = read(file);
        let resolved = registry.guess_type(content.as_slice()).unwrap();
        assert_eq!(
            resolved.to_string(),
            format!("{}; charset=binary", expected),
            "File `{}`",
            file
        );
        assert_eq!(resolved.strategy(), Strategy::Magic);
    }
}

#[test]
fn test_ogg_disambiguation() {
    let registry = registry();
    let mut theora = File::open(data("video.ogv")).unwrap();
    let mut vorbis = File::open(data("audio.ogg")).unwrap();
    assert_eq!(
        registry.guess_type(Source::seekable(&mut theora)).unwrap().mime_type(),
        "video/ogg"
    );
    assert_eq!(
        registry.guess_type(Source::seekable(&mut vorbis)).unwrap().mime_type(),
        "audio/ogg"
    );
}

#[test]
fn test_text_charsets() {
    let registry = registry();
    let ascii = registry.guess_type(read("page.html").as_slice()).unwrap();
    assert_eq!(ascii.to_string(), "text/html; charset=us-ascii");

    let utf8 = registry.guess_type(read("notes-utf8.html").as_slice()).unwrap();
    assert_eq!(utf8.to_string(), "text/html; charset=utf-8");
}

#[test]
fn test_iso_media_by_path() {
    let registry = registry();
    let path = data("video_h264.mp4");
    assert_eq!(registry.guess_type(&path).unwrap().mime_type(), "video/mp4");
    assert_eq!(registry.guess_name(&path).unwrap(), "video");
}

#[test]
fn test_seekable_stream_position_is_restored() {
    let registry = registry();
    let mut file = File::open(data("image.png")).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    let resolved = registry.guess_type(Source::seekable(&mut file)).unwrap();
    assert_eq!(resolved.mime_type(), "image/png");
    assert_eq!(file.stream_position().unwrap(), 0);

    let mut rest = Vec::new();
    file.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, read("image.png"));
}

#[test]
fn test_forward_only_stream() {
    let registry = registry();
    let mut content = read("image.gif");
    content.resize(100_000, 0);
    let mut reader = content.as_slice();
    let resolved = registry.guess_type(Source::stream(&mut reader)).unwrap();
    assert_eq!(resolved.mime_type(), "image/gif");
    // The sniffed prefix is gone; the rest is still there
    assert!(!reader.is_empty());
    assert!(reader.len() < content.len());
}

#[test]
fn test_apache_analyze() {
    let db = GlobDatabase::open(data("mime.types"), Dialect::Apache).unwrap();
    assert!(db.analyze("").is_empty());

    let cases = [
        ("file.css", "text/css"),
        ("file.gif", "image/gif"),
        ("file.class", "application/java-vm"),
        ("file.js", "application/x-javascript"),
        ("file.pdf", "application/pdf"),
        ("file.txt", "text/plain"),
        ("file.doc", "application/msword"),
        ("file.odt", "application/vnd.oasis.opendocument.text"),
        ("file.tar", "application/x-tar"),
        ("file.xhtml", "application/xhtml+xml"),
        ("file.xml", "application/xml"),
    ];
    for (file, expected) in cases {
        assert_eq!(db.analyze(file), vec![expected], "File `{}`", file);
    }
    assert!(db.analyze("file.unknown-extension").is_empty());
    assert_eq!(db.skipped(), 0);
}

#[test]
fn test_malformed_line_resilience() {
    let db = GlobDatabase::open(data("mime-corrupt.types"), Dialect::Apache).unwrap();
    assert_eq!(db.len(), 9);
    assert_eq!(db.skipped(), 1);
}

#[test]
fn test_freedesktop_precedence() {
    let db = GlobDatabase::open(data("globs2"), Dialect::Freedesktop).unwrap();
    // Literal beats glob
    assert_eq!(db.first("Makefile"), Some("text/x-makefile"));
    // Longest suffix
    assert_eq!(db.first("backup.tar.gz"), Some("application/x-compressed-tar"));
    assert_eq!(db.first("notes.gz"), Some("application/gzip"));
    // Case-sensitive entries
    assert_eq!(db.first("main.c"), Some("text/x-csrc"));
    // Exact-case `*.c` shadows the case-folded `*.C` declared before it
    assert_eq!(db.analyze("hello.c"), vec!["text/x-csrc"]);
    assert_eq!(db.first("main.C"), Some("text/x-c++src"));
    // Higher weight first, both candidates kept
    assert_eq!(db.analyze("song.ogg"), vec!["audio/ogg", "audio/x-vorbis+ogg"]);
    assert_eq!(db.first("README.md"), Some("text/x-readme"));
}

#[test]
fn test_content_wins_over_filename() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("misnamed.txt");
    std::fs::write(&path, read("image.gif")).unwrap();

    let resolved = registry().guess_type(&path).unwrap();
    assert_eq!(resolved.mime_type(), "image/gif");
    assert_eq!(resolved.strategy(), Strategy::Magic);
}

#[test]
fn test_filename_used_when_magic_unavailable() {
    let registry = registry();
    registry
        .configure_magic(MagicConfig::freedesktop(data("no-such-magic")))
        .unwrap();

    let resolved = registry.guess_type(&data("image.gif")).unwrap();
    assert_eq!(resolved.to_string(), "image/gif; charset=binary");
    assert_eq!(resolved.strategy(), Strategy::Glob);

    let err = registry.magic_type(&data("image.gif")).unwrap_err();
    assert!(matches!(err, MimeError::DatabaseUnavailable(_)));
}

#[test]
fn test_filename_used_when_content_unknown() {
    let resolved = registry().guess_type(&data("style.css")).unwrap();
    assert_eq!(resolved.to_string(), "text/css; charset=us-ascii");
    assert_eq!(resolved.strategy(), Strategy::Glob);

    let dir = tempfile::TempDir::new().unwrap();
    let source = dir.path().join("hello.c");
    std::fs::write(&source, "int main(void) { return 0; }\n").unwrap();
    assert_eq!(
        registry().guess_type(&source).unwrap().to_string(),
        "text/x-csrc; charset=us-ascii"
    );
}

#[test]
fn test_plain_ascii_snippet() {
    let resolved = registry()
        .guess_type(Source::Bytes(b"just a few words of 7-bit text\n"))
        .unwrap();
    assert_eq!(resolved.to_string(), "text/plain; charset=us-ascii");
}

#[test]
fn test_no_match_defaults() {
    let resolved = registry()
        .guess_type(Source::Bytes(b"\x00\x13\x37 no signature here"))
        .unwrap();
    assert_eq!(resolved.to_string(), "application/octet-stream; charset=binary");
    assert_eq!(resolved, ResolvedType::unknown());
}

#[test]
fn test_unreadable_path() {
    let err = registry().guess_type(&data("missing.gif")).unwrap_err();
    assert!(matches!(err, MimeError::StreamUnreadable(_)));
}

#[test]
fn test_freedesktop_magic_file() {
    let registry = Registry::new();
    registry
        .configure_magic(MagicConfig::freedesktop(data("magic")))
        .unwrap();

    let backend = registry.magic_backend().unwrap();
    assert!(backend.to_string().contains("signature table"));

    for (file, expected) in [
        ("image.gif", "image/gif; charset=binary"),
        ("image.png", "image/png; charset=binary"),
        ("image.jpg", "image/jpeg; charset=binary"),
        ("document.pdf", "application/pdf; charset=binary"),
        ("video.ogv", "video/ogg; charset=binary"),
        ("audio.ogg", "audio/ogg; charset=binary"),
        ("page.html", "text/html; charset=us-ascii"),
    ] {
        assert_eq!(
            registry.guess_type(&data(file)).unwrap().to_string(),
            expected,
            "File `{}`",
            file
        );
    }
}

#[test]
fn test_infer_adapter() {
    let registry = Registry::new();
    registry.configure_magic(MagicConfig::infer()).unwrap();
    for (file, expected) in [
        ("image.gif", "image/gif"),
        ("image.png", "image/png"),
        ("document.pdf", "application/pdf"),
    ] {
        assert_eq!(
            registry.guess_type(&data(file)).unwrap().mime_type(),
            expected,
            "File `{}`",
            file
        );
    }
}

#[test]
fn test_determinism_and_reset_round_trip() {
    let registry = registry();
    let files = ["image.gif", "video.ogv", "style.css", "page.html", "video_h264.mp4"];
    let first: Vec<_> = files
        .iter()
        .map(|f| registry.guess_type(&data(f)).unwrap())
        .collect();
    let again: Vec<_> = files
        .iter()
        .map(|f| registry.guess_type(&data(f)).unwrap())
        .collect();
    assert_eq!(first, again);

    let magic = registry.magic_config();
    let glob = registry.glob_config().unwrap();
    registry.reset();
    registry
        .config(RegistryConfig::default().with_magic(magic).with_glob(glob))
        .unwrap();

    let after: Vec<_> = files
        .iter()
        .map(|f| registry.guess_type(&data(f)).unwrap())
        .collect();
    assert_eq!(first, after);
}

#[test]
fn test_guess_extension() {
    let registry = Registry::new();
    registry.configure_glob(Some(GlobConfig::apache(data("mime.types"))));
    assert_eq!(
        registry.guess_extension("image/jpeg").unwrap().as_deref(),
        Some("jpeg")
    );
    assert_eq!(
        registry
            .guess_extension("Video/MP4; codecs=avc1")
            .unwrap()
            .as_deref(),
        Some("mp4")
    );
    assert_eq!(registry.guess_extension("application/x-unknown").unwrap(), None);
}

#[test]
fn test_config_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("mimetype.json");
    std::fs::write(
        &config,
        format!(
            r#"{{ "magic": {{ "adapter": "fileinfo" }},
                  "glob": {{ "adapter": "apache", "file": "{}" }} }}"#,
            data("mime.types").display()
        ),
    )
    .unwrap();

    let registry = Registry::from_config_file(&config).unwrap();
    assert_eq!(registry.glob_types("site.css").unwrap(), vec!["text/css"]);
    assert_eq!(
        registry.guess_type(&data("image.png")).unwrap().mime_type(),
        "image/png"
    );
}

#[test]
fn test_gzip_database() {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("globs2.gz");
    let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    encoder.write_all(&read("globs2")).unwrap();
    encoder.finish().unwrap();

    let db = GlobDatabase::open(&path, Dialect::Freedesktop).unwrap();
    assert_eq!(db.first("index.html"), Some("text/html"));
}

#[test]
fn test_global_registry_is_shared() {
    let a = Registry::global() as *const Registry;
    let b = Registry::global() as *const Registry;
    assert_eq!(a, b);
    let content = read("image.gif");
    let resolved = Registry::global().guess_type(content.as_slice()).unwrap();
    assert_eq!(resolved.mime_type(), "image/gif");
}

proptest! {
    #[test]
    fn prop_glob_lookup_is_deterministic(name in "[a-zA-Z0-9._-]{0,24}") {
        let db = GlobDatabase::open(data("globs2"), Dialect::Freedesktop).unwrap();
        let first = db.analyze(&name);
        let second = db.analyze(&name);
        prop_assert_eq!(&first, &second);
        // Candidates never repeat
        let mut unique = first.clone();
        unique.dedup();
        prop_assert_eq!(unique.len(), first.len());
    }

    #[test]
    fn prop_resolution_never_fails_on_bytes(content in proptest::collection::vec(any::<u8>(), 0..512)) {
        let resolved = Registry::new().guess_type(content.as_slice()).unwrap();
        prop_assert!(resolved.mime_type().contains('/'));
        prop_assert!(!resolved.charset().is_empty());
    }
}
